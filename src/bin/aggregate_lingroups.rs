//! Lingroup Aggregation Tool
//!
//! Combine per-sample lingroup results into one tab-separated table

use anyhow::Result;
use clap::{Arg, Command};
use lingroup_tools::aggregate::{aggregate_lingroups, read_manifest};
use lingroup_tools::reporting::write_stats_json;
use lingroup_tools::{init_logging, optional_path_arg, path_arg};

fn main() -> Result<()> {
    let matches = Command::new("lingroup-aggregate")
        .version("0.1.0")
        .about("Aggregate per-sample lingroup files into one table")
        .author("Megan Johnson")
        .arg(
            Arg::new("lingroups")
                .long("lingroups")
                .value_name("FILE")
                .help("File listing one lingroup result file per line")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("TSV")
                .help("Aggregated lingroups output")
                .required(true),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output aggregation statistics (JSON)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let manifest = path_arg(&matches, "lingroups")?;
    let output_file = path_arg(&matches, "output")?;
    let stats_file = optional_path_arg(&matches, "stats");

    let files = read_manifest(&manifest)?;
    log::info!("{} lingroup files listed in {}", files.len(), manifest.display());

    let stats = aggregate_lingroups(&files, &output_file)?;

    if let Some(stats_file) = stats_file {
        write_stats_json(&stats, &stats_file)?;
        log::info!("aggregation statistics saved to {}", stats_file.display());
    }

    println!("Combined file saved to '{}'", output_file.display());

    Ok(())
}
