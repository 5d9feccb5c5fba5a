//! Phylogroup Concordance Tool
//!
//! Compare detected phylogroups with the phylogroups expected for each
//! sample's country of origin.

use anyhow::Result;
use clap::{Arg, Command};
use lingroup_tools::concordance::compare_phylogroups;
use lingroup_tools::reporting::write_stats_json;
use lingroup_tools::table::{Table, COMMA, TAB};
use lingroup_tools::{init_logging, optional_path_arg, path_arg};

fn main() -> Result<()> {
    let matches = Command::new("lingroup-compare-phylogroup")
        .version("0.1.0")
        .about("Compare detected phylogroups with expected phylogroups")
        .author("Megan Johnson")
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("TSV")
                .help("Path to the detected phylogroup file")
                .required(true),
        )
        .arg(
            Arg::new("expected_phylogroup")
                .long("expected-phylogroup")
                .value_name("CSV")
                .help("Path to the expected phylogroup file (columns: country, expected_phylogroup)")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("CSV")
                .help("Path to save the comparison result")
                .required(true),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output concordance statistics (JSON)"),
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

    let input_file = path_arg(&matches, "input")?;
    let expected_file = path_arg(&matches, "expected_phylogroup")?;
    let output_file = path_arg(&matches, "output")?;
    let stats_file = optional_path_arg(&matches, "stats");

    let expected = Table::read_delimited(&expected_file, COMMA)?;
    let detected = Table::read_delimited(&input_file, TAB)?;

    let concordance = compare_phylogroups(&detected, &expected)?;
    concordance.table.write_delimited(&output_file, COMMA)?;

    if let Some(stats_file) = stats_file {
        write_stats_json(&concordance.stats, &stats_file)?;
        log::info!("concordance statistics saved to {}", stats_file.display());
    }

    let stats = &concordance.stats;
    println!("Comparison result saved to '{}'", output_file.display());
    println!(
        "Total number of samples with detected phylogroup: {}",
        stats.detected_phylogroups
    );
    println!("{} samples with expected phylogroups", stats.with_expected_phylogroups);
    let percent_matching = stats.match_percentage()?;
    println!(
        "phylogroups matching expectation: {}/{} ({:.2}%)",
        stats.matches, stats.with_expected_phylogroups, percent_matching
    );
    log::debug!(
        "{} rows had no expectation for their country",
        stats.no_expectation
    );

    Ok(())
}
