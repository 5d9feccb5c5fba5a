//! Phylogroup Best-Match Tool
//!
//! Call the best phylogroup per sample from aggregated lingroup containment,
//! and collect every phylogroup call above a containment threshold.

use anyhow::Result;
use clap::{Arg, Command};
use lingroup_tools::phylogroup::{PhylogroupExtractor, PhylogroupLevel};
use lingroup_tools::reporting::write_stats_json;
use lingroup_tools::table::{Table, COMMA, TAB};
use lingroup_tools::{init_logging, optional_path_arg, path_arg, LingroupError};

fn main() -> Result<()> {
    let matches = Command::new("lingroup-extract-best-match")
        .version("0.1.0")
        .about("Extract the best phylogroup match per sample")
        .author("Megan Johnson")
        .arg(
            Arg::new("lingroup_csv")
                .long("lingroup-csv")
                .value_name("TSV")
                .help("Aggregated lingroups input file")
                .required(true),
        )
        .arg(
            Arg::new("best")
                .short('b')
                .long("best")
                .value_name("TSV")
                .help("Best phylogroup match per sample")
                .required(true),
        )
        .arg(
            Arg::new("good")
                .short('g')
                .long("good")
                .value_name("TSV")
                .help("Phylogroup matches above threshold"),
        )
        .arg(
            Arg::new("all")
                .short('a')
                .long("all")
                .value_name("TSV")
                .help("All lingroup rows annotated with their phylogroup"),
        )
        .arg(
            Arg::new("containment_threshold")
                .long("containment-threshold")
                .value_name("PERCENT")
                .help("Containment threshold for \"good\" matches")
                .default_value("0.3"),
        )
        .arg(
            Arg::new("phylogroup_level")
                .long("phylogroup-level")
                .value_name("POLICY")
                .help("Which lineage rows are phylogroup calls")
                .value_parser(PhylogroupLevel::VARIANTS)
                .default_value("last-segment"),
        )
        .arg(
            Arg::new("metadata")
                .long("metadata")
                .value_name("CSV")
                .help("Branchwater metadata file (comma-separated, keyed by 'acc')"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("JSON")
                .help("Output extraction statistics (JSON)"),
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

    // Parse arguments
    let input_file = path_arg(&matches, "lingroup_csv")?;
    let best_file = path_arg(&matches, "best")?;
    let good_file = optional_path_arg(&matches, "good");
    let all_file = optional_path_arg(&matches, "all");
    let metadata_file = optional_path_arg(&matches, "metadata");
    let stats_file = optional_path_arg(&matches, "stats");
    let threshold_text = matches
        .get_one::<String>("containment_threshold")
        .map(String::as_str)
        .unwrap_or_default();
    let containment_threshold: f64 = threshold_text
        .trim()
        .parse()
        .map_err(|_| LingroupError::InvalidThreshold(threshold_text.to_string()))?;
    let level: PhylogroupLevel = matches
        .get_one::<String>("phylogroup_level")
        .map(String::as_str)
        .unwrap_or_default()
        .parse()?;

    let extractor = PhylogroupExtractor::new(containment_threshold, level)?;

    let lingroups = Table::read_delimited(&input_file, TAB)?;
    let metadata = match &metadata_file {
        Some(path) => Some(Table::read_delimited(path, COMMA)?),
        None => None,
    };
    log::info!(
        "extracting phylogroups from {} rows ({} policy)",
        lingroups.len(),
        level
    );

    let extraction = extractor.extract(&lingroups, metadata.as_ref())?;

    println!(
        "Percentage of samples with at least one containment value over {}%: {:.2}%",
        containment_threshold, extraction.stats.percent_samples_above_threshold
    );

    extraction.best.write_delimited(&best_file, TAB)?;
    println!("Best phylogroup match per sample saved to '{}'", best_file.display());

    if let Some(good_file) = good_file {
        extraction.above_threshold.write_delimited(&good_file, TAB)?;
        println!(
            "Phylogroup matches above {}% containment saved to '{}'",
            containment_threshold,
            good_file.display()
        );
    }

    if let Some(all_file) = all_file {
        extraction.all.write_delimited(&all_file, TAB)?;
        println!("All phylogroup rows saved to '{}'", all_file.display());
    }

    if let Some(stats_file) = stats_file {
        write_stats_json(&extraction.stats, &stats_file)?;
        log::info!("extraction statistics saved to {}", stats_file.display());
    }

    Ok(())
}
