//! Lingroup Tools
//!
//! Batch tools for turning per-sample lingroup containment results into
//! phylogroup calls.
//!
//! This library provides shared functionality for:
//! - Aggregating per-sample lingroup files into one table
//! - Best-match and above-threshold phylogroup extraction
//! - Concordance of detected phylogroups with expected phylogroups
//! - Summary statistics export

pub mod aggregate;
pub mod concordance;
pub mod error;
pub mod phylogroup;
pub mod reporting;
pub mod table;

use anyhow::{anyhow, Result};
use clap::ArgMatches;
use std::path::PathBuf;

pub use error::LingroupError;
pub use table::Table;

/// Set up `env_logger`; `verbose` raises the default level to debug
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Path given for a required or defaulted argument
pub fn path_arg(matches: &ArgMatches, id: &str) -> Result<PathBuf> {
    matches
        .get_one::<String>(id)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("missing required argument '{}'", id))
}

/// Path given for an optional argument, if any
pub fn optional_path_arg(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    matches.get_one::<String>(id).map(PathBuf::from)
}
