//! Summary statistics shared by the tools
//!
//! Each tool prints its headline numbers and can also dump the full summary
//! structure as JSON with `--stats`.

use crate::error::LingroupError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait for summary structures that can be exported with `--stats`
pub trait StatsMarker: Clone + Serialize + for<'de> Deserialize<'de> + std::fmt::Debug {}

/// Export a summary structure to pretty-printed JSON
pub fn write_stats_json<T: StatsMarker, P: AsRef<Path>>(stats: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let json_content = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json_content)
        .with_context(|| format!("failed to write stats to {}", path.display()))?;
    Ok(())
}

/// `numerator / denominator * 100`, refusing an empty denominator
pub fn percentage(numerator: usize, denominator: usize, what: &str) -> Result<f64> {
    if denominator == 0 {
        return Err(LingroupError::EmptyDenominator(what.to_string()).into());
    }
    Ok((numerator as f64 / denominator as f64) * 100.0)
}
