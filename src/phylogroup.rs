//! Phylogroup calling from aggregated lingroup containment
//!
//! Lineage names are `;`-delimited paths such as `B_1;B_1.1`. A row is
//! phylogroup-level when its name resolves to a phylogroup under the chosen
//! [`PhylogroupLevel`] and it carries a containment value. For each sample
//! the phylogroup-level row with the highest containment is its best match;
//! all phylogroup-level rows at or above the threshold are reported too.

use crate::aggregate::SAMPLE_COLUMN;
use crate::error::LingroupError;
use crate::reporting::{percentage, StatsMarker};
use crate::table::Table;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const OUTGROUP_NAME: &str = "O_outgroup";
pub const OUTGROUP: &str = "outgroup";
pub const PHYLOGROUP_PREFIX: &str = "B_";
pub const LINEAGE_SEPARATOR: char = ';';

pub const DEFAULT_CONTAINMENT_THRESHOLD: f64 = 0.3;

pub const NAME_COLUMN: &str = "name";
pub const CONTAINMENT_COLUMN: &str = "percent_containment";
pub const PHYLOGROUP_COLUMN: &str = "phylogroup";
pub const METADATA_KEY_COLUMN: &str = "acc";

const OUTPUT_RENAMES: [(&str, &str); 3] = [
    ("percent_containment", "phylogroup_containment"),
    ("containment", "branchwater_containment"),
    ("organism", "sra_organism"),
];
const CALL_DROPS: [&str; 4] = ["name", "lin", "num_bp_contained", "acc"];
const ALL_ROWS_DROPS: [&str; 2] = ["num_bp_contained", "acc"];

/// Which lineage rows count as phylogroup-level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhylogroupLevel {
    /// The last segment starts with `B_`
    #[default]
    LastSegment,
    /// The name has exactly two segments
    TwoSegments,
}

impl PhylogroupLevel {
    pub const VARIANTS: [&'static str; 2] = ["last-segment", "two-segments"];

    /// Phylogroup label for a lineage name, `None` when the row is not
    /// phylogroup-level
    pub fn classify(&self, name: &str) -> Option<String> {
        if name == OUTGROUP_NAME {
            return Some(OUTGROUP.to_string());
        }

        let parts: Vec<&str> = name.split(LINEAGE_SEPARATOR).collect();
        let last = *parts.last()?;
        match self {
            PhylogroupLevel::LastSegment => last
                .strip_prefix(PHYLOGROUP_PREFIX)
                .map(str::to_string),
            PhylogroupLevel::TwoSegments if parts.len() == 2 => Some(
                last.strip_prefix(PHYLOGROUP_PREFIX)
                    .unwrap_or(last)
                    .to_string(),
            ),
            PhylogroupLevel::TwoSegments => None,
        }
    }
}

impl fmt::Display for PhylogroupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhylogroupLevel::LastSegment => write!(f, "last-segment"),
            PhylogroupLevel::TwoSegments => write!(f, "two-segments"),
        }
    }
}

impl FromStr for PhylogroupLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last-segment" => Ok(PhylogroupLevel::LastSegment),
            "two-segments" => Ok(PhylogroupLevel::TwoSegments),
            other => anyhow::bail!(
                "unknown phylogroup level '{}', expected one of: {}",
                other,
                Self::VARIANTS.join(", ")
            ),
        }
    }
}

/// Classify with the default policy
pub fn classify(name: &str) -> Option<String> {
    PhylogroupLevel::default().classify(name)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub containment_threshold: f64,
    pub phylogroup_level: PhylogroupLevel,
    pub total_rows: usize,
    pub phylogroup_rows: usize,
    pub total_samples: usize,
    pub samples_with_best_match: usize,
    pub samples_above_threshold: usize,
    pub percent_samples_above_threshold: f64,
}

impl StatsMarker for ExtractionStats {}

/// Output tables of one extraction run
#[derive(Debug, Clone)]
pub struct Extraction {
    /// One row per sample, ordered by sample
    pub best: Table,
    /// Phylogroup-level rows at or above the threshold, in input order
    pub above_threshold: Table,
    /// Every input row with its phylogroup, keeping `name` and `lin`
    pub all: Table,
    pub stats: ExtractionStats,
}

/// Best-match and threshold selection over an aggregated lingroup table
pub struct PhylogroupExtractor {
    pub containment_threshold: f64,
    pub level: PhylogroupLevel,
}

impl Default for PhylogroupExtractor {
    fn default() -> Self {
        Self {
            containment_threshold: DEFAULT_CONTAINMENT_THRESHOLD,
            level: PhylogroupLevel::default(),
        }
    }
}

impl PhylogroupExtractor {
    pub fn new(containment_threshold: f64, level: PhylogroupLevel) -> Result<Self> {
        if containment_threshold.is_nan() {
            return Err(LingroupError::InvalidThreshold(containment_threshold.to_string()).into());
        }
        Ok(Self {
            containment_threshold,
            level,
        })
    }

    /// Parse the containment column; empty and NaN cells are missing values
    fn parse_containment(table: &Table, column: usize) -> Result<Vec<Option<f64>>> {
        let mut values = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let value = match table.value(row, column) {
                None => None,
                Some(text) => {
                    let parsed: f64 = text.trim().parse().map_err(|_| LingroupError::NonNumeric {
                        column: CONTAINMENT_COLUMN.to_string(),
                        row: row + 1,
                        value: text.to_string(),
                    })?;
                    Some(parsed).filter(|v| !v.is_nan())
                }
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Run the extraction, optionally left-joining metadata on `sample = acc`
    pub fn extract(&self, lingroups: &Table, metadata: Option<&Table>) -> Result<Extraction> {
        let sample_idx = lingroups.require_column(SAMPLE_COLUMN)?;
        let name_idx = lingroups.require_column(NAME_COLUMN)?;
        let containment_idx = lingroups.require_column(CONTAINMENT_COLUMN)?;
        if let Some(metadata) = metadata {
            metadata.require_column(METADATA_KEY_COLUMN)?;
        }

        let containment = Self::parse_containment(lingroups, containment_idx)?;
        let phylogroups: Vec<Option<String>> = (0..lingroups.len())
            .map(|row| lingroups.value(row, name_idx).and_then(|n| self.level.classify(n)))
            .collect();

        let level_rows: Vec<(usize, &str, f64)> = (0..lingroups.len())
            .filter_map(|row| {
                let sample = lingroups.value(row, sample_idx)?;
                phylogroups[row].as_ref()?;
                Some((row, sample, containment[row]?))
            })
            .collect();
        log::debug!(
            "{} of {} rows are phylogroup-level ({})",
            level_rows.len(),
            lingroups.len(),
            self.level
        );

        // first row wins ties
        let mut best: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for &(row, sample, value) in &level_rows {
            let replace = best.get(sample).map_or(true, |&(_, current)| value > current);
            if replace {
                best.insert(sample, (row, value));
            }
        }
        let best_rows: Vec<usize> = best.values().map(|&(row, _)| row).collect();

        let above_rows: Vec<usize> = level_rows
            .iter()
            .filter(|(_, _, value)| *value >= self.containment_threshold)
            .map(|&(row, _, _)| row)
            .collect();

        let total_samples = (0..lingroups.len())
            .filter_map(|row| lingroups.value(row, sample_idx))
            .collect::<HashSet<_>>()
            .len();
        let samples_above_threshold = above_rows
            .iter()
            .filter_map(|&row| lingroups.value(row, sample_idx))
            .collect::<HashSet<_>>()
            .len();
        let percent_samples_above_threshold = percentage(
            samples_above_threshold,
            total_samples,
            "percentage of samples above threshold",
        )?;

        let mut annotated = lingroups.clone();
        annotated.push_column(
            PHYLOGROUP_COLUMN,
            phylogroups.into_iter().map(Option::unwrap_or_default).collect(),
        );

        let finish = |rows: Option<&[usize]>, drops: &[&str]| -> Result<Table> {
            let mut table = match rows {
                Some(rows) => annotated.select_rows(rows),
                None => annotated.clone(),
            };
            if let Some(metadata) = metadata {
                table = table.left_join(metadata, SAMPLE_COLUMN, METADATA_KEY_COLUMN)?;
            }
            table.rename_columns(&OUTPUT_RENAMES);
            table.drop_columns(drops);
            Ok(table)
        };

        let stats = ExtractionStats {
            containment_threshold: self.containment_threshold,
            phylogroup_level: self.level,
            total_rows: lingroups.len(),
            phylogroup_rows: level_rows.len(),
            total_samples,
            samples_with_best_match: best_rows.len(),
            samples_above_threshold,
            percent_samples_above_threshold,
        };

        Ok(Extraction {
            best: finish(Some(best_rows.as_slice()), &CALL_DROPS)?,
            above_threshold: finish(Some(above_rows.as_slice()), &CALL_DROPS)?,
            all: finish(None, &ALL_ROWS_DROPS)?,
            stats,
        })
    }
}
