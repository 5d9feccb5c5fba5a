//! Concordance of detected phylogroups with expected phylogroups
//!
//! Detected calls are joined to a reference of acceptable phylogroups per
//! country. The written `expected_match` column is boolean; the verdict
//! itself keeps "no expectation" apart from a real mismatch.

use crate::error::LingroupError;
use crate::phylogroup::{LINEAGE_SEPARATOR, PHYLOGROUP_COLUMN};
use crate::reporting::{percentage, StatsMarker};
use crate::table::Table;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const COUNTRY_COLUMN: &str = "country";
pub const KNOWN_COUNTRY_COLUMN: &str = "known_country";
pub const EXPECTED_PHYLOGROUP_COLUMN: &str = "expected_phylogroup";
pub const DETECTED_COUNTRY_COLUMN: &str = "geo_loc_name_country_calc";
pub const EXPECTED_MATCH_COLUMN: &str = "expected_match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationVerdict {
    Match,
    Mismatch,
    /// No reference row for the sample's country
    NoExpectation,
}

impl ExpectationVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, ExpectationVerdict::Match)
    }

    /// Boolean rendering for the `expected_match` column
    pub fn as_column_value(&self) -> &'static str {
        if self.is_match() {
            "True"
        } else {
            "False"
        }
    }
}

/// Verdict for one detected phylogroup against a `;`-separated expectation
pub fn check_match(phylogroup: Option<&str>, expected: Option<&str>) -> ExpectationVerdict {
    let Some(expected) = expected else {
        return ExpectationVerdict::NoExpectation;
    };
    match phylogroup {
        Some(detected) if expected.split(LINEAGE_SEPARATOR).any(|g| g == detected) => {
            ExpectationVerdict::Match
        }
        _ => ExpectationVerdict::Mismatch,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcordanceStats {
    pub rows: usize,
    pub detected_phylogroups: usize,
    pub with_expected_phylogroups: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub no_expectation: usize,
    /// `None` when no row had a reference entry
    pub percent_matching: Option<f64>,
}

impl StatsMarker for ConcordanceStats {}

impl ConcordanceStats {
    /// Share of rows with a reference entry whose phylogroup was expected
    pub fn match_percentage(&self) -> Result<f64> {
        percentage(
            self.matches,
            self.with_expected_phylogroups,
            "phylogroups matching expectation",
        )
    }
}

#[derive(Debug, Clone)]
pub struct Concordance {
    /// Detected rows, reference columns and `expected_match`
    pub table: Table,
    pub verdicts: Vec<ExpectationVerdict>,
    pub stats: ConcordanceStats,
}

/// Join detected calls to the reference and annotate each row
pub fn compare_phylogroups(detected: &Table, expected: &Table) -> Result<Concordance> {
    detected.require_column(DETECTED_COUNTRY_COLUMN)?;
    let phylogroup_idx = detected.require_column(PHYLOGROUP_COLUMN)?;

    let mut reference = expected.clone();
    if reference.column_index(COUNTRY_COLUMN).is_none() {
        return Err(LingroupError::MissingColumn {
            table: reference.name.clone(),
            column: COUNTRY_COLUMN.to_string(),
        }
        .into());
    }
    reference.rename_columns(&[(COUNTRY_COLUMN, KNOWN_COUNTRY_COLUMN)]);
    let known_idx = reference.require_column(KNOWN_COUNTRY_COLUMN)?;
    let expected_idx = reference.require_column(EXPECTED_PHYLOGROUP_COLUMN)?;

    let mut seen = HashSet::new();
    for row in 0..reference.len() {
        if let Some(country) = reference.value(row, known_idx) {
            if !seen.insert(country) {
                log::warn!(
                    "country '{}' appears more than once in {}; matching samples are repeated",
                    country,
                    reference.name
                );
            }
        }
    }

    let mut table = detected.left_join(&reference, DETECTED_COUNTRY_COLUMN, KNOWN_COUNTRY_COLUMN)?;
    // reference columns follow the detected ones, whatever their joined names
    let known_idx = detected.header.len() + known_idx;
    let expected_idx = detected.header.len() + expected_idx;

    let verdicts: Vec<ExpectationVerdict> = (0..table.len())
        .map(|row| check_match(table.value(row, phylogroup_idx), table.value(row, expected_idx)))
        .collect();

    let count = |verdict: ExpectationVerdict| verdicts.iter().filter(|v| **v == verdict).count();
    let matches = count(ExpectationVerdict::Match);
    let with_expected_phylogroups = (0..table.len())
        .filter(|&row| table.value(row, known_idx).is_some())
        .count();
    let stats = ConcordanceStats {
        rows: table.len(),
        detected_phylogroups: (0..table.len())
            .filter(|&row| table.value(row, phylogroup_idx).is_some())
            .count(),
        with_expected_phylogroups,
        matches,
        mismatches: count(ExpectationVerdict::Mismatch),
        no_expectation: count(ExpectationVerdict::NoExpectation),
        percent_matching: percentage(matches, with_expected_phylogroups, "match rate").ok(),
    };

    table.push_column(
        EXPECTED_MATCH_COLUMN,
        verdicts.iter().map(|v| v.as_column_value().to_string()).collect(),
    );

    Ok(Concordance {
        table,
        verdicts,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::table_of;

    fn reference() -> Table {
        table_of(
            &["country", "expected_phylogroup"],
            &[&["USA", "1;2"], &["Chile", ""]],
        )
    }

    #[test]
    fn test_check_match() {
        assert_eq!(check_match(Some("2"), Some("1;2")), ExpectationVerdict::Match);
        assert_eq!(check_match(Some("3"), Some("1;2")), ExpectationVerdict::Mismatch);
        assert_eq!(check_match(None, Some("1;2")), ExpectationVerdict::Mismatch);
        assert_eq!(check_match(Some("2"), None), ExpectationVerdict::NoExpectation);
        assert_eq!(ExpectationVerdict::NoExpectation.as_column_value(), "False");
    }

    #[test]
    fn test_compare_annotates_rows() {
        let detected = table_of(
            &["sample", "phylogroup", "geo_loc_name_country_calc"],
            &[
                &["S1", "2", "USA"],
                &["S2", "3", "USA"],
                &["S3", "1", "France"],
                &["S4", "", "USA"],
                &["S5", "1", "Chile"],
            ],
        );

        let result = compare_phylogroups(&detected, &reference()).unwrap();
        assert_eq!(
            result.table.header,
            vec![
                "sample",
                "phylogroup",
                "geo_loc_name_country_calc",
                "known_country",
                "expected_phylogroup",
                "expected_match"
            ]
        );
        let matches: Vec<&str> = result.table.rows.iter().map(|r| r[5].as_str()).collect();
        assert_eq!(matches, vec!["True", "False", "False", "False", "False"]);
        assert_eq!(result.table.rows[2][3], "");
        assert_eq!(result.verdicts[2], ExpectationVerdict::NoExpectation);
        assert_eq!(result.verdicts[4], ExpectationVerdict::NoExpectation);

        let stats = &result.stats;
        assert_eq!(stats.detected_phylogroups, 4);
        assert_eq!(stats.with_expected_phylogroups, 4);
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.mismatches, 2);
        assert_eq!(stats.no_expectation, 2);
        assert_eq!(stats.match_percentage().unwrap(), 25.0);
    }

    #[test]
    fn test_no_reference_rows_has_no_denominator() {
        let detected = table_of(
            &["phylogroup", "geo_loc_name_country_calc"],
            &[&["1", "Peru"]],
        );
        let result = compare_phylogroups(&detected, &reference()).unwrap();
        assert_eq!(result.stats.percent_matching, None);
        assert!(result.stats.match_percentage().is_err());
    }

    #[test]
    fn test_reference_requires_country() {
        let detected = table_of(&["phylogroup", "geo_loc_name_country_calc"], &[]);
        let bad = table_of(&["nation", "expected_phylogroup"], &[]);
        let err = compare_phylogroups(&detected, &bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LingroupError>(),
            Some(LingroupError::MissingColumn { .. })
        ));
    }
}
