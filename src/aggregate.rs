//! Lingroup result aggregation
//!
//! Concatenates per-sample lingroup files into one tab-separated table with
//! a leading `sample` column. The header of the first file is used for the
//! whole output; later headers are discarded without being compared.

use crate::error::LingroupError;
use crate::reporting::StatsMarker;
use crate::table::{Table, TAB};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Separator between the sample accession and the rest of a file name
pub const SAMPLE_SEPARATOR: &str = "-x-";

pub const SAMPLE_COLUMN: &str = "sample";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRows {
    pub path: String,
    pub sample: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationStats {
    pub files: usize,
    pub rows: usize,
    pub per_file: Vec<FileRows>,
}

impl StatsMarker for AggregationStats {}

/// Sample name for a lingroup file: the basename up to the first `-x-`
pub fn extract_sample_name<P: AsRef<Path>>(path: P) -> String {
    let basename = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match basename.split_once(SAMPLE_SEPARATOR) {
        Some((sample, _)) => sample.to_string(),
        None => basename,
    }
}

/// Read the manifest of lingroup files, one path per line
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read lingroup manifest {}", path.display()))?;

    let mut files = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let entry = line.trim();
        if entry.is_empty() {
            log::warn!("skipping blank line {} in {}", line_no + 1, path.display());
            continue;
        }
        files.push(PathBuf::from(entry));
    }
    Ok(files)
}

/// Raw header and data records of one lingroup file, copied verbatim
fn read_lingroup_file(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(TAB)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open lingroup file {}", path.display()))?;

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Err(LingroupError::EmptyInput(path.display().to_string()).into()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.with_context(|| format!("failed to read row of {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

/// Combine lingroup files into one table with a prepended `sample` column
///
/// Every input is read before anything is returned, so a missing or
/// unreadable file aborts the whole aggregation.
pub fn aggregate_tables(files: &[PathBuf]) -> Result<(Table, AggregationStats)> {
    let mut combined: Option<Table> = None;
    let mut per_file = Vec::with_capacity(files.len());

    for file in files {
        let sample = extract_sample_name(file);
        let (header, rows) = read_lingroup_file(file)?;
        log::debug!("{}: sample '{}', {} rows", file.display(), sample, rows.len());

        let table = combined.get_or_insert_with(|| {
            let mut full_header = Vec::with_capacity(header.len() + 1);
            full_header.push(SAMPLE_COLUMN.to_string());
            full_header.extend(header);
            Table::new("aggregated lingroups", full_header)
        });

        per_file.push(FileRows {
            path: file.display().to_string(),
            sample: sample.clone(),
            rows: rows.len(),
        });
        for row in rows {
            let mut out = Vec::with_capacity(row.len() + 1);
            out.push(sample.clone());
            out.extend(row);
            table.rows.push(out);
        }
    }

    let table = combined.unwrap_or_default();
    let stats = AggregationStats {
        files: files.len(),
        rows: table.len(),
        per_file,
    };
    Ok((table, stats))
}

/// Aggregate the files and write the combined table to `output`
///
/// With no input files the output is created empty, without a header.
pub fn aggregate_lingroups<P: AsRef<Path>>(files: &[PathBuf], output: P) -> Result<AggregationStats> {
    let output = output.as_ref();
    let (table, stats) = aggregate_tables(files)?;

    if files.is_empty() {
        std::fs::write(output, "")
            .with_context(|| format!("failed to create {}", output.display()))?;
    } else {
        table.write_delimited(output, TAB)?;
    }
    log::info!("aggregated {} files into {} rows", stats.files, stats.rows);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extract_sample_name() {
        assert_eq!(extract_sample_name("SRR123-x-something.csv"), "SRR123");
        assert_eq!(extract_sample_name("plainname.csv"), "plainname.csv");
        assert_eq!(extract_sample_name("/data/runs/ERR9-x-a-x-b.tsv"), "ERR9");
    }

    #[test]
    fn test_read_manifest_trims_and_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("files.txt");
        std::fs::write(&manifest, "  a-x-1.tsv \n\nb-x-1.tsv\n").unwrap();

        let files = read_manifest(&manifest).unwrap();
        assert_eq!(files, vec![PathBuf::from("a-x-1.tsv"), PathBuf::from("b-x-1.tsv")]);
    }

    #[test]
    fn test_header_written_once_and_rows_preserved() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A-x-r1.tsv");
        let b = dir.path().join("B-x-r1.tsv");
        std::fs::write(&a, "name\tpercent_containment\nB_1;B_1.1\t0.5\nO_outgroup\t0.1\n").unwrap();
        std::fs::write(&b, "name\tpercent_containment\nB_2;B_2.1\t0.7\n").unwrap();

        let output = dir.path().join("agg.tsv");
        let stats = aggregate_lingroups(&[a, b], &output).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.rows, 3);

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines,
            vec![
                "sample\tname\tpercent_containment",
                "A\tB_1;B_1.1\t0.5",
                "A\tO_outgroup\t0.1",
                "B\tB_2;B_2.1\t0.7",
            ]
        );
    }

    #[test]
    fn test_missing_input_aborts_without_output() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A-x-r1.tsv");
        std::fs::write(&a, "name\tpercent_containment\nB_1\t0.5\n").unwrap();
        let missing = dir.path().join("missing-x-r1.tsv");

        let output = dir.path().join("agg.tsv");
        assert!(aggregate_lingroups(&[a, missing], &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_empty_input_file_is_rejected() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A-x-r1.tsv");
        std::fs::write(&a, "").unwrap();

        let err = aggregate_tables(&[a]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LingroupError>(),
            Some(LingroupError::EmptyInput(_))
        ));
    }
}
