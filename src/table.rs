//! In-memory delimited tables
//!
//! Every tool in this crate loads its inputs whole, reshapes them and writes
//! them back out. Cells are kept as the text found in the file so values are
//! written verbatim; an empty cell is treated as a missing value.

use crate::error::LingroupError;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

pub const TAB: u8 = b'\t';
pub const COMMA: u8 = b',';

/// A header plus string rows, all rows as wide as the header
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Human-readable origin, used in error messages
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// Load a table whose first line is the header
    ///
    /// Ragged rows are rejected by the CSV reader.
    pub fn read_delimited<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let header: Vec<String> = reader
            .headers()
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();
        if header.is_empty() {
            return Err(LingroupError::EmptyInput(path.display().to_string()).into());
        }

        let mut table = Table::new(path.display().to_string(), header);
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to read row of {}", path.display()))?;
            table.rows.push(record.iter().map(str::to_string).collect());
        }

        log::debug!("loaded {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Write header and rows, creating or truncating `path`
    pub fn write_delimited<P: AsRef<Path>>(&self, path: P, delimiter: u8) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|h| h == column)
    }

    /// Like [`Table::column_index`] but a missing column is a schema error
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| {
            LingroupError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            }
            .into()
        })
    }

    /// Cell text by row and column, `None` if the cell is empty
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Append a derived column; `values` must hold one entry per row
    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.header.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Rename columns by `(from, to)` pairs; absent names are skipped
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for h in self.header.iter_mut() {
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == h.as_str()) {
                *h = to.to_string();
            }
        }
    }

    /// Remove the named columns; absent names are skipped
    pub fn drop_columns(&mut self, columns: &[&str]) {
        let keep: Vec<bool> = self
            .header
            .iter()
            .map(|h| !columns.contains(&h.as_str()))
            .collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        let retain = |cells: &mut Vec<String>| {
            let mut i = 0;
            cells.retain(|_| {
                let k = keep.get(i).copied().unwrap_or(true);
                i += 1;
                k
            });
        };
        retain(&mut self.header);
        for row in self.rows.iter_mut() {
            retain(row);
        }
    }

    /// New table holding the given rows, in the order given
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            header: self.header.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Relational left join of `self` with `right` on `left_key == right_key`
    ///
    /// Each left row is repeated once per matching right row and kept once
    /// with empty right cells when nothing matches. Empty keys never match.
    /// Column names present on both sides get `_x` (left) and `_y` (right)
    /// suffixes.
    pub fn left_join(&self, right: &Table, left_key: &str, right_key: &str) -> Result<Table> {
        let left_idx = self.require_column(left_key)?;
        let right_idx = right.require_column(right_key)?;

        let mut lookup: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(key) = row.get(right_idx).filter(|k| !k.is_empty()) {
                lookup.entry(key.as_str()).or_default().push(i);
            }
        }

        let mut header: Vec<String> = self
            .header
            .iter()
            .map(|h| {
                if right.header.contains(h) {
                    format!("{h}_x")
                } else {
                    h.clone()
                }
            })
            .collect();
        header.extend(right.header.iter().map(|h| {
            if self.header.contains(h) {
                format!("{h}_y")
            } else {
                h.clone()
            }
        }));

        let mut joined = Table::new(self.name.clone(), header);
        let blank = vec![String::new(); right.header.len()];
        let mut matched = 0usize;
        for row in &self.rows {
            let hits = row
                .get(left_idx)
                .and_then(|k| lookup.get(k.as_str()))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if hits.is_empty() {
                joined.rows.push(row.iter().chain(&blank).cloned().collect());
                continue;
            }
            matched += 1;
            for &hit in hits {
                joined
                    .rows
                    .push(row.iter().chain(&right.rows[hit]).cloned().collect());
            }
        }

        log::debug!(
            "joined {} on {} = {}: {}/{} rows matched",
            right.name,
            left_key,
            right_key,
            matched,
            self.len()
        );
        Ok(joined)
    }
}

/// Build a table from literal cells, used by tests across the crate
#[cfg(test)]
pub(crate) fn table_of(header: &[&str], rows: &[&[&str]]) -> Table {
    Table {
        name: "test".to_string(),
        header: header.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}
