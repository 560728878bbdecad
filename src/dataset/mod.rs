//! Accumulated CSV table: batch building, outer-join append, full rewrite.

pub mod checkpoint;
pub mod resume;

pub use checkpoint::Checkpoint;
pub use resume::{replay_clicks, ResumeState};

use crate::gadgets::{Batch, ItemSummary};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Trailing column written when completeness flags are enabled.
pub const COMPLETE_COLUMN: &str = "complete";

/// Prefix given to a detail label that collides with a reserved column.
pub const SPEC_PREFIX: &str = "spec:";

/// Header plus rows of optional cells; every row is as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table for one batch: summary columns, then the union of
    /// detail labels in order of first appearance.
    ///
    /// Detail labels never overwrite the summary columns or the completeness
    /// flag; a clashing label is written as `spec:<label>`.
    pub fn from_batch(batch: &Batch, completeness_column: bool) -> Self {
        let mut table = Table {
            columns: ItemSummary::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::with_capacity(batch.summary_count()),
        };

        for record in &batch.records {
            let mut cells: Vec<(String, Option<String>)> = ItemSummary::COLUMNS
                .iter()
                .zip(record.summary.values())
                .map(|(column, value)| (column.to_string(), value.map(str::to_string)))
                .collect();

            if let Some(specs) = &record.specs {
                cells.extend(
                    specs.iter().map(|(label, value)| (detail_column(label), Some(value.to_string()))),
                );
            }

            table.push_cells(cells);
        }

        if completeness_column {
            let flags: Vec<Option<String>> =
                batch.records.iter().map(|r| Some(r.is_complete().to_string())).collect();
            let idx = table.column_index_or_insert(COMPLETE_COLUMN);
            for (row, flag) in table.rows.iter_mut().zip(flags) {
                row[idx] = flag;
            }
        }

        table
    }

    /// Reads a CSV file with a header row. Empty cells become `None`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading table from: {}", path.display());

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open dataset: {}", path.display()))?;

        let columns: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read dataset header: {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("Failed to read dataset row {} of {}", line + 1, path.display())
            })?;

            let mut row: Vec<Option<String>> = record
                .iter()
                .take(columns.len())
                .map(|cell| if cell.is_empty() { None } else { Some(cell.to_string()) })
                .collect();
            row.resize(columns.len(), None);
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Overwrites `path` with the whole table.
    ///
    /// The table is written to a sibling temp file first and renamed over the
    /// target, so an interrupted write leaves the previous file intact.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = Path::new(&tmp_name);

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(tmp)
                .with_context(|| format!("Failed to create {}", tmp.display()))?;

            if !self.columns.is_empty() {
                writer.write_record(&self.columns)?;
            }
            for row in &self.rows {
                writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
            }
            writer.flush().with_context(|| format!("Failed to flush {}", tmp.display()))?;
        }

        std::fs::rename(tmp, path)
            .with_context(|| format!("Failed to replace dataset: {}", path.display()))?;

        debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Appends `other` below this table, outer-joining the column sets.
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> =
            other.columns.iter().map(|c| self.column_index_or_insert(c)).collect();

        for other_row in other.rows {
            let mut row = vec![None; self.columns.len()];
            for (cell, &idx) in other_row.into_iter().zip(&mapping) {
                row[idx] = cell;
            }
            self.rows.push(row);
        }

        self.move_column_last(COMPLETE_COLUMN);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Cell lookup by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn push_cells(&mut self, cells: impl IntoIterator<Item = (String, Option<String>)>) {
        let mut row = vec![None; self.columns.len()];
        for (column, value) in cells {
            let idx = self.column_index_or_insert(&column);
            if idx >= row.len() {
                row.resize(idx + 1, None);
            }
            row[idx] = value;
        }
        self.rows.push(row);
    }

    /// Returns the column's index, adding it (and padding every row) if new.
    fn column_index_or_insert(&mut self, column: &str) -> usize {
        if let Some(idx) = self.columns.iter().position(|c| c == column) {
            return idx;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    /// Moves `column`, if present, to the end of the header and of every row.
    fn move_column_last(&mut self, column: &str) {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return;
        };
        if idx + 1 == self.columns.len() {
            return;
        }
        let name = self.columns.remove(idx);
        self.columns.push(name);
        for row in &mut self.rows {
            let cell = row.remove(idx);
            row.push(cell);
        }
    }
}

/// Column name for a detail label, kept clear of the reserved columns.
fn detail_column(label: &str) -> String {
    if ItemSummary::COLUMNS.contains(&label) || label == COMPLETE_COLUMN {
        warn!(
            "Detail label '{}' clashes with a reserved column, writing it as '{}{}'",
            label, SPEC_PREFIX, label
        );
        format!("{}{}", SPEC_PREFIX, label)
    } else {
        label.to_string()
    }
}
