//! Restart support: how many clicks to replay to reach the previous load state.

use super::{Checkpoint, Table};
use crate::config::{Config, ResumeMode};
use tracing::{error, info, warn};

/// Replay clicks for a dataset of `rows` rows, assuming the first page and
/// every click each show `per_click` rows. Never negative.
pub fn replay_clicks(rows: usize, per_click: usize) -> usize {
    if per_click == 0 {
        return 0;
    }
    rows.saturating_sub(per_click) / per_click
}

/// What a previous run left behind.
#[derive(Debug, Clone, Default)]
pub struct ResumeState {
    /// Rows already in the dataset
    pub rows: usize,
    /// Clicks to replay before new data is fetched
    pub replay_clicks: usize,
    /// Previously written table, appended to by this run
    pub table: Table,
}

impl ResumeState {
    /// Inspects the configured output file (and checkpoint, if enabled).
    ///
    /// An unreadable dataset is logged and treated as absent.
    pub fn inspect(config: &Config) -> Self {
        let path = &config.output;
        if !path.exists() {
            info!("No dataset file detected");
            return Self::default();
        }

        let table = match Table::read(path) {
            Ok(table) => table,
            Err(e) => {
                error!("Error reading the data file: {:#}", e);
                return Self::default();
            }
        };

        let rows = table.len();
        let mut clicks = replay_clicks(rows, config.items_per_click);

        if config.resume == ResumeMode::Checkpoint {
            match Checkpoint::load(config.checkpoint_path()) {
                Ok(Some(checkpoint)) if checkpoint.rows == rows => {
                    info!("Using checkpoint: {} clicks for {} rows", checkpoint.clicks, rows);
                    clicks = checkpoint.clicks;
                }
                Ok(Some(checkpoint)) => warn!(
                    "Checkpoint records {} rows but dataset has {}; falling back to row count",
                    checkpoint.rows, rows
                ),
                Ok(None) => info!("No checkpoint found; falling back to row count"),
                Err(e) => warn!("Ignoring checkpoint: {:#}", e),
            }
        }

        if clicks > 0 {
            info!("Old clicks have been re-assigned");
        } else {
            info!("Dataset exists but no old clicks found");
        }

        Self { rows, replay_clicks: clicks, table }
    }
}
