use crate::common::*;

use crate::models::ProgressRow;
use crate::service_trait::progress_service::*;

/// Prints every row to stdout and mirrors it into the log file.
#[derive(Debug, Default, Clone, new)]
pub struct ConsoleProgressServiceImpl;

impl ProgressService for ConsoleProgressServiceImpl {
    fn emit(&self, row: ProgressRow) {
        println!("{}", row);

        match &row {
            ProgressRow::DocumentFailure { .. } | ProgressRow::Warning { .. } => {
                warn!("[ConsoleProgressServiceImpl::emit] {}", row)
            }
            _ => info!("[ConsoleProgressServiceImpl::emit] {}", row),
        }
    }
}

/// Keeps rows in memory so tests can inspect the trace.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CollectingProgressServiceImpl {
    rows: Mutex<Vec<ProgressRow>>,
}

#[cfg(test)]
impl CollectingProgressServiceImpl {
    pub fn rows(&self) -> Vec<ProgressRow> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn failure_rows(&self) -> Vec<ProgressRow> {
        self.rows()
            .into_iter()
            .filter(|row| matches!(row, ProgressRow::DocumentFailure { .. }))
            .collect()
    }

    pub fn status_rows(&self) -> usize {
        self.rows()
            .iter()
            .filter(|row| matches!(row, ProgressRow::TaskStatus { .. }))
            .count()
    }
}

#[cfg(test)]
impl ProgressService for CollectingProgressServiceImpl {
    fn emit(&self, row: ProgressRow) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.push(row);
        }
    }
}
