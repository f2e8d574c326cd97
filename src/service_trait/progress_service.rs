use crate::models::ProgressRow;

/// Sink for the progress trace of a run.
pub trait ProgressService: Send + Sync {
    fn emit(&self, row: ProgressRow);
}
