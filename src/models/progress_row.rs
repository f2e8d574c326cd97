use crate::common::*;

use crate::enums::MigrationState;
use crate::models::{DocumentFailure, TaskProgress};

/// One line of the progress trace streamed to the caller while a run is in flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressRow {
    /// A significant step started or finished.
    Step {
        state: MigrationState,
        message: String,
    },
    /// The task counters changed since the previous poll.
    TaskStatus {
        task_id: String,
        progress: TaskProgress,
    },
    /// A document failure seen for the first time.
    DocumentFailure {
        index: String,
        document_id: String,
        status_code: u16,
        cause_type: String,
        cause_reason: String,
    },
    /// Something went wrong that does not fail the run.
    Warning { message: String },
}

impl ProgressRow {
    pub fn step(state: MigrationState, message: impl Into<String>) -> Self {
        ProgressRow::Step {
            state,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        ProgressRow::Warning {
            message: message.into(),
        }
    }
}

impl From<&DocumentFailure> for ProgressRow {
    fn from(failure: &DocumentFailure) -> Self {
        ProgressRow::DocumentFailure {
            index: failure.index().clone(),
            document_id: failure.document_id().clone(),
            status_code: *failure.status_code(),
            cause_type: failure.cause_type().clone(),
            cause_reason: failure.cause_reason().clone(),
        }
    }
}

impl fmt::Display for ProgressRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressRow::Step { state, message } => write!(f, "[{}] {}", state, message),
            ProgressRow::TaskStatus { task_id, progress } => write!(
                f,
                "[task {}] total={} created={} updated={} deleted={} batches={} conflicts={}",
                task_id,
                progress.total,
                progress.created,
                progress.updated,
                progress.deleted,
                progress.batches,
                progress.version_conflicts
            ),
            ProgressRow::DocumentFailure {
                index,
                document_id,
                status_code,
                cause_type,
                cause_reason,
            } => write!(
                f,
                "[failure] index={} id={} status={} {}: {}",
                index, document_id, status_code, cause_type, cause_reason
            ),
            ProgressRow::Warning { message } => write!(f, "[warning] {}", message),
        }
    }
}
