//! Error taxonomy of a migration run.
//!
//! Only the orchestrator turns these into a final verdict. Warnings live in
//! [`crate::models::MigrationWarning`] and are never converted into errors.

use crate::enums::MigrationStep;
use crate::errors::GatewayError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MigrationError {
    /// Bad input detected before any cluster call.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("target '{0}' does not exist")]
    NotFound(String),

    /// In-place update failed and reindexing is not allowed. Nothing was changed.
    #[error("in-place mapping update of '{target}' failed and zero-downtime migration is disabled: {cause}")]
    PlanningRefused { target: String, cause: String },

    /// The target is an alias with no concrete index behind it.
    #[error("alias '{0}' does not point to any index")]
    EmptyAlias(String),

    /// A cluster call that the run cannot continue without was rejected.
    #[error("{step} failed on '{index}': {source}")]
    ClusterFatal {
        step: MigrationStep,
        index: String,
        #[source]
        source: GatewayError,
    },

    /// The long-running task finished with a task-level error.
    #[error("task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    /// The task completed but some documents were not copied.
    #[error("{count} document(s) failed to reindex into '{destination}'")]
    PartialDocumentFailure { destination: String, count: usize },

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// The operator answered no at the confirmation prompt.
    #[error("migration of '{0}' declined at the confirmation prompt")]
    ConfirmationDeclined(String),

    #[error("deadline exceeded while {0}")]
    DeadlineExceeded(String),
}

impl MigrationError {
    pub fn cluster(step: MigrationStep, index: impl Into<String>, source: GatewayError) -> Self {
        MigrationError::ClusterFatal {
            step,
            index: index.into(),
            source,
        }
    }

    /// `true` when the run stopped before it changed anything on the cluster
    /// besides a possibly accepted in-place mapping write.
    pub fn nothing_changed(&self) -> bool {
        matches!(
            self,
            MigrationError::Configuration(_)
                | MigrationError::NotFound(_)
                | MigrationError::PlanningRefused { .. }
                | MigrationError::EmptyAlias(_)
                | MigrationError::ConfirmationDeclined(_)
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, MigrationError::Configuration(_))
    }
}
