use crate::common::*;

use crate::errors::MigrationError;
use crate::models::{MonitorReport, ReindexSpec, ReindexSubmission, TaskHandle};

#[async_trait]
pub trait TaskMonitorService {
    /// Sends the reindex request. Returns a task handle, or the full response
    /// when the spec waits for completion.
    async fn submit(&self, spec: &ReindexSpec) -> Result<ReindexSubmission, MigrationError>;

    /// Polls `handle` until the task completes, streaming progress rows.
    ///
    /// The first poll happens immediately, later ones every `poll_interval`.
    /// Transient cluster errors are logged and retried at the next tick.
    /// Cancellation and `deadline` are checked on every tick; neither aborts
    /// the task on the cluster.
    ///
    /// # Returns
    ///
    /// A report carrying the final status and the number of document failures.
    /// A report with failures is a partial failure even though the task completed.
    ///
    /// # Errors
    ///
    /// * `ClusterFatal` - the task API rejected the status request
    /// * `TaskFailed` - the task finished with a task-level error
    /// * `Cancelled` / `DeadlineExceeded` - monitoring stopped early
    async fn monitor(
        &self,
        handle: &TaskHandle,
        poll_interval: Duration,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<MonitorReport, MigrationError>;

    /// Submits `spec` and, for the asynchronous case, monitors it to the end.
    async fn run(
        &self,
        spec: &ReindexSpec,
        poll_interval: Duration,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<MonitorReport, MigrationError>;
}
