use serde::Serialize;
use std::fmt;

/// States a single migration run moves through.
///
/// ```text
/// Init -> PlanningDone -> Done
///                      -> Reindexing -> Cutover -> Done
///                                               -> CleanupWarning
/// (any non-terminal state) -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationState {
    Init,
    PlanningDone,
    Reindexing,
    Cutover,
    /// Finished successfully, but at least one cleanup step only produced a warning.
    CleanupWarning,
    Done,
    Failed,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &str = match self {
            MigrationState::Init => "init",
            MigrationState::PlanningDone => "planning-done",
            MigrationState::Reindexing => "reindexing",
            MigrationState::Cutover => "cutover",
            MigrationState::CleanupWarning => "cleanup-warning",
            MigrationState::Done => "done",
            MigrationState::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}
