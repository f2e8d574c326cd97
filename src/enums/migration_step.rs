use serde::Serialize;
use std::fmt;

/// Cluster-facing step of a migration; carried by fatal errors so the
/// caller can tell how far the run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationStep {
    ExistenceCheck,
    InPlaceUpdate,
    AliasLookup,
    CreateIndex,
    SubmitReindex,
    MonitorTask,
    AddTempAlias,
    DeleteOldIndex,
    AddFinalAlias,
    SwapAlias,
    Cleanup,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &str = match self {
            MigrationStep::ExistenceCheck => "existence check",
            MigrationStep::InPlaceUpdate => "in-place mapping update",
            MigrationStep::AliasLookup => "alias lookup",
            MigrationStep::CreateIndex => "create destination index",
            MigrationStep::SubmitReindex => "submit reindex",
            MigrationStep::MonitorTask => "monitor task",
            MigrationStep::AddTempAlias => "add temporary alias",
            MigrationStep::DeleteOldIndex => "delete old concrete index",
            MigrationStep::AddFinalAlias => "add final alias",
            MigrationStep::SwapAlias => "atomic alias swap",
            MigrationStep::Cleanup => "cleanup",
        };
        write!(f, "{}", label)
    }
}
