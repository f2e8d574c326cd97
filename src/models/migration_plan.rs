use crate::common::*;

/// Decision produced by the planner; consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MigrationPlan {
    /// The in-place mapping write was accepted and nothing else is required.
    InPlaceSucceeded,
    /// The in-place write was rejected; a reindex-based migration follows.
    InPlaceFailedFallbackToReindex,
    /// The in-place write was accepted, but the target is a concrete index and
    /// the caller requires it to become an alias.
    ReindexForcedByAliasRequirement,
    /// The in-place write was rejected and reindexing is not allowed. Terminal.
    ReindexDisallowedAndInPlaceFailed(String),
}

impl MigrationPlan {
    /// Pure decision table.
    ///
    /// `target_is_alias` is only consulted when `force_alias` is set; callers
    /// that do not force an alias may pass `false` without probing the cluster.
    pub fn decide(
        in_place: std::result::Result<(), String>,
        force_alias: bool,
        zero_downtime_allowed: bool,
        target_is_alias: bool,
    ) -> Self {
        let alias_required: bool = force_alias && !target_is_alias;

        match in_place {
            Ok(()) if alias_required => MigrationPlan::ReindexForcedByAliasRequirement,
            Ok(()) => MigrationPlan::InPlaceSucceeded,
            Err(_) if zero_downtime_allowed || alias_required => {
                MigrationPlan::InPlaceFailedFallbackToReindex
            }
            Err(cause) => MigrationPlan::ReindexDisallowedAndInPlaceFailed(cause),
        }
    }

    pub fn requires_reindex(&self) -> bool {
        matches!(
            self,
            MigrationPlan::InPlaceFailedFallbackToReindex
                | MigrationPlan::ReindexForcedByAliasRequirement
        )
    }
}

impl fmt::Display for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationPlan::InPlaceSucceeded => write!(f, "in-place update succeeded"),
            MigrationPlan::InPlaceFailedFallbackToReindex => {
                write!(f, "in-place update failed, falling back to reindex")
            }
            MigrationPlan::ReindexForcedByAliasRequirement => {
                write!(f, "in-place update succeeded, reindexing to convert target into an alias")
            }
            MigrationPlan::ReindexDisallowedAndInPlaceFailed(cause) => {
                write!(f, "in-place update failed and reindex is disallowed: {}", cause)
            }
        }
    }
}
