use crate::common::*;

use crate::enums::MigrationState;
use crate::errors::MigrationError;
use crate::models::MigrationPlan;

/// Non-fatal problems collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MigrationWarning {
    /// Step 4 of the concrete-index replacement failed; the temporary alias
    /// still exists and must be removed by hand.
    TempAliasLeaked { alias: String, index: String, cause: String },
    /// Best-effort deletion of a migrated source index failed.
    OldIndexNotDeleted { index: String, cause: String },
    /// The alias pointed at more than one index; only the first was migrated.
    ExtraSourceIndicesIgnored { migrated: String, ignored: Vec<String> },
}

impl fmt::Display for MigrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationWarning::TempAliasLeaked { alias, index, cause } => write!(
                f,
                "temporary alias '{}' still points at '{}' and needs manual removal: {}",
                alias, index, cause
            ),
            MigrationWarning::OldIndexNotDeleted { index, cause } => {
                write!(f, "old index '{}' was not deleted: {}", index, cause)
            }
            MigrationWarning::ExtraSourceIndicesIgnored { migrated, ignored } => write!(
                f,
                "only '{}' was migrated; indices {:?} behind the same alias were not",
                migrated, ignored
            ),
        }
    }
}

/// The only value a migration run hands back.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct MigrationOutcome {
    success: bool,
    document_failure_count: usize,
    error: Option<MigrationError>,
    alias_swapped: bool,
    warnings: Vec<MigrationWarning>,
    final_state: MigrationState,
    plan: Option<MigrationPlan>,
    new_index: Option<String>,
}

impl MigrationOutcome {
    pub fn succeeded(
        plan: Option<MigrationPlan>,
        new_index: Option<String>,
        alias_swapped: bool,
        warnings: Vec<MigrationWarning>,
    ) -> Self {
        let final_state: MigrationState = if warnings.is_empty() {
            MigrationState::Done
        } else {
            MigrationState::CleanupWarning
        };

        MigrationOutcome {
            success: true,
            document_failure_count: 0,
            error: None,
            alias_swapped,
            warnings,
            final_state,
            plan,
            new_index,
        }
    }

    pub fn failed(
        error: MigrationError,
        plan: Option<MigrationPlan>,
        new_index: Option<String>,
        document_failure_count: usize,
        warnings: Vec<MigrationWarning>,
    ) -> Self {
        MigrationOutcome {
            success: false,
            document_failure_count,
            error: Some(error),
            alias_swapped: false,
            warnings,
            final_state: MigrationState::Failed,
            plan,
            new_index,
        }
    }

    /// Process exit status: 0 success (warnings allowed), 2 configuration
    /// error, 1 anything else.
    pub fn exit_code(&self) -> i32 {
        match &self.error {
            None if self.success && self.document_failure_count == 0 => 0,
            Some(err) if err.is_configuration() => 2,
            _ => 1,
        }
    }
}
