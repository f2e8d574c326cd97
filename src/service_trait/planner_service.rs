use crate::common::*;

use crate::errors::MigrationError;
use crate::models::{MappingDocument, MigrationPlan};

#[async_trait]
pub trait PlannerService {
    /// Decides how `target` gets the desired mapping.
    ///
    /// Always attempts the in-place mapping write first. The write is not
    /// undone when the resulting plan goes on to reindex.
    ///
    /// # Arguments
    ///
    /// * `target` - Index or alias name to migrate
    /// * `mapping` - Normalized desired mapping
    /// * `force_alias` - The target must end up as an alias
    /// * `zero_downtime_allowed` - A rejected in-place write may fall back to a reindex
    /// * `write_index_only` - Limit the in-place write to the alias' write index
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::ClusterFatal` when the alias probe fails or the
    /// in-place write could not reach the cluster. A refused plan is not an
    /// error here; it comes back as `MigrationPlan::ReindexDisallowedAndInPlaceFailed`.
    async fn plan(
        &self,
        target: &str,
        mapping: &MappingDocument,
        force_alias: bool,
        zero_downtime_allowed: bool,
        write_index_only: bool,
    ) -> Result<MigrationPlan, MigrationError>;
}
