use crate::common::*;

use crate::models::{MigrationOptions, MigrationOutcome};

#[async_trait]
pub trait MigrationService {
    /// Applies `raw_mapping` to `target`, in place when possible and through a
    /// reindex plus alias cutover otherwise.
    ///
    /// Never returns an error: every failure is folded into the outcome, together
    /// with the warnings collected on the way.
    ///
    /// # Arguments
    ///
    /// * `target` - Index or alias to migrate
    /// * `raw_mapping` - Desired mapping in any accepted envelope shape
    /// * `options` - Run options
    /// * `cancel` - Stops the run between steps and while polling
    async fn migrate(
        &self,
        target: &str,
        raw_mapping: &Value,
        options: &MigrationOptions,
        cancel: &CancellationToken,
    ) -> MigrationOutcome;
}
