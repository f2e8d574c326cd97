use crate::common::*;

use crate::errors::MigrationError;
use crate::models::MigrationWarning;

#[async_trait]
pub trait AliasService {
    /// Moves `alias_name` from `old_index` to `new_index` in one atomic alias batch.
    ///
    /// The cluster applies both actions or neither.
    async fn swap_alias(
        &self,
        old_index: &str,
        new_index: &str,
        alias_name: &str,
    ) -> Result<(), MigrationError>;

    /// Turns the concrete index `old_concrete_index` into an alias named
    /// `final_alias_name` that points at `new_index`.
    ///
    /// Runs four separate calls:
    ///
    /// 1. add `{final_alias_name}_temp` -> `new_index`
    /// 2. delete `old_concrete_index`
    /// 3. add `final_alias_name` -> `new_index`
    /// 4. remove the temporary alias
    ///
    /// Between steps 2 and 3 the name does not resolve to anything.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when all four steps succeeded, `Ok(Some(warning))` when only
    /// the temporary alias removal failed.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::ClusterFatal` naming the step when any of the
    /// first three steps fails.
    async fn replace_concrete_index_with_alias(
        &self,
        old_concrete_index: &str,
        new_index: &str,
        final_alias_name: &str,
    ) -> Result<Option<MigrationWarning>, MigrationError>;
}
