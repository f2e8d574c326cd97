//! Alias cutover.
//!
//! ```text
//!  alias target                       concrete target
//!  ────────────                       ───────────────
//!  POST _aliases                      1. add    {name}_temp -> new
//!   [ remove name -> old,             2. delete old                 ┐ name does
//!     add    name -> new ]            3. add    name -> new         ┘ not resolve
//!  (one atomic batch)                 4. remove {name}_temp -> new  (warning only)
//! ```
//!
//! A cluster cannot hold an index and an alias with the same name, so the
//! concrete variant has to delete before it can add. The window between
//! steps 2 and 3 is logged at `warn` level every time it is entered.

use crate::common::*;

use crate::enums::{AliasAction, MigrationStep};
use crate::errors::MigrationError;
use crate::models::MigrationWarning;
use crate::repository::es_repository::*;
use crate::service_trait::alias_service::*;

#[derive(Debug, Getters, Clone, new)]
pub struct AliasServiceImpl<R: EsRepository> {
    es_repo: Arc<R>,
}

pub fn temp_alias_name(final_alias_name: &str) -> String {
    format!("{}{}", final_alias_name, TEMP_ALIAS_SUFFIX)
}

#[async_trait]
impl<R> AliasService for AliasServiceImpl<R>
where
    R: EsRepository + Sync + Send,
{
    async fn swap_alias(
        &self,
        old_index: &str,
        new_index: &str,
        alias_name: &str,
    ) -> Result<(), MigrationError> {
        let actions: Vec<AliasAction> = vec![
            AliasAction::remove(old_index, alias_name),
            AliasAction::add(new_index, alias_name),
        ];

        self.es_repo
            .update_aliases_atomic(&actions)
            .await
            .map_err(|e| {
                error!(
                    "[AliasServiceImpl::swap_alias] Alias '{}' still points at '{}': {}",
                    alias_name, old_index, e
                );
                MigrationError::cluster(MigrationStep::SwapAlias, alias_name, e)
            })?;

        info!(
            "[AliasServiceImpl::swap_alias] Alias '{}' moved from '{}' to '{}'",
            alias_name, old_index, new_index
        );

        Ok(())
    }

    async fn replace_concrete_index_with_alias(
        &self,
        old_concrete_index: &str,
        new_index: &str,
        final_alias_name: &str,
    ) -> Result<Option<MigrationWarning>, MigrationError> {
        let temp_alias: String = temp_alias_name(final_alias_name);

        self.es_repo
            .update_aliases_atomic(&[AliasAction::add(new_index, &temp_alias)])
            .await
            .map_err(|e| MigrationError::cluster(MigrationStep::AddTempAlias, &temp_alias, e))?;

        info!(
            "[AliasServiceImpl::replace_concrete_index_with_alias] Temporary alias '{}' -> '{}'",
            temp_alias, new_index
        );

        warn!(
            "[AliasServiceImpl::replace_concrete_index_with_alias] Deleting '{}'; the name is unavailable until alias '{}' is created",
            old_concrete_index, final_alias_name
        );

        self.es_repo
            .delete_index(old_concrete_index)
            .await
            .map_err(|e| {
                MigrationError::cluster(MigrationStep::DeleteOldIndex, old_concrete_index, e)
            })?;

        self.es_repo
            .update_aliases_atomic(&[AliasAction::add(new_index, final_alias_name)])
            .await
            .map_err(|e| {
                error!(
                    "[AliasServiceImpl::replace_concrete_index_with_alias] '{}' was deleted but alias '{}' could not be created; the data is reachable through '{}'",
                    old_concrete_index, final_alias_name, temp_alias
                );
                MigrationError::cluster(MigrationStep::AddFinalAlias, final_alias_name, e)
            })?;

        info!(
            "[AliasServiceImpl::replace_concrete_index_with_alias] '{}' is now an alias of '{}'",
            final_alias_name, new_index
        );

        match self
            .es_repo
            .update_aliases_atomic(&[AliasAction::remove(new_index, &temp_alias)])
            .await
        {
            Ok(()) => Ok(None),
            Err(e) => {
                warn!(
                    "[AliasServiceImpl::replace_concrete_index_with_alias] Temporary alias '{}' left behind: {}",
                    temp_alias, e
                );
                Ok(Some(MigrationWarning::TempAliasLeaked {
                    alias: temp_alias,
                    index: new_index.to_string(),
                    cause: e.to_string(),
                }))
            }
        }
    }
}
