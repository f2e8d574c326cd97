//! Migration orchestrator.
//!
//! # Sequence
//!
//! ```text
//!  normalize mapping ─► exists? ─► planner ─┬─ InPlaceSucceeded ─────────────────────► Done
//!                                           ├─ Disallowed ─────────────────────────► Failed
//!                                           └─ needs reindex
//!                                                 │
//!      resolve sources ◄──────────────────────────┘
//!            │
//!      confirm ─► create {target}_{ts} ─► reindex + monitor ─► cutover ─► cleanup ─► Done
//!                                                                       (warnings ─► CleanupWarning)
//! ```
//!
//! Steps run strictly one after another. Cancellation and the overall deadline
//! are checked before every cluster-changing step and on every poll tick.
//! Nothing is rolled back: an index created before a failure stays on the
//! cluster and its name is reported in the outcome.
//!
//! Two runs against the same target are not coordinated. Both can create a
//! destination index and race on the alias cutover.

use crate::common::*;

use crate::enums::{MigrationState, MigrationStep};
use crate::errors::MigrationError;
use crate::models::{
    AliasLookup, MappingDocument, MigrationOptions, MigrationOutcome, MigrationPlan,
    MigrationWarning, MonitorReport, ProgressRow, ReindexSpec,
};
use crate::repository::es_repository::*;
use crate::service::alias_service_impl::*;
use crate::service::planner_service_impl::*;
use crate::service::task_monitor_service_impl::*;
use crate::service_trait::{
    alias_service::*, confirm_service::*, migration_service::*, planner_service::*,
    progress_service::*, task_monitor_service::*,
};
use crate::utils_module::time_utils::timestamped_index_name;

/// Everything a run accumulates before it is turned into an outcome.
#[derive(Debug, Default)]
struct RunLedger {
    plan: Option<MigrationPlan>,
    new_index: Option<String>,
    document_failures: usize,
    warnings: Vec<MigrationWarning>,
}

/// Source side of a reindex-based migration.
#[derive(Debug)]
struct SourceResolution {
    target_is_alias: bool,
    source_index: String,
}

#[derive(Debug, Getters)]
pub struct MigrationServiceImpl<R, P, C>
where
    R: EsRepository,
    P: ProgressService,
    C: ConfirmService,
{
    es_repo: Arc<R>,
    progress: Arc<P>,
    confirm: Arc<C>,
    planner: PlannerServiceImpl<R>,
    alias: AliasServiceImpl<R>,
    monitor: TaskMonitorServiceImpl<R, P>,
}

impl<R, P, C> MigrationServiceImpl<R, P, C>
where
    R: EsRepository + Sync + Send,
    P: ProgressService,
    C: ConfirmService,
{
    pub fn new(es_repo: Arc<R>, progress: Arc<P>, confirm: Arc<C>) -> Self {
        MigrationServiceImpl {
            planner: PlannerServiceImpl::new(es_repo.clone()),
            alias: AliasServiceImpl::new(es_repo.clone()),
            monitor: TaskMonitorServiceImpl::new(es_repo.clone(), progress.clone()),
            es_repo,
            progress,
            confirm,
        }
    }

    fn transition(&self, state: MigrationState, message: String) {
        info!("[MigrationServiceImpl::transition] [{}] {}", state, message);
        self.progress.emit(ProgressRow::step(state, message));
    }

    fn record_warning(&self, ledger: &mut RunLedger, warning: MigrationWarning) {
        warn!("[MigrationServiceImpl::record_warning] {}", warning);
        self.progress.emit(ProgressRow::warning(warning.to_string()));
        ledger.warnings.push(warning);
    }

    fn checkpoint(
        cancel: &CancellationToken,
        deadline: Option<Instant>,
        step: MigrationStep,
    ) -> Result<(), MigrationError> {
        if cancel.is_cancelled() {
            return Err(MigrationError::Cancelled(format!("before {}", step)));
        }

        match deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(MigrationError::DeadlineExceeded(format!("starting {}", step)))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_target_exists(&self, target: &str) -> Result<(), MigrationError> {
        let exists: bool = self
            .es_repo
            .index_exists(target)
            .await
            .map_err(|e| MigrationError::cluster(MigrationStep::ExistenceCheck, target, e))?;

        if exists {
            Ok(())
        } else {
            Err(MigrationError::NotFound(target.to_string()))
        }
    }

    /// Fresh alias lookup: the planner's probe (if any) may be stale by now.
    async fn resolve_sources(
        &self,
        target: &str,
        ledger: &mut RunLedger,
    ) -> Result<SourceResolution, MigrationError> {
        let lookup: AliasLookup = self
            .es_repo
            .get_alias(target)
            .await
            .map_err(|e| MigrationError::cluster(MigrationStep::AliasLookup, target, e))?;

        let binding = match lookup {
            AliasLookup::NotFound => {
                return Ok(SourceResolution {
                    target_is_alias: false,
                    source_index: target.to_string(),
                })
            }
            AliasLookup::Found(binding) => binding,
        };

        let source_index: String = binding
            .first_index()
            .map(str::to_string)
            .ok_or_else(|| MigrationError::EmptyAlias(target.to_string()))?;

        let ignored: Vec<String> = binding
            .target_indices()
            .iter()
            .filter(|index| **index != source_index)
            .cloned()
            .collect();

        if !ignored.is_empty() {
            self.record_warning(
                ledger,
                MigrationWarning::ExtraSourceIndicesIgnored {
                    migrated: source_index.clone(),
                    ignored,
                },
            );
        }

        Ok(SourceResolution {
            target_is_alias: true,
            source_index,
        })
    }

    fn confirmation_prompt(target: &str, sources: &SourceResolution, new_index: &str) -> String {
        if sources.target_is_alias {
            format!(
                "'{}' will be reindexed from '{}' into '{}' and the alias moved",
                target, sources.source_index, new_index
            )
        } else {
            format!(
                "'{}' will be reindexed into '{}', then DELETED and replaced by an alias of the same name",
                target, new_index
            )
        }
    }

    /// Runs the whole sequence. `Ok(alias_swapped)` on success.
    async fn execute(
        &self,
        target: &str,
        raw_mapping: &Value,
        options: &MigrationOptions,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
        ledger: &mut RunLedger,
    ) -> Result<bool, MigrationError> {
        let mapping: MappingDocument = MappingDocument::normalize(raw_mapping)
            .map_err(|e| MigrationError::Configuration(format!("{:#}", e)))?;

        self.transition(MigrationState::Init, format!("migrating '{}'", target));

        Self::checkpoint(cancel, deadline, MigrationStep::ExistenceCheck)?;
        self.ensure_target_exists(target).await?;

        Self::checkpoint(cancel, deadline, MigrationStep::InPlaceUpdate)?;
        let plan: MigrationPlan = self
            .planner
            .plan(
                target,
                &mapping,
                *options.force_alias(),
                *options.zero_downtime_allowed(),
                *options.write_index_only(),
            )
            .await?;

        ledger.plan = Some(plan.clone());
        self.transition(MigrationState::PlanningDone, plan.to_string());

        match plan {
            MigrationPlan::InPlaceSucceeded => return Ok(false),
            MigrationPlan::ReindexDisallowedAndInPlaceFailed(cause) => {
                return Err(MigrationError::PlanningRefused {
                    target: target.to_string(),
                    cause,
                })
            }
            MigrationPlan::InPlaceFailedFallbackToReindex
            | MigrationPlan::ReindexForcedByAliasRequirement => {}
        }

        Self::checkpoint(cancel, deadline, MigrationStep::AliasLookup)?;
        let sources: SourceResolution = self.resolve_sources(target, ledger).await?;

        let new_index: String = timestamped_index_name(target, Utc::now());

        if !self
            .confirm
            .confirm(&Self::confirmation_prompt(target, &sources, &new_index))
            .await
        {
            return Err(MigrationError::ConfirmationDeclined(target.to_string()));
        }

        Self::checkpoint(cancel, deadline, MigrationStep::CreateIndex)?;
        self.es_repo
            .create_index(&new_index, mapping.as_value())
            .await
            .map_err(|e| MigrationError::cluster(MigrationStep::CreateIndex, &new_index, e))?;
        ledger.new_index = Some(new_index.clone());

        self.transition(
            MigrationState::Reindexing,
            format!("'{}' -> '{}'", sources.source_index, new_index),
        );

        let spec: ReindexSpec = ReindexSpec::builder(&sources.source_index, &new_index)
            .batch_size(*options.batch_size())
            .slices(*options.slices())
            .requests_per_second(*options.requests_per_second())
            .build();

        Self::checkpoint(cancel, deadline, MigrationStep::SubmitReindex)?;
        let report: MonitorReport = self
            .monitor
            .run(&spec, *options.poll_interval(), cancel, deadline)
            .await?;

        ledger.document_failures = *report.document_failures();
        if !report.is_clean() {
            return Err(MigrationError::PartialDocumentFailure {
                destination: new_index,
                count: ledger.document_failures,
            });
        }

        let cutover_step: MigrationStep = if sources.target_is_alias {
            MigrationStep::SwapAlias
        } else {
            MigrationStep::AddTempAlias
        };
        Self::checkpoint(cancel, deadline, cutover_step)?;

        self.transition(
            MigrationState::Cutover,
            format!("pointing '{}' at '{}'", target, new_index),
        );

        if sources.target_is_alias {
            self.alias
                .swap_alias(&sources.source_index, &new_index, target)
                .await?;
        } else if let Some(warning) = self
            .alias
            .replace_concrete_index_with_alias(&sources.source_index, &new_index, target)
            .await?
        {
            self.record_warning(ledger, warning);
        }

        // A concrete source was already deleted by the replacement.
        if *options.delete_old_index() && sources.target_is_alias {
            if let Err(e) = self.es_repo.delete_index(&sources.source_index).await {
                self.record_warning(
                    ledger,
                    MigrationWarning::OldIndexNotDeleted {
                        index: sources.source_index.clone(),
                        cause: e.to_string(),
                    },
                );
            } else {
                info!(
                    "[MigrationServiceImpl::execute] Old index '{}' deleted",
                    sources.source_index
                );
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl<R, P, C> MigrationService for MigrationServiceImpl<R, P, C>
where
    R: EsRepository + Sync + Send,
    P: ProgressService,
    C: ConfirmService,
{
    async fn migrate(
        &self,
        target: &str,
        raw_mapping: &Value,
        options: &MigrationOptions,
        cancel: &CancellationToken,
    ) -> MigrationOutcome {
        let deadline: Option<Instant> = options
            .update_timeout()
            .map(|timeout| Instant::now() + timeout);

        let mut ledger: RunLedger = RunLedger::default();

        match self
            .execute(target, raw_mapping, options, cancel, deadline, &mut ledger)
            .await
        {
            Ok(alias_swapped) => {
                let outcome: MigrationOutcome = MigrationOutcome::succeeded(
                    ledger.plan,
                    ledger.new_index,
                    alias_swapped,
                    ledger.warnings,
                );
                self.transition(*outcome.final_state(), format!("'{}' migrated", target));
                outcome
            }
            Err(err) => {
                error!("[MigrationServiceImpl::migrate] Migration of '{}' failed: {}", target, err);

                if let Some(index) = &ledger.new_index {
                    warn!(
                        "[MigrationServiceImpl::migrate] '{}' was created by this run and is left in place",
                        index
                    );
                }

                self.transition(MigrationState::Failed, err.to_string());
                MigrationOutcome::failed(
                    err,
                    ledger.plan,
                    ledger.new_index,
                    ledger.document_failures,
                    ledger.warnings,
                )
            }
        }
    }
}
