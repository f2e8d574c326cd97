//! Entry point of every subcommand.
//!
//! Turns parsed arguments plus the merged [`AppConfig`] into service calls and
//! maps the result onto a process exit code:
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | success, possibly with cleanup warnings              |
//! | 1    | fatal error or documents that failed to reindex      |
//! | 2    | configuration error (bad file, bad flag, bad env)    |

use crate::common::*;

use crate::app_config::AppConfig;
use crate::config::{Command, MigrateArgs, ReindexArgs, TaskArgs};
use crate::errors::MigrationError;
use crate::models::{MigrationOptions, MigrationOutcome, MonitorReport, ReindexSpec, TaskHandle};
use crate::repository::es_repository::*;
use crate::service::confirm_service_impl::*;
use crate::service::migration_service_impl::*;
use crate::service::task_monitor_service_impl::*;
use crate::service_trait::{
    confirm_service::*, migration_service::*, progress_service::*, task_monitor_service::*,
};
use crate::utils_module::io_utils::read_json_from_file;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIGURATION: i32 = 2;

#[derive(Debug, new)]
pub struct MainController<R: EsRepository, P: ProgressService> {
    es_repo: Arc<R>,
    progress: Arc<P>,
}

impl<R, P> MainController<R, P>
where
    R: EsRepository + Sync + Send,
    P: ProgressService,
{
    pub async fn run(
        &self,
        command: &Command,
        config: &AppConfig,
        cancel: &CancellationToken,
    ) -> i32 {
        match command {
            Command::Migrate(args) => self.migrate(args, config, cancel).await,
            Command::Reindex(args) => self.reindex(args, config, cancel).await,
            Command::Task(args) => self.follow_task(args, config, cancel).await,
        }
    }

    fn deadline(config: &AppConfig) -> Option<Instant> {
        config.update_timeout().map(|timeout| Instant::now() + timeout)
    }

    fn configuration_error(message: String) -> i32 {
        let err: MigrationError = MigrationError::Configuration(message);
        error!("[MainController] {}", err);
        eprintln!("{}", err);
        EXIT_CONFIGURATION
    }

    async fn migrate(
        &self,
        args: &MigrateArgs,
        config: &AppConfig,
        cancel: &CancellationToken,
    ) -> i32 {
        let raw_mapping: Value = match read_json_from_file(&args.mapping) {
            Ok(raw_mapping) => raw_mapping,
            Err(e) => return Self::configuration_error(format!("{:#}", e)),
        };

        let options: MigrationOptions = MigrationOptions::default()
            .with_zero_downtime(args.zero_downtime)
            .with_force_alias(args.force_alias)
            .with_delete_old_index(args.delete_old_index)
            .with_write_index_only(args.write_index_only)
            .with_batch_size(*config.batch_size())
            .with_slices(*config.slices())
            .with_requests_per_second(args.requests_per_second)
            .with_poll_interval(config.poll_interval())
            .with_update_timeout(config.update_timeout());

        let outcome: MigrationOutcome = if args.non_interactive {
            self.run_migration(
                Arc::new(AutoConfirmServiceImpl::new()),
                &args.target,
                &raw_mapping,
                &options,
                cancel,
            )
            .await
        } else {
            self.run_migration(
                Arc::new(StdinConfirmServiceImpl::new()),
                &args.target,
                &raw_mapping,
                &options,
                cancel,
            )
            .await
        };

        Self::print_outcome(&args.target, &outcome);
        outcome.exit_code()
    }

    async fn run_migration<C: ConfirmService>(
        &self,
        confirm: Arc<C>,
        target: &str,
        raw_mapping: &Value,
        options: &MigrationOptions,
        cancel: &CancellationToken,
    ) -> MigrationOutcome {
        MigrationServiceImpl::new(self.es_repo.clone(), self.progress.clone(), confirm)
            .migrate(target, raw_mapping, options, cancel)
            .await
    }

    fn print_outcome(target: &str, outcome: &MigrationOutcome) {
        for warning in outcome.warnings() {
            println!("warning: {}", warning);
        }

        match outcome.error() {
            None => println!(
                "'{}' migrated ({}){}",
                target,
                outcome.final_state(),
                outcome
                    .new_index()
                    .as_ref()
                    .map(|index| format!(", now served by '{}'", index))
                    .unwrap_or_default()
            ),
            Some(err) => {
                eprintln!("migration of '{}' failed: {}", target, err);
                if err.nothing_changed() {
                    eprintln!("nothing was changed on the cluster");
                } else if let Some(index) = outcome.new_index() {
                    eprintln!("index '{}' created by this run was left in place", index);
                }
            }
        }
    }

    fn monitor_service(&self) -> TaskMonitorServiceImpl<R, P> {
        TaskMonitorServiceImpl::new(self.es_repo.clone(), self.progress.clone())
    }

    async fn reindex(
        &self,
        args: &ReindexArgs,
        config: &AppConfig,
        cancel: &CancellationToken,
    ) -> i32 {
        let query: Option<Value> = match &args.query {
            Some(path) => match read_json_from_file(path) {
                // Accept both `{"query": {...}}` and the bare query object.
                Ok(mut body) => Some(body.get_mut("query").map(Value::take).unwrap_or(body)),
                Err(e) => return Self::configuration_error(format!("{:#}", e)),
            },
            None => None,
        };

        let spec: ReindexSpec = ReindexSpec::builder(&args.source, &args.dest)
            .query(query)
            .script(args.script.clone())
            .pipeline(args.pipeline.clone())
            .batch_size(*config.batch_size())
            .slices(*config.slices())
            .requests_per_second(args.requests_per_second)
            .wait_for_completion(args.wait)
            .build();

        let result: Result<MonitorReport, MigrationError> = self
            .monitor_service()
            .run(&spec, config.poll_interval(), cancel, Self::deadline(config))
            .await;

        Self::report_exit_code(&result)
    }

    async fn follow_task(
        &self,
        args: &TaskArgs,
        config: &AppConfig,
        cancel: &CancellationToken,
    ) -> i32 {
        let handle: TaskHandle = TaskHandle::new(args.task_id.trim());

        let result: Result<MonitorReport, MigrationError> = self
            .monitor_service()
            .monitor(&handle, config.poll_interval(), cancel, Self::deadline(config))
            .await;

        Self::report_exit_code(&result)
    }

    fn report_exit_code(result: &Result<MonitorReport, MigrationError>) -> i32 {
        match result {
            Ok(report) if report.is_clean() => {
                println!(
                    "done: {} document(s) processed",
                    report.progress().processed()
                );
                EXIT_OK
            }
            Ok(report) => {
                eprintln!(
                    "completed with {} document failure(s)",
                    report.document_failures()
                );
                EXIT_FAILURE
            }
            Err(err) => {
                eprintln!("{}", err);
                if err.is_configuration() {
                    EXIT_CONFIGURATION
                } else {
                    EXIT_FAILURE
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{EnvLayer, GlobalArgs};
    use crate::errors::GatewayError;
    use crate::repository::mock_es_repository::*;
    use crate::service::progress_service_impl::*;

    fn config() -> AppConfig {
        AppConfig::merge(&GlobalArgs::default(), &EnvLayer::default())
    }

    fn controller(
        cluster: &Arc<MockEsRepository>,
    ) -> MainController<MockEsRepository, CollectingProgressServiceImpl> {
        MainController::new(cluster.clone(), Arc::new(CollectingProgressServiceImpl::default()))
    }

    #[tokio::test]
    async fn unreadable_mapping_file_exits_with_configuration_code() {
        let cluster: Arc<MockEsRepository> =
            Arc::new(MockEsRepository::new().with_index("products", json!({})));
        let command: Command = Command::Migrate(MigrateArgs {
            target: "products".into(),
            mapping: "/definitely/not/here.json".into(),
            zero_downtime: true,
            force_alias: false,
            delete_old_index: false,
            write_index_only: false,
            non_interactive: true,
            requests_per_second: None,
        });

        let code: i32 = controller(&cluster)
            .run(&command, &config(), &CancellationToken::new())
            .await;

        assert_eq!(code, EXIT_CONFIGURATION);
        assert!(cluster.call_log().is_empty());
    }

    #[tokio::test]
    async fn standalone_reindex_succeeds() {
        let cluster: Arc<MockEsRepository> =
            Arc::new(MockEsRepository::new().with_index("logs_2023", json!({})));
        let command: Command = Command::Reindex(ReindexArgs {
            source: "logs_2023".into(),
            dest: "logs_archive".into(),
            query: None,
            script: Some("ctx._source.remove('tmp')".into()),
            pipeline: None,
            requests_per_second: Some(500.0),
            wait: false,
        });

        let code: i32 = controller(&cluster)
            .run(&command, &config(), &CancellationToken::new())
            .await;

        assert_eq!(code, EXIT_OK);
        let spec: ReindexSpec = cluster.submitted()[0].clone();
        assert_eq!(*spec.requests_per_second(), Some(500.0));
        assert_eq!(*spec.batch_size(), 1000);
    }

    #[tokio::test]
    async fn followed_task_with_failures_exits_non_zero() {
        let cluster: Arc<MockEsRepository> = Arc::new(MockEsRepository::new());
        cluster.script_task_statuses(vec![Ok(json!({
            "completed": true,
            "response": {
                "created": 1,
                "failures": [ { "index": "a", "id": "9", "status": 409, "cause": { "type": "version_conflict_engine_exception", "reason": "conflict" } } ]
            }
        }))]);
        let command: Command = Command::Task(TaskArgs {
            task_id: "node-1:7".into(),
        });

        let code: i32 = controller(&cluster)
            .run(&command, &config(), &CancellationToken::new())
            .await;

        assert_eq!(code, EXIT_FAILURE);
    }

    #[tokio::test]
    async fn unknown_task_exits_with_failure() {
        let cluster: Arc<MockEsRepository> = Arc::new(MockEsRepository::new());
        cluster.fail_call(
            GatewayOp::GetTaskStatus,
            None,
            GatewayError::rejected(404, "resource_not_found_exception"),
        );
        let command: Command = Command::Task(TaskArgs {
            task_id: "node-1:404".into(),
        });

        let code: i32 = controller(&cluster)
            .run(&command, &config(), &CancellationToken::new())
            .await;

        assert_eq!(code, EXIT_FAILURE);
    }
}
