//! Reindex submission and task polling.
//!
//! # Poll loop
//!
//! ```text
//!   tick 0 (immediate) ──► GET _tasks/<id> ──► observe ──► completed? ── yes ──► report
//!        ▲                       │                │              │
//!        │                 transient error   new failures /      no
//!        │                 (log, continue)   changed counters    │
//!        │                       │           streamed as rows    │
//!        └──── poll_interval ◄───┴───────────────────────────────┘
//!
//!   cancel token / deadline are raced against every tick
//! ```
//!
//! What has been reported so far lives in a [`PollTracker`] value handed from
//! one tick to the next.

use crate::common::*;

use crate::enums::MigrationStep;
use crate::errors::MigrationError;
use crate::models::{
    MonitorReport, PollTracker, ProgressRow, ReindexSpec, ReindexSubmission, TaskHandle,
    TaskStatusDocument, TickOutcome,
};
use crate::repository::es_repository::*;
use crate::service_trait::progress_service::*;
use crate::service_trait::task_monitor_service::*;

#[derive(Debug, Getters, Clone, new)]
pub struct TaskMonitorServiceImpl<R: EsRepository, P: ProgressService> {
    es_repo: Arc<R>,
    progress: Arc<P>,
}

impl<R, P> TaskMonitorServiceImpl<R, P>
where
    R: EsRepository,
    P: ProgressService,
{
    /// Resolves when `deadline` passes; never resolves without one.
    async fn deadline_reached(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    fn report_tick(&self, task_id: &str, outcome: &TickOutcome) {
        for failure in &outcome.new_failures {
            self.progress.emit(ProgressRow::from(failure));
        }

        if outcome.status_changed {
            self.progress.emit(ProgressRow::TaskStatus {
                task_id: task_id.to_string(),
                progress: outcome.progress,
            });
        }
    }
}

#[async_trait]
impl<R, P> TaskMonitorService for TaskMonitorServiceImpl<R, P>
where
    R: EsRepository + Sync + Send,
    P: ProgressService,
{
    async fn submit(&self, spec: &ReindexSpec) -> Result<ReindexSubmission, MigrationError> {
        info!(
            "[TaskMonitorServiceImpl::submit] Reindex '{}' -> '{}' (size={}, slices={}, wait={})",
            spec.source_index(),
            spec.destination_index(),
            spec.batch_size(),
            spec.slices(),
            spec.wait_for_completion()
        );

        let submission: ReindexSubmission =
            self.es_repo.submit_reindex(spec).await.map_err(|e| {
                MigrationError::cluster(MigrationStep::SubmitReindex, spec.destination_index(), e)
            })?;

        if let ReindexSubmission::Task(handle) = &submission {
            info!("[TaskMonitorServiceImpl::submit] Reindex running as task {}", handle);
        }

        Ok(submission)
    }

    async fn monitor(
        &self,
        handle: &TaskHandle,
        poll_interval: Duration,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<MonitorReport, MigrationError> {
        let mut ticker: tokio::time::Interval = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut tracker: PollTracker = PollTracker::default();
        let mut polls: usize = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("[TaskMonitorServiceImpl::monitor] Stopped watching task {}; it keeps running on the cluster", handle);
                    return Err(MigrationError::Cancelled(format!("monitoring task {}", handle)));
                }
                _ = Self::deadline_reached(deadline) => {
                    warn!("[TaskMonitorServiceImpl::monitor] Deadline passed while watching task {}", handle);
                    return Err(MigrationError::DeadlineExceeded(format!("monitoring task {}", handle)));
                }
                _ = ticker.tick() => {}
            }

            polls += 1;

            let raw: Value = match self.es_repo.get_task_status(handle).await {
                Ok(raw) => raw,
                Err(e) if e.is_transient() => {
                    warn!(
                        "[TaskMonitorServiceImpl::monitor] Poll {} of task {} failed, retrying next tick: {}",
                        polls, handle, e
                    );
                    continue;
                }
                Err(e) => {
                    error!(
                        "[TaskMonitorServiceImpl::monitor] Task API rejected status request for {}: {}",
                        handle, e
                    );
                    return Err(MigrationError::cluster(MigrationStep::MonitorTask, handle.id(), e));
                }
            };

            let doc: TaskStatusDocument = TaskStatusDocument::from_task_response(raw);

            let (next, outcome) = tracker.observe(&doc);
            tracker = next;
            self.report_tick(handle.id(), &outcome);

            if let Some(reason) = doc.task_error {
                error!("[TaskMonitorServiceImpl::monitor] Task {} failed: {}", handle, reason);
                return Err(MigrationError::TaskFailed {
                    task_id: handle.id().to_string(),
                    reason,
                });
            }

            if outcome.completed {
                info!(
                    "[TaskMonitorServiceImpl::monitor] Task {} completed after {} poll(s): {} processed, {} document failure(s)",
                    handle,
                    polls,
                    doc.progress.processed(),
                    tracker.reported_failures()
                );

                return Ok(MonitorReport::new(
                    Some(handle.id().to_string()),
                    doc.raw,
                    doc.progress,
                    tracker.reported_failures(),
                    polls,
                ));
            }
        }
    }

    async fn run(
        &self,
        spec: &ReindexSpec,
        poll_interval: Duration,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<MonitorReport, MigrationError> {
        match self.submit(spec).await? {
            ReindexSubmission::Task(handle) => {
                self.monitor(&handle, poll_interval, cancel, deadline).await
            }
            ReindexSubmission::Completed(raw) => {
                let doc: TaskStatusDocument = TaskStatusDocument::from_sync_response(raw);
                let (tracker, outcome) = PollTracker::default().observe(&doc);
                self.report_tick("sync", &outcome);

                if let Some(reason) = doc.task_error {
                    error!("[TaskMonitorServiceImpl::run] Synchronous reindex failed: {}", reason);
                    return Err(MigrationError::TaskFailed {
                        task_id: "sync".to_string(),
                        reason,
                    });
                }

                Ok(MonitorReport::new(
                    None,
                    doc.raw,
                    doc.progress,
                    tracker.reported_failures(),
                    0,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::GatewayError;
    use crate::repository::mock_es_repository::*;
    use crate::service::progress_service_impl::*;

    type Monitor = TaskMonitorServiceImpl<MockEsRepository, CollectingProgressServiceImpl>;

    const POLL: Duration = Duration::from_secs(5);

    fn setup() -> (Arc<MockEsRepository>, Arc<CollectingProgressServiceImpl>, Monitor) {
        let cluster: Arc<MockEsRepository> =
            Arc::new(MockEsRepository::new().with_index("products_v1", json!({})));
        let sink: Arc<CollectingProgressServiceImpl> =
            Arc::new(CollectingProgressServiceImpl::default());
        let monitor: Monitor = TaskMonitorServiceImpl::new(cluster.clone(), sink.clone());
        (cluster, sink, monitor)
    }

    fn running(created: u64) -> GatewayResult<Value> {
        Ok(json!({
            "completed": false,
            "task": { "status": { "total": 100, "created": created } }
        }))
    }

    fn failure(id: usize) -> Value {
        json!({
            "index": "products_new",
            "id": id.to_string(),
            "status": 400,
            "cause": { "type": "mapper_parsing_exception", "reason": "bad value" }
        })
    }

    fn failures(range: std::ops::Range<usize>) -> Vec<Value> {
        range.map(failure).collect()
    }

    fn handle() -> TaskHandle {
        TaskHandle::new("node-1:42")
    }

    #[tokio::test(start_paused = true)]
    async fn polls_n_plus_one_times() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses(vec![
            running(10),
            running(20),
            running(30),
            Ok(json!({ "completed": true, "response": { "total": 100, "created": 100, "failures": [] } })),
        ]);

        let started: Instant = Instant::now();
        let report: MonitorReport = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect("task completes");

        assert_eq!(*report.polls(), 4);
        assert_eq!(cluster.calls(GatewayOp::GetTaskStatus), 4);
        assert_eq!(started.elapsed(), POLL * 3);
        assert!(report.is_clean());
        assert_eq!(report.progress().created, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_task_is_seen_on_the_first_poll() {
        let (cluster, _sink, monitor) = setup();

        let started: Instant = Instant::now();
        let report: MonitorReport = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect("task completes");

        assert_eq!(*report.polls(), 1);
        assert_eq!(cluster.calls(GatewayOp::GetTaskStatus), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_streamed_once_each() {
        let (cluster, sink, monitor) = setup();
        cluster.script_task_statuses(vec![
            Ok(json!({
                "completed": false,
                "task": { "status": { "created": 10, "failures": failures(0..2) } }
            })),
            Ok(json!({
                "completed": true,
                "task": { "status": { "created": 20 } },
                "response": { "created": 20, "failures": failures(0..5) }
            })),
        ]);

        let report: MonitorReport = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect("task completes");

        assert_eq!(*report.document_failures(), 5);
        assert!(!report.is_clean());

        let ids: Vec<String> = sink
            .failure_rows()
            .into_iter()
            .filter_map(|row| match row {
                ProgressRow::DocumentFailure { document_id, .. } => Some(document_id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_status_is_not_repeated() {
        let (cluster, sink, monitor) = setup();
        cluster.script_task_statuses(vec![
            running(10),
            running(10),
            running(10),
            running(50),
            Ok(json!({ "completed": true, "task": { "status": { "total": 100, "created": 50 } } })),
        ]);

        monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect("task completes");

        assert_eq!(sink.status_rows(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses(vec![
            Err(GatewayError::Transport("connection reset".into())),
            Err(GatewayError::rejected(503, "master_not_discovered_exception")),
            running(50),
            Ok(json!({ "completed": true, "response": { "created": 100 } })),
        ]);

        let report: MonitorReport = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect("transient errors are not fatal");

        assert_eq!(*report.polls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn task_api_rejection_is_fatal() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses(vec![Err(GatewayError::rejected(
            404,
            "resource_not_found_exception: task [node-1:42] isn't running",
        ))]);

        let err: MigrationError = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect_err("task API error aborts");

        assert!(matches!(
            err,
            MigrationError::ClusterFatal { step: MigrationStep::MonitorTask, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn task_level_error_is_fatal() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses(vec![Ok(json!({
            "completed": true,
            "error": { "type": "index_not_found_exception", "reason": "no such index [products_v1]" }
        }))]);

        let err: MigrationError = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect_err("task error aborts");

        assert!(matches!(
            err,
            MigrationError::TaskFailed { ref reason, .. } if reason.contains("no such index")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn task_cancelled_on_the_cluster_is_fatal() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses(vec![
            running(10),
            Ok(json!({
                "completed": true,
                "response": { "total": 100, "created": 10, "canceled": "by user request", "failures": [] }
            })),
        ]);

        let err: MigrationError = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect_err("cancelled task is not a success");

        assert!(matches!(
            err,
            MigrationError::TaskFailed { ref reason, .. } if reason.contains("by user request")
        ));
        assert_eq!(cluster.calls(GatewayOp::GetTaskStatus), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_task_is_fatal() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses(vec![Ok(json!({
            "completed": true,
            "response": { "total": 100, "created": 70, "timed_out": true, "failures": [] }
        }))]);

        let err: MigrationError = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), None)
            .await
            .expect_err("timed out task is not a success");

        assert!(matches!(
            err,
            MigrationError::TaskFailed { ref reason, .. } if reason.contains("timed out")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_observed_within_a_tick() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses((0..100).map(running).collect());

        let cancel: CancellationToken = CancellationToken::new();
        let trigger: CancellationToken = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            trigger.cancel();
        });

        let started: Instant = Instant::now();
        let err: MigrationError = monitor
            .monitor(&handle(), POLL, &cancel, None)
            .await
            .expect_err("cancelled");

        assert!(matches!(err, MigrationError::Cancelled(_)));
        assert!(started.elapsed() < Duration::from_secs(12) + POLL);
        assert_eq!(cluster.calls(GatewayOp::GetTaskStatus), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_stops_monitoring() {
        let (cluster, _sink, monitor) = setup();
        cluster.script_task_statuses((0..100).map(running).collect());

        let deadline: Instant = Instant::now() + Duration::from_secs(7);
        let err: MigrationError = monitor
            .monitor(&handle(), POLL, &CancellationToken::new(), Some(deadline))
            .await
            .expect_err("deadline");

        assert!(matches!(err, MigrationError::DeadlineExceeded(_)));
        assert_eq!(cluster.calls(GatewayOp::GetTaskStatus), 2);
    }

    #[tokio::test]
    async fn synchronous_reindex_skips_polling() {
        let (cluster, sink, monitor) = setup();
        cluster.set_sync_response(json!({
            "took": 5,
            "total": 3,
            "created": 2,
            "failures": [failure(7)]
        }));

        let spec: ReindexSpec = ReindexSpec::builder("products_v1", "products_v2")
            .wait_for_completion(true)
            .build();

        let report: MonitorReport = monitor
            .run(&spec, POLL, &CancellationToken::new(), None)
            .await
            .expect("sync reindex");

        assert_eq!(*report.polls(), 0);
        assert!(report.task_id().is_none());
        assert_eq!(*report.document_failures(), 1);
        assert_eq!(sink.failure_rows().len(), 1);
        assert_eq!(cluster.calls(GatewayOp::GetTaskStatus), 0);
    }

    #[tokio::test]
    async fn timed_out_synchronous_reindex_is_fatal() {
        let (cluster, _sink, monitor) = setup();
        cluster.set_sync_response(json!({
            "took": 60000,
            "timed_out": true,
            "total": 3,
            "created": 1,
            "failures": []
        }));

        let spec: ReindexSpec = ReindexSpec::builder("products_v1", "products_v2")
            .wait_for_completion(true)
            .build();

        let err: MigrationError = monitor
            .run(&spec, POLL, &CancellationToken::new(), None)
            .await
            .expect_err("timed out");

        assert!(matches!(err, MigrationError::TaskFailed { ref task_id, .. } if task_id == "sync"));
    }

    #[tokio::test]
    async fn rejected_submission_is_fatal() {
        let (_cluster, _sink, monitor) = setup();
        let spec: ReindexSpec = ReindexSpec::builder("missing", "products_v2").build();

        let err: MigrationError = monitor
            .run(&spec, POLL, &CancellationToken::new(), None)
            .await
            .expect_err("unknown source");

        assert!(matches!(
            err,
            MigrationError::ClusterFatal { step: MigrationStep::SubmitReindex, .. }
        ));
    }
}
