//! Task status model.
//!
//! Parses `GET _tasks/<id>` bodies (and synchronous `_reindex` responses, which
//! share the counters and `failures` layout) and tracks what has already been
//! reported between polls.
//!
//! ```json
//! {
//!   "completed": true,
//!   "task": { "status": { "total": 10, "created": 8, "updated": 0, "batches": 1 } },
//!   "response": { "failures": [ { "index": "x", "id": "7", "status": 400,
//!                                 "cause": { "type": "...", "reason": "..." } } ] },
//!   "error": { "type": "...", "reason": "..." }
//! }
//! ```
//!
//! A task stopped through `_tasks/<id>/_cancel` still ends with `completed: true`
//! and carries `response.canceled`; one that hit its timeout carries
//! `response.timed_out: true`. Both are task-level failures.

use crate::common::*;

/// Counters reported by a running or finished reindex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub batches: u64,
    #[serde(default)]
    pub version_conflicts: u64,
    #[serde(default)]
    pub noops: u64,
}

impl TaskProgress {
    fn from_counters(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn processed(&self) -> u64 {
        self.created + self.updated + self.deleted + self.version_conflicts + self.noops
    }

    /// The counters a status row is emitted for.
    fn headline(&self) -> (u64, u64, u64, u64, u64) {
        (self.created, self.updated, self.deleted, self.batches, self.total)
    }
}

/// A single document the reindex could not write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[getset(get = "pub")]
pub struct DocumentFailure {
    index: String,
    document_id: String,
    status_code: u16,
    cause_type: String,
    cause_reason: String,
}

impl DocumentFailure {
    /// Bulk failures carry `cause`, search failures carry `reason`; both are accepted.
    pub fn from_value(value: &Value) -> Self {
        let cause: &Value = value
            .get("cause")
            .filter(|cause| cause.is_object())
            .or_else(|| value.get("reason").filter(|reason| reason.is_object()))
            .unwrap_or(&Value::Null);

        DocumentFailure {
            index: str_field(value, "index"),
            document_id: str_field(value, "id"),
            status_code: value
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|status| u16::try_from(status).ok())
                .unwrap_or(0),
            cause_type: str_field(cause, "type"),
            cause_reason: str_field(cause, "reason"),
        }
    }
}

fn str_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Parsed view of one task status answer.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatusDocument {
    pub completed: bool,
    pub progress: TaskProgress,
    pub failures: Vec<DocumentFailure>,
    /// Set when the task finished with a task-level error.
    pub task_error: Option<String>,
    pub raw: Value,
}

impl TaskStatusDocument {
    pub fn from_task_response(raw: Value) -> Self {
        let completed: bool = raw
            .get("completed")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let response: &Value = raw.get("response").unwrap_or(&Value::Null);

        // The final response has the authoritative counters once present.
        let progress: TaskProgress = if response.is_object() {
            TaskProgress::from_counters(response)
        } else {
            TaskProgress::from_counters(&raw["task"]["status"])
        };

        let failures_source: &Value = if response.get("failures").is_some() {
            &response["failures"]
        } else {
            &raw["task"]["status"]["failures"]
        };

        let task_error: Option<String> = raw
            .get("error")
            .filter(|error| !error.is_null())
            .map(error_reason)
            .or_else(|| interruption_reason(response));

        TaskStatusDocument {
            completed,
            progress,
            failures: parse_failures(failures_source),
            task_error,
            raw,
        }
    }

    /// A `wait_for_completion=true` reindex answer is always complete.
    pub fn from_sync_response(raw: Value) -> Self {
        TaskStatusDocument {
            completed: true,
            progress: TaskProgress::from_counters(&raw),
            failures: parse_failures(&raw["failures"]),
            task_error: interruption_reason(&raw),
            raw,
        }
    }
}

fn parse_failures(value: &Value) -> Vec<DocumentFailure> {
    value
        .as_array()
        .map(|items| items.iter().map(DocumentFailure::from_value).collect())
        .unwrap_or_default()
}

/// Cancellation or timeout reported inside a finished reindex body.
fn interruption_reason(response: &Value) -> Option<String> {
    if let Some(reason) = response
        .get("canceled")
        .and_then(Value::as_str)
        .filter(|reason| !reason.is_empty())
    {
        return Some(format!("reindex was cancelled: {}", reason));
    }

    if response.get("timed_out").and_then(Value::as_bool) == Some(true) {
        return Some("reindex timed out before every document was copied".to_string());
    }

    None
}

fn error_reason(error: &Value) -> String {
    let kind: String = str_field(error, "type");
    let reason: String = str_field(error, "reason");

    match (kind.is_empty(), reason.is_empty()) {
        (false, false) => format!("{}: {}", kind, reason),
        (true, false) => reason,
        (false, true) => kind,
        (true, true) => error.to_string(),
    }
}

/// What a single poll produced, relative to everything seen before it.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub new_failures: Vec<DocumentFailure>,
    pub status_changed: bool,
    pub completed: bool,
    pub progress: TaskProgress,
}

/// Accumulator threaded through the poll loop.
///
/// The `failures` array of a task only ever grows, so the number of entries
/// already reported is enough to find the new ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollTracker {
    last_progress: Option<TaskProgress>,
    reported_failures: usize,
}

impl PollTracker {
    pub fn observe(self, doc: &TaskStatusDocument) -> (PollTracker, TickOutcome) {
        let new_failures: Vec<DocumentFailure> = doc
            .failures
            .iter()
            .skip(self.reported_failures)
            .cloned()
            .collect();

        let status_changed: bool = self.last_progress.map(|last| last.headline())
            != Some(doc.progress.headline());

        let next: PollTracker = PollTracker {
            last_progress: Some(doc.progress),
            reported_failures: self.reported_failures.max(doc.failures.len()),
        };

        let outcome: TickOutcome = TickOutcome {
            new_failures,
            status_changed,
            completed: doc.completed,
            progress: doc.progress,
        };

        (next, outcome)
    }

    pub fn reported_failures(&self) -> usize {
        self.reported_failures
    }
}

/// Terminal result of monitoring one reindex.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct MonitorReport {
    task_id: Option<String>,
    final_status: Value,
    progress: TaskProgress,
    document_failures: usize,
    polls: usize,
}

impl MonitorReport {
    pub fn new(
        task_id: Option<String>,
        final_status: Value,
        progress: TaskProgress,
        document_failures: usize,
        polls: usize,
    ) -> Self {
        MonitorReport {
            task_id,
            final_status,
            progress,
            document_failures,
            polls,
        }
    }

    /// Completed with zero document failures. Callers must use this rather than
    /// the task's own `completed` flag.
    pub fn is_clean(&self) -> bool {
        self.document_failures == 0
    }
}
