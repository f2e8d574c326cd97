use crate::common::*;

/// Resolved options for one migration run. How they were parsed is the
/// caller's business.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
#[getset(get = "pub")]
pub struct MigrationOptions {
    /// Allow falling back to a reindex when the in-place update is rejected.
    zero_downtime_allowed: bool,
    /// Require the target to end up as an alias.
    force_alias: bool,
    /// Delete the migrated source index after a successful cutover.
    delete_old_index: bool,
    /// Restrict the in-place mapping write to the alias' write index.
    write_index_only: bool,
    batch_size: usize,
    slices: u32,
    requests_per_second: Option<f32>,
    poll_interval: Duration,
    /// Bound on the whole run, measured from its start.
    update_timeout: Option<Duration>,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        MigrationOptions {
            zero_downtime_allowed: false,
            force_alias: false,
            delete_old_index: false,
            write_index_only: false,
            batch_size: 1000,
            slices: 1,
            requests_per_second: None,
            poll_interval: Duration::from_secs(5),
            update_timeout: None,
        }
    }
}

impl MigrationOptions {
    pub fn with_zero_downtime(mut self, allowed: bool) -> Self {
        self.zero_downtime_allowed = allowed;
        self
    }

    pub fn with_force_alias(mut self, force: bool) -> Self {
        self.force_alias = force;
        self
    }

    pub fn with_delete_old_index(mut self, delete: bool) -> Self {
        self.delete_old_index = delete;
        self
    }

    pub fn with_write_index_only(mut self, write_index_only: bool) -> Self {
        self.write_index_only = write_index_only;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_slices(mut self, slices: u32) -> Self {
        self.slices = slices;
        self
    }

    pub fn with_requests_per_second(mut self, rps: Option<f32>) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_update_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.update_timeout = timeout;
        self
    }
}
