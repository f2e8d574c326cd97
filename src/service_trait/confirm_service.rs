use crate::common::*;

/// Asks whether a destructive step may go ahead.
#[async_trait]
pub trait ConfirmService: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}
