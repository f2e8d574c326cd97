use crate::common::*;

use crate::service_trait::confirm_service::*;

/// Asks on the terminal and waits for an answer.
#[derive(Debug, Default, Clone, new)]
pub struct StdinConfirmServiceImpl;

impl StdinConfirmServiceImpl {
    /// Reads one line from stdin without blocking the async runtime.
    /// `None` on EOF or read error.
    async fn read_user_input() -> Option<String> {
        tokio::task::spawn_blocking(|| {
            let mut line: String = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line),
            }
        })
        .await
        .ok()
        .flatten()
    }
}

/// Only an explicit `y` / `yes` counts as consent.
pub fn is_affirmative(input: &str) -> bool {
    let trimmed: &str = input.trim();
    trimmed.eq_ignore_ascii_case("y") || trimmed.eq_ignore_ascii_case("yes")
}

#[async_trait]
impl ConfirmService for StdinConfirmServiceImpl {
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{}\nProceed? [y/N] ", prompt);

        if let Err(e) = std::io::stdout().flush() {
            warn!("[StdinConfirmServiceImpl::confirm] Failed to flush stdout: {}", e);
        }

        let answer: bool = Self::read_user_input()
            .await
            .map(|line| is_affirmative(&line))
            .unwrap_or(false);

        info!(
            "[StdinConfirmServiceImpl::confirm] '{}' answered {}",
            prompt,
            if answer { "yes" } else { "no" }
        );

        answer
    }
}

/// Used under `--non-interactive`; agrees to everything.
#[derive(Debug, Default, Clone, new)]
pub struct AutoConfirmServiceImpl;

#[async_trait]
impl ConfirmService for AutoConfirmServiceImpl {
    async fn confirm(&self, prompt: &str) -> bool {
        info!("[AutoConfirmServiceImpl::confirm] auto-accepted: {}", prompt);
        true
    }
}

/// Declines everything.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct DenyConfirmServiceImpl;

#[cfg(test)]
#[async_trait]
impl ConfirmService for DenyConfirmServiceImpl {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
