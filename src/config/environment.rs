//! Environment layer of the configuration.
//!
//! Reads the process environment (after `.env` has been loaded) into a set of
//! optional values. Nothing here applies defaults; see
//! [`crate::app_config::AppConfig::merge`].
//!
//! | Variable                   | Setting                        |
//! |----------------------------|--------------------------------|
//! | `ES_DB_URL`                | comma-separated cluster hosts  |
//! | `ES_ID` / `ES_PW`          | basic-auth credentials         |
//! | `ES_REQUEST_TIMEOUT`       | request timeout (s)            |
//! | `MIGRATE_POLL_INTERVAL_MS` | task poll interval (ms)        |
//! | `MIGRATE_BATCH_SIZE`       | reindex batch size             |
//! | `MIGRATE_SLICES`           | reindex slices                 |
//! | `MIGRATE_UPDATE_TIMEOUT`   | overall deadline (s)           |
//! | `RUST_LOG`                 | log level                      |

use crate::common::*;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvLayer {
    pub es_url: Option<String>,
    pub es_id: Option<String>,
    pub es_pw: Option<String>,
    pub request_timeout: Option<u64>,
    pub poll_interval: Option<u64>,
    pub batch_size: Option<usize>,
    pub slices: Option<u32>,
    pub update_timeout: Option<u64>,
    pub log_level: Option<String>,
}

impl EnvLayer {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the layer from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| -> Option<String> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Ok(EnvLayer {
            es_url: text("ES_DB_URL"),
            es_id: text("ES_ID"),
            es_pw: text("ES_PW"),
            request_timeout: parse_number("ES_REQUEST_TIMEOUT", text("ES_REQUEST_TIMEOUT"))?,
            poll_interval: parse_number(
                "MIGRATE_POLL_INTERVAL_MS",
                text("MIGRATE_POLL_INTERVAL_MS"),
            )?,
            batch_size: parse_number("MIGRATE_BATCH_SIZE", text("MIGRATE_BATCH_SIZE"))?,
            slices: parse_number("MIGRATE_SLICES", text("MIGRATE_SLICES"))?,
            update_timeout: parse_number(
                "MIGRATE_UPDATE_TIMEOUT",
                text("MIGRATE_UPDATE_TIMEOUT"),
            )?,
            log_level: text("RUST_LOG"),
        })
    }
}

fn parse_number<T>(key: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .with_context(|| format!("[EnvLayer::from_env] {} must be a number, got '{}'", key, value))
    })
    .transpose()
}
