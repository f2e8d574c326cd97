use crate::common::*;

use crate::config::{EnvLayer, GlobalArgs};

pub const DEFAULT_ES_URL: &str = "localhost:9200";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_SLICES: u32 = 1;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Global configuration struct
/// This struct is thread-safe and can be accessed from multiple threads concurrently
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct AppConfig {
    /// Elasticsearch URL (comma-separated hosts)
    es_db_url: String,
    /// Elasticsearch username
    es_id: String,
    /// Elasticsearch password
    es_pw: String,
    request_timeout_secs: u64,
    poll_interval_ms: u64,
    batch_size: usize,
    slices: u32,
    /// Overall bound on a run; unbounded when `None`
    update_timeout_secs: Option<u64>,
    log_level: String,
}

/// Global static instance of AppConfig
/// This is initialized once and can be safely accessed from multiple threads
static APP_CONFIG: normalOnceCell<AppConfig> = normalOnceCell::new();

impl AppConfig {
    /// Builds the configuration from its layers.
    ///
    /// Precedence, per setting: explicit flag, then environment variable, then
    /// the built-in default. This is the only place the layers are combined.
    pub fn merge(cli: &GlobalArgs, env_layer: &EnvLayer) -> AppConfig {
        fn pick<T: Clone>(flag: &Option<T>, env_value: &Option<T>, default: T) -> T {
            flag.clone().or_else(|| env_value.clone()).unwrap_or(default)
        }

        AppConfig {
            es_db_url: pick(&cli.es_url, &env_layer.es_url, DEFAULT_ES_URL.to_string()),
            es_id: pick(&cli.es_id, &env_layer.es_id, String::new()),
            es_pw: pick(&cli.es_pw, &env_layer.es_pw, String::new()),
            request_timeout_secs: pick(
                &cli.request_timeout,
                &env_layer.request_timeout,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            poll_interval_ms: pick(
                &cli.poll_interval,
                &env_layer.poll_interval,
                DEFAULT_POLL_INTERVAL_MS,
            )
            .max(1),
            batch_size: pick(&cli.batch_size, &env_layer.batch_size, DEFAULT_BATCH_SIZE).max(1),
            slices: pick(&cli.slices, &env_layer.slices, DEFAULT_SLICES).max(1),
            update_timeout_secs: cli.update_timeout.or(env_layer.update_timeout),
            log_level: pick(
                &cli.log_level,
                &env_layer.log_level,
                DEFAULT_LOG_LEVEL.to_string(),
            ),
        }
    }

    /// Installs the global configuration
    /// This should be called once at application startup
    pub fn init(config: AppConfig) -> Result<&'static AppConfig> {
        APP_CONFIG
            .set(config)
            .map_err(|_| anyhow!("[AppConfig::init] AppConfig already initialized"))?;

        Self::global()
    }

    /// Get a reference to the global configuration
    ///
    /// # Returns
    /// * `Result<&'static AppConfig>` - Err if `AppConfig::init()` has not run yet
    pub fn global() -> Result<&'static AppConfig> {
        APP_CONFIG
            .get()
            .ok_or_else(|| anyhow!("[AppConfig::global] AppConfig not initialized. Call AppConfig::init() first."))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn update_timeout(&self) -> Option<Duration> {
        self.update_timeout_secs.map(Duration::from_secs)
    }
}
