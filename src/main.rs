mod common;
use common::*;

mod app_config;
use app_config::AppConfig;

mod config;
use config::{CliArgs, EnvLayer};

mod controller;
use controller::main_controller::*;

mod enums;
mod errors;
mod models;

mod repository;
use repository::es_repository::*;

mod service;
use service::progress_service_impl::*;

mod service_trait;

mod utils_module;
use utils_module::logger_utils::*;

use clap::Parser;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli: CliArgs = CliArgs::parse();

    let exit_code: i32 = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("[main] {:?}", e);
            eprintln!("configuration error: {:#}", e);
            EXIT_CONFIGURATION
        }
    };

    std::process::exit(exit_code);
}

/// Everything before the controller runs is setup; a failure there is a
/// configuration problem.
async fn run(cli: CliArgs) -> anyhow::Result<i32> {
    let env_layer: EnvLayer = EnvLayer::from_env()?;
    let app_config: &AppConfig = AppConfig::init(AppConfig::merge(&cli.global, &env_layer))?;

    let _logger: LoggerHandle = set_global_logger(app_config.log_level())?;

    info!(
        "[main] index_migrator {} against {}",
        env!("CARGO_PKG_VERSION"),
        app_config.es_db_url()
    );

    let es_repo: Arc<EsRepositoryImpl> = Arc::new(EsRepositoryImpl::new()?);

    let cancel: CancellationToken = CancellationToken::new();
    let trigger: CancellationToken = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("[main] Shutdown signal received, stopping after the current step");
            trigger.cancel();
        }
    });

    let main_controller =
        MainController::new(es_repo, Arc::new(ConsoleProgressServiceImpl::new()));

    Ok(main_controller.run(&cli.command, app_config, &cancel).await)
}
