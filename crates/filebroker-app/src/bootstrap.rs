use std::future::Future;
use std::path::PathBuf;

use clap::Parser;
use filebroker_config::{BrokerConfig, ConfigLoader, LogFormatSetting, Overrides};
use filebroker_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics, init_logging};
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{AppError, AppResult};
use crate::services::Services;
use crate::transport;

/// Command-line flags; each one overrides the matching configuration value.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "filebroker", about = "Privileged filesystem-operations broker")]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Socket path or pipe name to listen on.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long)]
    pub log_level: Option<String>,
    /// Log output format (`auto`, `json`, `pretty`).
    #[arg(long, value_parser = parse_log_format)]
    pub log_format: Option<LogFormatSetting>,
}

impl Cli {
    /// Resolve the effective configuration with these flags as the last layer.
    ///
    /// # Errors
    ///
    /// Returns an error when any configuration layer fails to load or the
    /// result does not validate.
    pub fn load_config(&self) -> AppResult<BrokerConfig> {
        let mut loader = ConfigLoader::new().with_overrides(Overrides {
            endpoint: self.endpoint.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        });
        if let Some(path) = &self.config {
            loader = loader.with_file(path.clone());
        }
        loader
            .load()
            .map_err(|err| AppError::config("config.load", err))
    }
}

fn parse_log_format(value: &str) -> Result<LogFormatSetting, String> {
    LogFormatSetting::parse(value).ok_or_else(|| format!("unknown log format `{value}`"))
}

/// Entry point for the broker: parse flags, load configuration, serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration, logging setup or the listener fails.
pub async fn run_app() -> AppResult<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    run_app_with(config, shutdown_signal()).await
}

/// Boot sequence over an already-resolved configuration.
///
/// # Errors
///
/// Returns an error if logging setup, service wiring or the listener fails.
pub async fn run_app_with<F>(config: BrokerConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    init_logging(&LoggingConfig {
        level: &config.logging.level,
        format: LogFormat::from_name(config.logging.format.as_str()),
        build_sha: option_env!("FILEBROKER_BUILD_SHA").unwrap_or("dev"),
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("broker");

    info!(
        endpoint = %config.endpoint,
        recycle_dir = ?config.recycle_dir,
        "filebroker starting"
    );

    let metrics = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
    let services = Services::from_config(&config, metrics.clone())?;
    let dispatcher = Dispatcher::new(services);

    transport::serve(&config.endpoint, dispatcher, shutdown).await?;

    match metrics.render() {
        Ok(rendered) => info!(metrics = %rendered, "filebroker stopped"),
        Err(err) => warn!(error = %err, "metrics render failed"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
}
