//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig     # Host, port, request and shutdown timeouts
//! ├── service: ServiceConfig   # HTTP client, delivery log retention
//! └── log_format: LogFormat    # Text or JSON log output
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod server;

use std::process;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use herald_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use self::server::ServerConfig;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Output format of the log lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "herald")]
#[command(about = "Webhook delivery server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Delivery engine configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so clap's `env` fallbacks can see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Installs the tracing subscriber with `RUST_LOG` filtering (default `info`).
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match self.log_format {
            LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .init(),
        }
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            http_timeout_secs = self.service.http_client.http_timeout,
            user_agent = %self.service.http_client.resolved_user_agent(),
            retention_days = self.service.engine.retention_days,
            cleanup_interval_secs = self.service.engine.cleanup_interval_secs,
            "Delivery configuration"
        );
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "herald",
            "--port",
            "8080",
            "--retention-days",
            "7",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.server.port, 8080);
        assert_eq!(cli.service.engine.retention_days, 7);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn zero_retention_fails_validation() {
        let cli = Cli::try_parse_from(["herald", "--retention-days", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn serializes_log_format_lowercase() {
        let json = serde_json::to_value(LogFormat::Json).unwrap();
        assert_eq!(json, "json");
    }
}
