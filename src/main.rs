//! Finboard main entry point

use anyhow::Context;
use clap::Parser;
use finboard_api::start_server;
use finboard_config::error::ConfigErrorSeverity;
use finboard_config::{Config, ConfigError};
use finboard_core::Stores;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "finboard")]
#[command(version = "0.1.0")]
#[command(about = "Backend server for a financial transactions dashboard", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print a default configuration file and exit
    #[arg(long)]
    print_config: bool,
}

/// Load the config file; recoverable problems yield defaults plus the error to report
fn load_config(path: &Path) -> Result<(Config, Option<ConfigError>), ConfigError> {
    match Config::load(path) {
        Ok(config) => Ok((config, None)),
        Err(e) if e.severity() == ConfigErrorSeverity::Warning => Ok((Config::default(), Some(e))),
        Err(e) => Err(e),
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match load_config(&args.config) {
        Ok((config, fallback)) => {
            init_logging(&config.logging.level);
            if let Some(e) = fallback {
                log::warn!("{}\nUsing default configuration", e.to_details());
            }
            config
        }
        Err(e) => {
            init_logging("info");
            log::error!("{}", e.to_details());
            return Err(e).with_context(|| format!("Failed to load configuration from {}", args.config.display()));
        }
    };

    if config.auth.uses_dev_secret() {
        log::warn!("Using the built-in development JWT secret; set auth.jwt_secret for production");
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let stores = Stores::open(&config).await.context("Failed to open stores")?;
        if config.database.seed_demo_data {
            if let Err(e) = stores.seed().await {
                log::warn!("Failed to seed demo data: {}", e);
            }
        }

        start_server(config, stores).await.context("Server error")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("finboard-missing-config-does-not-exist.yaml");
        let (config, fallback) = load_config(&path).unwrap();
        assert_eq!(config.server.port, Config::default().server.port);
        let details = fallback.unwrap().to_details();
        assert!(details.suggestions.iter().any(|s| s.contains("--print-config")));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let path = std::env::temp_dir().join(format!("finboard-invalid-{}.yaml", std::process::id()));
        std::fs::write(&path, "server:\n  port: 0\n").unwrap();
        let error = load_config(&path).unwrap_err();
        assert_eq!(error.severity(), ConfigErrorSeverity::Error);
        assert_eq!(error.to_details().field.as_deref(), Some("server.port"));
        let _ = std::fs::remove_file(&path);
    }
}
