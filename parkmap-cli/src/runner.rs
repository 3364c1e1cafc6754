//! Shared setup for commands that talk to the backend or the map.

use std::future::Future;
use std::path::Path;

use parkmap::config::ConfigFile;
use parkmap::logging::{init_logging, LoggingGuard};
use tokio::runtime::Runtime;

use crate::error::CliError;

/// Loaded configuration, installed logging and an async runtime.
pub struct CliRunner {
    config: ConfigFile,
    runtime: Runtime,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Loads `config_path`, applies environment overrides and starts logging.
    ///
    /// `verbose` raises the level above the configured one: `-v` for debug,
    /// `-vv` for trace.
    pub fn new(config_path: &Path, verbose: u8) -> Result<Self, CliError> {
        let mut config = ConfigFile::load_from(config_path)?;
        config.apply_env();

        let level = match verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        };
        let logging = init_logging(&level, config.logging.file.as_deref())?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))?;

        Ok(Self {
            config,
            runtime,
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            command,
            api = %self.config.api.base_url,
            "parkmap starting"
        );
    }

    /// Runs `future` to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
