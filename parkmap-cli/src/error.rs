//! CLI error type.

use std::fmt;

use parkmap::config::ConfigError;
use parkmap::logging::LoggingError;
use parkmap::usecase::DisplayError;

/// Errors surfaced to the terminal.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or missing setting
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigError),
    Logging(LoggingError),
    /// Async runtime could not be started
    Runtime(String),
    /// Fetching or rendering parking lots failed
    Display(DisplayError),
    /// Writing command output failed
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Runtime(msg) => write!(f, "Failed to start async runtime: {}", msg),
            CliError::Display(DisplayError::Map(e)) => write!(f, "Map error: {}", e),
            CliError::Display(e) => write!(f, "{}", e),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Display(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<DisplayError> for CliError {
    fn from(e: DisplayError) -> Self {
        CliError::Display(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
