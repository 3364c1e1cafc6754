//! Map adapter error types.

use std::fmt;

use thiserror::Error;

/// Errors raised by the SDK loader and the map adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The SDK namespace is not present in the page.
    #[error("Map SDK is not available")]
    ProviderUnavailable,

    /// No element with the given id exists in the page.
    #[error("Map container not found: {0}")]
    ContainerNotFound(String),

    /// Loading or initializing the SDK failed.
    #[error("Map SDK failed to load: {0}")]
    LoaderFailed(LoadDiagnostic),

    /// A render or listener call was made before `initialize`.
    #[error("Map has not been initialized")]
    NotInitialized,

    /// No SDK app key is configured.
    #[error("Map SDK API key is not configured")]
    MissingApiKey,

    /// The in-flight load was cancelled.
    #[error("Map SDK load was cancelled")]
    LoadCancelled,

    /// An SDK constructor or camera call failed.
    #[error("Map SDK call failed: {0}")]
    Sdk(String),
}

/// What the loader knew when a load attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDiagnostic {
    /// Short description of the failure.
    pub reason: String,
    /// Script URL that was attempted.
    pub url: String,
    /// HTTP status of the script URL, when a probe could obtain one.
    pub status: Option<u16>,
    /// Origin of the page hosting the map.
    pub origin: String,
}

impl LoadDiagnostic {
    pub fn new(reason: impl Into<String>, url: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            url: url.into(),
            status: None,
            origin: origin.into(),
        }
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }

    /// Likely cause of the failure, keyed on the probed status.
    pub fn hint(&self) -> String {
        match self.status {
            Some(401) => format!(
                "unauthorized: register origin {} as a web platform domain for this app key, \
                 verify the JavaScript app key and that the map API is enabled",
                self.origin
            ),
            Some(403) => format!(
                "forbidden: origin {} is not registered or the app key is invalid",
                self.origin
            ),
            _ => format!(
                "check that origin {} is registered, the app key is correct and the network \
                 can reach the SDK host",
                self.origin
            ),
        }
    }
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        write!(
            f,
            "{} (url: {}, status: {}, origin: {}); {}",
            self.reason,
            self.url,
            status,
            self.origin,
            self.hint()
        )
    }
}
