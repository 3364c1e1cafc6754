//! HTTP client abstraction for testability

use std::time::Duration;

use futures::future::BoxFuture;

use super::RepositoryError;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests. Non-2xx responses are returned
/// as values; only transport failures are errors.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `query` - Query string pairs appended to the URL
    fn get<'a>(
        &'a self,
        url: &'a str,
        query: &'a [(&'static str, String)],
    ) -> BoxFuture<'a, Result<HttpResponse, RepositoryError>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, RepositoryError> {
        Self::with_timeout(30)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get<'a>(
        &'a self,
        url: &'a str,
        query: &'a [(&'static str, String)],
    ) -> BoxFuture<'a, Result<HttpResponse, RepositoryError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| RepositoryError::FetchFailed(format!("Request failed: {}", e)))?;

            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| {
                RepositoryError::FetchFailed(format!("Failed to read response: {}", e))
            })?;

            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}
