//! HTTP-backed parking lot repository.
//!
//! The backend answers either with a bare JSON array of parking lots or with
//! an envelope:
//!
//! ```text
//! { "success": true, "message": "...", "data": [ ... ], "timestamp": "..." }
//! ```
//!
//! A non-2xx status or `success: false` is a fetch failure; a body matching
//! neither shape is a parse failure.

use futures::future::BoxFuture;
use serde::Deserialize;

use super::{
    AsyncHttpClient, ParkingLot, ParkingLotDto, ParkingLotRepository, RepositoryError,
    SearchParams,
};

/// Path of the parking lot listing endpoint, relative to the API base URL.
pub const PARKING_LOTS_PATH: &str = "/parking-lots";

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Vec<ParkingLotDto>>,
}

/// Decodes a listing response body.
///
/// # Errors
///
/// - `FetchFailed` with the envelope message when `success` is false
/// - `ParseFailed` when the body is neither an array nor an envelope, or a
///   successful envelope carries no `data`
pub fn decode_parking_lots(body: &[u8]) -> Result<Vec<ParkingLotDto>, RepositoryError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| RepositoryError::ParseFailed(format!("Invalid JSON: {}", e)))?;

    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(|e| {
            RepositoryError::ParseFailed(format!("Invalid parking lot list: {}", e))
        }),
        serde_json::Value::Object(_) => {
            let envelope: ApiEnvelope = serde_json::from_value(value)
                .map_err(|e| RepositoryError::ParseFailed(format!("Invalid envelope: {}", e)))?;

            if !envelope.success {
                return Err(RepositoryError::FetchFailed(
                    envelope
                        .message
                        .unwrap_or_else(|| "Backend reported failure".to_string()),
                ));
            }

            envelope.data.ok_or_else(|| {
                RepositoryError::ParseFailed("Envelope is missing the data field".to_string())
            })
        }
        other => Err(RepositoryError::ParseFailed(format!(
            "Expected a list or an envelope, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Parking lot repository backed by the REST API.
pub struct HttpParkingLotRepository<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> HttpParkingLotRepository<C> {
    /// Creates a repository for the API rooted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `base_url` - API base URL, with or without a trailing slash
    pub fn new(http_client: C, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    fn listing_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), PARKING_LOTS_PATH)
    }

    async fn fetch(
        &self,
        query: Vec<(&'static str, String)>,
    ) -> Result<Vec<ParkingLot>, RepositoryError> {
        let url = self.listing_url();
        tracing::debug!(url = %url, filters = query.len(), "Fetching parking lots");

        let response = self.http_client.get(&url, &query).await?;
        if !response.is_success() {
            tracing::warn!(url = %url, status = response.status, "Parking lot request failed");
            return Err(RepositoryError::FetchFailed(format!(
                "HTTP {} from {}",
                response.status, url
            )));
        }

        let lots: Vec<ParkingLot> = decode_parking_lots(&response.body)?
            .into_iter()
            .map(ParkingLot::from)
            .collect();

        tracing::debug!(count = lots.len(), "Fetched parking lots");
        Ok(lots)
    }
}

impl<C: AsyncHttpClient> ParkingLotRepository for HttpParkingLotRepository<C> {
    fn find_all(&self) -> BoxFuture<'_, Result<Vec<ParkingLot>, RepositoryError>> {
        Box::pin(self.fetch(Vec::new()))
    }

    fn find_by_search_params<'a>(
        &'a self,
        params: &'a SearchParams,
    ) -> BoxFuture<'a, Result<Vec<ParkingLot>, RepositoryError>> {
        Box::pin(self.fetch(params.to_query()))
    }
}
