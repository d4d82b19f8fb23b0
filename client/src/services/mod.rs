pub mod api;
pub mod geocoding;

pub use api::EventService;
pub use geocoding::NominatimClient;

use reqwest::Response;
use serde::de::DeserializeOwned;
use shared::api::ErrorResponse;

use crate::error::{ClientError, ClientResult};

/// Turns a non-2xx response into `ClientError::Status`, keeping whatever
/// detail the server put in its error body.
async fn ensure_success(response: Response, context: &str) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.detail().map(str::to_string));
    Err(ClientError::status(status, context, detail))
}

async fn decode_json<T: DeserializeOwned>(response: Response, context: &str) -> ClientResult<T> {
    let response = ensure_success(response, context).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
