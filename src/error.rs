use reqwest::StatusCode;
use tracing::warn;

/// CoinAPI reports failures as `{"error": "..."}`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub(crate) error: Option<String>,
    // Some gateways answer with {"message": ...} instead
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl ApiErrorResponse {
    pub(crate) fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Logs a non-success response. The body is left for the caller to interpret.
pub(crate) fn log_api_error(status: StatusCode, url: &str, body: &[u8]) {
    let parsed = serde_json::from_slice::<ApiErrorResponse>(body).ok();
    match parsed.as_ref().and_then(ApiErrorResponse::text) {
        Some(text) => warn!(status = status.as_u16(), url, "CoinAPI error: {}", text),
        None => warn!(status = status.as_u16(), url, "CoinAPI returned HTTP {}", status),
    }
}
