//! REST API client for the AI edit route.

use pixci_core::error_body::extract_error_message;

use crate::messages::{EditRequest, EditResponse};

/// Message used when the route fails without a body.
const FALLBACK_ERROR: &str = "AI edit failed";

/// HTTP client for the AI edit proxy.
#[derive(Debug, Clone)]
pub struct GatewayApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the AI edit REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, or an
    /// undecodable body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The route returned a non-2xx status code.
    #[error("AI edit error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
}

impl GatewayApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base URL of the route prefix, e.g. `http://host:3000/api`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send one edit turn.
    ///
    /// The response is returned as received; the caller decides whether
    /// the edited codes are usable.
    pub async fn edit(&self, request: &EditRequest) -> Result<EditResponse, GatewayApiError> {
        tracing::debug!(
            reference_count = request.reference_codes.len(),
            conversation_len = request.conversation.as_ref().map_or(0, |c| c.len()),
            "Sending AI edit request",
        );

        let response = self
            .client
            .post(format!("{}/ai/edit", self.api_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = extract_error_message(&body, FALLBACK_ERROR);
            tracing::warn!(status = status.as_u16(), error = %message, "AI edit request failed");
            return Err(GatewayApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let edited: EditResponse = response.json().await?;

        tracing::info!(
            edited_count = edited.edited_codes.len(),
            conversation_len = edited.conversation.len(),
            total_tokens = edited.usage.map(|u| u.total_tokens),
            "AI edit completed",
        );

        Ok(edited)
    }
}
