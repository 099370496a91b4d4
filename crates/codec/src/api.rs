//! REST API client for the conversion service's HTTP endpoints.
//!
//! Wraps `POST /encode` (multipart upload), `POST /decode` and
//! `GET /health` using [`reqwest`]. Parameters are checked against the
//! service's limits before any request is sent.

use pixci_core::error::CoreError;
use pixci_core::error_body::extract_error_message;
use pixci_core::validation::{validate_block_size, validate_markup, validate_scale};
use reqwest::multipart;

use crate::messages::{DecodeRequest, DecodeResponse, EncodeInput, EncodeResponse, HealthResponse};

/// Message used when the service fails without a body.
const FALLBACK_ERROR: &str = "An error occurred";

/// HTTP client for one conversion service.
#[derive(Debug, Clone)]
pub struct CodecApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the conversion service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum CodecApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, or an
    /// undecodable body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Conversion service error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The request was rejected locally before being sent.
    #[error(transparent)]
    InvalidInput(#[from] CoreError),
}

impl CodecApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base URL including the version prefix, e.g.
    ///   `http://host:8000/api/v1`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (shares the connection pool and timeout settings).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Encode an image into markup.
    ///
    /// Sends a multipart `POST /encode` with the `file`, `block_size` and
    /// `auto_detect` fields.
    pub async fn encode(&self, input: &EncodeInput) -> Result<EncodeResponse, CodecApiError> {
        validate_block_size(input.options.block_size)?;
        if input.bytes.is_empty() {
            return Err(CoreError::Validation(format!(
                "Image '{}' is empty",
                input.file_name
            ))
            .into());
        }

        let file = multipart::Part::bytes(input.bytes.clone()).file_name(input.file_name.clone());
        let form = multipart::Form::new()
            .part("file", file)
            .text("block_size", input.options.block_size.to_string())
            .text("auto_detect", input.options.auto_detect.to_string());

        tracing::debug!(
            file_name = %input.file_name,
            size_bytes = input.bytes.len(),
            block_size = input.options.block_size,
            auto_detect = input.options.auto_detect,
            "Submitting image for encoding",
        );

        let response = self
            .client
            .post(format!("{}/encode", self.api_url))
            .multipart(form)
            .send()
            .await?;

        let encoded: EncodeResponse = Self::parse_response(response).await?;

        tracing::info!(
            file_name = %input.file_name,
            grid_width = encoded.grid_width,
            grid_height = encoded.grid_height,
            color_count = encoded.color_count,
            block_size = encoded.block_size,
            "Encoded image to markup",
        );

        Ok(encoded)
    }

    /// Render a markup code to a PNG.
    ///
    /// Sends a JSON `POST /decode`. The returned payload may or may not
    /// carry a data-URI prefix; use [`DecodeResponse::preview`] to render it.
    pub async fn decode(&self, request: &DecodeRequest) -> Result<DecodeResponse, CodecApiError> {
        validate_scale(request.scale)?;
        validate_markup(&request.markup_code)?;

        let response = self
            .client
            .post(format!("{}/decode", self.api_url))
            .json(request)
            .send()
            .await?;

        let decoded: DecodeResponse = Self::parse_response(response).await?;

        tracing::info!(
            width = decoded.width,
            height = decoded.height,
            scale = request.scale,
            "Decoded markup to image",
        );

        Ok(decoded)
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse, CodecApiError> {
        let response = self
            .client
            .get(format!("{}/health", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`CodecApiError::ApiError`]
    /// carrying the status and the body's error message on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, CodecApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = extract_error_message(&body, FALLBACK_ERROR);
            tracing::warn!(status = status.as_u16(), error = %message, "Conversion service error");
            return Err(CodecApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CodecApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
