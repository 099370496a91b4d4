//! Request and response bodies of the conversion service.
//!
//! Field names follow the service's wire format (`pxvg_code`,
//! `num_colors`, ...) and are renamed to domain names on the Rust side.

use pixci_core::preview::Preview;
use pixci_core::validation::DEFAULT_BLOCK_SIZE;
use serde::{Deserialize, Serialize};

/// Encoder hints sent alongside an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Edge length in source pixels of one markup pixel.
    pub block_size: u32,
    /// Let the service detect the block size, ignoring `block_size`.
    pub auto_detect: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            auto_detect: false,
        }
    }
}

/// A raw image to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeInput {
    /// Original file name; the service uses its extension to pick a decoder.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub options: EncodeOptions,
}

/// Response of `POST /encode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeResponse {
    #[serde(rename = "pxvg_code")]
    pub markup_code: String,
    /// Grid width in blocks.
    pub grid_width: u32,
    /// Grid height in blocks.
    pub grid_height: u32,
    #[serde(rename = "num_colors")]
    pub color_count: u32,
    /// Block size actually used (differs from the hint when auto-detected).
    pub block_size: u32,
}

/// Body of `POST /decode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeRequest {
    #[serde(rename = "pxvg_code")]
    pub markup_code: String,
    /// Output scale factor.
    pub scale: u32,
}

/// Response of `POST /decode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResponse {
    /// PNG payload, with or without a data-URI prefix.
    pub image_base64: String,
    pub width: u32,
    pub height: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
}

impl DecodeResponse {
    /// Classify the payload as an embeddable or raw preview.
    pub fn preview(&self) -> Preview {
        Preview::from_payload(self.image_base64.clone())
    }

    pub fn into_preview(self) -> Preview {
        Preview::from_payload(self.image_base64)
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
