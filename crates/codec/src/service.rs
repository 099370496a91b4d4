//! Service seam used by the editor.
//!
//! The editor depends on [`ArtifactCodec`] rather than on [`CodecApi`]
//! directly so that alternative transports and in-memory fakes can stand
//! in for the HTTP client.

use async_trait::async_trait;

use crate::api::{CodecApi, CodecApiError};
use crate::messages::{DecodeRequest, DecodeResponse, EncodeInput, EncodeResponse};

/// Image <-> markup conversion.
#[async_trait]
pub trait ArtifactCodec: Send + Sync {
    async fn encode(&self, input: &EncodeInput) -> Result<EncodeResponse, CodecApiError>;

    async fn decode(&self, request: &DecodeRequest) -> Result<DecodeResponse, CodecApiError>;
}

#[async_trait]
impl ArtifactCodec for CodecApi {
    async fn encode(&self, input: &EncodeInput) -> Result<EncodeResponse, CodecApiError> {
        CodecApi::encode(self, input).await
    }

    async fn decode(&self, request: &DecodeRequest) -> Result<DecodeResponse, CodecApiError> {
        CodecApi::decode(self, request).await
    }
}
