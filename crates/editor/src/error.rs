use pixci_codec::api::CodecApiError;
use pixci_core::error::CoreError;
use pixci_gateway::api::GatewayApiError;

/// A failed call to one of the external services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Codec(#[from] CodecApiError),

    #[error(transparent)]
    Gateway(#[from] GatewayApiError),

    #[error("The AI edit returned no artifact codes")]
    EmptyEdit,

    /// A first edit must return one code per submitted code, in order.
    #[error("The AI edit returned {edited} artifact codes for {submitted} submitted images")]
    EditCountMismatch { submitted: usize, edited: usize },
}

/// Errors surfaced by [`EditorCoordinator`](crate::coordinator::EditorCoordinator).
///
/// Every variant leaves the history and the current pointer as they were
/// before the failed operation.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// A precondition failed; nothing was sent to any service.
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Only part of the edited batch could be decoded.
    #[error("Decoded {decoded} of {edited} edited images: {reason}")]
    DecodeMismatch {
        edited: usize,
        decoded: usize,
        reason: String,
    },

    #[error("An edit is already in progress")]
    ConcurrentEdit,

    /// The history was reset, replaced or moved while the operation was
    /// waiting on a service.
    #[error("The history changed before the operation finished; its result was discarded")]
    Discarded,
}

impl EditorError {
    /// `true` for failures of the external services, including partial
    /// decode batches.
    pub fn is_service_error(&self) -> bool {
        matches!(self, Self::Service(_) | Self::DecodeMismatch { .. })
    }
}

impl From<CodecApiError> for EditorError {
    fn from(err: CodecApiError) -> Self {
        Self::Service(err.into())
    }
}

impl From<GatewayApiError> for EditorError {
    fn from(err: GatewayApiError) -> Self {
        Self::Service(err.into())
    }
}
