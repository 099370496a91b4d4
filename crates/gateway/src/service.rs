//! Service seam used by the editor.

use async_trait::async_trait;

use crate::api::{GatewayApi, GatewayApiError};
use crate::messages::{EditRequest, EditResponse};

/// One stateless AI edit turn.
#[async_trait]
pub trait EditGateway: Send + Sync {
    async fn edit(&self, request: &EditRequest) -> Result<EditResponse, GatewayApiError>;
}

#[async_trait]
impl EditGateway for GatewayApi {
    async fn edit(&self, request: &EditRequest) -> Result<EditResponse, GatewayApiError> {
        GatewayApi::edit(self, request).await
    }
}
