use async_trait::async_trait;

use crate::domain::{
    errors::TransportError,
    models::{ChannelTarget, MessageRef, RenderedMessage},
};

/// The one call the pipeline makes to the outside messaging platform.
///
/// Implementations classify every failure as `Transient`, `RateLimited`, or
/// `Fatal`; the dispatcher's retry policy is driven entirely by that
/// classification.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn send(
        &self,
        target: &ChannelTarget,
        message: &RenderedMessage,
    ) -> Result<MessageRef, TransportError>;

    /// Liveness probe for the readiness check.
    async fn health_check(&self) -> bool;
}
