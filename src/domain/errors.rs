use std::time::Duration;

use thiserror::Error;

/// Rendering failure: the listing is missing a field the formatter requires.
/// A data defect, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("listing is missing required field: {0}")]
    MissingField(&'static str),
}

/// Failure reported by the channel transport for one send attempt.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network or platform hiccup, expected to clear on retry.
    #[error("transient transport failure: {0}")]
    Transient(String),
    /// Platform rate limit. Retryable; `retry_after` is a floor on the next
    /// backoff delay when the platform provided one.
    #[error("rate limited by platform: {detail}")]
    RateLimited {
        retry_after: Option<Duration>,
        detail: String,
    },
    /// Retrying cannot help (bad request, revoked credentials, deleted channel).
    #[error("fatal transport failure: {0}")]
    Fatal(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Fatal(_))
    }
}

/// Terminal failure attached to a `DeliveryResult`.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("no channel configured for city {0}")]
    UnknownCity(String),
    /// Last transport error, after a fatal response or exhausted attempts.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DeliveryError {
    /// True for failures retrying could never fix.
    pub fn is_fatal(&self) -> bool {
        match self {
            DeliveryError::Render(_) | DeliveryError::UnknownCity(_) => true,
            DeliveryError::Transport(err) => !err.is_retryable(),
        }
    }
}

/// Synchronous rejection at the async submission boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission queue is full")]
pub struct QueueFull;

/// Configuration-time failure building the channel table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelTableError {
    #[error("invalid channel handle {handle:?} for city {city_id}")]
    InvalidHandle { city_id: String, handle: String },
}
