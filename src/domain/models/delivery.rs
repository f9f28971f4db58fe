use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DeliveryError;

/// A message derived from a `ListingEvent`, ready for the channel transport.
///
/// Rendering is deterministic: the same listing always produces a byte-identical
/// `RenderedMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    /// HTML-formatted body, within the platform size limit for its shape
    /// (message text, or caption when photos are attached).
    pub text: String,
    /// Ordered photo URLs, capped at the platform attachment limit.
    pub photos: Vec<String>,
    /// Set when the body or photo list had to be cut to fit. Non-fatal.
    pub truncated: bool,
}

/// A validated destination channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTarget {
    /// `@name` handle or numeric chat id, as the platform accepts it.
    pub handle: String,
}

/// Reference assigned by the platform to a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef(pub i64);

/// Outcome of a single transport attempt, kept only for the retry loop.
#[derive(Debug, Clone)]
pub struct DeliveryAttempt {
    pub listing_id: String,
    /// Starts at 1.
    pub number: u32,
    pub outcome: AttemptOutcome,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Delivered(MessageRef),
    RetryableFailure { detail: String },
    FatalFailure { detail: String },
}

/// Terminal outcome for one listing submission. Exactly one per submission.
#[derive(Debug)]
pub struct DeliveryResult {
    pub listing_id: String,
    pub outcome: DeliveryOutcome,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered {
        message_ref: MessageRef,
        channel: String,
        attempts: u32,
    },
    Failed {
        error: DeliveryError,
        attempts: u32,
    },
}

impl DeliveryResult {
    pub fn delivered(
        listing_id: String,
        message_ref: MessageRef,
        channel: String,
        attempts: u32,
    ) -> Self {
        Self {
            listing_id,
            outcome: DeliveryOutcome::Delivered {
                message_ref,
                channel,
                attempts,
            },
            finished_at: Utc::now(),
        }
    }

    pub fn failed(listing_id: String, error: DeliveryError, attempts: u32) -> Self {
        Self {
            listing_id,
            outcome: DeliveryOutcome::Failed { error, attempts },
            finished_at: Utc::now(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered { .. })
    }
}

/// Per-item outcomes of a batch submission, in input order.
#[derive(Debug)]
pub struct BatchResult {
    pub results: Vec<DeliveryResult>,
    pub delivered: u32,
    pub failed: u32,
}

impl BatchResult {
    pub fn from_results(results: Vec<DeliveryResult>) -> Self {
        let delivered = results.iter().filter(|r| r.is_delivered()).count() as u32;
        let failed = results.len() as u32 - delivered;
        Self {
            results,
            delivered,
            failed,
        }
    }
}

/// Acknowledgement returned by the async submission path before delivery runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub submission_id: uuid::Uuid,
    pub listing_id: String,
    pub accepted_at: DateTime<Utc>,
}
