use poem_openapi::Enum;

use crate::domain::models::{DeliveryOutcome, DeliveryResult, OfferType};
use crate::domain::errors::DeliveryError;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum OfferTypeKind {
    #[oai(rename = "SELL")]
    Sell,
    #[oai(rename = "RENT")]
    Rent,
    #[oai(rename = "CHALET")]
    Chalet,
}

impl Default for OfferTypeKind {
    fn default() -> Self {
        OfferTypeKind::Sell
    }
}

impl From<OfferTypeKind> for OfferType {
    fn from(value: OfferTypeKind) -> Self {
        match value {
            OfferTypeKind::Sell => OfferType::Sell,
            OfferTypeKind::Rent => OfferType::Rent,
            OfferTypeKind::Chalet => OfferType::Chalet,
        }
    }
}

/// Outcome vocabulary of the webhook responses, kept from the upstream API:
/// an unmapped city reports as `skipped`, every other terminal failure as
/// `failed`.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum WebhookStatusKind {
    #[oai(rename = "posted")]
    Posted,
    #[oai(rename = "skipped")]
    Skipped,
    #[oai(rename = "failed")]
    Failed,
    #[oai(rename = "queued")]
    Queued,
}

impl From<&DeliveryResult> for WebhookStatusKind {
    fn from(result: &DeliveryResult) -> Self {
        match &result.outcome {
            DeliveryOutcome::Delivered { .. } => WebhookStatusKind::Posted,
            DeliveryOutcome::Failed {
                error: DeliveryError::UnknownCity(_),
                ..
            } => WebhookStatusKind::Skipped,
            DeliveryOutcome::Failed { .. } => WebhookStatusKind::Failed,
        }
    }
}
