mod delivery;
mod listing;

pub use delivery::{
    AttemptOutcome, BatchResult, ChannelTarget, DeliveryAttempt, DeliveryOutcome, DeliveryResult,
    MessageRef, RenderedMessage, SubmissionAck,
};
pub use listing::{ListingEvent, ListingLocation, ListingSpecs, OfferType};
