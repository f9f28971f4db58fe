use chrono::Utc;

use crate::{
    domain::models::{
        DeliveryOutcome, DeliveryResult, ListingEvent, ListingLocation, ListingSpecs,
        SubmissionAck,
    },
    presentation::{
        http::{
            requests::ListingWebhookDto,
            responses::{QueuedResponseDto, WebhookResponseDto},
        },
        models::WebhookStatusKind,
    },
};

pub fn map_listing(dto: ListingWebhookDto) -> ListingEvent {
    ListingEvent {
        id: dto.id,
        city_id: dto.city_id.to_string(),
        title: dto.title,
        description: dto.description,
        price: dto.price,
        currency: dto.currency,
        area: dto.area,
        location: ListingLocation {
            city_name: dto.city_name,
            district_name: dto.district_name,
            subdistrict_name: dto.subdistrict_name,
        },
        category: dto.category,
        subcategory: dto.subcategory,
        offer_type: dto.offer_type.into(),
        photos: dto.images,
        phone: dto.phone,
        url: dto.url,
        specs: ListingSpecs {
            bedrooms: dto.bedrooms,
            bathrooms: dto.bathrooms,
            floors: dto.floors,
            age_years: dto.age,
            frontage_width: dto.frontage_width,
            frontage_depth: dto.frontage_depth,
        },
        received_at: Utc::now(),
    }
}

pub fn map_result(result: &DeliveryResult) -> WebhookResponseDto {
    let status = WebhookStatusKind::from(result);
    match &result.outcome {
        DeliveryOutcome::Delivered {
            message_ref,
            channel,
            attempts,
        } => WebhookResponseDto {
            status,
            message: Some("Successfully posted to channel".to_string()),
            message_id: Some(message_ref.0),
            channel_id: Some(channel.clone()),
            attempts: *attempts,
            timestamp: result.finished_at.to_rfc3339(),
        },
        DeliveryOutcome::Failed { error, attempts } => WebhookResponseDto {
            status,
            // Error detail preserved verbatim so callers can retry out-of-band.
            message: Some(error.to_string()),
            message_id: None,
            channel_id: None,
            attempts: *attempts,
            timestamp: result.finished_at.to_rfc3339(),
        },
    }
}

pub fn map_ack(ack: &SubmissionAck) -> QueuedResponseDto {
    QueuedResponseDto {
        status: WebhookStatusKind::Queued,
        submission_id: ack.submission_id,
        listing_id: ack.listing_id.clone(),
        accepted_at: ack.accepted_at.to_rfc3339(),
    }
}
