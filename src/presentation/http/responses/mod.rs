use std::collections::HashMap;

use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::WebhookStatusKind;

#[derive(Object)]
pub struct WebhookResponseDto {
    pub status: WebhookStatusKind,
    pub message: Option<String>,
    /// Platform message reference when posted.
    pub message_id: Option<i64>,
    pub channel_id: Option<String>,
    pub attempts: u32,
    pub timestamp: String,
}

#[derive(Object)]
pub struct BatchWebhookResponseDto {
    pub results: Vec<WebhookResponseDto>,
    pub total: u32,
    pub delivered: u32,
    pub failed: u32,
}

#[derive(Object)]
pub struct QueuedResponseDto {
    pub status: WebhookStatusKind,
    pub submission_id: Uuid,
    pub listing_id: String,
    pub accepted_at: String,
}

#[derive(Object)]
pub struct HealthResponseDto {
    pub status: String,
    pub version: String,
    pub checks: HashMap<String, bool>,
    pub timestamp: String,
}
