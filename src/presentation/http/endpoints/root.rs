use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::{
    handlers::{batch::BatchCoordinator, dispatcher::Dispatcher, queue::SubmissionQueue},
    services::transport::ChannelTransport,
};

pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
    pub batch: Arc<BatchCoordinator>,
    pub queue: SubmissionQueue,
    pub transport: Arc<dyn ChannelTransport>,
    pub api_key: String,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Webhooks,
}
