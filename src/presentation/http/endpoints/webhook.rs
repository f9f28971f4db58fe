use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Header, payload::Json};
use tracing::info;

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    mappers::{map_ack, map_listing, map_result},
    requests::{BatchWebhookRequestDto, ListingWebhookDto},
    responses::{BatchWebhookResponseDto, QueuedResponseDto, WebhookResponseDto},
    security::verify_api_key,
};

const MAX_BATCH_ITEMS: usize = 100;

pub struct WebhookEndpoints {
    state: Arc<ApiState>,
}

impl WebhookEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl WebhookEndpoints {
    /// Posts one listing to its city channel and waits for the terminal
    /// outcome.
    #[oai(path = "/webhook/listing", method = "post", tag = EndpointsTags::Webhooks)]
    pub async fn post_listing(
        &self,
        #[oai(name = "X-Api-Key")] api_key: Header<Option<String>>,
        request: Json<ListingWebhookDto>,
    ) -> PoemResult<Json<WebhookResponseDto>> {
        verify_api_key(api_key.0.as_deref(), &self.state.api_key)?;

        let listing = map_listing(request.0);
        info!(listing_id = %listing.id, city_id = %listing.city_id, "webhook received");

        let result = self.state.dispatcher.deliver(&listing).await;
        Ok(Json(map_result(&result)))
    }

    /// Accepts a listing for background delivery and returns immediately.
    #[oai(path = "/webhook/listing/async", method = "post", tag = EndpointsTags::Webhooks)]
    pub async fn post_listing_async(
        &self,
        #[oai(name = "X-Api-Key")] api_key: Header<Option<String>>,
        request: Json<ListingWebhookDto>,
    ) -> PoemResult<Json<QueuedResponseDto>> {
        verify_api_key(api_key.0.as_deref(), &self.state.api_key)?;

        let listing = map_listing(request.0);
        info!(listing_id = %listing.id, "queueing async webhook");

        let ack = self.state.queue.submit(listing).map_err(|err| {
            poem::Error::from_string(err.to_string(), poem::http::StatusCode::SERVICE_UNAVAILABLE)
        })?;
        Ok(Json(map_ack(&ack)))
    }

    /// Posts a whole batch; items are delivered independently and reported in
    /// input order.
    #[oai(path = "/webhook/listings", method = "post", tag = EndpointsTags::Webhooks)]
    pub async fn post_listings(
        &self,
        #[oai(name = "X-Api-Key")] api_key: Header<Option<String>>,
        request: Json<BatchWebhookRequestDto>,
    ) -> PoemResult<Json<BatchWebhookResponseDto>> {
        verify_api_key(api_key.0.as_deref(), &self.state.api_key)?;

        if request.listings.is_empty() {
            return Err(poem::Error::from_string(
                "listings array cannot be empty",
                poem::http::StatusCode::BAD_REQUEST,
            ));
        }
        if request.listings.len() > MAX_BATCH_ITEMS {
            return Err(poem::Error::from_string(
                format!("listings array cannot exceed {MAX_BATCH_ITEMS} items"),
                poem::http::StatusCode::BAD_REQUEST,
            ));
        }

        let listings: Vec<_> = request.0.listings.into_iter().map(map_listing).collect();
        info!(count = listings.len(), "batch webhook received");

        let batch = self.state.batch.deliver_batch(listings).await;
        Ok(Json(BatchWebhookResponseDto {
            total: batch.results.len() as u32,
            delivered: batch.delivered,
            failed: batch.failed,
            results: batch.results.iter().map(map_result).collect(),
        }))
    }
}
