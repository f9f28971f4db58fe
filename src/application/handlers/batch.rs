use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::{
    application::handlers::dispatcher::Dispatcher,
    domain::{
        errors::TransportError,
        models::{BatchResult, DeliveryResult, ListingEvent},
    },
};

/// Fans a batch out through the dispatcher with bounded parallelism.
///
/// Results come back in input order regardless of completion order, and one
/// item's failure never touches the others: there is no all-or-nothing
/// semantics here, only per-item outcomes.
pub struct BatchCoordinator {
    dispatcher: Arc<Dispatcher>,
    parallelism: usize,
}

impl BatchCoordinator {
    pub fn new(dispatcher: Arc<Dispatcher>, parallelism: usize) -> Self {
        Self {
            dispatcher,
            parallelism: parallelism.max(1),
        }
    }

    pub async fn deliver_batch(&self, listings: Vec<ListingEvent>) -> BatchResult {
        let total = listings.len();
        let ids: Vec<String> = listings.iter().map(|l| l.id.clone()).collect();
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut tasks = JoinSet::new();

        for (index, listing) in listings.into_iter().enumerate() {
            let dispatcher = self.dispatcher.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                // Holding the permit for the whole delivery bounds how many
                // retry timelines run at once, not just how many sends.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("batch semaphore closed");
                (index, dispatcher.deliver(&listing).await)
            });
        }

        let mut slots: Vec<Option<DeliveryResult>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(err) => error!(error = %err, "batch delivery task failed"),
            }
        }

        // A slot can only stay empty if its task panicked; still report one
        // result per input item.
        let results: Vec<DeliveryResult> = slots
            .into_iter()
            .zip(ids)
            .map(|(slot, id)| {
                slot.unwrap_or_else(|| {
                    DeliveryResult::failed(
                        id,
                        TransportError::Fatal("delivery task aborted".into()).into(),
                        0,
                    )
                })
            })
            .collect();
        let batch = BatchResult::from_results(results);
        info!(
            total,
            delivered = batch.delivered,
            failed = batch.failed,
            "batch finished"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::{
        application::{
            handlers::dispatcher::RetryPolicy,
            services::{
                rate_limiter::{RateLimiter, RateLimiterConfig},
                resolver::ChannelResolver,
                transport::ChannelTransport,
            },
        },
        domain::{
            errors::TransportError,
            models::{
                ChannelTarget, DeliveryOutcome, ListingEvent, ListingLocation, ListingSpecs,
                MessageRef, OfferType, RenderedMessage,
            },
        },
        infrastructure::formatting::StandardFormatter,
    };

    fn listing(id: &str) -> ListingEvent {
        ListingEvent {
            id: id.to_string(),
            city_id: "1".to_string(),
            title: format!("Listing {id}"),
            description: None,
            price: 1000.0,
            currency: "USD".to_string(),
            area: 80.0,
            location: ListingLocation {
                city_name: "Baghdad".to_string(),
                district_name: "Karrada".to_string(),
                subdistrict_name: None,
            },
            category: "Residential".to_string(),
            subcategory: "Apartment".to_string(),
            offer_type: OfferType::Rent,
            photos: vec![],
            phone: None,
            url: format!("https://example.com/l/{id}"),
            specs: ListingSpecs::default(),
            received_at: Utc::now(),
        }
    }

    /// Fails every send whose message text names the poisoned listing.
    struct PoisonedTransport {
        poisoned: String,
        in_flight: AtomicU32,
        max_in_flight: AtomicU32,
    }

    #[async_trait]
    impl ChannelTransport for PoisonedTransport {
        async fn send(
            &self,
            _target: &ChannelTarget,
            message: &RenderedMessage,
        ) -> Result<MessageRef, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if message.text.contains(&self.poisoned) {
                Err(TransportError::Fatal("chat not found".into()))
            } else {
                Ok(MessageRef(7))
            }
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn coordinator(transport: Arc<PoisonedTransport>, parallelism: usize) -> BatchCoordinator {
        let resolver = ChannelResolver::from_map(HashMap::from([(
            "1".to_string(),
            "@city_channel".to_string(),
        )]))
        .unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(StandardFormatter::new()),
            Arc::new(resolver),
            Arc::new(RateLimiter::new(RateLimiterConfig {
                rate: 1000,
                window: Duration::from_secs(1),
                burst: 1000,
            })),
            transport,
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(10),
            },
        );
        BatchCoordinator::new(Arc::new(dispatcher), parallelism)
    }

    #[tokio::test]
    async fn one_failing_item_does_not_abort_the_rest() {
        let transport = Arc::new(PoisonedTransport {
            poisoned: "Listing item-3".to_string(),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
        });
        let listings: Vec<ListingEvent> =
            (0..10).map(|i| listing(&format!("item-{i}"))).collect();

        let batch = coordinator(transport, 4).deliver_batch(listings).await;

        assert_eq!(batch.results.len(), 10);
        assert_eq!(batch.delivered, 9);
        assert_eq!(batch.failed, 1);
        // Input order is preserved, matched by listing id.
        for (i, result) in batch.results.iter().enumerate() {
            assert_eq!(result.listing_id, format!("item-{i}"));
        }
        assert!(matches!(
            batch.results[3].outcome,
            DeliveryOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn parallelism_bound_is_honored() {
        let transport = Arc::new(PoisonedTransport {
            poisoned: "none".to_string(),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
        });
        let listings: Vec<ListingEvent> =
            (0..20).map(|i| listing(&format!("x{i}"))).collect();

        let batch = coordinator(transport.clone(), 3).deliver_batch(listings).await;

        assert_eq!(batch.delivered, 20);
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_result() {
        let transport = Arc::new(PoisonedTransport {
            poisoned: "none".to_string(),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
        });
        let batch = coordinator(transport, 2).deliver_batch(vec![]).await;
        assert!(batch.results.is_empty());
        assert_eq!(batch.delivered, 0);
        assert_eq!(batch.failed, 0);
    }
}
