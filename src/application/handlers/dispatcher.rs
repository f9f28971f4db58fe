use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    application::services::{
        rate_limiter::RateLimiter, renderer::Renderer, resolver::ChannelResolver,
        transport::ChannelTransport,
    },
    domain::{
        errors::TransportError,
        models::{AttemptOutcome, DeliveryAttempt, DeliveryResult, ListingEvent},
    },
};

/// Bounds the retry loop: attempts are capped and so is the backoff delay,
/// which caps time-to-terminal-result for any submission.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: base × 2^(attempt−1), capped at `max_delay`.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.max_delay)
    }
}

/// Adds up to 10% random jitter so retrying listings do not re-send in step.
fn with_jitter(delay: Duration) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.0..=0.1);
    delay + Duration::from_secs_f64(delay.as_secs_f64() * jitter)
}

/// Orchestrates render → resolve → rate-limit → send → retry for one listing.
///
/// Every collaborator is injected; the rate limiter is the only piece shared
/// with other in-flight deliveries. Retries for a given listing run strictly
/// in sequence, so the same submission is never in transit twice at once.
pub struct Dispatcher {
    renderer: Arc<dyn Renderer>,
    resolver: Arc<ChannelResolver>,
    limiter: Arc<RateLimiter>,
    transport: Arc<dyn ChannelTransport>,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        resolver: Arc<ChannelResolver>,
        limiter: Arc<RateLimiter>,
        transport: Arc<dyn ChannelTransport>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            renderer,
            resolver,
            limiter,
            transport,
            retry,
        }
    }

    /// Drives one listing to its terminal `DeliveryResult`. Always returns
    /// exactly one result; failures come back as values, never panics.
    pub async fn deliver(&self, listing: &ListingEvent) -> DeliveryResult {
        let rendered = match self.renderer.render(listing) {
            Ok(message) => message,
            Err(err) => {
                warn!(listing_id = %listing.id, error = %err, "render failed");
                return DeliveryResult::failed(listing.id.clone(), err.into(), 0);
            }
        };
        if rendered.truncated {
            debug!(listing_id = %listing.id, "message truncated to platform limits");
        }

        let target = match self.resolver.resolve(&listing.city_id) {
            Ok(target) => target.clone(),
            Err(err) => {
                warn!(listing_id = %listing.id, city_id = %listing.city_id, "no channel mapping");
                return DeliveryResult::failed(listing.id.clone(), err, 0);
            }
        };

        let mut attempts: Vec<DeliveryAttempt> = Vec::new();
        let mut attempt = 1u32;
        loop {
            self.limiter.acquire().await;
            match self.transport.send(&target, &rendered).await {
                Ok(message_ref) => {
                    attempts.push(DeliveryAttempt {
                        listing_id: listing.id.clone(),
                        number: attempt,
                        outcome: AttemptOutcome::Delivered(message_ref),
                        at: Utc::now(),
                    });
                    info!(
                        listing_id = %listing.id,
                        channel = %target.handle,
                        message_ref = message_ref.0,
                        attempts = attempts.len(),
                        "listing delivered"
                    );
                    return DeliveryResult::delivered(
                        listing.id.clone(),
                        message_ref,
                        target.handle.clone(),
                        attempt,
                    );
                }
                Err(err) => {
                    let detail = err.to_string();
                    attempts.push(DeliveryAttempt {
                        listing_id: listing.id.clone(),
                        number: attempt,
                        outcome: if err.is_retryable() {
                            AttemptOutcome::RetryableFailure {
                                detail: detail.clone(),
                            }
                        } else {
                            AttemptOutcome::FatalFailure {
                                detail: detail.clone(),
                            }
                        },
                        at: Utc::now(),
                    });

                    if !err.is_retryable() || attempt >= self.retry.max_attempts {
                        warn!(
                            listing_id = %listing.id,
                            attempts = attempts.len(),
                            error = %detail,
                            "delivery failed terminally"
                        );
                        return DeliveryResult::failed(listing.id.clone(), err.into(), attempt);
                    }

                    let mut delay = with_jitter(self.retry.backoff(attempt));
                    if let TransportError::RateLimited {
                        retry_after: Some(floor),
                        ..
                    } = &err
                    {
                        // Platform hint is a floor, never shortened by backoff.
                        delay = delay.max(*floor);
                    }
                    warn!(
                        listing_id = %listing.id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %detail,
                        "send failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        application::services::rate_limiter::RateLimiterConfig,
        domain::{
            errors::DeliveryError,
            models::{
                ChannelTarget, DeliveryOutcome, ListingLocation, ListingSpecs, MessageRef,
                OfferType, RenderedMessage,
            },
        },
        infrastructure::formatting::StandardFormatter,
    };

    fn listing(id: &str, city_id: &str) -> ListingEvent {
        ListingEvent {
            id: id.to_string(),
            city_id: city_id.to_string(),
            title: "2BR Apartment".to_string(),
            description: Some("Spacious, near the river".to_string()),
            price: 450_000.0,
            currency: "USD".to_string(),
            area: 120.0,
            location: ListingLocation {
                city_name: "Baghdad".to_string(),
                district_name: "Al-Mansour".to_string(),
                subdistrict_name: None,
            },
            category: "Residential".to_string(),
            subcategory: "Apartment".to_string(),
            offer_type: OfferType::Sell,
            photos: vec![],
            phone: None,
            url: "https://example.com/l/abc123".to_string(),
            specs: ListingSpecs::default(),
            received_at: Utc::now(),
        }
    }

    /// Fails with the scripted errors, then succeeds.
    struct ScriptedTransport {
        failures: std::sync::Mutex<Vec<TransportError>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn failing(failures: Vec<TransportError>) -> Self {
            Self {
                failures: std::sync::Mutex::new(failures),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelTransport for ScriptedTransport {
        async fn send(
            &self,
            _target: &ChannelTarget,
            _message: &RenderedMessage,
        ) -> Result<MessageRef, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                Ok(MessageRef(42))
            } else {
                Err(failures.remove(0))
            }
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn dispatcher(transport: Arc<ScriptedTransport>, max_attempts: u32) -> Dispatcher {
        let resolver = ChannelResolver::from_map(HashMap::from([(
            "1".to_string(),
            "@city_channel".to_string(),
        )]))
        .unwrap();
        Dispatcher::new(
            Arc::new(StandardFormatter::new()),
            Arc::new(resolver),
            Arc::new(RateLimiter::new(RateLimiterConfig {
                rate: 100,
                window: Duration::from_secs(1),
                burst: 100,
            })),
            transport,
            RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(100),
            },
        )
    }

    #[tokio::test]
    async fn delivers_on_first_attempt() {
        let transport = Arc::new(ScriptedTransport::failing(vec![]));
        let result = dispatcher(transport.clone(), 3).deliver(&listing("abc123", "1")).await;
        match result.outcome {
            DeliveryOutcome::Delivered {
                message_ref,
                channel,
                attempts,
            } => {
                assert_eq!(message_ref, MessageRef(42));
                assert_eq!(channel, "@city_channel");
                assert_eq!(attempts, 1);
            }
            other => panic!("expected delivered, got {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_until_success() {
        let transport = Arc::new(ScriptedTransport::failing(vec![
            TransportError::Transient("503".into()),
            TransportError::Transient("timeout".into()),
        ]));
        let result = dispatcher(transport.clone(), 3).deliver(&listing("abc123", "1")).await;
        assert!(result.is_delivered());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_fail_with_last_error() {
        let transport = Arc::new(ScriptedTransport::failing(vec![
            TransportError::Transient("a".into()),
            TransportError::Transient("b".into()),
            TransportError::Transient("c".into()),
        ]));
        let result = dispatcher(transport.clone(), 3).deliver(&listing("abc123", "1")).await;
        match result.outcome {
            DeliveryOutcome::Failed { error, attempts } => {
                assert_eq!(attempts, 3);
                assert!(error.to_string().contains('c'));
            }
            other => panic!("expected failed, got {other:?}"),
        }
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::failing(vec![TransportError::Fatal(
            "chat not found".into(),
        )]));
        let result = dispatcher(transport.clone(), 3).deliver(&listing("abc123", "1")).await;
        match result.outcome {
            DeliveryOutcome::Failed { attempts, .. } => assert_eq!(attempts, 1),
            other => panic!("expected failed, got {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn unmapped_city_fails_without_any_send() {
        let transport = Arc::new(ScriptedTransport::failing(vec![]));
        let result = dispatcher(transport.clone(), 3).deliver(&listing("abc123", "99")).await;
        match result.outcome {
            DeliveryOutcome::Failed { error, attempts } => {
                assert!(matches!(error, DeliveryError::UnknownCity(ref id) if id == "99"));
                assert_eq!(attempts, 0);
            }
            other => panic!("expected failed, got {other:?}"),
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn missing_title_fails_without_any_send() {
        let transport = Arc::new(ScriptedTransport::failing(vec![]));
        let mut event = listing("abc123", "1");
        event.title = "  ".to_string();
        let result = dispatcher(transport.clone(), 3).deliver(&event).await;
        match result.outcome {
            DeliveryOutcome::Failed { error, .. } => {
                assert!(matches!(error, DeliveryError::Render(_)));
            }
            other => panic!("expected failed, got {other:?}"),
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_waits_at_least_the_platform_hint() {
        let transport = Arc::new(ScriptedTransport::failing(vec![
            TransportError::RateLimited {
                retry_after: Some(Duration::from_secs(7)),
                detail: "429".into(),
            },
        ]));
        let start = tokio::time::Instant::now();
        let result = dispatcher(transport.clone(), 3).deliver(&listing("abc123", "1")).await;
        assert!(result.is_delivered());
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(5));
        assert_eq!(policy.backoff(40), Duration::from_secs(5));
    }
}
