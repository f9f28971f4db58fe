use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use listing_relay::{
    application::{
        handlers::{
            batch::BatchCoordinator,
            dispatcher::{Dispatcher, RetryPolicy},
            queue::SubmissionQueue,
        },
        services::{
            rate_limiter::{RateLimiter, RateLimiterConfig},
            renderer::Renderer,
            resolver::ChannelResolver,
            transport::ChannelTransport,
        },
    },
    config::{Config, FormatterKind},
    infrastructure::{
        formatting::{ArabicFormatter, StandardFormatter},
        messaging::TelegramTransport,
    },
    presentation::http::endpoints::{
        health::HealthEndpoints, root::ApiState, webhook::WebhookEndpoints,
    },
};
use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use tokio::main;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::try_parse().map_err(anyhow::Error::msg)?;

    let renderer: Arc<dyn Renderer> = match config.formatter {
        FormatterKind::Standard => Arc::new(StandardFormatter::new()),
        FormatterKind::Arabic => Arc::new(ArabicFormatter::new()),
    };
    let resolver = Arc::new(
        ChannelResolver::from_map(config.city_channels.clone())
            .context("invalid city-channel mapping")?,
    );
    info!(channels = resolver.len(), "channel table loaded");

    let limiter = Arc::new(RateLimiter::new(RateLimiterConfig {
        rate: config.rate_limit_per_window,
        window: Duration::from_secs(config.rate_limit_window_secs),
        burst: config.rate_limit_burst,
    }));
    let transport: Arc<dyn ChannelTransport> =
        Arc::new(TelegramTransport::new(config.bot_token.clone()));

    let dispatcher = Arc::new(Dispatcher::new(
        renderer,
        resolver,
        limiter,
        transport.clone(),
        RetryPolicy {
            max_attempts: config.retry_max_attempts,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        },
    ));
    let batch = Arc::new(BatchCoordinator::new(
        dispatcher.clone(),
        config.batch_parallelism,
    ));
    let (queue, worker_pool) =
        SubmissionQueue::start(dispatcher.clone(), config.queue_capacity, config.queue_workers);

    let state = Arc::new(ApiState {
        dispatcher,
        batch,
        queue,
        transport,
        api_key: config.webhook_api_key.clone(),
    });

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);
    info!(%server_url, "starting server");

    let api_service = OpenApiService::new(
        (
            WebhookEndpoints::new(state.clone()),
            HealthEndpoints::new(state.clone()),
        ),
        "Listing Relay API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("localhost:{}", config.port)))
        .run(app)
        .await
        .context("server stopped with an error")?;

    // Server stopped; close the queue and let the workers finish what is
    // still buffered.
    drop(state);
    worker_pool.drain().await;
    Ok(())
}
