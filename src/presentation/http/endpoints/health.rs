use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use poem_openapi::{OpenApi, payload::Json};

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    responses::HealthResponseDto,
};

pub struct HealthEndpoints {
    state: Arc<ApiState>,
}

impl HealthEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl HealthEndpoints {
    /// Readiness: configuration loaded and the channel transport reachable.
    #[oai(path = "/health", method = "get", tag = EndpointsTags::Health)]
    pub async fn health(&self) -> Json<HealthResponseDto> {
        let mut checks = HashMap::new();
        checks.insert("configuration".to_string(), true);
        checks.insert(
            "channel_transport".to_string(),
            self.state.transport.health_check().await,
        );

        let all_healthy = checks.values().all(|ok| *ok);
        Json(HealthResponseDto {
            status: if all_healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}
