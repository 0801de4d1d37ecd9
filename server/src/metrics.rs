//! # Prometheus Metrics
//!
//! Exposes operational counters for the wallet backend. Scraped by
//! Prometheus at `/metrics` on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the server.
///
/// Clone-friendly (prometheus handles are `Arc` internally) so it can be
/// shared across request handlers and the WebSocket tasks.
#[derive(Clone)]
pub struct ServerMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Transactions recorded through `POST /api/transactions`.
    pub transactions_created_total: IntCounter,
    /// Successful status changes through `PATCH /api/transactions/:id/status`.
    pub transaction_status_updates_total: IntCounter,
    /// Rewards credited through `POST /api/rewards`.
    pub rewards_created_total: IntCounter,
    /// Successful reward claims.
    pub rewards_claimed_total: IntCounter,
    /// Claims answered with 404 (unknown or already claimed).
    pub reward_claims_rejected_total: IntCounter,
    /// Transaction codes derived through `POST /api/generate-code`.
    pub codes_generated_total: IntCounter,
    /// Users registered through `POST /api/users`.
    pub users_created_total: IntCounter,
    /// Currently connected `/ws` subscribers.
    pub ws_subscribers: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let c = IntCounter::new(name, help).expect("metric creation");
    registry
        .register(Box::new(c.clone()))
        .expect("metric registration");
    c
}

impl ServerMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("xaro".into()), None)
            .expect("failed to create prometheus registry");

        let transactions_created_total = counter(
            &registry,
            "transactions_created_total",
            "Total number of transactions recorded",
        );
        let transaction_status_updates_total = counter(
            &registry,
            "transaction_status_updates_total",
            "Total number of transaction status changes applied",
        );
        let rewards_created_total = counter(
            &registry,
            "rewards_created_total",
            "Total number of rewards credited",
        );
        let rewards_claimed_total = counter(
            &registry,
            "rewards_claimed_total",
            "Total number of rewards claimed",
        );
        let reward_claims_rejected_total = counter(
            &registry,
            "reward_claims_rejected_total",
            "Total number of claims for unknown or already claimed rewards",
        );
        let codes_generated_total = counter(
            &registry,
            "codes_generated_total",
            "Total number of transaction codes generated",
        );
        let users_created_total = counter(
            &registry,
            "users_created_total",
            "Total number of users registered",
        );

        let ws_subscribers = IntGauge::new(
            "ws_subscribers",
            "Number of currently connected WebSocket subscribers",
        )
        .expect("metric creation");
        registry
            .register(Box::new(ws_subscribers.clone()))
            .expect("metric registration");

        Self {
            registry,
            transactions_created_total,
            transaction_status_updates_total,
            rewards_created_total,
            rewards_claimed_total,
            reward_claims_rejected_total,
            codes_generated_total,
            users_created_total,
            ws_subscribers,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<ServerMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_prefixed_counters() {
        let metrics = ServerMetrics::new();
        metrics.codes_generated_total.inc();
        metrics.codes_generated_total.inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains("xaro_codes_generated_total 2"));
        assert!(text.contains("xaro_rewards_claimed_total 0"));
        assert!(text.contains("xaro_ws_subscribers 0"));
    }
}
