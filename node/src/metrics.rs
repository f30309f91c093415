//! # Prometheus Metrics
//!
//! Operational metrics for the redemption engine, scraped by Prometheus at
//! the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] under the
//! `fission` namespace so they never collide with a default global registry
//! consumer.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are internally ref-counted) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of successful redemptions.
    pub redemptions_total: IntCounter,
    /// Total number of rejected redemption attempts, all causes combined.
    pub redemption_failures_total: IntCounter,
    /// Warheads minted so far (mirrors the contract's supply counter).
    pub warheads_minted: IntGauge,
    /// Treasury balance in the smallest native unit.
    ///
    /// An i64 gauge cannot represent the full u128 range; it saturates in
    /// the (theoretical) overflow case rather than wrapping.
    pub treasury_balance: IntGauge,
    /// Histogram of end-to-end redemption handling latency in seconds.
    pub redemption_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("fission".into()), None)
            .expect("failed to create prometheus registry");

        let redemptions_total = IntCounter::new(
            "redemptions_total",
            "Total number of successful voucher redemptions",
        )
        .expect("metric creation");
        registry
            .register(Box::new(redemptions_total.clone()))
            .expect("metric registration");

        let redemption_failures_total = IntCounter::new(
            "redemption_failures_total",
            "Total number of rejected redemption attempts",
        )
        .expect("metric creation");
        registry
            .register(Box::new(redemption_failures_total.clone()))
            .expect("metric registration");

        let warheads_minted = IntGauge::new(
            "warheads_minted",
            "Number of warheads minted by this engine",
        )
        .expect("metric creation");
        registry
            .register(Box::new(warheads_minted.clone()))
            .expect("metric registration");

        let treasury_balance = IntGauge::new(
            "treasury_balance",
            "Unwithdrawn treasury balance in the smallest native unit",
        )
        .expect("metric creation");
        registry
            .register(Box::new(treasury_balance.clone()))
            .expect("metric registration");

        let redemption_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "redemption_latency_seconds",
                "End-to-end redemption handling latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(redemption_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            redemptions_total,
            redemption_failures_total,
            warheads_minted,
            treasury_balance,
            redemption_latency_seconds,
        }
    }

    /// Syncs the gauges from contract state. Called after every mutation so
    /// scrapes always see the latest counters.
    pub fn observe_contract(&self, minted: u64, treasury: u128) {
        self.warheads_minted.set(minted as i64);
        self.treasury_balance
            .set(i64::try_from(treasury).unwrap_or(i64::MAX));
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

/// Shared metrics state passed to axum handlers via state.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
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
