//! Metrics collection using Prometheus
//!
//! One registry per collector so tests and multiple app instances never
//! collide on metric names.

use anyhow::{anyhow, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Main metrics collector for the balancing service
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    /// Team splits handed out
    pub splits_generated_total: IntCounter,

    /// `|sum_a - sum_b|` of each chosen split
    pub split_rating_difference: Histogram,

    /// Finalize/cancel attempts by outcome
    pub match_transitions_total: IntCounterVec,

    /// Elo magnitude awarded per finalized match
    pub rating_delta_magnitude: Histogram,

    /// Account links, split by whether a rating was seeded
    pub players_linked_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let splits_generated_total = IntCounter::new(
            "squad_balancer_splits_generated_total",
            "Total team splits generated",
        )?;
        registry.register(Box::new(splits_generated_total.clone()))?;

        let split_rating_difference = Histogram::with_opts(
            HistogramOpts::new(
                "squad_balancer_split_rating_difference",
                "Rating sum difference of chosen splits",
            )
            .buckets(vec![0.0, 10.0, 25.0, 50.0, 100.0, 200.0, 400.0, 800.0]),
        )?;
        registry.register(Box::new(split_rating_difference.clone()))?;

        let match_transitions_total = IntCounterVec::new(
            Opts::new(
                "squad_balancer_match_transitions_total",
                "Match finalize and cancel attempts",
            ),
            &["transition", "outcome"],
        )?;
        registry.register(Box::new(match_transitions_total.clone()))?;

        let rating_delta_magnitude = Histogram::with_opts(
            HistogramOpts::new(
                "squad_balancer_rating_delta_magnitude",
                "Rating change awarded per finalized match",
            )
            .buckets(vec![0.0, 4.0, 8.0, 12.0, 16.0, 20.0, 24.0, 28.0, 32.0]),
        )?;
        registry.register(Box::new(rating_delta_magnitude.clone()))?;

        let players_linked_total = IntCounterVec::new(
            Opts::new("squad_balancer_players_linked_total", "Player account links"),
            &["seeded"],
        )?;
        registry.register(Box::new(players_linked_total.clone()))?;

        Ok(Self {
            registry,
            splits_generated_total,
            split_rating_difference,
            match_transitions_total,
            rating_delta_magnitude,
            players_linked_total,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_split(&self, diff: u64) {
        self.splits_generated_total.inc();
        self.split_rating_difference.observe(diff as f64);
    }

    /// Record a finalize attempt; `magnitude` is `None` when it was rejected
    pub fn record_finalize(&self, magnitude: Option<u32>) {
        let outcome = if magnitude.is_some() { "applied" } else { "rejected" };
        self.match_transitions_total
            .with_label_values(&["finalize", outcome])
            .inc();
        if let Some(magnitude) = magnitude {
            self.rating_delta_magnitude.observe(f64::from(magnitude));
        }
    }

    pub fn record_cancel(&self, applied: bool) {
        let outcome = if applied { "applied" } else { "rejected" };
        self.match_transitions_total
            .with_label_values(&["cancel", outcome])
            .inc();
    }

    pub fn record_link(&self, seeded: bool) {
        self.players_linked_total
            .with_label_values(&[if seeded { "true" } else { "false" }])
            .inc();
    }

    /// Encode all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        TextEncoder::new()
            .encode_to_string(&metric_families)
            .map_err(|e| anyhow!("Failed to encode metrics: {}", e))
    }

    /// Content type of [`MetricsCollector::render`] output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}
