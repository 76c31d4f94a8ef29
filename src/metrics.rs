//! Prometheus metrics collection for agrirelay
//!
//! This module provides metrics instrumentation for tracking:
//! - Chat requests by outcome
//! - Relayed fragments and dropped (malformed) upstream lines
//! - Mid-stream upstream failures and superseded sessions
//! - Crop predictions by the source of the answer
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Outcome of a `/chat` request, used as a metrics label
///
/// Restricting outcomes to an enum keeps label cardinality fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Upstream accepted the request and the relay started streaming
    Streamed,
    /// Request failed validation before contacting the upstream
    Rejected,
    /// Upstream unreachable or returned a non-success status
    Unavailable,
    /// Any other failure before streaming began
    Failed,
}

impl ChatOutcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatOutcome::Streamed => "streamed",
            ChatOutcome::Rejected => "rejected",
            ChatOutcome::Unavailable => "unavailable",
            ChatOutcome::Failed => "failed",
        }
    }
}

/// Where a crop prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    /// The configured classifier answered
    Model,
    /// The classifier failed and a fallback crop was chosen
    Fallback,
}

impl PredictionSource {
    /// Convert source to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSource::Model => "model",
            PredictionSource::Fallback => "fallback",
        }
    }
}

/// Metrics collector for agrirelay
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    chat_requests: IntCounterVec,
    relayed_fragments: IntCounter,
    malformed_lines: IntCounter,
    mid_stream_failures: IntCounter,
    superseded_sessions: IntCounter,
    crop_predictions: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 4 outcomes = 4 time series
        let chat_requests = IntCounterVec::new(
            Opts::new(
                "agrirelay_chat_requests_total",
                "Total number of chat requests by outcome",
            ),
            &["outcome"],
        )?;

        let relayed_fragments = IntCounter::with_opts(Opts::new(
            "agrirelay_relayed_fragments_total",
            "Total number of text fragments forwarded to chat callers",
        ))?;

        let malformed_lines = IntCounter::with_opts(Opts::new(
            "agrirelay_malformed_upstream_lines_total",
            "Total number of upstream NDJSON lines dropped because they did not parse",
        ))?;

        // Failures after the first byte reached the caller. The caller sees a
        // truncated body, so this counter is the only trace of them.
        let mid_stream_failures = IntCounter::with_opts(Opts::new(
            "agrirelay_mid_stream_failures_total",
            "Total number of upstream streams that failed after relaying began",
        ))?;

        let superseded_sessions = IntCounter::with_opts(Opts::new(
            "agrirelay_superseded_relays_total",
            "Total number of in-flight relays cancelled by a newer message in the same session",
        ))?;

        // Cardinality: 2 sources = 2 time series
        let crop_predictions = IntCounterVec::new(
            Opts::new(
                "agrirelay_crop_predictions_total",
                "Total number of crop predictions by source (model or fallback)",
            ),
            &["source"],
        )?;

        registry.register(Box::new(chat_requests.clone()))?;
        registry.register(Box::new(relayed_fragments.clone()))?;
        registry.register(Box::new(malformed_lines.clone()))?;
        registry.register(Box::new(mid_stream_failures.clone()))?;
        registry.register(Box::new(superseded_sessions.clone()))?;
        registry.register(Box::new(crop_predictions.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            chat_requests,
            relayed_fragments,
            malformed_lines,
            mid_stream_failures,
            superseded_sessions,
            crop_predictions,
        })
    }

    /// Record a chat request outcome
    pub fn chat_request(&self, outcome: ChatOutcome) {
        self.chat_requests
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Get the number of chat requests recorded with `outcome`
    pub fn chat_requests_count(&self, outcome: ChatOutcome) -> u64 {
        self.chat_requests
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Record one fragment forwarded to a caller
    pub fn relayed_fragment(&self) {
        self.relayed_fragments.inc();
    }

    /// Get the number of fragments forwarded since startup
    pub fn relayed_fragments_count(&self) -> u64 {
        self.relayed_fragments.get()
    }

    /// Record `count` upstream lines dropped as malformed
    pub fn malformed_lines(&self, count: u64) {
        self.malformed_lines.inc_by(count);
    }

    /// Get the number of malformed upstream lines since startup
    pub fn malformed_lines_count(&self) -> u64 {
        self.malformed_lines.get()
    }

    /// Record an upstream failure after relaying began
    pub fn mid_stream_failure(&self) {
        self.mid_stream_failures.inc();
    }

    /// Get the number of mid-stream failures since startup
    pub fn mid_stream_failures_count(&self) -> u64 {
        self.mid_stream_failures.get()
    }

    /// Record a relay cancelled by a newer request in the same session
    pub fn superseded_session(&self) {
        self.superseded_sessions.inc();
    }

    /// Get the number of superseded relays since startup
    pub fn superseded_sessions_count(&self) -> u64 {
        self.superseded_sessions.get()
    }

    /// Record a crop prediction by source
    pub fn crop_prediction(&self, source: PredictionSource) {
        self.crop_predictions
            .with_label_values(&[source.as_str()])
            .inc();
    }

    /// Get the number of crop predictions recorded with `source`
    pub fn crop_predictions_count(&self, source: PredictionSource) -> u64 {
        self.crop_predictions
            .with_label_values(&[source.as_str()])
            .get()
    }

    /// Gather all metrics and encode them in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        tracing::debug!(
            metric_family_count = metric_families.len(),
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}
