//! Prometheus metrics collection for judgeprobe
//!
//! This module provides metrics instrumentation for tracking:
//! - Probe attempts by outcome
//! - Probe request latency
//! - Readiness polls against a spawned model server
//! - Judge requests by result
//!
//! judgeprobe is a one-shot tool, so metrics are rendered in Prometheus text
//! format at the end of a run (`--metrics` on `probe`, `judge` and `serve`)
//! instead of being served over HTTP.

use crate::probe::ProbeOutcome;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Judge call result for type-safe metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeCallResult {
    /// Response content received
    Success,
    /// Attempt failed and another attempt follows
    Retried,
    /// Attempt failed and no further attempt is made
    Failed,
}

impl JudgeCallResult {
    /// Convert to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgeCallResult::Success => "success",
            JudgeCallResult::Retried => "retried",
            JudgeCallResult::Failed => "failed",
        }
    }
}

/// Metrics collector for judgeprobe
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    probe_attempts: IntCounterVec,
    probe_duration: HistogramVec,
    readiness_polls: IntCounterVec,
    judge_requests: IntCounterVec,
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

        // Cardinality: 5 outcomes
        let probe_attempts = IntCounterVec::new(
            Opts::new(
                "judgeprobe_probe_attempts_total",
                "Total probe attempts by outcome",
            ),
            &["outcome"],
        )?;

        let probe_duration = HistogramVec::new(
            HistogramOpts::new(
                "judgeprobe_probe_duration_ms",
                "Probe request latency in milliseconds",
            )
            .buckets(vec![
                10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
            ]),
            &["outcome"],
        )?;

        let readiness_polls = IntCounterVec::new(
            Opts::new(
                "judgeprobe_readiness_polls_total",
                "Total readiness polls against the model server by result",
            ),
            &["ready"],
        )?;

        let judge_requests = IntCounterVec::new(
            Opts::new(
                "judgeprobe_judge_requests_total",
                "Total judge chat requests by result",
            ),
            &["result"],
        )?;

        registry.register(Box::new(probe_attempts.clone()))?;
        registry.register(Box::new(probe_duration.clone()))?;
        registry.register(Box::new(readiness_polls.clone()))?;
        registry.register(Box::new(judge_requests.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            probe_attempts,
            probe_duration,
            readiness_polls,
            judge_requests,
        })
    }

    /// Record one probe attempt
    pub fn record_probe_attempt(&self, outcome: ProbeOutcome, duration_ms: f64) {
        let label = outcome.as_str();
        self.probe_attempts.with_label_values(&[label]).inc();
        self.probe_duration
            .with_label_values(&[label])
            .observe(duration_ms);
    }

    /// Record one readiness poll
    pub fn record_readiness_poll(&self, ready: bool) {
        let label = if ready { "true" } else { "false" };
        self.readiness_polls.with_label_values(&[label]).inc();
    }

    /// Record one judge request attempt
    pub fn record_judge_request(&self, result: JudgeCallResult) {
        self.judge_requests
            .with_label_values(&[result.as_str()])
            .inc();
    }

    /// Number of probe attempts recorded with `outcome`
    pub fn probe_attempts(&self, outcome: ProbeOutcome) -> u64 {
        self.probe_attempts
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Render all metrics in Prometheus text exposition format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_registers() {
        let metrics = Metrics::new().expect("should create metrics");
        metrics.record_probe_attempt(ProbeOutcome::Success, 12.0);
        let text = metrics.gather().expect("should gather");
        assert!(text.contains("judgeprobe_probe_attempts_total"));
        assert!(text.contains("judgeprobe_probe_duration_ms"));
    }

    #[test]
    fn test_probe_attempts_counted_by_outcome() {
        let metrics = Metrics::new().unwrap();
        metrics.record_probe_attempt(ProbeOutcome::NotFound, 5.0);
        metrics.record_probe_attempt(ProbeOutcome::NotFound, 6.0);
        metrics.record_probe_attempt(ProbeOutcome::Unauthorized, 7.0);

        assert_eq!(metrics.probe_attempts(ProbeOutcome::NotFound), 2);
        assert_eq!(metrics.probe_attempts(ProbeOutcome::Unauthorized), 1);
        assert_eq!(metrics.probe_attempts(ProbeOutcome::Success), 0);
    }

    #[test]
    fn test_readiness_and_judge_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.record_readiness_poll(false);
        metrics.record_readiness_poll(true);
        metrics.record_judge_request(JudgeCallResult::Retried);

        let text = metrics.gather().unwrap();
        assert!(text.contains(r#"judgeprobe_readiness_polls_total{ready="false"} 1"#));
        assert!(text.contains(r#"judgeprobe_readiness_polls_total{ready="true"} 1"#));
        assert!(text.contains(r#"judgeprobe_judge_requests_total{result="retried"} 1"#));
    }
}
