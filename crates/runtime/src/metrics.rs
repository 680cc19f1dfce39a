//! Metrics instrumentation for the orchestration loop.

use std::time::Instant;

/// Record completion API latency.
pub fn record_model_latency(duration_ms: f64) {
    metrics::histogram!("model_request_latency_ms", duration_ms);
}

/// Record the number of dispatch steps a turn used.
pub fn record_turn_steps(steps: usize) {
    metrics::histogram!("turn_steps", steps as f64);
}

/// RAII timer for model latency.
pub struct MetricTimer {
    start: Instant,
}

impl MetricTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MetricTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MetricTimer {
    fn drop(&mut self) {
        record_model_latency(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}
