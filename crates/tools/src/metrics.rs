//! Dispatch instrumentation.

use std::time::Instant;

/// Count one finished dispatch by tool and outcome code.
pub fn record_dispatch(tool: &str, outcome: &'static str) {
    metrics::counter!("tool_dispatch_total", 1, "tool" => tool.to_string(), "outcome" => outcome);
}

/// Record wall time of one dispatch, gate included.
pub fn record_dispatch_latency(tool: &str, duration_ms: f64) {
    metrics::histogram!("tool_dispatch_latency_ms", duration_ms, "tool" => tool.to_string());
}

/// Records dispatch latency for `tool` when dropped.
pub struct DispatchTimer {
    start: Instant,
    tool: String,
}

impl DispatchTimer {
    pub fn new(tool: &str) -> Self {
        Self {
            start: Instant::now(),
            tool: tool.to_string(),
        }
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        record_dispatch_latency(&self.tool, self.start.elapsed().as_secs_f64() * 1000.0);
    }
}
