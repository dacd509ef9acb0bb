use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Tool call counters for one server run
#[derive(Debug, Default)]
pub struct ToolCallMetrics {
    pub total_calls: AtomicU64,
    pub guidance_replies: AtomicU64,
    pub tool_errors: AtomicU64,
    pub protocol_errors: AtomicU64,
}

impl ToolCallMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// A sequencing deviation answered with guidance text
    pub fn record_guidance(&self) {
        self.guidance_replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tool_error(&self) {
        self.tool_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ToolCallStats {
        ToolCallStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            guidance_replies: self.guidance_replies.load(Ordering::Relaxed),
            tool_errors: self.tool_errors.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            total_calls = stats.total_calls,
            guidance_replies = stats.guidance_replies,
            tool_errors = stats.tool_errors,
            protocol_errors = stats.protocol_errors,
            "Tool call metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCallStats {
    pub total_calls: u64,
    pub guidance_replies: u64,
    pub tool_errors: u64,
    pub protocol_errors: u64,
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
