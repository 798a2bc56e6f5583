//! Dashboard metrics definitions.

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for the dashboard.
#[derive(Clone)]
pub struct DashboardMetrics {
    pub writes_submitted: Counter<u64>,
    pub writes_failed: Counter<u64>,
    pub decode_fallbacks: Counter<u64>,
    pub events_presented: Counter<u64>,
    pub confirmation_latency_ms: Histogram<f64>,
}

impl DashboardMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            writes_submitted: meter
                .u64_counter("counterdash.writes_submitted")
                .with_description("Transactions accepted by the contract client")
                .build(),
            writes_failed: meter
                .u64_counter("counterdash.writes_failed")
                .with_description("Write actions that failed before or after submission")
                .build(),
            decode_fallbacks: meter
                .u64_counter("counterdash.decode_fallbacks")
                .with_description("Event values rendered as a placeholder instead of a number")
                .build(),
            events_presented: meter
                .u64_counter("counterdash.events_presented")
                .with_description("History entries handed to the view")
                .build(),
            confirmation_latency_ms: meter
                .f64_histogram("counterdash.confirmation_latency_ms")
                .with_description("Time from submission to receipt in milliseconds")
                .build(),
        }
    }

    /// Instruments on the process-wide meter provider.
    pub fn global() -> Self {
        Self::new(&global::meter("counterdash"))
    }

    pub fn record_submitted(&self, action: &str) {
        self.writes_submitted
            .add(1, &[KeyValue::new("action", action.to_string())]);
    }

    pub fn record_failed(&self, action: &str, stage: &str) {
        self.writes_failed.add(
            1,
            &[
                KeyValue::new("action", action.to_string()),
                KeyValue::new("stage", stage.to_string()),
            ],
        );
    }

    pub fn record_latency(&self, ms: f64, action: &str) {
        self.confirmation_latency_ms
            .record(ms, &[KeyValue::new("action", action.to_string())]);
    }

    pub fn record_presented(&self, event: &str, count: u64, fallbacks: u64) {
        if count > 0 {
            self.events_presented
                .add(count, &[KeyValue::new("event", event.to_string())]);
        }
        if fallbacks > 0 {
            self.decode_fallbacks.add(fallbacks, &[]);
        }
    }
}

impl std::fmt::Debug for DashboardMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_provider_is_noop() {
        let metrics = DashboardMetrics::global();
        metrics.record_submitted("increment");
        metrics.record_failed("reset", "submit");
        metrics.record_latency(12.5, "set");
        metrics.record_presented("CounterChanged", 3, 1);
    }
}
