//! Prometheus metrics for termacls.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Decision counter by operation and outcome (allow, deny, error).
pub static DECISIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "termacls_decisions_total",
        "Total number of authorization decisions",
        &["operation", "outcome"]
    )
    .expect("Failed to register decisions_total")
});

/// Store query duration histogram.
pub static STORE_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "termacls_store_query_duration_seconds",
        "Store query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register store_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DECISIONS_TOTAL);
    Lazy::force(&STORE_QUERY_DURATION);
}

/// Record the outcome of a boolean decision.
pub fn record_decision<E>(operation: &str, result: &Result<bool, E>) {
    let outcome = match result {
        Ok(true) => "allow",
        Ok(false) => "deny",
        Err(_) => "error",
    };
    DECISIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decision_outcomes() {
        init_metrics();
        let before = DECISIONS_TOTAL
            .with_label_values(&["metrics_test", "deny"])
            .get();

        record_decision::<()>("metrics_test", &Ok(false));
        record_decision::<()>("metrics_test", &Ok(true));
        record_decision("metrics_test", &Err(()));

        assert_eq!(
            DECISIONS_TOTAL
                .with_label_values(&["metrics_test", "deny"])
                .get(),
            before + 1.0
        );
        assert!(get_metrics().contains("termacls_decisions_total"));
    }
}
