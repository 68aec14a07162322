//! Prometheus metrics for scan monitoring.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Odds fetch latency metric name.
pub const METRIC_FETCH_LATENCY: &str = "odds_fetch_latency_ms";
/// Opportunity detection latency metric name.
pub const METRIC_DETECTION_LATENCY: &str = "opportunity_detection_latency_ms";
/// Scans counter metric name.
pub const METRIC_SCANS: &str = "scans_total";
/// Quotes ingested counter metric name.
pub const METRIC_QUOTES_INGESTED: &str = "quotes_ingested_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Feed failures counter metric name.
pub const METRIC_FEED_FAILURES: &str = "feed_failures_total";
/// Persistence failures counter metric name.
pub const METRIC_PERSISTENCE_FAILURES: &str = "persistence_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_FETCH_LATENCY,
        "Odds feed fetch latency in milliseconds"
    );
    describe_histogram!(
        METRIC_DETECTION_LATENCY,
        "Time to scan a quote snapshot for arbitrage in milliseconds"
    );

    describe_counter!(METRIC_SCANS, "Total number of completed scans");
    describe_counter!(METRIC_QUOTES_INGESTED, "Total number of quotes ingested");
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(METRIC_FEED_FAILURES, "Total number of failed feed fetches");
    describe_counter!(
        METRIC_PERSISTENCE_FAILURES,
        "Total number of failed store writes"
    );

    debug!("Metrics initialized");
}

/// Record odds fetch latency.
pub fn record_fetch_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_FETCH_LATENCY).record(latency_ms);
}

/// Record opportunity detection latency.
pub fn record_detection_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_DETECTION_LATENCY).record(latency_ms);
}

/// Increment the completed-scan counter.
pub fn inc_scans() {
    counter!(METRIC_SCANS).increment(1);
}

/// Add ingested quotes to the counter.
pub fn inc_quotes_ingested(count: u64) {
    counter!(METRIC_QUOTES_INGESTED).increment(count);
}

/// Increment the opportunities-detected counter.
pub fn inc_opportunities_detected() {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(1);
}

/// Increment the feed-failure counter.
pub fn inc_feed_failures() {
    counter!(METRIC_FEED_FAILURES).increment(1);
}

/// Increment the persistence-failure counter.
pub fn inc_persistence_failures() {
    counter!(METRIC_PERSISTENCE_FAILURES).increment(1);
}
