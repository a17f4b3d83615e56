use std::path::Path;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

pub static PAGES_FETCHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "harvester_issue_pages_fetched_total",
        "Issue listing pages retrieved from the tracker"
    )
    .expect("harvester pages fetched")
});

pub static ISSUES_SEEN_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "harvester_issues_seen_total",
        "Issues returned by the tracker before label filtering"
    )
    .expect("harvester issues seen")
});

pub static ISSUES_MATCHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "harvester_issues_matched_total",
        "Issues whose first label matched the configured description"
    )
    .expect("harvester issues matched")
});

pub static PROFILES_FETCHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "harvester_profiles_fetched_total",
        "Author profiles retrieved, by profile source",
        &["source"]
    )
    .expect("harvester profiles fetched")
});

pub static REQUEST_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "harvester_request_failures_total",
        "Requests that failed in transport or returned a non-success status",
        &["op"]
    )
    .expect("harvester request failures")
});

pub static REQUEST_LATENCY_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "harvester_request_latency_seconds",
        "Latency of tracker requests",
        &["op"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("harvester request latency")
});

/// Dumps every registered metric in the Prometheus text format, for a
/// node-exporter textfile collector to pick up after the run.
pub fn write_text_exposition(path: impl AsRef<Path>) -> Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    std::fs::write(path, buffer)?;
    Ok(())
}
