//! Tests for the metrics module.
#![cfg(feature = "metrics")]

use anyhow::Result;
use foldset::metrics::{CounterMetric, HistogramMetric, Metric, MetricsCollector};
use foldset::testing::{FakeRecordSource, record_fixture};
use foldset::{BuildConfig, BuildPipeline};
use serde_json::json;

#[test]
fn test_increment_counter() {
    let collector = MetricsCollector::new();
    collector.increment_counter("requests", 1);
    collector.increment_counter("requests", 5);

    assert_eq!(collector.counter("requests"), Some(6));
    assert_eq!(collector.counter("missing"), None);
}

#[test]
fn test_registered_counter() {
    let collector = MetricsCollector::new();
    let counter = CounterMetric::new("registered");
    counter.add(3);
    collector.register(Box::new(counter));

    assert_eq!(collector.to_json()["registered"]["value"], json!(3));
}

#[test]
fn test_histogram_stats() {
    let mut hist = HistogramMetric::new("lengths");
    for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
        hist.record(v);
    }
    let stats = hist.stats();
    assert_eq!(stats.count, 5);
    assert_eq!(stats.mean, 3.0);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 5.0);
    assert_eq!(stats.p50, 3.0);
    assert_eq!(hist.value()["count"], json!(5));
}

#[test]
fn test_empty_histogram() {
    let stats = HistogramMetric::new("empty").stats();
    assert_eq!(stats.count, 0);
    assert_eq!(stats.sum, 0.0);
}

#[test]
fn test_timing() {
    let collector = MetricsCollector::new();
    assert!(collector.elapsed().is_none());
    collector.record_start();
    collector.record_end();
    assert!(collector.elapsed().is_some());
    assert!(collector.to_json().get("execution_time_ms").is_some());
}

#[test]
fn test_clones_share_state() {
    let collector = MetricsCollector::new();
    let clone = collector.clone();
    clone.increment_counter("shared", 2);
    assert_eq!(collector.counter("shared"), Some(2));
}

#[test]
fn test_build_records_counters() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let metrics = MetricsCollector::new();
    let source = FakeRecordSource::new()
        .with_record(record_fixture("A1", &[10], None))
        .with_record(record_fixture("A2", &[20, 5], None))
        .with_record(record_fixture("EMPTY", &[], None))
        .with_content_error("BAD", "garbled");
    let config = BuildConfig::default()
        .with_identifiers(["A1", "A2", "EMPTY", "BAD", "GONE"])
        .with_concurrency(2)
        .with_metrics(metrics.clone())
        .with_save_path(tmp.path());

    BuildPipeline::new(source, config).run()?;

    assert_eq!(metrics.counter("records_requested"), Some(5));
    assert_eq!(metrics.counter("records_fetched"), Some(2));
    assert_eq!(metrics.counter("records_skipped"), Some(3));
    assert_eq!(metrics.counter("records_skipped_empty"), Some(1));
    assert_eq!(metrics.counter("records_skipped_content"), Some(1));
    assert_eq!(metrics.counter("records_skipped_request"), Some(1));
    assert!(metrics.elapsed().is_some());

    let summary = metrics.to_json();
    assert_eq!(summary["residues_per_record"]["value"]["count"], json!(2));
    assert_eq!(summary["residues_per_record"]["value"]["max"], json!(25.0));
    Ok(())
}

#[test]
fn test_save_to_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("metrics.json");
    let collector = MetricsCollector::new();
    collector.increment_counter("records_fetched", 7);

    collector.save_to_file(&path)?;

    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(saved["records_fetched"]["value"], json!(7));
    Ok(())
}
