//! Build pipeline behaviour: skips, ordering, parallelism, cancellation.

use anyhow::Result;
use foldset::testing::{FakeRecordSource, record_fixture};
use foldset::{
    BuildConfig, BuildPipeline, CancellationToken, DatasetError, DatasetOptions, FetchError,
    MAX_COMPLEX_SIZE, RecordStore, SkipReason, StructureRecord, build_table, default_identifiers,
};
use foldset::io::ids::parse_identifiers;
use std::fs;
use std::path::Path;

fn source_with(ids: &[&str]) -> FakeRecordSource {
    ids.iter().enumerate().fold(FakeRecordSource::new(), |src, (i, id)| {
        src.with_record(record_fixture(id, &[10 + i, 4], Some(1.0 + i as f64 / 10.0)))
    })
}

#[test]
fn test_skips_failed_identifier() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let source = source_with(&["A1", "A2"]).with_content_error("BAD", "unparseable");
    let config = BuildConfig::default()
        .with_identifiers(["A1", "A2", "BAD"])
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source, config).run()?;

    assert_eq!(report.table.identifiers(), vec!["A1", "A2"]);
    assert_eq!(report.fetched(), 2);
    assert_eq!(
        report.skipped,
        vec![("BAD".to_string(), SkipReason::Content("unparseable".to_string()))]
    );
    assert_eq!(report.save_path, tmp.path());
    Ok(())
}

#[test]
fn test_request_errors_are_skipped() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let source = source_with(&["A1"]).with_request_error("DOWN", "503 service unavailable");
    let config = BuildConfig::default()
        .with_identifiers(["DOWN", "A1", "MISSING"])
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source, config).run()?;

    assert_eq!(report.table.identifiers(), vec!["A1"]);
    let labels: Vec<_> = report.skipped.iter().map(|(id, r)| (id.as_str(), r.label())).collect();
    assert_eq!(labels, vec![("DOWN", "request"), ("MISSING", "request")]);
    Ok(())
}

#[test]
fn test_empty_structure_is_skipped() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let source = source_with(&["A1"]).with_record(record_fixture("EMPTY", &[], None));
    let config = BuildConfig::default()
        .with_identifiers(["EMPTY", "A1"])
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source, config).run()?;

    assert_eq!(report.table.identifiers(), vec!["A1"]);
    assert_eq!(report.skipped, vec![("EMPTY".to_string(), SkipReason::EmptySequence)]);
    Ok(())
}

#[test]
fn test_oversized_complex_is_skipped() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let chains = vec![2; MAX_COMPLEX_SIZE + 1];
    let source = source_with(&["A1"]).with_record(record_fixture("HUGE", &chains, Some(3.0)));
    let config = BuildConfig::default()
        .with_identifiers(["A1", "HUGE"])
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source, config).run()?;

    assert_eq!(report.table.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "HUGE");
    assert!(matches!(report.skipped[0].1, SkipReason::Schema(_)));
    Ok(())
}

#[test]
fn test_exactly_max_chains_is_kept() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let chains = vec![1; MAX_COMPLEX_SIZE];
    let source = FakeRecordSource::new().with_record(record_fixture("FULL", &chains, None));
    let config = BuildConfig::default()
        .with_identifiers(["FULL"])
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source, config).run()?;

    let row = report.table.get(0).expect("one row");
    assert_eq!(row.num_chains(), MAX_COMPLEX_SIZE);
    assert_eq!(row.num_res_31, Some(1));
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<()> {
    let ids: Vec<String> = (0..40).map(|i| format!("P{i:03}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let run = |workers: usize| -> Result<_> {
        let tmp = tempfile::tempdir()?;
        let source = source_with(&id_refs)
            .with_content_error("P007", "bad")
            .with_request_error("P021", "timeout");
        let config = BuildConfig::default()
            .with_identifiers(ids.clone())
            .with_concurrency(workers)
            .with_save_path(tmp.path());
        let pipeline = BuildPipeline::new(source, config);
        let report = pipeline.run()?;
        assert_eq!(pipeline.source().calls(), 40);
        Ok(report)
    };

    let seq = run(1)?;
    let par = run(8)?;

    assert_eq!(seq.table.len(), 38);
    assert_eq!(par.table, seq.table);
    assert_eq!(par.skipped, seq.skipped);
    Ok(())
}

#[test]
fn test_records_persisted_under_save_path() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = BuildConfig::default()
        .with_identifiers(["A1", "A2"])
        .with_concurrency(2)
        .with_save_path(tmp.path());

    BuildPipeline::new(source_with(&["A1", "A2"]), config).run()?;

    let store = RecordStore::new(tmp.path());
    assert!(store.contains("A1"));
    assert!(store.contains("A2"));
    assert_eq!(store.load("A2")?.len(), 15);
    Ok(())
}

#[test]
fn test_table_persisted_and_reloaded() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = BuildConfig::default()
        .with_identifiers(["A1", "A2", "A3"])
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source_with(&["A1", "A2", "A3"]), config).run()?;

    let store = RecordStore::new(tmp.path());
    assert!(store.metadata_path().is_file());
    assert_eq!(store.load_table()?, report.table);
    Ok(())
}

#[test]
fn test_save_table_disabled() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = BuildConfig::default()
        .with_identifiers(["A1"])
        .with_save_table(false)
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source_with(&["A1"]), config).run()?;

    assert_eq!(report.table.len(), 1);
    assert!(!RecordStore::new(tmp.path()).metadata_path().exists());
    Ok(())
}

#[test]
fn test_duplicate_identifiers_collapse() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = BuildConfig::default()
        .with_identifiers(["A1", "A2", "A1"])
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source_with(&["A1", "A2"]), config).run()?;

    assert_eq!(report.table.identifiers(), vec!["A1", "A2"]);
    Ok(())
}

#[test]
fn test_cancel_before_start() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let token = CancellationToken::new();
    token.cancel();
    let config = BuildConfig::default()
        .with_identifiers(["A1", "A2"])
        .with_cancellation(token)
        .with_save_path(tmp.path());

    let pipeline = BuildPipeline::new(source_with(&["A1", "A2"]), config);
    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, DatasetError::Cancelled));
    assert_eq!(pipeline.source().calls(), 0);
    assert!(!RecordStore::new(tmp.path()).metadata_path().exists());
    Ok(())
}

#[test]
fn test_cancel_mid_build_keeps_saved_records() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let token = CancellationToken::new();
    let source = source_with(&["A1", "A3"]).with_cancel_on("A2", token.clone());
    let config = BuildConfig::default()
        .with_identifiers(["A1", "A2", "A3"])
        .with_cancellation(token)
        .with_save_path(tmp.path());

    let pipeline = BuildPipeline::new(source, config);
    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, DatasetError::Cancelled));
    assert_eq!(pipeline.source().attempted(), vec!["A1", "A2"]);
    let store = RecordStore::new(tmp.path());
    assert!(store.contains("A1"));
    assert!(!store.contains("A3"));
    assert!(!store.metadata_path().exists());
    Ok(())
}

#[test]
fn test_cancel_stops_parallel_build() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let token = CancellationToken::new();
    let ids: Vec<String> = (0..400).map(|i| format!("C{i:03}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let source = source_with(&id_refs).with_cancel_on("C010", token.clone());
    let config = BuildConfig::default()
        .with_identifiers(ids.clone())
        .with_concurrency(4)
        .with_cancellation(token)
        .with_save_path(tmp.path());

    let pipeline = BuildPipeline::new(source, config);
    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, DatasetError::Cancelled));
    // Workers stop fetching once the token fires.
    assert!(pipeline.source().calls() < ids.len());
    assert!(!RecordStore::new(tmp.path()).metadata_path().exists());
    Ok(())
}

#[test]
fn test_closure_source() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let source = |idcode: &str, _dest: &Path| -> Result<StructureRecord, FetchError> {
        if idcode.starts_with('X') {
            Err(FetchError::request(idcode, "unknown"))
        } else {
            Ok(record_fixture(idcode, &[3], None))
        }
    };
    let config = BuildConfig::default()
        .with_identifiers(["B1", "X1", "B2"])
        .with_save_table(false)
        .with_save_path(tmp.path());

    let report = BuildPipeline::new(source, config).run()?;

    assert_eq!(report.table.identifiers(), vec!["B1", "B2"]);
    assert_eq!(report.skipped.len(), 1);
    Ok(())
}

#[test]
fn test_identifier_list_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let list = tmp.path().join("ids.txt");
    fs::write(&list, "# two ids\na1\na2\n")?;
    let config = BuildConfig::default()
        .with_identifier_list(&list)
        .with_save_path(tmp.path().join("out"));

    let report = BuildPipeline::new(source_with(&["A1", "A2"]), config).run()?;

    assert_eq!(report.table.identifiers(), vec!["A1", "A2"]);
    assert!(tmp.path().join("out").is_dir());
    Ok(())
}

#[test]
fn test_missing_identifier_list() {
    let config = BuildConfig::default().with_identifier_list("/nonexistent/ids.txt");
    let err = BuildPipeline::new(FakeRecordSource::new(), config)
        .run()
        .unwrap_err();
    assert!(matches!(err, DatasetError::Storage { .. }));
}

#[test]
fn test_bundled_identifier_list() -> Result<()> {
    let ids = BuildConfig::default().resolve_identifiers()?;
    assert!(!ids.is_empty());
    assert_eq!(ids[0], "101M");
    assert!(ids.iter().any(|id| id == "4HHB"));
    assert_eq!(ids, default_identifiers());
    Ok(())
}

#[test]
fn test_bundled_list_is_compiled_in() -> Result<()> {
    let ids = BuildConfig::default().resolve_identifiers()?;
    assert_eq!(ids, parse_identifiers(include_str!("../data/pids_all.txt")));
    assert!(BuildConfig::default().identifier_list.is_none());
    Ok(())
}

#[test]
fn test_list_file_overrides_bundled_list() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let list = tmp.path().join("ids.txt");
    fs::write(&list, "z9\n")?;
    let ids = BuildConfig::default().with_identifier_list(&list).resolve_identifiers()?;
    assert_eq!(ids, vec!["Z9"]);
    Ok(())
}

#[cfg(feature = "progress")]
#[test]
fn test_progress_ticks_per_identifier() -> Result<()> {
    use indicatif::ProgressBar;

    let ids = ["P1", "P2", "P3", "P4", "P5"];
    for workers in [1, 3] {
        let tmp = tempfile::tempdir()?;
        let bar = ProgressBar::hidden();
        let source = source_with(&["P1", "P2", "P4", "P5"]);
        let config = BuildConfig::default()
            .with_identifiers(ids)
            .with_concurrency(workers)
            .with_save_path(tmp.path())
            .with_progress_bar(bar.clone());

        let report = BuildPipeline::new(source, config).run()?;

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(bar.length(), Some(ids.len() as u64));
        assert_eq!(bar.position(), ids.len() as u64, "workers = {workers}");
        assert!(bar.is_finished());
    }
    Ok(())
}

#[test]
fn test_build_table_helper() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let table = build_table(
        source_with(&["A1", "A2"]),
        vec!["A1".into(), "NOPE".into(), "A2".into()],
        3,
        tmp.path(),
    )?;
    assert_eq!(table.identifiers(), vec!["A1", "A2"]);
    Ok(())
}

#[test]
fn test_build_dataset_applies_options() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let source = FakeRecordSource::new()
        .with_record(record_fixture("LOW", &[10], Some(1.2)))
        .with_record(record_fixture("HIGH", &[10], Some(4.0)));
    let config = BuildConfig::default()
        .with_identifiers(["LOW", "HIGH"])
        .with_save_path(tmp.path());

    let dataset = BuildPipeline::new(source, config)
        .build_dataset(DatasetOptions::default().with_max_resolution(2.0))?;

    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.get(0)?.idcode, "LOW");
    Ok(())
}
