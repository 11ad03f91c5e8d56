#![cfg(feature = "test-utils")]

use scrub::error::ErrorKind;
use scrub::filter::clean_records;
use scrub::pipeline::Pipeline;
use scrub::store::RecordStore;
use scrub::store::sqlite::SqliteRecordStore;
use scrub::test_utils::database::{
    TestDatabase, sample_records, scenario_records, sorted_by_row_id, spawn_sales_database,
};
use scrub::test_utils::store::TestStoreWrapper;
use scrub::types::{AgentId, SalesRecord};
use scrub_config::shared::{PipelineConfig, SqliteConnectionConfig};
use scrub_telemetry::tracing::init_test_tracing;

fn test_pipeline_config(source: SqliteConnectionConfig) -> PipelineConfig {
    PipelineConfig {
        id: rand::random(),
        source,
        fetch_latency_ms: 0,
        fetch_timeout_ms: None,
        max_concurrent_fetches: 8,
    }
}

/// Reads the clean table through a fresh store connection.
async fn read_clean_table(database: &TestDatabase) -> Vec<SalesRecord> {
    let store = SqliteRecordStore::new(database.config.clone());
    store.open().await.unwrap();
    let clean = store.read_clean().await.unwrap();
    store.close().await.unwrap();
    clean
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_writes_positive_non_prime_amounts() {
    init_test_tracing();

    let database = spawn_sales_database(&scenario_records()).await;
    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.rows_fetched, 4);
    assert_eq!(report.clean_rows_written, 3);

    let clean = read_clean_table(&database).await;
    let row_ids: Vec<i64> = clean.iter().map(|r| r.row_id).collect();
    // Row 1 has amount 7, which is prime.
    assert_eq!(row_ids, vec![2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_and_sequential_paths_are_equivalent() {
    init_test_tracing();

    let records = sample_records();
    let database = spawn_sales_database(&records).await;

    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);
    pipeline.run().await.unwrap();
    let concurrent_clean = read_clean_table(&database).await;

    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);
    pipeline.run_sequential().await.unwrap();
    let sequential_clean = read_clean_table(&database).await;

    let expected = sorted_by_row_id(clean_records(records));
    assert_eq!(sorted_by_row_id(concurrent_clean), expected);
    assert_eq!(sorted_by_row_id(sequential_clean), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_runs_are_idempotent() {
    init_test_tracing();

    let database = spawn_sales_database(&sample_records()).await;

    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);
    pipeline.run().await.unwrap();
    let first = read_clean_table(&database).await;

    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);
    pipeline.run().await.unwrap();
    let second = read_clean_table(&database).await;

    assert_eq!(sorted_by_row_id(first), sorted_by_row_id(second));
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_fetch_fails_the_run_and_still_closes_the_store() {
    init_test_tracing();

    let database = spawn_sales_database(&scenario_records()).await;

    // Populate the clean table so a later failed run has prior state to preserve.
    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);
    pipeline.run().await.unwrap();
    let before = read_clean_table(&database).await;

    let inner = SqliteRecordStore::new(database.config.clone());
    let wrapper = TestStoreWrapper::wrap(inner.clone());
    wrapper.fail_fetch_for(AgentId(20)).await;

    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), wrapper.clone());
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FetchFailed);
    assert_eq!(wrapper.open_calls().await, 1);
    assert_eq!(wrapper.close_calls().await, 1);
    assert!(!inner.is_open().await);

    // Partial results were discarded; nothing was written.
    let after = read_clean_table(&database).await;
    assert_eq!(sorted_by_row_id(before), sorted_by_row_id(after));
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_write_preserves_prior_clean_table() {
    init_test_tracing();

    let database = spawn_sales_database(&scenario_records()).await;

    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);
    pipeline.run().await.unwrap();
    let before = read_clean_table(&database).await;

    let wrapper = TestStoreWrapper::wrap(SqliteRecordStore::new(database.config.clone()));
    wrapper.fail_write().await;

    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), wrapper.clone());
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::WriteFailed);
    assert_eq!(wrapper.close_calls().await, 1);

    let after = read_clean_table(&database).await;
    assert_eq!(sorted_by_row_id(before), sorted_by_row_id(after));
}

#[tokio::test(flavor = "multi_thread")]
async fn cleanup_failure_does_not_mask_the_primary_error() {
    init_test_tracing();

    let database = spawn_sales_database(&scenario_records()).await;

    let wrapper = TestStoreWrapper::wrap(SqliteRecordStore::new(database.config.clone()));
    wrapper.fail_write().await;
    wrapper.fail_close().await;

    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), wrapper.clone());
    let err = pipeline.run().await.unwrap_err();

    // The write failure stays primary; the cleanup failure rides along.
    assert_eq!(err.kind(), ErrorKind::WriteFailed);
    assert_eq!(
        err.kinds(),
        vec![ErrorKind::WriteFailed, ErrorKind::CleanupFailed]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn cleanup_failure_alone_is_surfaced() {
    init_test_tracing();

    let database = spawn_sales_database(&scenario_records()).await;

    let wrapper = TestStoreWrapper::wrap(SqliteRecordStore::new(database.config.clone()));
    wrapper.fail_close().await;

    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), wrapper.clone());
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CleanupFailed);

    // The stages themselves succeeded, so the clean table was written.
    let clean = read_clean_table(&database).await;
    assert_eq!(clean.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_database_fails_without_cleanup() {
    init_test_tracing();

    let source = SqliteConnectionConfig {
        path: std::env::temp_dir().join("scrub_missing/does_not_exist.sqlite"),
        create_if_missing: false,
    };

    let wrapper = TestStoreWrapper::wrap(SqliteRecordStore::new(source.clone()));
    let mut pipeline = Pipeline::new(test_pipeline_config(source), wrapper.clone());
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
    // The pipeline never progressed past idle, so close was never attempted.
    assert_eq!(wrapper.close_calls().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_instance_runs_only_once() {
    init_test_tracing();

    let database = spawn_sales_database(&scenario_records()).await;
    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(test_pipeline_config(database.config.clone()), store);

    pipeline.run().await.unwrap();
    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test(flavor = "multi_thread")]
async fn simulated_latency_overlaps_across_partitions() {
    init_test_tracing();

    let database = spawn_sales_database(&sample_records()).await;

    let mut config = test_pipeline_config(database.config.clone());
    config.fetch_latency_ms = 40;

    let store = SqliteRecordStore::new(database.config.clone());
    let mut pipeline = Pipeline::new(config, store);
    let report = pipeline.run().await.unwrap();

    // Five partitions with a 40ms simulated wait each: overlapped waits
    // finish well under the 200ms a sequential gather would need.
    assert!(report.gather_elapsed.as_millis() < 200);
    assert_eq!(report.rows_fetched, 50);
}
