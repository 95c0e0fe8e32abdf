//! Output adapters: SQLite warehouse loader and CSV export.

use std::path::PathBuf;
use usagegen_core::{
    export::{write_csv, ATTRIBUTE_COLUMNS, CHURN_COLUMNS},
    generate,
    metrics::Metric,
    store::WarehouseStore,
    Dataset, GeneratorConfig,
};

fn dataset(seed: u64) -> Dataset {
    generate(&GeneratorConfig::default_test(), seed).expect("generation")
}

fn store() -> WarehouseStore {
    let store = WarehouseStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn scratch_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("usagegen-{tag}-{}", std::process::id()))
}

#[test]
fn load_dataset_stores_every_row() {
    let ds = dataset(42);
    let mut store = store();
    let run_id = store.insert_run(42, "0.1.0-test", "{}").expect("insert run");
    store.load_dataset(&run_id, &ds).expect("load");

    assert_eq!(store.attribute_row_count(&run_id).unwrap(), ds.attributes.len() as u64);
    assert_eq!(store.usage_row_count(&run_id).unwrap(), ds.usage.len() as u64);
    assert_eq!(store.churn_row_count(&run_id).unwrap(), ds.churn.len() as u64);
    assert_eq!(store.churned_count(&run_id).unwrap(), ds.churned_accounts() as u64);

    let run = store.run(&run_id).unwrap().expect("run row");
    assert_eq!(run.seed, 42);
    assert_eq!(run.version, "0.1.0-test");
}

#[test]
fn reloading_a_run_replaces_its_rows() {
    let ds = dataset(42);
    let mut store = store();
    let run_id = store.insert_run(42, "0.1.0-test", "{}").expect("insert run");
    store.load_dataset(&run_id, &ds).expect("first load");
    store.load_dataset(&run_id, &ds).expect("second load");
    assert_eq!(store.usage_row_count(&run_id).unwrap(), ds.usage.len() as u64);

    store.clear_run(&run_id).expect("clear");
    assert_eq!(store.usage_row_count(&run_id).unwrap(), 0);
    assert_eq!(store.attribute_row_count(&run_id).unwrap(), 0);
    assert!(store.run(&run_id).unwrap().is_some(), "run row survives clear");
}

#[test]
fn runs_are_isolated() {
    let mut store = store();
    let a = store.insert_run(1, "t", "{}").unwrap();
    let b = store.insert_run(2, "t", "{}").unwrap();
    assert_ne!(a, b);
    store.load_dataset(&a, &dataset(1)).unwrap();
    assert_eq!(store.usage_row_count(&b).unwrap(), 0);
}

#[test]
fn stored_usage_matches_generated_usage() {
    let ds = dataset(9);
    let mut store = store();
    let run_id = store.insert_run(9, "t", "{}").unwrap();
    store.load_dataset(&run_id, &ds).unwrap();

    let user_id = ds.churn[0].user_id;
    let generated: Vec<_> = ds.usage_for(user_id).collect();
    let stored = store.usage_for_user(&run_id, user_id).unwrap();
    assert_eq!(stored.len(), generated.len());
    for (s, g) in stored.iter().zip(generated) {
        assert_eq!(s.month, g.month.to_string());
        assert_eq!(s.phone_total_calls, g.metrics.count(Metric::PhoneTotalCalls));
        assert_eq!(s.total_minutes, g.metrics.minutes(Metric::PhoneTotalMinutesOfUse));
    }

    if let Some(churned) = ds.churn.iter().find(|c| c.churned) {
        let month = churned.churn_date.expect("date").to_string();
        let status = store.status_in_month(&run_id, churned.user_id, &month).unwrap();
        assert!(matches!(status.as_deref(), Some("Suspended") | Some("Closed")), "{status:?}");
    }
}

#[test]
fn file_backed_store_persists_between_connections() {
    let dir = scratch_dir("db");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("warehouse.db");
    let path = path.to_str().expect("utf-8 path");
    let ds = dataset(3);

    let run_id = {
        let mut store = WarehouseStore::open(path).unwrap();
        store.migrate().unwrap();
        let run_id = store.insert_run(3, "t", "{}").unwrap();
        store.load_dataset(&run_id, &ds).unwrap();
        run_id
    };
    let reopened = WarehouseStore::open(path).unwrap();
    reopened.migrate().unwrap();
    assert_eq!(reopened.churn_row_count(&run_id).unwrap(), ds.churn.len() as u64);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn csv_export_writes_three_files_with_headers() {
    let ds = dataset(42);
    let dir = scratch_dir("csv");
    let files = write_csv(&dir, &ds).expect("export");

    let mut attributes = csv::Reader::from_path(&files.attributes).unwrap();
    let headers: Vec<String> = attributes.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, ATTRIBUTE_COLUMNS);
    assert_eq!(attributes.records().count(), ds.attributes.len());

    let mut usage = csv::Reader::from_path(&files.usage).unwrap();
    let headers: Vec<String> = usage.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers[..2], ["USERID", "MONTH"]);
    assert_eq!(headers.len(), 2 + Metric::ALL.len());
    assert_eq!(headers[2], "PHONE_TOTAL_CALLS");
    let first = usage.records().next().expect("a row").unwrap();
    assert_eq!(&first[0], ds.usage[0].user_id.to_string());
    assert_eq!(&first[1], ds.usage[0].month.to_string());

    let mut churn = csv::Reader::from_path(&files.churn).unwrap();
    let headers: Vec<String> = churn.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, CHURN_COLUMNS);
    let rows: Vec<csv::StringRecord> = churn.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), ds.churn.len());
    for (row, record) in rows.iter().zip(&ds.churn) {
        assert_eq!(&row[2], if record.churned { "1" } else { "0" });
        assert_eq!(row[1].is_empty(), !record.churned);
    }

    std::fs::remove_dir_all(&dir).ok();
}
