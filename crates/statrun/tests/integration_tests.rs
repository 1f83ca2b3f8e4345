//! End-to-end runs through the default orchestrator.
//!
//! Every test writes into its own temporary results root.

use serde_json::{json, Value};
use statrun::{
    Applicability, ComputationUnit, Computed, EngineConfig, Orchestrator, Params, Record,
    StatrunError, UnitError, UnitInput,
};
use std::path::Path;
use std::time::Duration;

fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

fn orchestrator(root: &Path) -> Orchestrator {
    statrun::default_orchestrator(EngineConfig::default().with_results_root(root))
}

// =============================================================================
// Methods
// =============================================================================

#[tokio::test]
async fn test_mean_and_unknown_method() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = Record::new("ds1", 1)
        .with_data(json!([2, 4, 6, 8]))
        .with_method("mean", Params::new())
        .with_method("unknown_stat", Params::new());

    orchestrator(dir.path()).handle(&mut record).await.unwrap();

    assert_eq!(record.results.len(), 2);
    assert!(record.results[0].ok);
    assert_eq!(record.results[0].value, json!(5.0));
    assert!(!record.results[1].ok);
    assert_eq!(
        record.results[1].error.as_deref(),
        Some("Method unknown_stat not found.")
    );
    assert_eq!(record.results[1].value, Value::Null);
}

#[tokio::test]
async fn test_chi_squared_unequal_sums_is_an_error_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = Record::new("ds1", 1)
        .with_data(json!([[1, 2], [1, 3]]))
        .with_method("chi_squared", Params::new());

    orchestrator(dir.path()).handle(&mut record).await.unwrap();

    let entry = &record.results[0];
    assert!(!entry.ok);
    assert_eq!(entry.value, Value::Null);
    assert!(entry.error.as_deref().unwrap().contains("same sum"));
}

#[tokio::test]
async fn test_full_catalogue_on_keyed_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut record: Record = serde_json::from_value(json!({
        "dataset_id": "survey",
        "dataset_version": 3,
        "metadata": [],
        "selection": {"rows": [[0, 4]], "cols": [0]},
        "methods": [
            "median",
            {"id": "std_dev", "params": {}},
            {"id": "percentiles", "params": {"p": [50]}},
            "spearman",
            "binomial"
        ],
        "data": {
            "median": [3, 1, 2],
            "std_dev": [2, 4, 6, 8],
            "percentiles": [1, 2, 3, 4],
            "spearman": [[1, 2, 3, 4, 5], [5, 6, 7, 8, 7]],
            "binomial": [4, 0.5, 0, null]
        }
    }))
    .unwrap();

    orchestrator(dir.path()).handle(&mut record).await.unwrap();

    let ids: Vec<&str> = record.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["median", "std_dev", "percentiles", "spearman", "binomial"]);
    assert!(record.results.iter().all(|r| r.ok), "{:#?}", record.results);
    assert_eq!(record.results[0].value, json!(2.0));
    assert_eq!(record.results[2].value, json!([2.5]));
    assert_eq!(record.results[4].value["k"], json!([0, 1, 2, 3, 4]));
    assert!(record.summary_text.starts_with("median: 2.0"));
}

#[tokio::test]
async fn test_non_numeric_cells_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = Record::new("ds1", 1)
        .with_data(json!([22, 30, "N/A", 41]))
        .with_method("mean", Params::new());

    orchestrator(dir.path()).handle(&mut record).await.unwrap();

    let entry = &record.results[0];
    assert!(!entry.ok);
    assert_eq!(entry.non_numeric_cells.len(), 1);
    assert_eq!(entry.non_numeric_cells[0].value, json!("N/A"));
}

#[tokio::test]
async fn test_non_object_params_still_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut record: Record = serde_json::from_value(json!({
        "dataset_id": "ds1",
        "dataset_version": 1,
        "data": [2, 4, 6, 8],
        "methods": [{"id": "mean", "params": null}, {"id": "median", "params": [1]}]
    }))
    .unwrap();

    orchestrator(dir.path()).handle(&mut record).await.unwrap();

    let ids: Vec<&str> = record.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["mean", "median"]);
    assert_eq!(record.results[0].value, json!(5.0));
    assert_eq!(record.results[1].value, json!(5.0));
    assert!(record.results[1].params_used.is_empty());
}

// =============================================================================
// Ordering
// =============================================================================

struct Slow {
    input: UnitInput,
}

impl Slow {
    fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Slow {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        Ok(())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(Computed::new(json!("slow")))
    }
}

#[tokio::test]
async fn test_results_keep_request_order() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        EngineConfig::default().with_results_root(dir.path()),
        statrun::methods::registry().with("slow", Slow::boxed),
        statrun::charts::registry(),
    );
    let mut record = Record::new("ds1", 1)
        .with_data(json!([1, 2, 3]))
        .with_method("slow", Params::new())
        .with_method("mean", Params::new())
        .with_method("median", Params::new());

    orchestrator.handle(&mut record).await.unwrap();

    let ids: Vec<&str> = record.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["slow", "mean", "median"]);
    assert_eq!(record.results[0].value, json!("slow"));
}

// =============================================================================
// Persistence and charts
// =============================================================================

#[tokio::test]
async fn test_chart_lands_in_results_folder() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = Record::new("ds1", 1)
        .with_data(json!([2, 4, 6, 8]))
        .with_method("mean", Params::new())
        .with_graphic("bar", params(json!({"path": "exports/x.png", "title": "Values"})));

    let saved = orchestrator(dir.path()).handle(&mut record).await.unwrap();

    let expected = dir.path().join("ds1_v1").join("x.png");
    assert_eq!(saved.folder, dir.path().join("ds1_v1"));
    assert!(expected.exists());
    assert!(!Path::new("exports/x.png").exists());

    let outcome = record.graphics[0].as_outcome().unwrap();
    assert!(outcome.ok, "{:?}", outcome.error);
    assert_eq!(outcome.path.as_deref(), Some(&*expected.to_string_lossy()));
}

#[tokio::test]
async fn test_chart_failures_do_not_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = Record::new("ds1", 1)
        .with_data(json!([1, 2]))
        .with_graphic("histogram", params(json!({"path": "h.png"})))
        .with_graphic("pie", Params::new());

    orchestrator(dir.path()).handle(&mut record).await.unwrap();

    let first = record.graphics[0].as_outcome().unwrap();
    assert_eq!(first.error.as_deref(), Some("Chart type histogram not found."));
    let second = record.graphics[1].as_outcome().unwrap();
    assert_eq!(second.error.as_deref(), Some("No output path provided"));
}

#[tokio::test]
async fn test_repeated_runs_never_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator(dir.path());

    let mut first = Record::new("ds1", 1)
        .with_data(json!([1, 2, 3]))
        .with_method("mean", Params::new());
    let mut second = first.clone();

    let a = orchestrator.handle(&mut first).await.unwrap();
    let b = orchestrator.handle(&mut second).await.unwrap();

    assert_ne!(a.snapshot, b.snapshot);
    assert!(a.snapshot.exists() && b.snapshot.exists());
    assert_eq!(orchestrator.store().history(&first).unwrap().len(), 2);

    let text = std::fs::read_to_string(&a.snapshot).unwrap();
    assert!(text.contains("\n    \"dataset_id\": \"ds1\""));
    let persisted = orchestrator.store().load(&a.snapshot).unwrap();
    assert_eq!(persisted.results, first.results);
}

#[tokio::test]
async fn test_invalid_dataset_id_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = Record::new("../escape", 1).with_method("mean", Params::new());

    let err = orchestrator(dir.path()).handle(&mut record).await.unwrap_err();
    assert!(matches!(err, StatrunError::InvalidKey(_)));
}

#[test]
fn test_request_json_round_trip_through_blocking_api() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = Record::from_json(
        r#"{
            "dataset_id": "ds2",
            "dataset_version": 7,
            "methods": ["variance", {"id": "regression"}],
            "method_data": {"regression": [[1, 2, 3, 4], [3, 5, 7, 9]]},
            "data": [2, 4, 6, 8]
        }"#,
    )
    .unwrap();

    orchestrator(dir.path()).handle_blocking(&mut record).unwrap();

    assert!(record.results.iter().all(|r| r.ok), "{:#?}", record.results);
    assert_eq!(record.results[1].value["slope"], json!(2.0));
    assert!(dir.path().join("ds2_v7").is_dir());
}

#[test]
fn test_malformed_request_is_rejected() {
    let err = Record::from_json(r#"{"dataset_version": 1}"#).unwrap_err();
    assert!(matches!(err, StatrunError::Request(_)));
}
