//! Data Model: the Record that carries a run's request and, once handled,
//! its results.
use crate::error::StatrunError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Parameters attached to a method or chart request.
pub type Params = Map<String, Value>;

/// Request/Response Record. One instance is threaded through the whole
/// pipeline and mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Identity of the source table
    pub dataset_id: String,
    /// Edit revision of the source table
    pub dataset_version: i64,
    /// Side-channel context handed to every unit unchanged
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub selection: Selection,
    /// Units to run, in caller order
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    /// Chart requests on input, render outcomes after handling
    #[serde(default)]
    pub graphics: Vec<Graphic>,
    /// Raw values shared by every unit
    #[serde(default)]
    pub data: Value,
    /// Explicit per-method data, takes precedence over `data`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub method_data: BTreeMap<String, Value>,
    /// Explicit per-method metadata, takes precedence over `metadata`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub method_metadata: BTreeMap<String, Value>,
    /// One entry per normalized method request, same order
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub summary_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub rows: Vec<Vec<usize>>,
    #[serde(default)]
    pub cols: Vec<usize>,
}

/// A method request as the caller wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodSpec {
    Bare(String),
    Full {
        #[serde(default)]
        id: Option<String>,
        /// Anything but an object counts as no parameters
        #[serde(default, skip_serializing_if = "Value::is_null")]
        params: Value,
    },
    Other(Value),
}

impl MethodSpec {
    pub fn new(id: impl Into<String>, params: Params) -> Self {
        Self::Full {
            id: Some(id.into()),
            params: Value::Object(params),
        }
    }

    /// The `(id, params)` pair this entry stands for, if it names a method.
    pub fn normalize(&self) -> Option<MethodRequest> {
        let (id, params) = match self {
            Self::Bare(id) => (id.clone(), Params::new()),
            Self::Full {
                id: Some(id),
                params,
            } => (id.clone(), params.as_object().cloned().unwrap_or_default()),
            Self::Full { id: None, .. } | Self::Other(_) => return None,
        };
        if id.is_empty() {
            return None;
        }
        Some(MethodRequest { id, params })
    }
}

/// A normalized method request.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    pub id: String,
    pub params: Params,
}

/// One cell that could not be read as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonNumericCell {
    pub row: usize,
    pub col: usize,
    pub value: Value,
}

/// Outcome of one method request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub id: String,
    pub ok: bool,
    pub value: Value,
    pub error: Option<String>,
    pub loss_of_precision: bool,
    pub params_used: Params,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_numeric_cells: Vec<NonNumericCell>,
}

impl ResultEntry {
    pub fn success(id: impl Into<String>, value: Value, params_used: Params) -> Self {
        Self {
            id: id.into(),
            ok: true,
            value,
            error: None,
            loss_of_precision: false,
            params_used,
            non_numeric_cells: Vec::new(),
        }
    }

    pub fn failure(id: impl Into<String>, error: impl Into<String>, params_used: Params) -> Self {
        Self {
            id: id.into(),
            ok: false,
            value: Value::Null,
            error: Some(error.into()),
            loss_of_precision: false,
            params_used,
            non_numeric_cells: Vec::new(),
        }
    }

    pub fn not_found(id: &str, params_used: Params) -> Self {
        Self::failure(id, format!("Method {} not found.", id), params_used)
    }

    pub fn with_loss_of_precision(mut self, lossy: bool) -> Self {
        self.loss_of_precision = lossy;
        self
    }

    pub fn with_non_numeric_cells(mut self, cells: Vec<NonNumericCell>) -> Self {
        self.non_numeric_cells = cells;
        self
    }

    /// One plain-text line for the run summary.
    pub fn summary_line(&self) -> String {
        match (&self.error, self.ok) {
            (_, true) => format!("{}: {}", self.id, self.value),
            (Some(error), false) => format!("{}: error: {}", self.id, error),
            (None, false) => format!("{}: error", self.id),
        }
    }
}

/// A chart request: `{"type": ..., ...params}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

/// Outcome of one chart request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphicOutcome {
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub ok: bool,
    pub path: Option<String>,
    pub error: Option<String>,
    pub params_used: Params,
}

impl GraphicOutcome {
    pub fn success(chart_type: impl Into<String>, path: impl Into<String>, params_used: Params) -> Self {
        Self {
            chart_type: Some(chart_type.into()),
            ok: true,
            path: Some(path.into()),
            error: None,
            params_used,
        }
    }

    pub fn failure(chart_type: Option<String>, error: impl Into<String>, params_used: Params) -> Self {
        let path = params_used
            .get("path")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            chart_type,
            ok: false,
            path,
            error: Some(error.into()),
            params_used,
        }
    }

    pub fn not_found(chart_type: Option<String>, params_used: Params) -> Self {
        let error = format!(
            "Chart type {} not found.",
            chart_type.as_deref().unwrap_or("<missing>")
        );
        Self {
            chart_type,
            ok: false,
            path: None,
            error: Some(error),
            params_used,
        }
    }
}

/// Entry of `Record::graphics`: a request before handling, an outcome after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Graphic {
    Outcome(GraphicOutcome),
    Request(GraphicRequest),
}

impl Graphic {
    pub fn request(chart_type: impl Into<String>, params: Params) -> Self {
        Self::Request(GraphicRequest {
            chart_type: Some(chart_type.into()),
            params,
        })
    }

    /// The request to render. Outcomes from a replayed record render again
    /// with the parameters they used.
    pub fn into_request(self) -> GraphicRequest {
        match self {
            Self::Request(request) => request,
            Self::Outcome(outcome) => GraphicRequest {
                chart_type: outcome.chart_type,
                params: outcome.params_used,
            },
        }
    }

    pub fn as_outcome(&self) -> Option<&GraphicOutcome> {
        match self {
            Self::Outcome(outcome) => Some(outcome),
            Self::Request(_) => None,
        }
    }
}

impl Record {
    pub fn new(dataset_id: impl Into<String>, dataset_version: i64) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            dataset_version,
            metadata: Value::Array(Vec::new()),
            selection: Selection::default(),
            methods: Vec::new(),
            graphics: Vec::new(),
            data: Value::Array(Vec::new()),
            method_data: BTreeMap::new(),
            method_metadata: BTreeMap::new(),
            results: Vec::new(),
            summary_text: String::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_method(mut self, id: impl Into<String>, params: Params) -> Self {
        self.methods.push(MethodSpec::new(id, params));
        self
    }

    pub fn with_graphic(mut self, chart_type: impl Into<String>, params: Params) -> Self {
        self.graphics.push(Graphic::request(chart_type, params));
        self
    }

    /// Parse a record from JSON. A malformed top-level record is the
    /// caller's error.
    pub fn from_json(json: &str) -> Result<Self, StatrunError> {
        serde_json::from_str(json).map_err(|e| StatrunError::Request(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, StatrunError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Normalized method requests. Entries without an identifier are dropped.
    pub fn method_requests(&self) -> Vec<MethodRequest> {
        self.methods.iter().filter_map(MethodSpec::normalize).collect()
    }

    /// Data for one method: explicit override, then a `data` object keyed by
    /// the method id, then the shared `data`.
    pub fn data_for(&self, method_id: &str) -> Value {
        resolve(&self.method_data, &self.data, method_id)
            .unwrap_or(&self.data)
            .clone()
    }

    /// Metadata for one method, resolved like [`Record::data_for`].
    pub fn metadata_for(&self, method_id: &str) -> Value {
        resolve(&self.method_metadata, &self.metadata, method_id)
            .unwrap_or(&self.metadata)
            .clone()
    }

    /// Resolver that hands every method without an override the same
    /// shared copy of `data` and `metadata`.
    pub fn inputs(&self) -> InputResolver<'_> {
        InputResolver {
            record: self,
            data: Arc::new(self.data.clone()),
            metadata: Arc::new(self.metadata.clone()),
        }
    }

    /// Plain-text report of the results, one line each.
    pub fn summarize(&self) -> String {
        self.results
            .iter()
            .map(ResultEntry::summary_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-method inputs of one record. Only overrides and keyed slices are
/// copied.
pub struct InputResolver<'a> {
    record: &'a Record,
    data: Arc<Value>,
    metadata: Arc<Value>,
}

impl InputResolver<'_> {
    pub fn data(&self, method_id: &str) -> Arc<Value> {
        match resolve(&self.record.method_data, &self.record.data, method_id) {
            Some(value) => Arc::new(value.clone()),
            None => self.data.clone(),
        }
    }

    pub fn metadata(&self, method_id: &str) -> Arc<Value> {
        match resolve(&self.record.method_metadata, &self.record.metadata, method_id) {
            Some(value) => Arc::new(value.clone()),
            None => self.metadata.clone(),
        }
    }

    /// The shared `data`, as handed to charts.
    pub fn shared_data(&self) -> Arc<Value> {
        self.data.clone()
    }

    pub fn shared_metadata(&self) -> Arc<Value> {
        self.metadata.clone()
    }
}

/// The value specific to `method_id`, or `None` when the shared one applies.
fn resolve<'a>(
    overrides: &'a BTreeMap<String, Value>,
    shared: &'a Value,
    method_id: &str,
) -> Option<&'a Value> {
    overrides.get(method_id).or_else(|| match shared {
        Value::Object(keyed) => keyed.get(method_id),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_bare_and_full_entries() {
        let record: Record = serde_json::from_value(json!({
            "dataset_id": "ds1",
            "dataset_version": 1,
            "methods": ["mean", {"id": "percentile", "params": {"p": [10]}}, {"params": {}}, "", 7]
        }))
        .unwrap();

        let requests = record.method_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].id, "mean");
        assert!(requests[0].params.is_empty());
        assert_eq!(requests[1].id, "percentile");
        assert_eq!(requests[1].params["p"], json!([10]));
    }

    #[test]
    fn test_non_object_params_keep_the_method() {
        let record: Record = serde_json::from_value(json!({
            "dataset_id": "ds1",
            "dataset_version": 1,
            "methods": [{"id": "mean", "params": null}, {"id": "median", "params": [1]}]
        }))
        .unwrap();

        let requests = record.method_requests();
        let ids: Vec<&str> = requests.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["mean", "median"]);
        assert!(requests.iter().all(|r| r.params.is_empty()));
    }

    #[test]
    fn test_keyed_data_resolution() {
        let record = Record::new("ds1", 1).with_data(json!({
            "regression": [[1, 2], [3, 4]],
            "mean": [1, 2, 3]
        }));

        assert_eq!(record.data_for("mean"), json!([1, 2, 3]));
        assert_eq!(record.data_for("regression"), json!([[1, 2], [3, 4]]));
        assert_eq!(record.data_for("median"), record.data);
    }

    #[test]
    fn test_explicit_override_wins() {
        let mut record = Record::new("ds1", 1).with_data(json!({"mean": [1, 2]}));
        record.method_data.insert("mean".to_string(), json!([9]));

        assert_eq!(record.data_for("mean"), json!([9]));
        assert_eq!(record.metadata_for("mean"), json!([]));
    }

    #[test]
    fn test_resolver_shares_one_copy_of_data() {
        let mut record = Record::new("ds1", 1).with_data(json!([1, 2, 3]));
        record.method_data.insert("mode".to_string(), json!([7]));
        let inputs = record.inputs();

        let (mean, median) = (inputs.data("mean"), inputs.data("median"));
        assert!(Arc::ptr_eq(&mean, &median));
        assert!(Arc::ptr_eq(&mean, &inputs.shared_data()));
        assert_eq!(*inputs.data("mode"), json!([7]));
        assert!(Arc::ptr_eq(&inputs.metadata("mean"), &inputs.metadata("mode")));
    }

    #[test]
    fn test_graphic_request_and_outcome_parse() {
        let graphics: Vec<Graphic> = serde_json::from_value(json!([
            {"type": "bar", "path": "exports/x.png", "title": "Ages"},
            {"type": "bar", "ok": true, "path": "a/x.png", "error": null, "params_used": {"path": "a/x.png"}}
        ]))
        .unwrap();

        match &graphics[0] {
            Graphic::Request(request) => {
                assert_eq!(request.chart_type.as_deref(), Some("bar"));
                assert_eq!(request.params["path"], json!("exports/x.png"));
                assert!(!request.params.contains_key("type"));
            }
            other => panic!("expected request, got {:?}", other),
        }
        assert!(graphics[1].as_outcome().is_some());

        let replay = graphics[1].clone().into_request();
        assert_eq!(replay.params["path"], json!("a/x.png"));
    }

    #[test]
    fn test_malformed_record_is_request_error() {
        let err = Record::from_json(r#"{"dataset_version": 1}"#).unwrap_err();
        assert!(matches!(err, StatrunError::Request(_)));
    }

    #[test]
    fn test_summary_lines() {
        let mut record = Record::new("ds1", 1);
        record.results.push(ResultEntry::success("mean", json!(5.0), Params::new()));
        record.results.push(ResultEntry::not_found("nope", Params::new()));

        assert_eq!(
            record.summarize(),
            "mean: 5.0\nnope: error: Method nope not found."
        );
    }

    #[test]
    fn test_entry_serialization_omits_empty_cells() {
        let entry = ResultEntry::success("mean", json!(1.5), Params::new());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("non_numeric_cells").is_none());
        assert_eq!(json["error"], Value::Null);
        assert_eq!(json["loss_of_precision"], json!(false));
    }
}
