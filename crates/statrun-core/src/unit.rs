//! Unit capabilities: the contract shared by every statistic and chart.
use crate::record::{GraphicOutcome, NonNumericCell, Params, ResultEntry};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `Ok(())` when the unit can run, otherwise the reason it cannot. The
/// reason doubles as the entry's error message.
pub type Applicability = Result<(), String>;

/// Read-only input of one unit invocation.
#[derive(Debug, Clone)]
pub struct UnitInput {
    /// Identifier the caller requested (method id or chart type)
    pub id: String,
    pub data: Arc<Value>,
    pub metadata: Arc<Value>,
    pub params: Params,
}

impl UnitInput {
    pub fn new(id: impl Into<String>, data: Value, metadata: Value, params: Params) -> Self {
        Self {
            id: id.into(),
            data: Arc::new(data),
            metadata: Arc::new(metadata),
            params,
        }
    }

    /// Requested output path, if any.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.params
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

/// Why a unit refused or failed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitError {
    pub message: String,
    pub cells: Vec<NonNumericCell>,
}

impl UnitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cells: Vec::new(),
        }
    }
}

impl From<String> for UnitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for UnitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl std::fmt::Display for UnitError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Successful numeric outcome of a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Computed {
    pub value: Value,
    pub loss_of_precision: bool,
    /// Effective parameters, when they differ from the requested ones
    pub params_used: Option<Params>,
}

impl Computed {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            loss_of_precision: false,
            params_used: None,
        }
    }

    pub fn lossy(mut self, lossy: bool) -> Self {
        self.loss_of_precision = lossy;
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params_used = Some(params);
        self
    }
}

/// A single statistic, constructed once per invocation.
pub trait ComputationUnit: Send {
    fn input(&self) -> &UnitInput;

    /// Cheap precondition check on the input shape.
    fn is_applicable(&self) -> Applicability;

    /// The numeric path. Only reached after `is_applicable` succeeded.
    fn evaluate(&self) -> Result<Computed, UnitError>;

    fn compute(&self) -> ResultEntry {
        let input = self.input();
        if let Err(reason) = self.is_applicable() {
            return ResultEntry::failure(&input.id, reason, input.params.clone());
        }
        match self.evaluate() {
            Ok(computed) => ResultEntry::success(
                &input.id,
                computed.value,
                computed.params_used.unwrap_or_else(|| input.params.clone()),
            )
            .with_loss_of_precision(computed.loss_of_precision),
            Err(err) => ResultEntry::failure(&input.id, err.message, input.params.clone())
                .with_non_numeric_cells(err.cells),
        }
    }
}

/// A single chart type, constructed once per invocation.
pub trait ChartUnit: Send {
    fn input(&self) -> &UnitInput;

    /// Fails closed when no output path was supplied.
    fn is_applicable(&self) -> Applicability {
        match self.input().output_path() {
            Some(_) => Ok(()),
            None => Err("No output path provided".to_string()),
        }
    }

    /// Draw the chart in memory and write it to `path`.
    fn render_to(&self, path: &Path) -> Result<(), String>;

    fn create_graphic(&self) -> GraphicOutcome {
        let input = self.input();
        let chart_type = Some(input.id.clone());
        if let Err(reason) = self.is_applicable() {
            return GraphicOutcome::failure(chart_type, reason, input.params.clone());
        }
        let Some(path) = input.output_path() else {
            return GraphicOutcome::failure(chart_type, "No output path provided", input.params.clone());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(dir) {
                return GraphicOutcome::failure(chart_type, e.to_string(), input.params.clone());
            }
        }
        match self.render_to(&path) {
            Ok(()) => GraphicOutcome::success(
                input.id.clone(),
                path.to_string_lossy(),
                input.params.clone(),
            ),
            Err(e) => GraphicOutcome::failure(chart_type, e, input.params.clone()),
        }
    }
}

pub type MethodConstructor = fn(UnitInput) -> Box<dyn ComputationUnit>;
pub type ChartConstructor = fn(UnitInput) -> Box<dyn ChartUnit>;
