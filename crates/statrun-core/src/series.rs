//! Reading numeric sequences out of loosely typed record data.
use crate::record::NonNumericCell;
use crate::unit::UnitError;
use serde_json::{Number, Value};

/// Largest integer magnitude an `f64` holds exactly.
const EXACT_INTEGER_LIMIT: u64 = 1 << 53;

/// A numeric sequence read from record data.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub values: Vec<f64>,
    /// Some input could not be represented exactly as `f64`
    pub lossy: bool,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The elements of a JSON array, or `None` for any other value.
pub fn elements(value: &Value) -> Option<&[Value]> {
    value.as_array().map(Vec::as_slice)
}

/// Length of a flat, non-empty sequence.
pub fn flat_len(value: &Value) -> Result<usize, String> {
    match elements(value) {
        None => Err("Data must be a sequence of values".to_string()),
        Some([]) => Err("No numerical data provided".to_string()),
        Some(items) if items.iter().any(|v| v.is_array() || v.is_object()) => {
            Err("Data must be a flat sequence of values".to_string())
        }
        Some(items) => Ok(items.len()),
    }
}

/// Lengths of the first two sequences of `[xs, ys, ...]`.
pub fn pair_len(value: &Value) -> Result<(usize, usize), String> {
    let items = elements(value).unwrap_or(&[]);
    if items.len() < 2 {
        return Err("Data must contain two sequences".to_string());
    }
    match (elements(&items[0]), elements(&items[1])) {
        (Some(a), Some(b)) => Ok((a.len(), b.len())),
        _ => Err("Data must contain two sequences".to_string()),
    }
}

/// Read a flat sequence. Every cell is reported as column 0.
pub fn series(value: &Value) -> Result<Series, UnitError> {
    read(elements(value).unwrap_or(&[]), 0)
}

/// Read the sequence at `data[col]` of a list of sequences.
pub fn series_at(value: &Value, col: usize) -> Result<Series, UnitError> {
    match elements(value).and_then(|items| items.get(col)) {
        Some(inner) => read(elements(inner).unwrap_or(&[]), col),
        None => Err(UnitError::new(format!("Data has no sequence at index {}", col))),
    }
}

/// Read the first two sequences, collecting bad cells from both.
pub fn pair(value: &Value) -> Result<(Series, Series), UnitError> {
    match (series_at(value, 0), series_at(value, 1)) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(mut a), Err(b)) => {
            a.cells.extend(b.cells);
            Err(a)
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

/// A finite result as JSON, or an error naming what was undefined.
pub fn finite(x: f64, what: &str) -> Result<Value, UnitError> {
    Number::from_f64(x)
        .map(Value::Number)
        .ok_or_else(|| UnitError::new(format!("{} is not a finite number", what)))
}

/// A list of finite results as JSON.
pub fn finite_list(xs: &[f64], what: &str) -> Result<Value, UnitError> {
    xs.iter()
        .map(|x| finite(*x, what))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn read(items: &[Value], col: usize) -> Result<Series, UnitError> {
    let mut values = Vec::with_capacity(items.len());
    let mut lossy = false;
    let mut cells = Vec::new();
    for (row, item) in items.iter().enumerate() {
        match number(item) {
            Some((x, inexact)) => {
                values.push(x);
                lossy |= inexact;
            }
            None => cells.push(NonNumericCell {
                row,
                col,
                value: item.clone(),
            }),
        }
    }
    if let Some(first) = cells.first() {
        return Err(UnitError {
            message: format!(
                "Non-numeric cell detected at row {}, col {}: {}",
                first.row, first.col, first.value
            ),
            cells,
        });
    }
    Ok(Series { values, lossy })
}

fn number(value: &Value) -> Option<(f64, bool)> {
    match value {
        Value::Number(n) => {
            let inexact = match (n.as_u64(), n.as_i64()) {
                (Some(u), _) => u > EXACT_INTEGER_LIMIT,
                (None, Some(i)) => i.unsigned_abs() > EXACT_INTEGER_LIMIT,
                (None, None) => false,
            };
            n.as_f64().map(|x| (x, inexact))
        }
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(|x| (x, false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_numbers_and_numeric_strings() {
        let s = series(&json!([1, 2.5, " 3 "])).unwrap();
        assert_eq!(s.values, vec![1.0, 2.5, 3.0]);
        assert!(!s.lossy);
    }

    #[test]
    fn test_reports_every_non_numeric_cell() {
        let err = series(&json!([22, 30, "N/A", 41, null])).unwrap_err();
        assert!(err.message.starts_with("Non-numeric cell detected at row 2, col 0"));
        assert_eq!(err.cells.len(), 2);
        assert_eq!(err.cells[0].value, json!("N/A"));
        assert_eq!(err.cells[1].row, 4);
    }

    #[test]
    fn test_pair_reports_columns() {
        let err = pair(&json!([[1, "x"], [true, 2]])).unwrap_err();
        assert_eq!(err.cells.len(), 2);
        assert_eq!((err.cells[0].row, err.cells[0].col), (1, 0));
        assert_eq!((err.cells[1].row, err.cells[1].col), (0, 1));
    }

    #[test]
    fn test_large_integers_flag_precision_loss() {
        let s = series(&json!([9_007_199_254_740_993u64, 1])).unwrap();
        assert!(s.lossy);
    }

    #[test]
    fn test_shape_checks() {
        assert!(flat_len(&json!([])).is_err());
        assert!(flat_len(&json!([[1], [2]])).is_err());
        assert_eq!(flat_len(&json!([1, 2])), Ok(2));
        assert_eq!(pair_len(&json!([[1, 2], [3]])), Ok((2, 1)));
        assert!(pair_len(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_non_finite_results_are_errors() {
        assert!(finite(f64::NAN, "rho").is_err());
        assert_eq!(finite(2.0, "x").unwrap(), json!(2.0));
    }
}
