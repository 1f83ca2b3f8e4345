//! Measures of location: mean, median, mode.
use statrun_core::series::{self, finite, finite_list};
use statrun_core::{Applicability, ComputationUnit, Computed, UnitError, UnitInput};

/// Compensated (Neumaier) sum.
pub(crate) fn sum(xs: &[f64]) -> f64 {
    let mut total = 0.0;
    let mut compensation = 0.0;
    for &x in xs {
        let t = total + x;
        if total.abs() >= x.abs() {
            compensation += (total - t) + x;
        } else {
            compensation += (x - t) + total;
        }
        total = t;
    }
    total + compensation
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    sum(xs) / xs.len() as f64
}

pub(crate) fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut out = xs.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

pub(crate) fn median(xs: &[f64]) -> f64 {
    let sorted = sorted(xs);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub struct Mean {
    input: UnitInput,
}

impl Mean {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Mean {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        series::flat_len(&self.input.data).map(|_| ())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let s = series::series(&self.input.data)?;
        Ok(Computed::new(finite(mean(&s.values), "mean")?).lossy(s.lossy))
    }
}

pub struct Median {
    input: UnitInput,
}

impl Median {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Median {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        series::flat_len(&self.input.data).map(|_| ())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let s = series::series(&self.input.data)?;
        Ok(Computed::new(finite(median(&s.values), "median")?).lossy(s.lossy))
    }
}

/// Most frequent values, ascending. Every value ties when all are distinct.
pub struct Mode {
    input: UnitInput,
}

impl Mode {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Mode {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        series::flat_len(&self.input.data).map(|_| ())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let s = series::series(&self.input.data)?;
        let sorted = sorted(&s.values);

        let mut runs: Vec<(f64, usize)> = Vec::new();
        for x in sorted {
            match runs.last_mut() {
                Some((value, count)) if *value == x => *count += 1,
                _ => runs.push((x, 1)),
            }
        }
        let top = runs.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let modes: Vec<f64> = runs
            .into_iter()
            .filter(|(_, count)| *count == top)
            .map(|(value, _)| value)
            .collect();

        Ok(Computed::new(finite_list(&modes, "mode")?).lossy(s.lossy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use statrun_core::{MethodConstructor, Params, ResultEntry};

    fn run(unit: MethodConstructor, id: &str, data: Value) -> ResultEntry {
        unit(UnitInput::new(id, data, json!([]), Params::new())).compute()
    }

    #[test]
    fn test_mean() {
        let entry = run(Mean::boxed, "mean", json!([2, 4, 6, 8]));
        assert!(entry.ok);
        assert_eq!(entry.value, json!(5.0));
        assert!(!entry.loss_of_precision);
    }

    #[test]
    fn test_mean_compensated_sum() {
        let entry = run(Mean::boxed, "mean", json!([1e16, 1.0, -1e16, 1.0]));
        assert_eq!(entry.value, json!(0.5));
    }

    #[test]
    fn test_mean_reports_non_numeric_cells() {
        let entry = run(Mean::boxed, "mean", json!([22, 30, "N/A", 41]));
        assert!(!entry.ok);
        assert!(entry.error.unwrap().starts_with("Non-numeric cell detected"));
        assert_eq!(entry.non_numeric_cells.len(), 1);
        assert_eq!(entry.non_numeric_cells[0].row, 2);
    }

    #[test]
    fn test_mean_empty() {
        let entry = run(Mean::boxed, "mean", json!([]));
        assert_eq!(entry.error.as_deref(), Some("No numerical data provided"));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(run(Median::boxed, "median", json!([3, 1, 2])).value, json!(2.0));
        assert_eq!(run(Median::boxed, "median", json!([4, 1, 3, 2])).value, json!(2.5));
    }

    #[test]
    fn test_mode_ties() {
        let entry = run(Mode::boxed, "mode", json!([3, 1, 2, 2, 3]));
        assert_eq!(entry.value, json!([2.0, 3.0]));
    }
}
