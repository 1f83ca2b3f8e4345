//! Measures of spread: standard deviation, variance, coefficient of
//! variation and percentiles.
use crate::location::{mean, sorted, sum};
use serde_json::{json, Value};
use statrun_core::series::{self, finite, finite_list};
use statrun_core::{Applicability, ComputationUnit, Computed, Params, UnitError, UnitInput};

const DEFAULT_PERCENTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Sum of squared deviations over `n - ddof`.
pub(crate) fn variance(xs: &[f64], ddof: u64) -> f64 {
    let m = mean(xs);
    let squares: Vec<f64> = xs.iter().map(|x| (x - m) * (x - m)).collect();
    sum(&squares) / (xs.len() as f64 - ddof as f64)
}

fn ddof(params: &Params, default: u64) -> Result<u64, String> {
    match params.get("ddof") {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| "ddof must be a non-negative integer".to_string()),
    }
}

fn with_param(params: &Params, key: &str, value: Value) -> Params {
    let mut effective = params.clone();
    effective.insert(key.to_string(), value);
    effective
}

/// Shared applicability for the ddof-based statistics.
fn check_ddof(input: &UnitInput, default: u64, min_len: usize, name: &str) -> Applicability {
    let n = series::flat_len(&input.data)?;
    if n < min_len {
        return Err(format!("{} needs at least {} values", name, min_len));
    }
    let ddof = ddof(&input.params, default)?;
    if ddof >= n as u64 {
        return Err(format!("ddof must be smaller than the number of values ({})", n));
    }
    Ok(())
}

pub struct StandardDeviation {
    input: UnitInput,
}

impl StandardDeviation {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for StandardDeviation {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        check_ddof(&self.input, 0, 1, "Standard deviation")
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let ddof = ddof(&self.input.params, 0)?;
        let s = series::series(&self.input.data)?;
        let value = finite(variance(&s.values, ddof).sqrt(), "standard deviation")?;
        Ok(Computed::new(value)
            .lossy(s.lossy)
            .with_params(with_param(&self.input.params, "ddof", json!(ddof))))
    }
}

/// Sample variance by default (`ddof = 1`).
pub struct Variance {
    input: UnitInput,
}

impl Variance {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Variance {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        check_ddof(&self.input, 1, 2, "Variance")
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let ddof = ddof(&self.input.params, 1)?;
        let s = series::series(&self.input.data)?;
        let value = finite(variance(&s.values, ddof), "variance")?;
        Ok(Computed::new(value)
            .lossy(s.lossy)
            .with_params(with_param(&self.input.params, "ddof", json!(ddof))))
    }
}

/// Population standard deviation over the mean.
pub struct CoefficientOfVariation {
    input: UnitInput,
}

impl CoefficientOfVariation {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for CoefficientOfVariation {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        series::flat_len(&self.input.data)?;
        // non-numeric cells are reported by evaluate
        if let Ok(s) = series::series(&self.input.data) {
            if mean(&s.values) == 0.0 {
                return Err("Coefficient of variation is undefined when the mean is zero".to_string());
            }
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let s = series::series(&self.input.data)?;
        let cv = variance(&s.values, 0).sqrt() / mean(&s.values);
        Ok(Computed::new(finite(cv, "coefficient of variation")?).lossy(s.lossy))
    }
}

/// Percentiles with linear interpolation between closest ranks.
pub struct Percentile {
    input: UnitInput,
}

impl Percentile {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }

    fn requested(&self) -> Result<Vec<f64>, String> {
        let invalid = || "p must be a number or a list of numbers between 0 and 100".to_string();
        let ps = match self.input.params.get("p") {
            None | Some(Value::Null) => DEFAULT_PERCENTILES.to_vec(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_f64().ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()?,
            Some(v) => vec![v.as_f64().ok_or_else(invalid)?],
        };
        if ps.is_empty() || ps.iter().any(|p| !(0.0..=100.0).contains(p)) {
            return Err(invalid());
        }
        Ok(ps)
    }
}

pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

impl ComputationUnit for Percentile {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        series::flat_len(&self.input.data)?;
        self.requested().map(|_| ())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let ps = self.requested()?;
        let s = series::series(&self.input.data)?;
        let sorted = sorted(&s.values);
        let values: Vec<f64> = ps.iter().map(|p| percentile(&sorted, *p)).collect();
        Ok(Computed::new(finite_list(&values, "percentile")?)
            .lossy(s.lossy)
            .with_params(with_param(&self.input.params, "p", json!(ps))))
    }
}
