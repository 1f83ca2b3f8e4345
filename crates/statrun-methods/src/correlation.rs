//! Pearson and Spearman correlation over `[xs, ys]`.
use crate::location::{mean, sum};
use statrun_core::series::{self, finite};
use statrun_core::{Applicability, ComputationUnit, Computed, UnitError, UnitInput};

/// Centered second moments of a pair of samples.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Moments {
    pub mean_x: f64,
    pub mean_y: f64,
    pub sxx: f64,
    pub syy: f64,
    pub sxy: f64,
}

impl Moments {
    pub(crate) fn of(xs: &[f64], ys: &[f64]) -> Self {
        let (mean_x, mean_y) = (mean(xs), mean(ys));
        let dx: Vec<f64> = xs.iter().map(|x| x - mean_x).collect();
        let dy: Vec<f64> = ys.iter().map(|y| y - mean_y).collect();
        let products = |a: &[f64], b: &[f64]| -> f64 {
            let terms: Vec<f64> = a.iter().zip(b).map(|(p, q)| p * q).collect();
            sum(&terms)
        };
        Self {
            mean_x,
            mean_y,
            sxx: products(&dx, &dx),
            syy: products(&dy, &dy),
            sxy: products(&dx, &dy),
        }
    }

    pub(crate) fn correlation(&self) -> f64 {
        (self.sxy / (self.sxx * self.syy).sqrt()).clamp(-1.0, 1.0)
    }
}

/// Two sequences of equal length, at least two points each.
pub(crate) fn check_pair(input: &UnitInput) -> Applicability {
    let (nx, ny) = series::pair_len(&input.data)?;
    if nx != ny {
        return Err("There must be an equal number of xs and ys".to_string());
    }
    if nx < 2 {
        return Err("At least two points are required".to_string());
    }
    Ok(())
}

/// `check_pair` plus "neither sequence is constant".
fn check_varying(input: &UnitInput) -> Applicability {
    check_pair(input)?;
    // non-numeric cells are reported by evaluate
    if let Ok((xs, ys)) = series::pair(&input.data) {
        let m = Moments::of(&xs.values, &ys.values);
        if m.sxx == 0.0 || m.syy == 0.0 {
            return Err("Correlation is undefined for a constant sequence".to_string());
        }
    }
    Ok(())
}

/// 1-based ranks, ties share the average of their positions.
pub(crate) fn ranks(xs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|a, b| xs[*a].total_cmp(&xs[*b]));

    let mut out = vec![0.0; xs.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && xs[order[end]] == xs[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            out[i] = rank;
        }
        start = end;
    }
    out
}

pub struct Pearson {
    input: UnitInput,
}

impl Pearson {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Pearson {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        check_varying(&self.input)
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let (xs, ys) = series::pair(&self.input.data)?;
        let r = Moments::of(&xs.values, &ys.values).correlation();
        Ok(Computed::new(finite(r, "correlation")?).lossy(xs.lossy || ys.lossy))
    }
}

/// Rank correlation: Pearson's r over average ranks.
pub struct Spearman {
    input: UnitInput,
}

impl Spearman {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Spearman {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        check_varying(&self.input)
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let (xs, ys) = series::pair(&self.input.data)?;
        let rho = Moments::of(&ranks(&xs.values), &ranks(&ys.values)).correlation();
        Ok(Computed::new(finite(rho, "correlation")?).lossy(xs.lossy || ys.lossy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use statrun_core::{MethodConstructor, Params, ResultEntry};

    fn run(unit: MethodConstructor, data: Value) -> ResultEntry {
        unit(UnitInput::new("corr", data, json!([]), Params::new())).compute()
    }

    #[test]
    fn test_ranks_average_ties() {
        assert_eq!(ranks(&[5.0, 6.0, 7.0, 8.0, 7.0]), vec![1.0, 2.0, 3.5, 5.0, 3.5]);
        assert_eq!(ranks(&[2.0, 2.0, 2.0]), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_spearman_with_ties() {
        let entry = run(Spearman::boxed, json!([[1, 2, 3, 4, 5], [5, 6, 7, 8, 7]]));
        assert!(entry.ok, "{:?}", entry.error);
        let rho = entry.value.as_f64().unwrap();
        assert!((rho - 0.820_782_681_668_123).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let entry = run(Pearson::boxed, json!([[1, 2, 3], [2, 4, 6]]));
        assert_eq!(entry.value, json!(1.0));
        let entry = run(Pearson::boxed, json!([[1, 2, 3], [3, 2, 1]]));
        assert_eq!(entry.value, json!(-1.0));
    }

    #[test]
    fn test_constant_sequence_not_applicable() {
        let entry = run(Pearson::boxed, json!([[1, 2, 3], [4, 4, 4]]));
        assert!(!entry.ok);
        assert!(entry.error.unwrap().contains("constant"));
    }

    #[test]
    fn test_mismatched_lengths() {
        let entry = run(Spearman::boxed, json!([[1, 2, 3], [1, 2]]));
        assert_eq!(
            entry.error.as_deref(),
            Some("There must be an equal number of xs and ys")
        );
    }
}
