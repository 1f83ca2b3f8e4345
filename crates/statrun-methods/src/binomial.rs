//! Binomial probability table.
//!
//! Data is `[n, p, k_min, k_max]`; a `null` (or missing) `k_max` means `n`.
//! The value is column oriented:
//!
//! ```text
//! {"k": [..], "P(X = k)": [..], "P(X <= k)": [..], "P(X >= k)": [..]}
//! ```
use serde_json::{Map, Value};
use statrun_core::series::{self, finite_list};
use statrun_core::{Applicability, ComputationUnit, Computed, UnitError, UnitInput};
use statrs::distribution::{Binomial as Distribution, Discrete, DiscreteCDF};

/// Largest number of trials tabulated.
const MAX_TRIALS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Parameters {
    n: u64,
    p: f64,
    k_min: u64,
    k_max: u64,
}

fn count(value: Option<&Value>, name: &str) -> Result<u64, String> {
    let invalid = || format!("{} must be a non-negative integer", name);
    let value = value.ok_or_else(invalid)?;
    if let Some(u) = value.as_u64() {
        return Ok(u);
    }
    match value.as_f64() {
        Some(x) if x >= 0.0 && x.fract() == 0.0 && x <= MAX_TRIALS as f64 => Ok(x as u64),
        _ => Err(invalid()),
    }
}

fn parameters(data: &Value) -> Result<Parameters, String> {
    let items = series::elements(data)
        .filter(|items| (3..=4).contains(&items.len()))
        .ok_or_else(|| "Data must be [n, p, k_min, k_max]".to_string())?;

    let n = count(items.first(), "n")?;
    if n > MAX_TRIALS {
        return Err(format!("n must not exceed {}", MAX_TRIALS));
    }
    let p = items[1]
        .as_f64()
        .filter(|p| (0.0..=1.0).contains(p))
        .ok_or_else(|| "p must be a probability between 0 and 1".to_string())?;
    let k_min = count(items.get(2), "k_min")?;
    let k_max = match items.get(3) {
        None | Some(Value::Null) => n,
        v => count(v, "k_max")?,
    };
    if k_min > k_max || k_max > n {
        return Err("Expected 0 <= k_min <= k_max <= n".to_string());
    }
    Ok(Parameters { n, p, k_min, k_max })
}

/// `P(X >= k)`, as the survival function one step down.
fn at_least(dist: &Distribution, k: u64) -> f64 {
    match k {
        0 => 1.0,
        k => dist.sf(k - 1),
    }
}

fn probabilities<F: Fn(u64) -> f64>(ks: &[u64], f: F) -> Vec<f64> {
    ks.iter().map(|k| f(*k).clamp(0.0, 1.0)).collect()
}

pub struct Binomial {
    input: UnitInput,
}

impl Binomial {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for Binomial {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        parameters(&self.input.data).map(|_| ())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let Parameters { n, p, k_min, k_max } = parameters(&self.input.data)?;
        let dist = Distribution::new(p, n).map_err(|e| e.to_string())?;

        let ks: Vec<u64> = (k_min..=k_max).collect();
        let mass = probabilities(&ks, |k| dist.pmf(k));
        let at_most = probabilities(&ks, |k| dist.cdf(k));
        let upper = probabilities(&ks, |k| at_least(&dist, k));

        let mut table = Map::new();
        table.insert("k".to_string(), ks.into_iter().map(Value::from).collect());
        table.insert("P(X = k)".to_string(), finite_list(&mass, "probability")?);
        table.insert("P(X <= k)".to_string(), finite_list(&at_most, "probability")?);
        table.insert("P(X >= k)".to_string(), finite_list(&upper, "probability")?);

        // mass and tails go through log-gamma and the incomplete beta function
        Ok(Computed::new(Value::Object(table)).lossy(true))
    }
}
