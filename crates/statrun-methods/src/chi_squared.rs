//! Pearson's chi-squared goodness-of-fit test.
use crate::location::sum;
use serde_json::json;
use statrs::distribution::{ChiSquared as Distribution, ContinuousCDF};
use statrun_core::series::{self, finite};
use statrun_core::{Applicability, ComputationUnit, Computed, UnitError, UnitInput};

/// Relative tolerance when comparing observed and expected totals.
const SUM_TOLERANCE: f64 = 1e-8;

/// Data is `[observed, expected]`.
pub struct ChiSquared {
    input: UnitInput,
}

impl ChiSquared {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

impl ComputationUnit for ChiSquared {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        let (n_obs, n_exp) = series::pair_len(&self.input.data)?;
        if n_obs != n_exp {
            return Err("Observed and expected frequencies must have the same length".to_string());
        }
        if n_obs < 2 {
            return Err("At least two categories are required".to_string());
        }
        // non-numeric cells are reported by evaluate
        let Ok((observed, expected)) = series::pair(&self.input.data) else {
            return Ok(());
        };
        if expected.values.iter().any(|e| *e <= 0.0) {
            return Err("Expected frequencies must be positive".to_string());
        }
        let (total_obs, total_exp) = (sum(&observed.values), sum(&expected.values));
        if (total_obs - total_exp).abs() > SUM_TOLERANCE * total_obs.abs().max(total_exp.abs()) {
            return Err(format!(
                "Observed and expected frequencies must have the same sum ({} != {})",
                total_obs, total_exp
            ));
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let (observed, expected) = series::pair(&self.input.data)?;
        let terms: Vec<f64> = observed
            .values
            .iter()
            .zip(&expected.values)
            .map(|(o, e)| (o - e) * (o - e) / e)
            .collect();
        let statistic = sum(&terms);
        let dof = observed.len() - 1;
        let p_value = Distribution::new(dof as f64)
            .map_err(|e| e.to_string())?
            .sf(statistic)
            .clamp(0.0, 1.0);

        Ok(Computed::new(json!({
            "statistic": finite(statistic, "chi-squared statistic")?,
            "dof": dof,
            "p_value": finite(p_value, "p-value")?,
        }))
        .lossy(observed.lossy || expected.lossy))
    }
}
