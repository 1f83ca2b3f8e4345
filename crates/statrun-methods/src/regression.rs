//! Ordinary least-squares line through `[xs, ys]`.
use crate::correlation::{check_pair, Moments};
use serde_json::json;
use statrun_core::series::{self, finite, finite_list};
use statrun_core::{Applicability, ComputationUnit, Computed, UnitError, UnitInput};

pub struct LeastSquaresRegression {
    input: UnitInput,
}

impl LeastSquaresRegression {
    pub fn boxed(input: UnitInput) -> Box<dyn ComputationUnit> {
        Box::new(Self { input })
    }
}

/// Slope and intercept of the least-squares line.
pub fn fit(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let m = Moments::of(xs, ys);
    let slope = m.sxy / m.sxx;
    (slope, m.mean_y - slope * m.mean_x)
}

impl ComputationUnit for LeastSquaresRegression {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        check_pair(&self.input)?;
        if let Ok((xs, ys)) = series::pair(&self.input.data) {
            if Moments::of(&xs.values, &ys.values).sxx == 0.0 {
                return Err("Regression is undefined when every x is the same".to_string());
            }
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<Computed, UnitError> {
        let (xs, ys) = series::pair(&self.input.data)?;
        let m = Moments::of(&xs.values, &ys.values);
        let (slope, intercept) = fit(&xs.values, &ys.values);
        // constant ys lie exactly on the horizontal fit
        let r_squared = if m.syy == 0.0 {
            1.0
        } else {
            (m.sxy * m.sxy / (m.sxx * m.syy)).min(1.0)
        };
        let fitted: Vec<f64> = xs.values.iter().map(|x| intercept + slope * x).collect();

        Ok(Computed::new(json!({
            "slope": finite(slope, "slope")?,
            "intercept": finite(intercept, "intercept")?,
            "r_squared": finite(r_squared, "r_squared")?,
            "fitted": finite_list(&fitted, "fitted value")?,
        }))
        .lossy(xs.lossy || ys.lossy))
    }
}
