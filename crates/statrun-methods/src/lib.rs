//! Statrun Methods: the built-in statistics.
//!
//! Each method is a [`ComputationUnit`](statrun_core::ComputationUnit)
//! constructed per invocation from a [`UnitInput`](statrun_core::UnitInput).
//! Aliases map to the same constructor and echo the requested id.
//!
//! | ids | data |
//! |---|---|
//! | `mean`, `median`, `mode` | flat sequence |
//! | `std`, `std_dev`, `variance`, `cv`, `variation` | flat sequence |
//! | `percentile`, `percentiles` | flat sequence, `p` param |
//! | `binomial` | `[n, p, k_min, k_max]` |
//! | `chi_squared`, `chi_square` | `[observed, expected]` |
//! | `least_squares_regression`, `regression`, `pearson`, `spearman` | `[xs, ys]` |

mod binomial;
mod chi_squared;
mod correlation;
mod location;
mod regression;
mod spread;

pub use binomial::Binomial;
pub use chi_squared::ChiSquared;
pub use correlation::{Pearson, Spearman};
pub use location::{Mean, Median, Mode};
pub use regression::{fit as least_squares_fit, LeastSquaresRegression};
pub use spread::{CoefficientOfVariation, Percentile, StandardDeviation, Variance};

use once_cell::sync::Lazy;
use statrun_core::MethodRegistry;

/// Every built-in method under its id and aliases.
pub fn registry() -> MethodRegistry {
    MethodRegistry::new()
        .with("mean", Mean::boxed)
        .with("median", Median::boxed)
        .with("mode", Mode::boxed)
        .with("std", StandardDeviation::boxed)
        .with("std_dev", StandardDeviation::boxed)
        .with("variance", Variance::boxed)
        .with("cv", CoefficientOfVariation::boxed)
        .with("variation", CoefficientOfVariation::boxed)
        .with("percentile", Percentile::boxed)
        .with("percentiles", Percentile::boxed)
        .with("binomial", Binomial::boxed)
        .with("chi_squared", ChiSquared::boxed)
        .with("chi_square", ChiSquared::boxed)
        .with("least_squares_regression", LeastSquaresRegression::boxed)
        .with("regression", LeastSquaresRegression::boxed)
        .with("spearman", Spearman::boxed)
        .with("pearson", Pearson::boxed)
}

/// Shared default registry.
pub static REGISTRY: Lazy<MethodRegistry> = Lazy::new(registry);
