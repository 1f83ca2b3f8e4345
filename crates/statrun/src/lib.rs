//! Statrun: statistics runs over a dataset selection.
//!
//! Wires the built-in methods and charts into an [`Orchestrator`] and
//! re-exports the core contract.
//!
//! ```no_run
//! use statrun::{EngineConfig, Params, Record};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), statrun::StatrunError> {
//! let orchestrator = statrun::default_orchestrator(EngineConfig::default());
//! let mut record = Record::new("ds1", 1)
//!     .with_data(json!([2, 4, 6, 8]))
//!     .with_method("mean", Params::new());
//! let saved = orchestrator.handle(&mut record).await?;
//! println!("{} -> {}", record.results[0].value, saved.snapshot.display());
//! # Ok(())
//! # }
//! ```

pub use statrun_charts as charts;
pub use statrun_core::*;
pub use statrun_methods as methods;

use tracing_subscriber::EnvFilter;

/// Orchestrator with every built-in method and chart registered.
pub fn default_orchestrator(config: EngineConfig) -> Orchestrator {
    Orchestrator::new(
        config,
        statrun_methods::REGISTRY.clone(),
        statrun_charts::REGISTRY.clone(),
    )
}

/// Install the stderr `fmt` subscriber, filtered by `RUST_LOG` (default
/// `info`). Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_orchestrator_registers_builtins() {
        let orchestrator = default_orchestrator(EngineConfig::default());
        assert!(orchestrator.methods().contains("chi_squared"));
        assert!(orchestrator.charts().contains("bar"));
        assert_eq!(orchestrator.config().workers(), 4);
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
