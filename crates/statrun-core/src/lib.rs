//! Statrun Core: Record contract, unit capabilities, orchestrator and run
//! persistence.
//!
//! A caller builds a [`Record`], hands it to [`Orchestrator::handle`] and
//! gets it back with one result entry per requested method and one outcome
//! per requested chart, plus a JSON snapshot in the results cache.
//!
//! ```text
//! Record → normalize → bounded dispatch → results → persist → charts → Record
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod record;
pub mod registry;
pub mod series;
pub mod store;
pub mod unit;

pub use config::EngineConfig;
pub use context::RunContext;
pub use error::StatrunError;
pub use orchestrator::Orchestrator;
pub use record::{
    Graphic, GraphicOutcome, GraphicRequest, InputResolver, MethodRequest, MethodSpec,
    NonNumericCell, Params, Record, ResultEntry, Selection,
};
pub use registry::{ChartRegistry, MethodRegistry, Registry};
pub use store::{RunStore, SavedRun};
pub use unit::{
    Applicability, ChartConstructor, ChartUnit, ComputationUnit, Computed, MethodConstructor,
    UnitError, UnitInput,
};

/// Engine version
pub const STATRUN_VERSION: &str = "1.0.0";
