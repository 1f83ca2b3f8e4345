//! Statrun Charts: the built-in chart types.
//!
//! Every chart draws an SVG document in memory and writes it to
//! `params.path`; the extension picks the encoding (`.svg`, `.png`,
//! `.jpg`/`.jpeg`).

mod bar;
mod canvas;
pub mod output;
mod pie;
mod scatter;

pub use bar::{BarChart, HorizontalBarChart};
pub use output::OutputFormat;
pub use pie::PieChart;
pub use scatter::{BestFitChart, ScatterChart};

use once_cell::sync::Lazy;
use statrun_core::ChartRegistry;

/// Every built-in chart under its type and aliases.
pub fn registry() -> ChartRegistry {
    ChartRegistry::new()
        .with("bar", BarChart::boxed)
        .with("vert_bar", BarChart::boxed)
        .with("horizontal_bar", HorizontalBarChart::boxed)
        .with("hbar", HorizontalBarChart::boxed)
        .with("scatter", ScatterChart::boxed)
        .with("line_of_best_fit", BestFitChart::boxed)
        .with("best_fit", BestFitChart::boxed)
        .with("pie", PieChart::boxed)
}

/// Shared default registry.
pub static REGISTRY: Lazy<ChartRegistry> = Lazy::new(registry);
