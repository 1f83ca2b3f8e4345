//! Shared drawing surface: page, plot frame, axes and parameter helpers.
use crate::output::OutputFormat;
use serde_json::Value;
use statrun_core::series::{self, Series};
use statrun_core::{Applicability, UnitInput};
use svg::node::element::{Line, Rectangle, Text};
use svg::Document;

pub(crate) const WIDTH: f32 = 800.0;
pub(crate) const HEIGHT: f32 = 600.0;
pub(crate) const PLOT_LEFT: f32 = 90.0;
pub(crate) const PLOT_RIGHT: f32 = WIDTH - 40.0;
pub(crate) const PLOT_TOP: f32 = 70.0;
pub(crate) const PLOT_BOTTOM: f32 = HEIGHT - 80.0;
const TICKS: usize = 5;

pub(crate) const PALETTE: [&str; 8] = [
    "#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3", "#937860", "#da8bc3", "#8c8c8c",
];
pub(crate) const INK: &str = "#1f2937";
const GRID: &str = "#e5e7eb";

/// A path is present and names a supported format.
pub(crate) fn check_output(input: &UnitInput) -> Applicability {
    let path = input
        .output_path()
        .ok_or_else(|| "No output path provided".to_string())?;
    OutputFormat::for_path(&path).map(|_| ())
}

pub(crate) fn title(input: &UnitInput, default: &str) -> String {
    input
        .params
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// `params.labels` padded with 1-based positions.
pub(crate) fn labels(input: &UnitInput, n: usize) -> Vec<String> {
    let given = input.params.get("labels").and_then(Value::as_array);
    (0..n)
        .map(|i| match given.and_then(|l| l.get(i)) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => (i + 1).to_string(),
            Some(other) => other.to_string(),
        })
        .collect()
}

/// Column index parameter; `None` when absent.
pub(crate) fn column(input: &UnitInput, key: &str) -> Result<Option<usize>, String> {
    match input.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|c| Some(c as usize))
            .ok_or_else(|| format!("{} must be a non-negative integer", key)),
    }
}

/// The flat sequence to plot: `data[column]` when given, else `data` itself.
pub(crate) fn values(input: &UnitInput) -> Result<Series, String> {
    let s = match column(input, "column")? {
        Some(col) => series::series_at(&input.data, col),
        None => {
            series::flat_len(&input.data)?;
            series::series(&input.data)
        }
    }
    .map_err(|e| e.message)?;
    if s.is_empty() {
        return Err("No numerical data provided".to_string());
    }
    Ok(s)
}

/// Blank page with a background and centred title.
pub(crate) fn page(title: &str) -> Document {
    Document::new()
        .set("viewBox", (0, 0, WIDTH, HEIGHT))
        .set("width", WIDTH)
        .set("height", HEIGHT)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", WIDTH)
                .set("height", HEIGHT)
                .set("fill", "#ffffff"),
        )
        .add(
            Text::new(title)
                .set("x", WIDTH / 2.0)
                .set("y", 40)
                .set("text-anchor", "middle")
                .set("font-family", "sans-serif")
                .set("font-size", 20)
                .set("fill", INK),
        )
}

pub(crate) fn label(text: impl Into<String>, x: f32, y: f32, anchor: &str) -> Text {
    Text::new(text)
        .set("x", x)
        .set("y", y)
        .set("text-anchor", anchor)
        .set("font-family", "sans-serif")
        .set("font-size", 12)
        .set("fill", INK)
}

/// Closed data interval, widened when degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Span {
    pub lo: f64,
    pub hi: f64,
}

impl Span {
    pub fn of(xs: &[f64]) -> Self {
        let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { lo, hi }.widened()
    }

    /// Stretched to include zero, for bars.
    pub fn with_zero(self) -> Self {
        Self {
            lo: self.lo.min(0.0),
            hi: self.hi.max(0.0),
        }
        .widened()
    }

    /// Five percent breathing room on both ends.
    pub fn padded(self) -> Self {
        let pad = (self.hi - self.lo) * 0.05;
        Self {
            lo: self.lo - pad,
            hi: self.hi + pad,
        }
    }

    fn widened(self) -> Self {
        if self.hi > self.lo {
            self
        } else {
            Self {
                lo: self.lo - 1.0,
                hi: self.hi + 1.0,
            }
        }
    }

    /// Position of `v` in `[0, 1]` along the span.
    pub fn fraction(&self, v: f64) -> f32 {
        ((v - self.lo) / (self.hi - self.lo)) as f32
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        (0..=TICKS).map(move |i| self.lo + (self.hi - self.lo) * i as f64 / TICKS as f64)
    }
}

/// Maps data coordinates onto the plot rectangle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub x: Span,
    pub y: Span,
}

impl Frame {
    pub fn px(&self, x: f64) -> f32 {
        PLOT_LEFT + self.x.fraction(x) * (PLOT_RIGHT - PLOT_LEFT)
    }

    pub fn py(&self, y: f64) -> f32 {
        PLOT_BOTTOM - self.y.fraction(y) * (PLOT_BOTTOM - PLOT_TOP)
    }

    /// Axis lines plus gridlines and tick labels on the numeric axes.
    pub fn axes(&self, mut doc: Document, numeric_x: bool, numeric_y: bool) -> Document {
        if numeric_y {
            for t in self.y.ticks() {
                let y = self.py(t);
                doc = doc
                    .add(rule(PLOT_LEFT, y, PLOT_RIGHT, y, GRID))
                    .add(label(tick(t), PLOT_LEFT - 8.0, y + 4.0, "end"));
            }
        }
        if numeric_x {
            for t in self.x.ticks() {
                let x = self.px(t);
                doc = doc
                    .add(rule(x, PLOT_TOP, x, PLOT_BOTTOM, GRID))
                    .add(label(tick(t), x, PLOT_BOTTOM + 18.0, "middle"));
            }
        }
        doc.add(rule(PLOT_LEFT, PLOT_BOTTOM, PLOT_RIGHT, PLOT_BOTTOM, INK))
            .add(rule(PLOT_LEFT, PLOT_TOP, PLOT_LEFT, PLOT_BOTTOM, INK))
    }
}

pub(crate) fn rule(x1: f32, y1: f32, x2: f32, y2: f32, stroke: &str) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", stroke)
        .set("stroke-width", 1)
}

fn tick(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    // avoid "-0"
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
