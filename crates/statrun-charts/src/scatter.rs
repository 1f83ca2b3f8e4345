//! Scatter plots, optionally with the least-squares line.
use crate::canvas::{self, Frame, Span, PALETTE, PLOT_LEFT, PLOT_TOP};
use crate::output;
use statrun_core::series::{self, Series};
use statrun_core::{Applicability, ChartUnit, UnitInput};
use std::path::Path;
use svg::node::element::Circle;
use svg::Document;

/// `data[x_col]` and `data[y_col]`, defaulting to the first two sequences.
fn points(input: &UnitInput) -> Result<(Series, Series), String> {
    let x_col = canvas::column(input, "x_col")?.unwrap_or(0);
    let y_col = canvas::column(input, "y_col")?.unwrap_or(1);
    let xs = series::series_at(&input.data, x_col).map_err(|e| e.message)?;
    let ys = series::series_at(&input.data, y_col).map_err(|e| e.message)?;
    if xs.len() != ys.len() {
        return Err("There must be an equal number of xs and ys".to_string());
    }
    if xs.is_empty() {
        return Err("No numerical data provided".to_string());
    }
    Ok((xs, ys))
}

fn draw(input: &UnitInput, with_fit: bool) -> Result<Document, String> {
    let (xs, ys) = points(input)?;
    let line = if with_fit {
        let (slope, intercept) = statrun_methods::least_squares_fit(&xs.values, &ys.values);
        if !slope.is_finite() {
            return Err("Regression is undefined when every x is the same".to_string());
        }
        Some((slope, intercept))
    } else {
        None
    };

    let frame = Frame {
        x: Span::of(&xs.values).padded(),
        y: Span::of(&ys.values).padded(),
    };
    let default_title = if with_fit { "Line of best fit" } else { "Scatter plot" };
    let mut doc = frame.axes(canvas::page(&canvas::title(input, default_title)), true, true);

    for (x, y) in xs.values.iter().zip(&ys.values) {
        doc = doc.add(
            Circle::new()
                .set("cx", frame.px(*x))
                .set("cy", frame.py(*y))
                .set("r", 4)
                .set("fill", PALETTE[0])
                .set("fill-opacity", 0.8),
        );
    }

    if let Some((slope, intercept)) = line {
        let (lo, hi) = (frame.x.lo, frame.x.hi);
        doc = doc.add(
            canvas::rule(
                frame.px(lo),
                frame.py(intercept + slope * lo),
                frame.px(hi),
                frame.py(intercept + slope * hi),
                PALETTE[3],
            )
            .set("stroke-width", 2),
        );
        let caption = format!("y = {:.3}x + {:.3}", slope, intercept);
        doc = doc.add(canvas::label(caption, PLOT_LEFT + 10.0, PLOT_TOP + 16.0, "start"));
    }

    Ok(doc)
}

pub struct ScatterChart {
    input: UnitInput,
}

impl ScatterChart {
    pub fn boxed(input: UnitInput) -> Box<dyn ChartUnit> {
        Box::new(Self { input })
    }
}

impl ChartUnit for ScatterChart {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        canvas::check_output(&self.input)?;
        points(&self.input).map(|_| ())
    }

    fn render_to(&self, path: &Path) -> Result<(), String> {
        output::write(&draw(&self.input, false)?, path)
    }
}

pub struct BestFitChart {
    input: UnitInput,
}

impl BestFitChart {
    pub fn boxed(input: UnitInput) -> Box<dyn ChartUnit> {
        Box::new(Self { input })
    }
}

impl ChartUnit for BestFitChart {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        canvas::check_output(&self.input)?;
        let (xs, _) = points(&self.input)?;
        if xs.len() < 2 {
            return Err("At least two points are required".to_string());
        }
        Ok(())
    }

    fn render_to(&self, path: &Path) -> Result<(), String> {
        output::write(&draw(&self.input, true)?, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn input(data: Value, params: Value) -> UnitInput {
        UnitInput::new("scatter", data, json!([]), params.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_scatter_draws_every_point() {
        let doc = draw(&input(json!([[1, 2, 3], [2, 4, 5]]), json!({})), false).unwrap();
        assert_eq!(doc.to_string().matches("<circle").count(), 3);
    }

    #[test]
    fn test_columns_select_sequences() {
        let i = input(json!([[9, 9], [1, 2], [3, 4]]), json!({"x_col": 1, "y_col": 2}));
        let (xs, ys) = points(&i).unwrap();
        assert_eq!(xs.values, vec![1.0, 2.0]);
        assert_eq!(ys.values, vec![3.0, 4.0]);
    }

    #[test]
    fn test_best_fit_caption() {
        let doc = draw(&input(json!([[1, 2, 3, 4], [3, 5, 7, 9]]), json!({})), true).unwrap();
        assert!(doc.to_string().contains("y = 2.000x + 1.000"));
    }

    #[test]
    fn test_best_fit_needs_varying_x() {
        let err = draw(&input(json!([[2, 2], [1, 3]]), json!({})), true).unwrap_err();
        assert!(err.contains("every x"));
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let unit = ScatterChart::boxed(input(json!([[1, 2], [1]]), json!({"path": "s.svg"})));
        let outcome = unit.create_graphic();
        assert!(!outcome.ok);
        assert_eq!(outcome.path.as_deref(), Some("s.svg"));
    }
}
