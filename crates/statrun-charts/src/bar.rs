//! Vertical and horizontal bar charts.
use crate::canvas::{self, Frame, Span, PALETTE, PLOT_BOTTOM, PLOT_LEFT, PLOT_RIGHT, PLOT_TOP};
use crate::output;
use statrun_core::{Applicability, ChartUnit, UnitInput};
use std::path::Path;
use svg::node::element::Rectangle;
use svg::Document;

/// Share of each slot taken by its bar.
const BAR_FILL: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Vertical,
    Horizontal,
}

fn applicable(input: &UnitInput) -> Applicability {
    canvas::check_output(input)?;
    canvas::values(input).map(|_| ())
}

fn draw(input: &UnitInput, orientation: Orientation) -> Result<Document, String> {
    let values = canvas::values(input)?.values;
    let labels = canvas::labels(input, values.len());
    let span = Span::of(&values).with_zero().padded();
    let n = values.len() as f32;

    let mut doc = canvas::page(&canvas::title(input, "Bar chart"));
    match orientation {
        Orientation::Vertical => {
            let frame = Frame { x: Span { lo: 0.0, hi: 1.0 }, y: span };
            let slot = (PLOT_RIGHT - PLOT_LEFT) / n;
            doc = frame.axes(doc, false, true);
            for (i, (v, name)) in values.iter().zip(&labels).enumerate() {
                let (top, base) = (frame.py(*v), frame.py(0.0));
                let x = PLOT_LEFT + slot * (i as f32 + (1.0 - BAR_FILL) / 2.0);
                doc = doc
                    .add(
                        Rectangle::new()
                            .set("x", x)
                            .set("y", top.min(base))
                            .set("width", slot * BAR_FILL)
                            .set("height", (base - top).abs())
                            .set("fill", PALETTE[0]),
                    )
                    .add(canvas::label(
                        name.as_str(),
                        PLOT_LEFT + slot * (i as f32 + 0.5),
                        PLOT_BOTTOM + 18.0,
                        "middle",
                    ));
            }
        }
        Orientation::Horizontal => {
            let frame = Frame { x: span, y: Span { lo: 0.0, hi: 1.0 } };
            let slot = (PLOT_BOTTOM - PLOT_TOP) / n;
            doc = frame.axes(doc, true, false);
            for (i, (v, name)) in values.iter().zip(&labels).enumerate() {
                let (end, base) = (frame.px(*v), frame.px(0.0));
                let y = PLOT_TOP + slot * (i as f32 + (1.0 - BAR_FILL) / 2.0);
                doc = doc
                    .add(
                        Rectangle::new()
                            .set("x", end.min(base))
                            .set("y", y)
                            .set("width", (end - base).abs())
                            .set("height", slot * BAR_FILL)
                            .set("fill", PALETTE[0]),
                    )
                    .add(canvas::label(
                        name.as_str(),
                        PLOT_LEFT - 8.0,
                        PLOT_TOP + slot * (i as f32 + 0.5) + 4.0,
                        "end",
                    ));
            }
        }
    }
    Ok(doc)
}

pub struct BarChart {
    input: UnitInput,
}

impl BarChart {
    pub fn boxed(input: UnitInput) -> Box<dyn ChartUnit> {
        Box::new(Self { input })
    }
}

impl ChartUnit for BarChart {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        applicable(&self.input)
    }

    fn render_to(&self, path: &Path) -> Result<(), String> {
        output::write(&draw(&self.input, Orientation::Vertical)?, path)
    }
}

pub struct HorizontalBarChart {
    input: UnitInput,
}

impl HorizontalBarChart {
    pub fn boxed(input: UnitInput) -> Box<dyn ChartUnit> {
        Box::new(Self { input })
    }
}

impl ChartUnit for HorizontalBarChart {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        applicable(&self.input)
    }

    fn render_to(&self, path: &Path) -> Result<(), String> {
        output::write(&draw(&self.input, Orientation::Horizontal)?, path)
    }
}
