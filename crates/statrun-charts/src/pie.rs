//! Pie chart over non-negative values.
use crate::canvas::{self, PALETTE};
use crate::output;
use statrun_core::{Applicability, ChartUnit, UnitInput};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::Path;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Path as SvgPath, Rectangle};
use svg::Document;

const RADIUS: f64 = 200.0;
const CENTER_X: f64 = 320.0;
const CENTER_Y: f64 = 320.0;
const LEGEND_X: f32 = 580.0;

fn shares(input: &UnitInput) -> Result<Vec<f64>, String> {
    let values = canvas::values(input)?.values;
    if values.iter().any(|v| *v < 0.0) {
        return Err("Pie chart values must be non-negative".to_string());
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err("Pie chart values must have a positive total".to_string());
    }
    Ok(values.iter().map(|v| v / total).collect())
}

fn on_circle(angle: f64) -> (f64, f64) {
    (CENTER_X + RADIUS * angle.cos(), CENTER_Y + RADIUS * angle.sin())
}

fn draw(input: &UnitInput) -> Result<Document, String> {
    let shares = shares(input)?;
    let labels = canvas::labels(input, shares.len());
    let mut doc = canvas::page(&canvas::title(input, "Pie chart"));

    // clockwise from twelve o'clock
    let mut start = -FRAC_PI_2;
    for (i, (share, name)) in shares.iter().zip(&labels).enumerate() {
        let colour = PALETTE[i % PALETTE.len()];
        if *share >= 1.0 {
            doc = doc.add(
                Circle::new()
                    .set("cx", CENTER_X)
                    .set("cy", CENTER_Y)
                    .set("r", RADIUS)
                    .set("fill", colour),
            );
        } else if *share > 0.0 {
            let end = start + share * TAU;
            let (x0, y0) = on_circle(start);
            let (x1, y1) = on_circle(end);
            let large_arc = if *share > 0.5 { 1.0 } else { 0.0 };
            let data = Data::new()
                .move_to((CENTER_X, CENTER_Y))
                .line_to((x0, y0))
                .elliptical_arc_to((RADIUS, RADIUS, 0.0, large_arc, 1.0, x1, y1))
                .close();
            doc = doc.add(
                SvgPath::new()
                    .set("d", data)
                    .set("fill", colour)
                    .set("stroke", "#ffffff")
                    .set("stroke-width", 1),
            );
            start = end;
        }

        let y = 100.0 + i as f32 * 24.0;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", LEGEND_X)
                    .set("y", y - 11.0)
                    .set("width", 14)
                    .set("height", 14)
                    .set("fill", colour),
            )
            .add(canvas::label(
                format!("{} ({:.1}%)", name, share * 100.0),
                LEGEND_X + 22.0,
                y,
                "start",
            ));
    }
    Ok(doc)
}

pub struct PieChart {
    input: UnitInput,
}

impl PieChart {
    pub fn boxed(input: UnitInput) -> Box<dyn ChartUnit> {
        Box::new(Self { input })
    }
}

impl ChartUnit for PieChart {
    fn input(&self) -> &UnitInput {
        &self.input
    }

    fn is_applicable(&self) -> Applicability {
        canvas::check_output(&self.input)?;
        shares(&self.input).map(|_| ())
    }

    fn render_to(&self, path: &Path) -> Result<(), String> {
        output::write(&draw(&self.input)?, path)
    }
}
