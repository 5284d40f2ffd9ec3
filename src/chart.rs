// src/chart.rs

use plotters::prelude::*;
use tracing::debug;

use crate::error::ChartError;
use crate::process::aggregate::YearlyAggregate;

pub const CHART_TITLE: &str = "Global Electricity Production Over Time";
pub const X_LABEL: &str = "Year";
pub const Y_LABEL: &str = "Total Electricity Production (GWh)";

/// 10×6 in at 100 dpi.
pub const DEFAULT_SIZE: (u32, u32) = (1000, 600);

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const MARKER_RADIUS: i32 = 4;
const MAX_X_LABELS: usize = 12;

/// A finished line chart, ready for a display layer to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// `(year, total)` in ascending year order.
    pub points: Vec<(i32, f64)>,
    pub markers: bool,
    pub grid: bool,
}

impl Chart {
    /// Year on x, summed value on y, one marker per year.
    pub fn from_yearly(yearly: &YearlyAggregate) -> Self {
        Self {
            title: CHART_TITLE.to_string(),
            x_label: X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
            points: yearly.iter().map(|t| (t.year, t.value)).collect(),
            markers: true,
            grid: true,
        }
    }

    /// Draw to an SVG document of `size` pixels.
    /// Fails without drawing if any point is non-finite.
    pub fn to_svg(&self, size: (u32, u32)) -> Result<String, ChartError> {
        if let Some(&(year, value)) = self.points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ChartError(format!("total for {} is not finite ({})", year, value)));
        }
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            self.draw(&root).map_err(|e| ChartError(e.to_string()))?;
            root.present().map_err(|e| ChartError(e.to_string()))?;
        }
        debug!(points = self.points.len(), bytes = svg.len(), "rendered chart");
        Ok(svg)
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, plotters::coord::Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        let (x_range, y_range) = self.ranges();
        let year_label = |y: &i32| y.to_string();
        let total_label = |v: &f64| format!("{:.0}", v);
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(100)
            .build_cartesian_2d(x_range, y_range)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_labels(self.points.len().clamp(2, MAX_X_LABELS))
            .x_label_formatter(&year_label)
            .y_label_formatter(&total_label);
        if !self.grid {
            mesh.disable_mesh();
        }
        mesh.draw()?;

        chart.draw_series(LineSeries::new(self.points.iter().copied(), &LINE_COLOR))?;
        if self.markers {
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&p| Circle::new(p, MARKER_RADIUS, LINE_COLOR.filled())),
            )?;
        }
        Ok(())
    }

    /// Axis ranges with a little headroom; a single point still gets a visible span.
    fn ranges(&self) -> (std::ops::Range<i32>, std::ops::Range<f64>) {
        let (mut x_min, mut x_max) = (i32::MAX, i32::MIN);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in &self.points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if self.points.is_empty() {
            return (0..1, 0.0..1.0);
        }

        let x_range = if x_min == x_max {
            (x_min - 1)..(x_max + 1)
        } else {
            x_min..x_max
        };

        let span = y_max - y_min;
        let pad = if span > 0.0 {
            span * 0.05
        } else if y_max != 0.0 {
            y_max.abs() * 0.05
        } else {
            1.0
        };
        (x_range, (y_min - pad)..(y_max + pad))
    }
}
