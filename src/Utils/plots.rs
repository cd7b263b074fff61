//! Figure description and `plotters` rendering.
//!
//! A [`Figure`] holds everything a chart needs: three labelled curves on shared axes, the
//! highlighted point with its coordinate annotation and a legend flag. Rendering goes to a PNG
//! file (`BitMapBackend`) or to an in-memory SVG document (`SVGBackend`).
use crate::numerical::sampler::{CurveSample, HighlightPoint};
use itertools::{Itertools, MinMaxResult};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fmt;
use std::path::Path;

pub const FIGURE_TITLE: &str = "Calculus Visualizer";
pub const DERIVATIVE_LABEL: &str = "Derivative";
pub const INTEGRAL_LABEL: &str = "Integral";
const MARKER_RADIUS: i32 = 6;
/// share of the data range added above and below the curves
const Y_PADDING: f64 = 0.05;
/// axis bounds are kept inside ±Y_LIMIT so the padded span stays finite
const Y_LIMIT: f64 = 1e300;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// the drawing backend failed (file system, fonts, encoding)
    Backend(String),
    InvalidSize { width: u32, height: u32 },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::Backend(msg) => write!(f, "rendering failed: {}", msg),
            RenderError::InvalidSize { width, height } => {
                write!(f, "invalid figure size {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for RenderError {}

fn backend_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Backend(e.to_string())
}

/// Renderable chart of a function, its derivative and its integral.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub curves: Vec<CurveSample>,
    pub marker: HighlightPoint,
    pub annotation: String,
    pub legend: bool,
    pub x_label: String,
    pub y_label: String,
}

impl Figure {
    /// Chart with the three curves in the order original, derivative, integral.
    pub fn from_curves(
        original: CurveSample,
        derivative: CurveSample,
        integral: CurveSample,
        highlight: HighlightPoint,
        variable: &str,
    ) -> Figure {
        Figure {
            title: FIGURE_TITLE.to_string(),
            curves: vec![original, derivative, integral],
            annotation: highlight.annotation(),
            marker: highlight,
            legend: true,
            x_label: variable.to_string(),
            y_label: "y".to_string(),
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.curves.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn x_range(&self) -> (f64, f64) {
        let xs = self.curves.iter().flat_map(|c| c.xs.iter().copied());
        match finite_min_max(xs) {
            Some((min, max)) if min < max => (min, max),
            Some((v, _)) => (v - 1.0, v + 1.0),
            None => (-1.0, 1.0),
        }
    }

    /// Range of all finite y values and the marker, padded; non-finite values are ignored.
    pub fn y_range(&self) -> (f64, f64) {
        let ys = self
            .curves
            .iter()
            .flat_map(|c| c.ys.iter().copied())
            .chain(std::iter::once(self.marker.y));
        match finite_min_max(ys) {
            Some((min, max)) => {
                let (min, max) = (min.clamp(-Y_LIMIT, Y_LIMIT), max.clamp(-Y_LIMIT, Y_LIMIT));
                if min < max {
                    let pad = (max - min) * Y_PADDING;
                    (min - pad, max + pad)
                } else {
                    let pad = (min.abs() * Y_PADDING).max(1.0);
                    (min - pad, min + pad)
                }
            }
            None => (-1.0, 1.0),
        }
    }
}

fn finite_min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match values.filter(|v| v.is_finite()).minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

fn draw_figure<DB: DrawingBackend>(
    figure: &Figure,
    root: &DrawingArea<DB, Shift>,
) -> Result<(), RenderError> {
    root.fill(&WHITE).map_err(backend_error)?;
    let (x_min, x_max) = figure.x_range();
    let (y_min, y_max) = figure.y_range();

    let mut chart = ChartBuilder::on(root)
        .caption(&figure.title, ("sans-serif", 30))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(backend_error)?;

    chart
        .configure_mesh()
        .x_desc(&figure.x_label)
        .y_desc(&figure.y_label)
        .draw()
        .map_err(backend_error)?;

    for (col, curve) in figure.curves.iter().enumerate() {
        let style = Palette99::pick(col).stroke_width(2);
        // points beyond the axis bounds are drawn on the edge
        let clip = |segment: Vec<(f64, f64)>| {
            segment
                .into_iter()
                .map(move |(x, y)| (x, y.clamp(y_min, y_max)))
        };
        // a line never crosses a non-finite value
        let mut segments = curve.finite_segments().into_iter();
        // the first series carries the legend entry, even when there is nothing to draw
        let first = segments.next().unwrap_or_default();
        chart
            .draw_series(LineSeries::new(clip(first), style))
            .map_err(backend_error)?
            .label(curve.label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], &Palette99::pick(col))
            });
        for segment in segments {
            chart
                .draw_series(LineSeries::new(clip(segment), style))
                .map_err(backend_error)?;
        }
    }

    let mut marker = figure.marker;
    if marker.x.is_finite() && marker.y.is_finite() {
        marker.y = marker.y.clamp(y_min, y_max);
        chart
            .draw_series(std::iter::once(Circle::new(
                (marker.x, marker.y),
                MARKER_RADIUS,
                RED.filled(),
            )))
            .map_err(backend_error)?;
        chart
            .draw_series(std::iter::once(Text::new(
                figure.annotation.clone(),
                (marker.x, marker.y),
                ("sans-serif", 18).into_font(),
            )))
            .map_err(backend_error)?;
    }

    if figure.legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(backend_error)?;
    }
    root.present().map_err(backend_error)?;
    Ok(())
}

fn check_size((width, height): (u32, u32)) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize { width, height });
    }
    Ok(())
}

/// Draws the figure into a PNG file.
pub fn render_png(figure: &Figure, path: &Path, size: (u32, u32)) -> Result<(), RenderError> {
    check_size(size)?;
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_figure(figure, &root)
}

/// Draws the figure into an SVG document held in memory.
pub fn render_svg_string(figure: &Figure, size: (u32, u32)) -> Result<String, RenderError> {
    check_size(size)?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_figure(figure, &root)?;
    }
    Ok(svg)
}
