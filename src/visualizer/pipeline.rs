//! One run of the visualizer: text and slider position in, figure or error indicator out.
//!
//! ```text
//! parse -> differentiate / integrate -> sample -> Figure
//!   |
//!   +-- ParseError -> "Invalid function"
//! ```
//! Parsing is the only step that can fail. A missing closed-form integral or non-finite
//! samples are reported as [`Notice`]s next to a normal result.
use crate::Utils::config::{VisualizerConfig, clamp_point};
use crate::Utils::plots::{DERIVATIVE_LABEL, Figure, INTEGRAL_LABEL};
use crate::numerical::sampler::{
    CurveSample, HighlightPoint, SampleGrid, highlight_point, sample_antiderivative, sample_curve,
};
use crate::symbolic::parse_expr::parse_expression;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_integration::{Antiderivative, antiderivative};
use log::{debug, error, info, warn};
use std::fmt;

pub const APP_TITLE: &str = "Calculus Visualizer";
pub const CONFIGURATION_HEADING: &str = "Configuration";
pub const FUNCTION_INPUT_LABEL: &str = "Function";
pub const POINT_INPUT_LABEL: &str = "Select a point in the range (-10,10)";
pub const INVALID_FUNCTION: &str = "Invalid function";

pub const DERIVATIVE_HEADING: &str = "What is a Derivative?";
pub const DERIVATIVE_TEXT: &str = "The derivative measures how a function changes as its input changes. \
It's a fundamental concept in calculus. Loosely speaking, a derivative \
can be thought of as how much one quantity is changing in response to \
changes in some other quantity; for example, the derivative of the \
position of a moving object with respect to time is the object's velocity, \
and the derivative of velocity with respect to time is acceleration.";

pub const INTEGRAL_HEADING: &str = "What is an Integral?";
pub const INTEGRAL_TEXT: &str = "The integral, on the other hand, is the accumulation of quantities. \
It can be interpreted as the area under a curve. In a physical sense, \
if the derivative of a position function gives a velocity function, \
then the integral of a velocity function gives a position function.";

/// The two inputs of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationRequest {
    pub expression: String,
    pub point: f64,
}

impl VisualizationRequest {
    /// The point is clamped into [-10, 10].
    pub fn new(expression: &str, point: f64) -> Self {
        VisualizationRequest {
            expression: expression.to_string(),
            point: clamp_point(point),
        }
    }
}

/// Non-fatal observations of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// the integral curve is `∫₀ˣ f` computed by quadrature
    NumericIntegral { reason: String },
    /// `count` grid points of `curve` have no finite value and are not drawn
    NonFiniteSamples { curve: String, count: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Notice::NumericIntegral { .. } => write!(
                f,
                "no closed-form integral found, showing the numeric integral from 0"
            ),
            Notice::NonFiniteSamples { curve, count } => {
                write!(f, "{}: {} point(s) are undefined and not drawn", curve, count)
            }
        }
    }
}

/// Successful result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Visualization {
    pub function: Expr,
    pub derivative: Expr,
    pub antiderivative: Antiderivative,
    pub figure: Figure,
    pub notices: Vec<Notice>,
}

impl Visualization {
    /// legend label of the original function
    pub fn function_label(&self) -> String {
        self.function.to_string()
    }

    pub fn original(&self) -> &CurveSample {
        &self.figure.curves[0]
    }

    pub fn derivative_sample(&self) -> &CurveSample {
        &self.figure.curves[1]
    }

    pub fn integral_sample(&self) -> &CurveSample {
        &self.figure.curves[2]
    }

    pub fn highlight(&self) -> HighlightPoint {
        self.figure.marker
    }
}

/// What the user sees when the text is not a valid function.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorIndicator {
    message: String,
}

impl ErrorIndicator {
    pub fn invalid_function() -> Self {
        ErrorIndicator {
            message: INVALID_FUNCTION.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorIndicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Rendered(Visualization),
    Error(ErrorIndicator),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

fn undefined_curve(label: &str, grid: &SampleGrid) -> CurveSample {
    CurveSample {
        label: label.to_string(),
        xs: grid.xs().to_vec(),
        ys: vec![f64::NAN; grid.len()],
    }
}

/// Runs the whole pipeline for one request.
pub fn visualize(request: &VisualizationRequest, config: &VisualizerConfig) -> Response {
    let var = config.free_variable();
    let function = match parse_expression(&request.expression, &var) {
        Ok(function) => function,
        Err(e) => {
            warn!("cannot parse '{}': {}", request.expression, e);
            return Response::Error(ErrorIndicator::invalid_function());
        }
    };
    info!("visualizing {} at {} = {}", function, var, request.point);

    let derivative = function.diff(var.name()).simplify();
    let integral = antiderivative(&function, var.name());
    debug!("d/d{} = {}", var, derivative);

    let mut notices = Vec::new();
    if let Antiderivative::Numeric { reason, .. } = &integral {
        notices.push(Notice::NumericIntegral {
            reason: reason.clone(),
        });
    }

    let grid = SampleGrid::standard();
    let label = function.to_string();
    let original = sample_curve(&label, &function, &var, &grid);
    let derivative_curve = sample_curve(DERIVATIVE_LABEL, &derivative, &var, &grid);
    let integral_curve = sample_antiderivative(
        INTEGRAL_LABEL,
        &integral,
        &var,
        &grid,
        config.quadrature_degree,
    )
    .unwrap_or_else(|e| {
        error!("integral curve unavailable: {}", e);
        undefined_curve(INTEGRAL_LABEL, &grid)
    });

    for curve in [&original, &derivative_curve, &integral_curve] {
        let count = curve.non_finite_count();
        if count > 0 {
            notices.push(Notice::NonFiniteSamples {
                curve: curve.label.clone(),
                count,
            });
        }
    }

    let highlight = highlight_point(&function, &var, request.point);
    let figure = Figure::from_curves(
        original,
        derivative_curve,
        integral_curve,
        highlight,
        var.name(),
    );
    Response::Rendered(Visualization {
        function,
        derivative,
        antiderivative: integral,
        figure,
        notices,
    })
}
