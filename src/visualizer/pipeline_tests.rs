//! End-to-end checks of one visualizer run.
use crate::Utils::config::VisualizerConfig;
use crate::numerical::sampler::{GRID_END, GRID_POINTS, GRID_START};
use crate::symbolic::parse_expr::parse_expression;
use crate::symbolic::symbolic_engine::{Expr, FreeVariable};
use crate::symbolic::symbolic_integration::Antiderivative;
use crate::symbolic::utils::linspace;
use crate::visualizer::pipeline::{
    INVALID_FUNCTION, Notice, Response, Visualization, VisualizationRequest, visualize,
};
use approx::assert_relative_eq;

fn run(expression: &str, point: f64) -> Response {
    visualize(
        &VisualizationRequest::new(expression, point),
        &VisualizerConfig::default(),
    )
}

fn rendered(expression: &str, point: f64) -> Visualization {
    match run(expression, point) {
        Response::Rendered(v) => v,
        Response::Error(e) => panic!("'{}' was rejected: {}", expression, e),
    }
}

fn parse(input: &str) -> Expr {
    parse_expression(input, &FreeVariable::default()).unwrap()
}

fn grid() -> Vec<f64> {
    linspace(GRID_START, GRID_END, GRID_POINTS)
}

#[test]
fn test_default_request() {
    let v = rendered("x**3*(x*cos(x) + 4*sin(x))", 0.0);
    assert_eq!(
        v.figure.labels(),
        vec!["x**3*(x*cos(x) + 4*sin(x))", "Derivative", "Integral"]
    );
    for curve in &v.figure.curves {
        assert_eq!(curve.len(), 400);
        assert_eq!(curve.xs, grid());
    }
    assert_eq!(v.highlight().x, 0.0);
    assert_eq!(v.highlight().y, 0.0);
    assert_eq!(v.figure.annotation, "(0.0, 0.0)");
    assert!(v.antiderivative.is_closed());
    assert!(v.notices.is_empty());
}

#[test]
fn test_highlight_of_square() {
    let v = rendered("x**2", 2.0);
    assert_eq!(v.highlight().y, 4.0);
    let v = rendered("x**2", 3.0);
    assert_eq!(v.figure.annotation, "(3.0, 9.0)");
}

#[test]
fn test_point_outside_slider_range_is_clamped() {
    let v = rendered("x", 12.0);
    assert_eq!(v.highlight().x, 10.0);
    assert_eq!(v.highlight().y, 10.0);
}

#[test]
fn test_invalid_inputs_give_error_indicator() {
    for input in ["", "x +", "x +* 2", "foo(x)", "y + 1", "sin(", "2 ** ** x"] {
        match run(input, 0.0) {
            Response::Error(e) => assert_eq!(e.message(), INVALID_FUNCTION),
            Response::Rendered(v) => panic!("'{}' rendered as {}", input, v.function),
        }
    }
}

#[test]
fn test_identity_samples_the_grid() {
    let v = rendered("x", 0.0);
    assert_eq!(v.original().ys, grid());
    assert!(v.derivative_sample().ys.iter().all(|y| *y == 1.0));
    for (x, y) in v.integral_sample().points() {
        assert_relative_eq!(y, 0.5 * x * x, epsilon = 1e-9);
    }
}

#[test]
fn test_derivative_matches_product_rule() {
    let v = rendered("x**3*(x*cos(x) + 4*sin(x))", 0.0);
    let by_hand = parse("3*x**2*(x*cos(x) + 4*sin(x)) + x**3*(5*cos(x) - x*sin(x))");
    assert!(v.derivative.equivalent_on(&by_hand, "x", &grid(), 1e-9));
}

#[test]
fn test_derivative_of_integral_is_integrand() {
    let v = rendered("2*x", 0.0);
    match &v.antiderivative {
        Antiderivative::Closed(closed) => {
            assert!(closed.diff("x").equivalent_on(&parse("2*x"), "x", &grid(), 1e-9));
        }
        other => panic!("expected a closed form, got {:?}", other),
    }
}

#[test]
fn test_integral_curve_of_default_expression() {
    // x**4*sin(x) differentiates to the default expression
    let v = rendered("x**3*(x*cos(x) + 4*sin(x))", 0.0);
    for (x, y) in v.integral_sample().points() {
        assert_relative_eq!(y, x.powi(4) * x.sin(), epsilon = 1e-6, max_relative = 1e-9);
    }
}

#[test]
fn test_numeric_integral_notice() {
    let v = rendered("exp(x**2)", 1.0);
    assert!(!v.antiderivative.is_closed());
    assert!(
        v.notices
            .iter()
            .any(|n| matches!(n, Notice::NumericIntegral { .. }))
    );
    // ∫₀ˣ vanishes at the origin and is odd for an even integrand
    let integral = v.integral_sample();
    let first = integral.ys[0];
    let last = integral.ys[GRID_POINTS - 1];
    assert_relative_eq!(first, -last, max_relative = 1e-9);
    assert!(last > 0.0);
}

#[test]
fn test_non_finite_samples_notice() {
    let v = rendered("1/(x - 10)", 0.0);
    let label = v.function_label();
    // the grid ends exactly at x = 10
    assert!(v.original().ys[GRID_POINTS - 1].is_infinite());
    assert!(v.notices.iter().any(|n| matches!(
        n,
        Notice::NonFiniteSamples { curve, count } if *curve == label && *count >= 1
    )));
    assert!(v.original().ys[..GRID_POINTS - 1].iter().all(|y| y.is_finite()));
}

#[test]
fn test_other_variable_name() {
    let config = VisualizerConfig {
        variable: "t".to_string(),
        ..VisualizerConfig::default()
    };
    let response = visualize(&VisualizationRequest::new("t**2", 3.0), &config);
    match response {
        Response::Rendered(v) => {
            assert_eq!(v.highlight().y, 9.0);
            assert_eq!(v.figure.x_label, "t");
        }
        Response::Error(e) => panic!("rejected: {}", e),
    }
    assert!(visualize(&VisualizationRequest::new("x**2", 3.0), &config).is_error());
}

#[test]
fn test_huge_values_keep_a_finite_axis() {
    let v = rendered("9*x**307", 0.0);
    let (lo, hi) = v.figure.y_range();
    assert!(lo.is_finite() && hi.is_finite() && lo < hi);
}

#[test]
fn test_undefined_function_has_undefined_derivative() {
    let v = rendered("1/(x - x)", 0.0);
    assert_eq!(v.original().non_finite_count(), GRID_POINTS);
    assert_eq!(v.derivative_sample().non_finite_count(), GRID_POINTS);
    assert_eq!(v.figure.labels(), vec!["1/(x - x)", "Derivative", "Integral"]);
}
