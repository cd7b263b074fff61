//! Numeric sampling of symbolic expressions over the fixed plotting grid.
//!
//! Values are evaluated in the complex domain and only their real parts are kept. Non-finite
//! values (division by zero, overflow) stay in the sample at their grid position, they are
//! counted and skipped later by the renderer.
use crate::symbolic::symbolic_engine::{Expr, FreeVariable};
use crate::symbolic::symbolic_integration::{Antiderivative, NumericIntegral};
use crate::symbolic::utils::linspace;
use log::debug;

pub const GRID_START: f64 = -10.0;
pub const GRID_END: f64 = 10.0;
pub const GRID_POINTS: usize = 400;

/// Evenly spaced x values over a closed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    xs: Vec<f64>,
}

impl SampleGrid {
    pub fn new(start: f64, end: f64, num_values: usize) -> Self {
        SampleGrid {
            xs: linspace(start, end, num_values),
        }
    }

    /// 400 points on [-10, 10]
    pub fn standard() -> Self {
        SampleGrid::new(GRID_START, GRID_END, GRID_POINTS)
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// A labelled curve; `ys[i]` belongs to `xs[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSample {
    pub label: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl CurveSample {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn non_finite_count(&self) -> usize {
        self.ys.iter().filter(|y| !y.is_finite()).count()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Runs of consecutive finite points, the pieces a line is drawn from.
    pub fn finite_segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (x, y) in self.points() {
            if y.is_finite() {
                current.push((x, y));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// The selected point on the original function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightPoint {
    pub x: f64,
    pub y: f64,
}

impl HighlightPoint {
    /// `(x, y)` with the debug float formatting, e.g. `(3.0, 9.0)`
    pub fn annotation(&self) -> String {
        format!("({:?}, {:?})", self.x, self.y)
    }
}

/// Evaluates `expr` at every grid point, in grid order.
pub fn sample_curve(label: &str, expr: &Expr, var: &FreeVariable, grid: &SampleGrid) -> CurveSample {
    let ys = expr.calc_vector_lambdified1D(var.name(), grid.xs());
    let sample = CurveSample {
        label: label.to_string(),
        xs: grid.xs().to_vec(),
        ys,
    };
    debug!(
        "sampled '{}' at {} points, {} non-finite",
        label,
        sample.len(),
        sample.non_finite_count()
    );
    sample
}

/// Samples a closed-form antiderivative directly, a numeric one as `∫₀ˣ f(t) dt`.
///
/// Fails only when a quadrature rule of `degree` points cannot be built.
pub fn sample_antiderivative(
    label: &str,
    antiderivative: &Antiderivative,
    var: &FreeVariable,
    grid: &SampleGrid,
    degree: usize,
) -> Result<CurveSample, String> {
    match antiderivative {
        Antiderivative::Closed(expr) => Ok(sample_curve(label, expr, var, grid)),
        Antiderivative::Numeric { integrand, .. } => {
            let integral = NumericIntegral::new(integrand, var.name(), degree)?;
            let ys = grid.xs().iter().map(|x| integral.value_at(*x)).collect();
            Ok(CurveSample {
                label: label.to_string(),
                xs: grid.xs().to_vec(),
                ys,
            })
        }
    }
}

/// The original function at the slider position.
pub fn highlight_point(expr: &Expr, var: &FreeVariable, x: f64) -> HighlightPoint {
    let y = expr.eval_expression(var.name(), x);
    HighlightPoint { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::parse_expression;
    use approx::assert_relative_eq;

    fn parse(input: &str) -> Expr {
        parse_expression(input, &FreeVariable::default()).unwrap()
    }

    #[test]
    fn test_standard_grid() {
        let grid = SampleGrid::standard();
        assert_eq!(grid.len(), 400);
        assert_eq!(grid.xs()[0], -10.0);
        assert_eq!(grid.xs()[399], 10.0);
    }

    #[test]
    fn test_identity_samples_equal_grid() {
        let grid = SampleGrid::standard();
        let sample = sample_curve("x", &parse("x"), &FreeVariable::default(), &grid);
        assert_eq!(sample.label, "x");
        assert_eq!(sample.ys, sample.xs);
        assert_eq!(sample.xs, grid.xs());
    }

    #[test]
    fn test_complex_values_keep_real_part() {
        let grid = SampleGrid::new(-4.0, 4.0, 3);
        let sample = sample_curve("sqrt", &parse("sqrt(x)"), &FreeVariable::default(), &grid);
        assert_eq!(sample.ys, vec![0.0, 0.0, 2.0]);
        assert_eq!(sample.non_finite_count(), 0);
    }

    #[test]
    fn test_non_finite_values_are_kept_and_counted() {
        let grid = SampleGrid::new(-1.0, 1.0, 3);
        let sample = sample_curve("1/x", &parse("1/x"), &FreeVariable::default(), &grid);
        assert_eq!(sample.len(), 3);
        assert_eq!(sample.ys[0], -1.0);
        assert!(sample.ys[1].is_infinite());
        assert_eq!(sample.non_finite_count(), 1);
        assert_eq!(
            sample.finite_segments(),
            vec![vec![(-1.0, -1.0)], vec![(1.0, 1.0)]]
        );
    }

    #[test]
    fn test_highlight_point() {
        let point = highlight_point(&parse("x**2"), &FreeVariable::default(), 3.0);
        assert_eq!(point, HighlightPoint { x: 3.0, y: 9.0 });
        assert_eq!(point.annotation(), "(3.0, 9.0)");
        let point = highlight_point(&parse("x**3*(x*cos(x) + 4*sin(x))"), &FreeVariable::default(), 0.0);
        assert_eq!(point.annotation(), "(0.0, 0.0)");
    }

    #[test]
    fn test_numeric_antiderivative_sample() {
        let grid = SampleGrid::new(-2.0, 2.0, 5);
        let numeric = Antiderivative::Numeric {
            integrand: parse("3*x**2"),
            reason: "test".to_string(),
        };
        let sample =
            sample_antiderivative("Integral", &numeric, &FreeVariable::default(), &grid, 16)
                .unwrap();
        for (x, y) in sample.points() {
            assert_relative_eq!(y, x * x * x, epsilon = 1e-12);
        }
        assert!(
            sample_antiderivative("Integral", &numeric, &FreeVariable::default(), &grid, 0)
                .is_err()
        );
    }

    #[test]
    fn test_closed_antiderivative_sample() {
        let grid = SampleGrid::new(0.0, 2.0, 3);
        let closed = Antiderivative::Closed(parse("x**2"));
        let sample =
            sample_antiderivative("Integral", &closed, &FreeVariable::default(), &grid, 16)
                .unwrap();
        assert_eq!(sample.ys, vec![0.0, 1.0, 4.0]);
    }
}
