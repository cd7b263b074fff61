//! LAMBDIFICATION - turning symbolic expressions into numeric closures.
//!
//! Closures work in the complex plane: `sqrt(x)` at `x = -4` is `2i`, `log(x)` at `x = -1` is
//! `iπ`, and intermediate imaginary parts may cancel (`sqrt(x)**2 == x` for negative `x`).
//! The real-valued entry point [`Expr::lambdify1D`] keeps only the real part of the result.
//!
//! Operations whose operands are real stay on the real code path (`f64::powi`, `f64::powf`,
//! `f64::sin` ...), so real input evaluates exactly as plain `f64` arithmetic would, including
//! `1/0 = inf`.
use crate::symbolic::symbolic_engine::Expr;
use num_complex::Complex64;

pub type ComplexFn = Box<dyn Fn(Complex64) -> Complex64 + Send + Sync>;
pub type RealFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

fn is_real(z: Complex64) -> bool {
    z.im == 0.0
}

fn real(value: f64) -> Complex64 {
    Complex64::new(value, 0.0)
}

fn div(a: Complex64, b: Complex64) -> Complex64 {
    if is_real(a) && is_real(b) {
        real(a.re / b.re)
    } else {
        a / b
    }
}

fn pow_integer(base: Complex64, n: i32) -> Complex64 {
    if is_real(base) {
        real(base.re.powi(n))
    } else {
        base.powi(n)
    }
}

fn pow_general(base: Complex64, exp: Complex64) -> Complex64 {
    if is_real(base) && is_real(exp) && base.re >= 0.0 {
        real(base.re.powf(exp.re))
    } else {
        base.powc(exp)
    }
}

/// constant integral exponents small enough for `powi`
fn integer_exponent(exp: &Expr) -> Option<i32> {
    match exp {
        Expr::Const(c) if c.fract() == 0.0 && c.abs() <= i32::MAX as f64 => Some(*c as i32),
        _ => None,
    }
}

fn unary(inner: ComplexFn, on_real: fn(f64) -> f64, on_complex: fn(Complex64) -> Complex64) -> ComplexFn {
    Box::new(move |z| {
        let v = inner(z);
        if is_real(v) { real(on_real(v.re)) } else { on_complex(v) }
    })
}

impl Expr {
    /// Compiles the expression into a complex closure of the variable `var`.
    ///
    /// Variables other than `var` evaluate to NaN.
    pub fn lambdify1D_complex(&self, var: &str) -> ComplexFn {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Box::new(|z| z)
                } else {
                    Box::new(|_| real(f64::NAN))
                }
            }
            Expr::Const(val) => {
                let val = real(*val);
                Box::new(move |_| val)
            }
            Expr::Add(lhs, rhs) => {
                let lf = lhs.lambdify1D_complex(var);
                let rf = rhs.lambdify1D_complex(var);
                Box::new(move |z| lf(z) + rf(z))
            }
            Expr::Sub(lhs, rhs) => {
                let lf = lhs.lambdify1D_complex(var);
                let rf = rhs.lambdify1D_complex(var);
                Box::new(move |z| lf(z) - rf(z))
            }
            Expr::Mul(lhs, rhs) => {
                let lf = lhs.lambdify1D_complex(var);
                let rf = rhs.lambdify1D_complex(var);
                Box::new(move |z| {
                    let (a, b) = (lf(z), rf(z));
                    if is_real(a) && is_real(b) { real(a.re * b.re) } else { a * b }
                })
            }
            Expr::Div(lhs, rhs) => {
                let lf = lhs.lambdify1D_complex(var);
                let rf = rhs.lambdify1D_complex(var);
                Box::new(move |z| div(lf(z), rf(z)))
            }
            Expr::Pow(base, exp) => {
                let bf = base.lambdify1D_complex(var);
                match integer_exponent(exp) {
                    Some(n) => Box::new(move |z| pow_integer(bf(z), n)),
                    None => {
                        let ef = exp.lambdify1D_complex(var);
                        Box::new(move |z| pow_general(bf(z), ef(z)))
                    }
                }
            }
            Expr::Exp(e) => unary(e.lambdify1D_complex(var), f64::exp, |z| z.exp()),
            Expr::Ln(e) => {
                let f = e.lambdify1D_complex(var);
                Box::new(move |z| {
                    let v = f(z);
                    if is_real(v) && v.re >= 0.0 { real(v.re.ln()) } else { v.ln() }
                })
            }
            Expr::sin(e) => unary(e.lambdify1D_complex(var), f64::sin, |z| z.sin()),
            Expr::cos(e) => unary(e.lambdify1D_complex(var), f64::cos, |z| z.cos()),
            Expr::tan(e) => unary(e.lambdify1D_complex(var), f64::tan, |z| z.tan()),
            Expr::sqrt(e) => {
                let f = e.lambdify1D_complex(var);
                Box::new(move |z| {
                    let v = f(z);
                    if is_real(v) && v.re >= 0.0 { real(v.re.sqrt()) } else { v.sqrt() }
                })
            }
        }
    }

    /// Real-valued closure of `var`: the real part of [`Expr::lambdify1D_complex`].
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let f = x.pow(Expr::Const(2.0)); // x^2
    /// let func = f.lambdify1D("x");
    /// assert_eq!(func(3.0), 9.0);
    /// ```
    pub fn lambdify1D(&self, var: &str) -> RealFn {
        let compiled = self.lambdify1D_complex(var);
        Box::new(move |x| compiled(real(x)).re)
    }

    /// One-off evaluation, use `lambdify1D` for repeated calls.
    pub fn eval_expression(&self, var: &str, value: f64) -> f64 {
        self.lambdify1D(var)(value)
    }

    /// Evaluates the expression at every point of `x`.
    pub fn calc_vector_lambdified1D(&self, var: &str, x: &[f64]) -> Vec<f64> {
        let func = self.lambdify1D(var);
        x.iter().map(|xi| func(*xi)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x() -> Expr {
        Expr::Var("x".to_string())
    }

    #[test]
    fn test_lambdify1d_single_variable() {
        let func = x().lambdify1D("x");
        assert_eq!(func(5.0), 5.0);
    }

    #[test]
    fn test_lambdify1d_constant() {
        let func = Expr::Const(42.0).lambdify1D("x");
        assert_eq!(func(100.0), 42.0);
    }

    #[test]
    fn test_lambdify1d_polynomial() {
        let expr = x() * x() + x() * Expr::Const(2.0) + Expr::Const(1.0); // x^2 + 2x + 1
        let func = expr.lambdify1D("x");
        assert_eq!(func(3.0), 16.0);
    }

    #[test]
    fn test_integer_powers_are_exact() {
        let func = x().pow(Expr::Const(2.0)).lambdify1D("x");
        assert_eq!(func(2.0), 4.0);
        assert_eq!(func(3.0), 9.0);
        assert_eq!(func(-3.0), 9.0);
        let cube = x().pow(Expr::Const(3.0)).lambdify1D("x");
        assert_eq!(cube(-2.0), -8.0);
    }

    #[test]
    fn test_lambdify1d_trigonometric() {
        let func = Expr::sin(Box::new(x())).lambdify1D("x");
        assert_relative_eq!(func(std::f64::consts::FRAC_PI_2), 1.0, epsilon = 1e-15);
        let func = Expr::tan(Box::new(x())).lambdify1D("x");
        assert_relative_eq!(func(std::f64::consts::FRAC_PI_4), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_sqrt_of_negative_keeps_real_part() {
        let sqrt = Expr::sqrt(Box::new(x()));
        assert_eq!(sqrt.lambdify1D("x")(-4.0), 0.0);
        let complex = sqrt.lambdify1D_complex("x")(Complex64::new(-4.0, 0.0));
        assert_relative_eq!(complex.im, 2.0, epsilon = 1e-15);
        // the imaginary parts cancel again
        let squared = sqrt.pow(Expr::Const(2.0)).lambdify1D("x");
        assert_relative_eq!(squared(-4.0), -4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fractional_power_of_negative_base() {
        // (-8)**(1/3) is the principal complex root 1 + i*sqrt(3)
        let func = x().pow(Expr::Const(1.0 / 3.0)).lambdify1D("x");
        assert_relative_eq!(func(-8.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(func(8.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_log_of_negative_keeps_real_part() {
        let func = x().ln().lambdify1D("x");
        assert_relative_eq!(func(-std::f64::consts::E), 1.0, epsilon = 1e-12);
        assert_eq!(func(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        let func = (Expr::Const(1.0) / x()).lambdify1D("x");
        assert_eq!(func(0.0), f64::INFINITY);
        assert!(func(0.0).is_infinite());
    }

    #[test]
    fn test_calc_vector() {
        let ys = x().calc_vector_lambdified1D("x", &[1.0, 2.0, 3.0]);
        assert_eq!(ys, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_foreign_variable_is_nan() {
        let func = Expr::Var("y".to_string()).lambdify1D("x");
        assert!(func(1.0).is_nan());
    }
}
