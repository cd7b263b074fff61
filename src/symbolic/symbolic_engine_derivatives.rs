//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation of [`Expr`] trees and numerical checks of the results.
//!
//! ## Key Methods
//! - `diff(var)` - analytical derivative, not simplified
//! - `n_th_derivative1D(var, n)` - repeated differentiation
//! - `compare_num1D(...)` - analytical derivative vs central differences on a grid
//! - `equivalent_on(other, var, points, tol)` - numerical equality of two expressions
//!
//! Rules: sum, difference, product, quotient and chain rules; `Pow` is split into three
//! cases depending on which of base and exponent depend on the variable.

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{linspace, max_relative_deviation, numerical_derivative};

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    ///
    /// - Power rule: d/dx(f^n) = n*f^(n-1)*f' for exponents free of `var`
    /// - Exponential rule: d/dx(a^g) = a^g*log(a)*g' for bases free of `var`
    /// - General rule: d/dx(f^g) = f^g*(g'*log(f) + g*f'/f)
    /// - Product, quotient and chain rules for everything else
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let f = x.clone().pow(Expr::Const(2.0)); // x^2
    /// let df_dx = f.diff("x").simplify(); // 2*x
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Expr::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Expr::Mul(lhs, rhs) => {
                lhs.diff(var) * rhs.as_ref().clone() + lhs.as_ref().clone() * rhs.diff(var)
            }
            Expr::Div(lhs, rhs) => {
                let numerator =
                    lhs.diff(var) * rhs.as_ref().clone() - lhs.as_ref().clone() * rhs.diff(var);
                numerator / rhs.as_ref().clone().pow(Expr::Const(2.0))
            }
            Expr::Pow(base, exp) => {
                let base_depends = base.contains_variable(var);
                let exp_depends = exp.contains_variable(var);
                match (base_depends, exp_depends) {
                    (false, false) => Expr::Const(0.0),
                    (true, false) => {
                        let lowered = match exp.as_ref() {
                            Expr::Const(n) => Expr::Const(n - 1.0),
                            other => other.clone() - Expr::Const(1.0),
                        };
                        exp.as_ref().clone() * base.as_ref().clone().pow(lowered) * base.diff(var)
                    }
                    (false, true) => {
                        self.clone() * base.as_ref().clone().ln() * exp.diff(var)
                    }
                    (true, true) => {
                        let inner = exp.diff(var) * base.as_ref().clone().ln()
                            + exp.as_ref().clone() * base.diff(var) / base.as_ref().clone();
                        self.clone() * inner
                    }
                }
            }
            Expr::Exp(expr) => self.clone() * expr.diff(var),
            Expr::Ln(expr) => expr.diff(var) / expr.as_ref().clone(),
            Expr::sin(expr) => Expr::cos(expr.clone()) * expr.diff(var),
            Expr::cos(expr) => -Expr::sin(expr.clone()) * expr.diff(var),
            Expr::tan(expr) => {
                expr.diff(var) / Expr::cos(expr.clone()).pow(Expr::Const(2.0))
            }
            Expr::sqrt(expr) => {
                expr.diff(var) / (Expr::Const(2.0) * Expr::sqrt(expr.clone()))
            }
        }
    }

    /// n-th derivative, each step simplified
    pub fn n_th_derivative1D(&self, var_name: &str, n: usize) -> Expr {
        let mut expr = self.clone();
        for _ in 0..n {
            expr = expr.diff(var_name).simplify();
        }
        expr
    }

    /// Validates the analytical derivative against central differences on `[start, end]`.
    ///
    /// # Returns
    /// Tuple of (largest relative deviation, is within `max_dev`)
    pub fn compare_num1D(
        &self,
        var: &str,
        start: f64,
        end: f64,
        num_values: usize,
        max_dev: f64,
    ) -> (f64, bool) {
        let domain = linspace(start, end, num_values);
        let analytical_derivative = self.diff(var).calc_vector_lambdified1D(var, &domain);
        let function = self.lambdify1D(var);
        let step = 1e-6 * (end - start).abs().max(1.0);
        let numerical = numerical_derivative(&function, &domain, step);
        match max_relative_deviation(&analytical_derivative, &numerical) {
            Some(dev) => (dev, dev < max_dev),
            None => (f64::NAN, false),
        }
    }

    /// Numerical equality test: `self` and `other` agree at every point of `points` where
    /// both are finite, within relative tolerance `tol`.
    ///
    /// At least half of the points must be comparable, otherwise the answer is `false`.
    pub fn equivalent_on(&self, other: &Expr, var: &str, points: &[f64], tol: f64) -> bool {
        let lhs = self.calc_vector_lambdified1D(var, points);
        let rhs = other.calc_vector_lambdified1D(var, points);
        let comparable = lhs
            .iter()
            .zip(rhs.iter())
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .count();
        if comparable * 2 < points.len() {
            return false;
        }
        max_relative_deviation(&lhs, &rhs).is_some_and(|dev| dev <= tol)
    }
}
