//! # Symbolic Expression Simplification Module
//!
//! Light algebraic cleanup applied to derivatives and antiderivatives before they are
//! evaluated and displayed. Only two kinds of rewriting are done:
//!
//! 1. **Constant Folding**: arithmetic and function calls on numerical constants
//! 2. **Algebraic Identities**: `x + 0 = x`, `x * 1 = x`, `x * 0 = 0`, `x**1 = x`,
//!    `x**0 = 1`, `-(-x) = x`, merging of nested constant factors
//!
//! No terms are collected or reordered beyond pulling constant factors to the front, so
//! the result stays recognizably close to what the rules produced.

use crate::symbolic::symbolic_engine::Expr;

const MAX_PASSES: usize = 16;

fn constant(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Const(c) => Some(*c),
        _ => None,
    }
}

/// splits `c*e` into `(c, e)`
fn split_factor(expr: &Expr) -> Option<(f64, &Expr)> {
    match expr {
        Expr::Mul(lhs, rhs) => constant(lhs).map(|c| (c, rhs.as_ref())),
        _ => None,
    }
}

/// true only when `expr` cannot be zero (or undefined) for any value of the variable
fn is_nonzero(expr: &Expr) -> bool {
    match expr {
        Expr::Const(c) => *c != 0.0 && c.is_finite(),
        Expr::Exp(_) => true,
        Expr::Mul(lhs, rhs) => is_nonzero(lhs) && is_nonzero(rhs),
        Expr::Div(lhs, rhs) => is_nonzero(lhs) && is_nonzero(rhs),
        Expr::Pow(base, exp) => is_nonzero(base) && constant(exp).is_some(),
        _ => false,
    }
}

fn is_integer(c: f64) -> bool {
    c.is_finite() && c.fract() == 0.0
}

fn fold_function(expr: &Expr, arg: f64) -> Option<f64> {
    let value = match expr {
        Expr::Exp(_) => arg.exp(),
        Expr::Ln(_) if arg > 0.0 => arg.ln(),
        Expr::sin(_) => arg.sin(),
        Expr::cos(_) => arg.cos(),
        Expr::tan(_) => arg.tan(),
        Expr::sqrt(_) if arg >= 0.0 => arg.sqrt(),
        _ => return None,
    };
    value.is_finite().then_some(value)
}

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies until a fixed point is reached (bounded number of passes).
    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        for _ in 0..MAX_PASSES {
            let next = current.simplify_pass();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// one bottom-up pass
    fn simplify_pass(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => simplify_add(lhs.simplify_pass(), rhs.simplify_pass()),
            Expr::Sub(lhs, rhs) => simplify_sub(lhs.simplify_pass(), rhs.simplify_pass()),
            Expr::Mul(lhs, rhs) => simplify_mul(lhs.simplify_pass(), rhs.simplify_pass()),
            Expr::Div(lhs, rhs) => simplify_div(lhs.simplify_pass(), rhs.simplify_pass()),
            Expr::Pow(base, exp) => simplify_pow(base.simplify_pass(), exp.simplify_pass()),
            Expr::Exp(arg)
            | Expr::Ln(arg)
            | Expr::sin(arg)
            | Expr::cos(arg)
            | Expr::tan(arg)
            | Expr::sqrt(arg) => {
                let arg = arg.simplify_pass();
                if let Some(value) = constant(&arg).and_then(|c| fold_function(self, c)) {
                    return Expr::Const(value);
                }
                let arg = arg.boxed();
                match self {
                    Expr::Exp(_) => Expr::Exp(arg),
                    Expr::Ln(_) => Expr::Ln(arg),
                    Expr::sin(_) => Expr::sin(arg),
                    Expr::cos(_) => Expr::cos(arg),
                    Expr::tan(_) => Expr::tan(arg),
                    _ => Expr::sqrt(arg),
                }
            }
        }
    }
}

fn simplify_add(lhs: Expr, rhs: Expr) -> Expr {
    match (constant(&lhs), constant(&rhs)) {
        (Some(a), Some(b)) => return Expr::Const(a + b),
        (Some(a), _) if a == 0.0 => return rhs,
        (_, Some(b)) if b == 0.0 => return lhs,
        (_, Some(b)) if b < 0.0 => return Expr::Sub(lhs.boxed(), Expr::Const(-b).boxed()),
        _ => {}
    }
    if let Some((c, inner)) = split_factor(&rhs) {
        if c < 0.0 {
            return simplify_sub(lhs, simplify_mul(Expr::Const(-c), inner.clone()));
        }
    }
    Expr::Add(lhs.boxed(), rhs.boxed())
}

fn simplify_sub(lhs: Expr, rhs: Expr) -> Expr {
    match (constant(&lhs), constant(&rhs)) {
        (Some(a), Some(b)) => return Expr::Const(a - b),
        (_, Some(b)) if b == 0.0 => return lhs,
        (Some(a), _) if a == 0.0 => return simplify_mul(Expr::Const(-1.0), rhs),
        (_, Some(b)) if b < 0.0 => return Expr::Add(lhs.boxed(), Expr::Const(-b).boxed()),
        _ => {}
    }
    if let Some((c, inner)) = split_factor(&rhs) {
        if c < 0.0 {
            return simplify_add(lhs, simplify_mul(Expr::Const(-c), inner.clone()));
        }
    }
    Expr::Sub(lhs.boxed(), rhs.boxed())
}

fn simplify_mul(lhs: Expr, rhs: Expr) -> Expr {
    match (constant(&lhs), constant(&rhs)) {
        (Some(a), Some(b)) => return Expr::Const(a * b),
        (Some(a), _) if a == 0.0 => return Expr::Const(0.0),
        (_, Some(b)) if b == 0.0 => return Expr::Const(0.0),
        (Some(a), _) if a == 1.0 => return rhs,
        (_, Some(b)) if b == 1.0 => return lhs,
        // constants go to the front
        (None, Some(_)) => return simplify_mul(rhs, lhs),
        _ => {}
    }
    match (split_factor(&lhs), split_factor(&rhs)) {
        // a*(b*e) = (a*b)*e
        (None, Some((b, inner))) => {
            if let Some(a) = constant(&lhs) {
                return simplify_mul(Expr::Const(a * b), inner.clone());
            }
            // e*(b*f) = b*(e*f)
            return simplify_mul(Expr::Const(b), Expr::Mul(lhs.boxed(), inner.clone().boxed()));
        }
        // (a*e)*f = a*(e*f)
        (Some((a, inner)), None) if constant(&rhs).is_none() => {
            return simplify_mul(Expr::Const(a), Expr::Mul(inner.clone().boxed(), rhs.boxed()));
        }
        (Some((a, l)), Some((b, r))) => {
            return simplify_mul(
                Expr::Const(a * b),
                Expr::Mul(l.clone().boxed(), r.clone().boxed()),
            );
        }
        _ => {}
    }
    Expr::Mul(lhs.boxed(), rhs.boxed())
}

fn simplify_div(lhs: Expr, rhs: Expr) -> Expr {
    match (constant(&lhs), constant(&rhs)) {
        (Some(a), Some(b)) if b != 0.0 => return Expr::Const(a / b),
        // 0/e stays undefined where e vanishes
        (Some(a), None) if a == 0.0 && is_nonzero(&rhs) => return Expr::Const(0.0),
        (_, Some(b)) if b == 1.0 => return lhs,
        (_, Some(b)) if b == -1.0 => return simplify_mul(Expr::Const(-1.0), lhs),
        _ => {}
    }
    // (c*e)/d = (c/d)*e for constant d
    if let (Some((c, inner)), Some(d)) = (split_factor(&lhs), constant(&rhs)) {
        if d != 0.0 {
            return simplify_mul(Expr::Const(c / d), inner.clone());
        }
    }
    Expr::Div(lhs.boxed(), rhs.boxed())
}

fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    match (constant(&base), constant(&exp)) {
        (Some(b), Some(e)) => {
            let value = b.powf(e);
            if (b >= 0.0 || is_integer(e)) && value.is_finite() {
                return Expr::Const(value);
            }
        }
        (_, Some(e)) if e == 0.0 => return Expr::Const(1.0),
        (_, Some(e)) if e == 1.0 => return base,
        (Some(b), _) if b == 1.0 => return Expr::Const(1.0),
        _ => {}
    }
    // (b**m)**n = b**(m*n) for integer m and n
    if let (Expr::Pow(inner_base, inner_exp), Some(n)) = (&base, constant(&exp)) {
        if let Some(m) = constant(inner_exp) {
            if is_integer(m) && is_integer(n) {
                return simplify_pow(inner_base.as_ref().clone(), Expr::Const(m * n));
            }
        }
    }
    Expr::Pow(base.boxed(), exp.boxed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::Var("x".to_string())
    }

    #[test]
    fn test_constant_folding() {
        let expr = Expr::Const(2.0) * Expr::Const(3.0) + Expr::Const(1.0);
        assert_eq!(expr.simplify(), Expr::Const(7.0));
        let expr = Expr::Const(2.0).pow(Expr::Const(10.0));
        assert_eq!(expr.simplify(), Expr::Const(1024.0));
        let expr = Expr::sin(Expr::Const(0.0).boxed());
        assert_eq!(expr.simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_identities() {
        assert_eq!((x() + Expr::Const(0.0)).simplify(), x());
        assert_eq!((Expr::Const(0.0) + x()).simplify(), x());
        assert_eq!((x() * Expr::Const(1.0)).simplify(), x());
        assert_eq!((x() * Expr::Const(0.0)).simplify(), Expr::Const(0.0));
        assert_eq!(x().pow(Expr::Const(1.0)).simplify(), x());
        assert_eq!(x().pow(Expr::Const(0.0)).simplify(), Expr::Const(1.0));
        assert_eq!((x() / Expr::Const(1.0)).simplify(), x());
    }

    #[test]
    fn test_double_negation() {
        assert_eq!((-(-x())).simplify(), x());
    }

    #[test]
    fn test_constant_factors_are_merged() {
        let expr = Expr::Const(2.0) * (Expr::Const(3.0) * x());
        assert_eq!(expr.simplify(), Expr::Const(6.0) * x());
        let expr = x() * Expr::Const(2.0);
        assert_eq!(expr.simplify(), Expr::Const(2.0) * x());
        let expr = (Expr::Const(4.0) * x()) / Expr::Const(2.0);
        assert_eq!(expr.simplify(), Expr::Const(2.0) * x());
    }

    #[test]
    fn test_negative_terms_become_subtraction() {
        let expr = x() + Expr::Const(-1.0) * Expr::sin(x().boxed());
        assert_eq!(expr.simplify(), x() - Expr::sin(x().boxed()));
        let expr = x() - Expr::Const(-2.0);
        assert_eq!(expr.simplify(), x() + Expr::Const(2.0));
    }

    #[test]
    fn test_nested_integer_powers() {
        let expr = x().pow(Expr::Const(2.0)).pow(Expr::Const(3.0));
        assert_eq!(expr.simplify(), x().pow(Expr::Const(6.0)));
    }

    #[test]
    fn test_derivative_of_square_simplifies_to_2x() {
        let expr = x().pow(Expr::Const(2.0)).diff("x").simplify();
        assert_eq!(expr, Expr::Const(2.0) * x());
        assert_eq!(expr.to_string(), "2*x");
    }

    #[test]
    fn test_derivative_of_sin_simplifies_to_cos() {
        let expr = Expr::sin(x().boxed()).diff("x").simplify();
        assert_eq!(expr, Expr::cos(x().boxed()));
    }

    #[test]
    fn test_zero_numerator_keeps_vanishing_denominator() {
        let vanishing = x() - x();
        let expr = Expr::Const(0.0) / vanishing.clone();
        assert_eq!(expr.simplify(), Expr::Div(Expr::Const(0.0).boxed(), vanishing.boxed()));
        assert!(expr.simplify().eval_expression("x", 1.0).is_nan());
        let expr = Expr::Const(0.0) / (Expr::Const(2.0) * x().exp());
        assert_eq!(expr.simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_derivative_of_undefined_quotient_stays_undefined() {
        let f = Expr::Const(1.0) / (x() - x());
        let derivative = f.diff("x").simplify();
        assert!(derivative.eval_expression("x", 2.0).is_nan());
    }

    #[test]
    fn test_negative_base_fractional_power_is_not_folded() {
        let expr = Expr::Const(-8.0).pow(Expr::Const(0.5));
        assert_eq!(expr.simplify(), expr);
    }
}
