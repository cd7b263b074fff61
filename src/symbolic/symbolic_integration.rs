//! SYMBOLIC INTEGRATION
//!
//! Indefinite integrals of single-variable expressions, constant of integration zero.
//!
//! The integrand is first expanded into a sum of terms (products are distributed over sums,
//! small positive integer powers of sums are multiplied out). Every term is normalized to
//! `coeff * x^n * f1 * f2 * ...` and integrated by one of:
//! - power rule, `log(x)` for `n = -1`;
//! - tabular integration by parts for `x^n * K(a*x + b)` where `K` is `sin`, `cos` or `exp`
//!   and `n` is a non-negative integer; products of several kernels are first reduced with
//!   the product-to-sum identities;
//! - linear substitution for `(a*x + b)^p`, `sqrt(a*x + b)`, `tan(a*x + b)`,
//!   `1/cos(a*x + b)^2` and `c^(a*x + b)`.
//!
//! Results of the tabular rule are collected by `(power, kernel)` so that cancelling terms
//! disappear: `x**3*(x*cos(x) + 4*sin(x))` integrates to `x**4*sin(x)`.
//!
//! [`antiderivative`] wraps all of this: a closed form that passes a derivative check, or a
//! numeric antiderivative evaluated by Gauss-Legendre quadrature.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::RealFn;
use gauss_quad::GaussLegendre;
use log::{debug, info};

const MAX_TERMS: usize = 256;
const MAX_EXPANDED_POWER: f64 = 8.0;
const MAX_KERNEL_FACTORS: usize = 8;
const MAX_TABULAR_POWER: f64 = 40.0;
/// points where a closed form's derivative must reproduce the integrand
const PROBE_POINTS: [f64; 12] = [
    -9.3, -7.1, -4.7, -2.9, -1.3, -0.45, 0.35, 1.7, 3.1, 5.3, 7.9, 9.6,
];
const PROBE_TOLERANCE: f64 = 1e-6;
/// widest panel of the composite quadrature
const MAX_PANEL_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum KernelKind {
    Sin,
    Cos,
    Exp,
}

/// `kind(a*x + b)`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Kernel {
    kind: KernelKind,
    a: f64,
    b: f64,
}

impl Kernel {
    fn from_expr(expr: &Expr, var: &str) -> Option<Kernel> {
        let (kind, arg) = match expr {
            Expr::sin(arg) => (KernelKind::Sin, arg),
            Expr::cos(arg) => (KernelKind::Cos, arg),
            Expr::Exp(arg) => (KernelKind::Exp, arg),
            _ => return None,
        };
        let (a, b) = arg.linear_coefficients(var)?;
        Some(Kernel { kind, a, b })
    }

    fn to_expr(self, var: &str) -> Expr {
        let arg = linear_expr(self.a, self.b, var).boxed();
        match self.kind {
            KernelKind::Sin => Expr::sin(arg),
            KernelKind::Cos => Expr::cos(arg),
            KernelKind::Exp => Expr::Exp(arg),
        }
    }

    /// value of a kernel whose argument does not depend on the variable
    fn constant_value(self) -> Option<f64> {
        if self.a != 0.0 {
            return None;
        }
        Some(match self.kind {
            KernelKind::Sin => self.b.sin(),
            KernelKind::Cos => self.b.cos(),
            KernelKind::Exp => self.b.exp(),
        })
    }

    /// `j`-th repeated antiderivative (`j >= 1`) in the kernel's own argument, as a sign and
    /// the kernel it lands on
    fn repeated_antiderivative(self, j: usize) -> (f64, Kernel) {
        let (sign, kind) = match self.kind {
            KernelKind::Sin => match (j - 1) % 4 {
                0 => (-1.0, KernelKind::Cos),
                1 => (-1.0, KernelKind::Sin),
                2 => (1.0, KernelKind::Cos),
                _ => (1.0, KernelKind::Sin),
            },
            KernelKind::Cos => match (j - 1) % 4 {
                0 => (1.0, KernelKind::Sin),
                1 => (-1.0, KernelKind::Cos),
                2 => (-1.0, KernelKind::Sin),
                _ => (1.0, KernelKind::Cos),
            },
            KernelKind::Exp => (1.0, KernelKind::Exp),
        };
        (sign, Kernel { kind, ..self })
    }

    /// Product of two kernels as a weighted sum of kernels.
    fn product(self, other: Kernel) -> Option<Vec<(f64, Kernel)>> {
        let sum = |kind| Kernel {
            kind,
            a: self.a + other.a,
            b: self.b + other.b,
        };
        let difference = |kind| Kernel {
            kind,
            a: self.a - other.a,
            b: self.b - other.b,
        };
        use KernelKind::*;
        let terms = match (self.kind, other.kind) {
            (Exp, Exp) => vec![(1.0, sum(Exp))],
            (Sin, Sin) => vec![(0.5, difference(Cos)), (-0.5, sum(Cos))],
            (Cos, Cos) => vec![(0.5, difference(Cos)), (0.5, sum(Cos))],
            (Sin, Cos) => vec![(0.5, sum(Sin)), (0.5, difference(Sin))],
            (Cos, Sin) => vec![(0.5, sum(Sin)), (-0.5, difference(Sin))],
            _ => return None,
        };
        Some(terms)
    }
}

/// `a*x + b` with the trivial parts left out
fn linear_expr(a: f64, b: f64, var: &str) -> Expr {
    (Expr::Const(a) * Expr::Var(var.to_string()) + Expr::Const(b)).simplify()
}

/// `x^n` with `n = 0` and `n = 1` written out
fn power_of(var: &str, n: f64) -> Expr {
    let x = Expr::Var(var.to_string());
    if n == 0.0 {
        Expr::Const(1.0)
    } else if n == 1.0 {
        x
    } else {
        x.pow(Expr::Const(n))
    }
}

fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// A piece of an antiderivative.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    /// `coeff * x^power * kernel`
    Monomial {
        coeff: f64,
        power: f64,
        kernel: Option<Kernel>,
    },
    Other(Expr),
}

impl Piece {
    fn to_expr(&self, var: &str) -> Expr {
        match self {
            Piece::Monomial {
                coeff,
                power,
                kernel,
            } => {
                let mut expr = Expr::Const(*coeff) * power_of(var, *power);
                if let Some(kernel) = kernel {
                    expr = expr * kernel.to_expr(var);
                }
                expr
            }
            Piece::Other(expr) => expr.clone(),
        }
    }
}

/// Sums monomials with equal power and kernel, drops those that cancel.
fn collect_pieces(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut collected: Vec<Piece> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if let Piece::Monomial {
            coeff,
            power,
            kernel,
        } = &piece
        {
            let same = collected.iter_mut().find(|p| {
                matches!(p, Piece::Monomial { power: p_pow, kernel: p_ker, .. }
                    if p_pow == power && p_ker == kernel)
            });
            if let Some(Piece::Monomial { coeff: total, .. }) = same {
                *total += coeff;
                continue;
            }
        }
        collected.push(piece);
    }
    let scale = collected
        .iter()
        .filter_map(|p| match p {
            Piece::Monomial { coeff, .. } => Some(coeff.abs()),
            Piece::Other(_) => None,
        })
        .fold(0.0, f64::max);
    collected.retain(|p| match p {
        Piece::Monomial { coeff, .. } => coeff.abs() > 1e-12 * scale,
        Piece::Other(_) => true,
    });
    collected
}

/// `coeff * x^power * factors...`
#[derive(Debug, Clone)]
struct Term {
    coeff: f64,
    power: f64,
    factors: Vec<Expr>,
}

impl Term {
    fn from_expr(expr: &Expr, var: &str) -> Term {
        let mut term = Term {
            coeff: 1.0,
            power: 0.0,
            factors: Vec::new(),
        };
        term.absorb(expr, var, 1.0);
        term
    }

    /// multiplies (`sign = 1`) or divides (`sign = -1`) the term by `expr`
    fn absorb(&mut self, expr: &Expr, var: &str, sign: f64) {
        match expr {
            Expr::Const(c) => {
                if sign > 0.0 {
                    self.coeff *= c;
                } else {
                    self.coeff /= c;
                }
            }
            Expr::Var(name) if name == var => self.power += sign,
            Expr::Mul(lhs, rhs) => {
                self.absorb(lhs, var, sign);
                self.absorb(rhs, var, sign);
            }
            Expr::Div(lhs, rhs) => {
                self.absorb(lhs, var, sign);
                self.absorb(rhs, var, -sign);
            }
            Expr::Pow(base, exp) => match (base.as_ref(), exp.as_ref()) {
                (Expr::Var(name), Expr::Const(n)) if name == var => self.power += sign * n,
                (_, Expr::Const(n))
                    if sign > 0.0
                        && is_integer(*n)
                        && *n >= 1.0
                        && *n <= MAX_KERNEL_FACTORS as f64
                        && Kernel::from_expr(base, var).is_some() =>
                {
                    for _ in 0..(*n as usize) {
                        self.factors.push(base.as_ref().clone());
                    }
                }
                (_, Expr::Const(n)) => self
                    .factors
                    .push(base.as_ref().clone().pow(Expr::Const(sign * n))),
                _ => self.push_factor(expr, sign),
            },
            _ => self.push_factor(expr, sign),
        }
    }

    fn push_factor(&mut self, expr: &Expr, sign: f64) {
        if sign > 0.0 {
            self.factors.push(expr.clone());
        } else {
            self.factors.push(expr.clone().pow(Expr::Const(-1.0)));
        }
    }
}

/// Splits an expression into additive terms.
fn expand(expr: &Expr) -> Result<Vec<Expr>, String> {
    let terms = match expr {
        Expr::Add(lhs, rhs) => {
            let mut terms = expand(lhs)?;
            terms.extend(expand(rhs)?);
            terms
        }
        Expr::Sub(lhs, rhs) => {
            let mut terms = expand(lhs)?;
            terms.extend(expand(rhs)?.into_iter().map(|t| -t));
            terms
        }
        Expr::Mul(lhs, rhs) => multiply_out(&expand(lhs)?, &expand(rhs)?)?,
        Expr::Div(lhs, rhs) => expand(lhs)?
            .into_iter()
            .map(|t| t / rhs.as_ref().clone())
            .collect(),
        Expr::Pow(base, exp) => match exp.as_ref() {
            Expr::Const(n) if is_integer(*n) && *n >= 2.0 && *n <= MAX_EXPANDED_POWER => {
                let base_terms = expand(base)?;
                if base_terms.len() > 1 {
                    let mut terms = base_terms.clone();
                    for _ in 1..(*n as usize) {
                        terms = multiply_out(&terms, &base_terms)?;
                    }
                    terms
                } else {
                    vec![expr.clone()]
                }
            }
            _ => vec![expr.clone()],
        },
        _ => vec![expr.clone()],
    };
    if terms.len() > MAX_TERMS {
        return Err(format!("expansion exceeds {} terms", MAX_TERMS));
    }
    Ok(terms)
}

fn multiply_out(lhs: &[Expr], rhs: &[Expr]) -> Result<Vec<Expr>, String> {
    if lhs.len() * rhs.len() > MAX_TERMS {
        return Err(format!("expansion exceeds {} terms", MAX_TERMS));
    }
    let mut terms = Vec::with_capacity(lhs.len() * rhs.len());
    for l in lhs {
        for r in rhs {
            terms.push(l.clone() * r.clone());
        }
    }
    Ok(terms)
}

/// product of all kernel factors as a weighted sum; `None` stands for the constant 1
fn multiply_kernels(kernels: &[Kernel]) -> Result<Vec<(f64, Option<Kernel>)>, String> {
    let mut sum: Vec<(f64, Option<Kernel>)> = vec![(1.0, None)];
    for kernel in kernels {
        let mut next = Vec::new();
        for (weight, existing) in sum {
            match existing {
                None => next.push((weight, Some(*kernel))),
                Some(existing) => {
                    let products = existing
                        .product(*kernel)
                        .ok_or_else(|| "no product rule for these functions".to_string())?;
                    next.extend(products.into_iter().map(|(w, k)| (weight * w, Some(k))));
                }
            }
        }
        sum = next
            .into_iter()
            .map(|(w, k)| match k.and_then(|k| k.constant_value()) {
                Some(value) => (w * value, None),
                None => (w, k),
            })
            .collect();
    }
    Ok(sum)
}

/// ∫ coeff*x^n dx
fn power_rule(coeff: f64, n: f64, var: &str) -> Piece {
    if n == -1.0 {
        Piece::Other(Expr::Const(coeff) * Expr::Var(var.to_string()).ln())
    } else {
        Piece::Monomial {
            coeff: coeff / (n + 1.0),
            power: n + 1.0,
            kernel: None,
        }
    }
}

/// ∫ coeff*x^n*K(a*x + b) dx = Σ_k (-1)^k n!/(n-k)! x^(n-k) I_{k+1}(K) / a^(k+1)
fn tabular(coeff: f64, n: f64, kernel: Kernel) -> Result<Vec<Piece>, String> {
    if !(is_integer(n) && n >= 0.0 && n <= MAX_TABULAR_POWER) {
        return Err(format!("x^{} times a kernel has no tabular antiderivative", n));
    }
    let n = n as usize;
    let mut pieces = Vec::with_capacity(n + 1);
    let mut falling = 1.0;
    for k in 0..=n {
        if k > 0 {
            falling *= (n - k + 1) as f64;
        }
        let (sign, integrated) = kernel.repeated_antiderivative(k + 1);
        let alternating = if k % 2 == 0 { 1.0 } else { -1.0 };
        pieces.push(Piece::Monomial {
            coeff: coeff * alternating * falling * sign / kernel.a.powi(k as i32 + 1),
            power: (n - k) as f64,
            kernel: Some(integrated),
        });
    }
    Ok(pieces)
}

/// ∫ f dx for a single non-kernel factor with a linear inner argument
fn linear_substitution(factor: &Expr, var: &str) -> Result<Expr, String> {
    let linear = |arg: &Expr| -> Result<(f64, f64), String> {
        match arg.linear_coefficients(var) {
            Some((a, b)) if a != 0.0 => Ok((a, b)),
            _ => Err(format!("{} is not linear in {}", arg, var)),
        }
    };
    match factor {
        // ∫ tan(L) = -log(cos(L))/a
        Expr::tan(arg) => {
            let (a, _) = linear(arg)?;
            Ok(Expr::Const(-1.0 / a) * Expr::cos(arg.clone()).ln())
        }
        // ∫ sqrt(L) = 2/(3a) * sqrt(L)**3
        Expr::sqrt(arg) => {
            let (a, _) = linear(arg)?;
            Ok(Expr::Const(2.0 / (3.0 * a)) * factor.clone().pow(Expr::Const(3.0)))
        }
        Expr::Pow(base, exp) => match (base.as_ref(), exp.as_ref()) {
            // ∫ cos(L)**-2 = tan(L)/a
            (Expr::cos(arg), Expr::Const(p)) if *p == -2.0 => {
                let (a, _) = linear(arg)?;
                Ok(Expr::Const(1.0 / a) * Expr::tan(arg.clone()))
            }
            // sqrt(L)**p = L**(p/2)
            (Expr::sqrt(arg), Expr::Const(p)) => {
                let (a, _) = linear(arg)?;
                Ok(power_of_linear(arg, p / 2.0, a))
            }
            (Expr::Const(c), exponent) if *c > 0.0 && *c != 1.0 => {
                let (a, _) = linear(exponent)?;
                Ok(Expr::Const(1.0 / (a * c.ln())) * factor.clone())
            }
            (base, Expr::Const(p)) => {
                let (a, _) = linear(base)?;
                Ok(power_of_linear(base, *p, a))
            }
            _ => Err(format!("no rule for {}", factor)),
        },
        _ => Err(format!("no rule for {}", factor)),
    }
}

/// ∫ L^p dx for `L = a*x + b`
fn power_of_linear(base: &Expr, p: f64, a: f64) -> Expr {
    if p == -1.0 {
        Expr::Const(1.0 / a) * base.clone().ln()
    } else {
        Expr::Const(1.0 / (a * (p + 1.0))) * base.clone().pow(Expr::Const(p + 1.0))
    }
}

fn integrate_term(term: Term, var: &str) -> Result<Vec<Piece>, String> {
    if let Some(constant) = term.factors.iter().find(|f| !f.contains_variable(var)) {
        return Err(format!("constant factor {} is not a number", constant));
    }
    let kernels: Vec<Kernel> = term
        .factors
        .iter()
        .filter_map(|f| Kernel::from_expr(f, var))
        .collect();
    let others: Vec<&Expr> = term
        .factors
        .iter()
        .filter(|f| Kernel::from_expr(f, var).is_none())
        .collect();

    match (kernels.len(), others.as_slice()) {
        (0, []) => Ok(vec![power_rule(term.coeff, term.power, var)]),
        (0, [factor]) if term.power == 0.0 => {
            let integral = linear_substitution(factor, var)?;
            Ok(vec![Piece::Other(Expr::Const(term.coeff) * integral)])
        }
        (k, []) if k <= MAX_KERNEL_FACTORS => {
            let mut pieces = Vec::new();
            for (weight, kernel) in multiply_kernels(&kernels)? {
                let coeff = term.coeff * weight;
                match kernel {
                    Some(kernel) if kernel.a != 0.0 => {
                        pieces.extend(tabular(coeff, term.power, kernel)?)
                    }
                    _ => pieces.push(power_rule(coeff, term.power, var)),
                }
            }
            Ok(pieces)
        }
        _ => Err(format!(
            "no rule for x^{} times {} factor(s)",
            term.power,
            term.factors.len()
        )),
    }
}

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral with respect to `var`, without constant of integration.
    ///
    /// `Err` carries the reason no rule applied; the result is not verified here, see
    /// [`antiderivative`].
    pub fn integrate(&self, var: &str) -> Result<Expr, String> {
        let integrand = self.simplify();
        let mut pieces = Vec::new();
        for term in expand(&integrand)? {
            let term = Term::from_expr(&term.simplify(), var);
            if term.coeff == 0.0 {
                continue;
            }
            if !term.coeff.is_finite() {
                return Err(format!("coefficient {} is not finite", term.coeff));
            }
            pieces.extend(integrate_term(term, var)?);
        }
        let result = collect_pieces(pieces)
            .iter()
            .map(|piece| piece.to_expr(var))
            .reduce(|acc, e| acc + e)
            .unwrap_or(Expr::Const(0.0));
        Ok(result.simplify())
    }

    /// ∫ f dx over `[lower, upper]` by composite Gauss-Legendre quadrature with panels no
    /// wider than one unit.
    pub fn definite_integral(
        &self,
        var: &str,
        lower: f64,
        upper: f64,
        degree: usize,
    ) -> Result<f64, String> {
        let integral = NumericIntegral::new(self, var, degree)?;
        Ok(integral.between(lower, upper))
    }
}

/// Numeric antiderivative `F(x) = ∫₀ˣ f(t) dt`.
pub struct NumericIntegral {
    rule: GaussLegendre,
    integrand: RealFn,
}

impl NumericIntegral {
    pub fn new(integrand: &Expr, var: &str, degree: usize) -> Result<Self, String> {
        let rule = GaussLegendre::new(degree)
            .map_err(|e| format!("Failed to create Gauss-Legendre quadrature: {:?}", e))?;
        Ok(NumericIntegral {
            rule,
            integrand: integrand.lambdify1D(var),
        })
    }

    pub fn between(&self, lower: f64, upper: f64) -> f64 {
        let width = upper - lower;
        if width == 0.0 {
            return 0.0;
        }
        let panels = (width.abs() / MAX_PANEL_WIDTH).ceil().max(1.0) as usize;
        let step = width / panels as f64;
        (0..panels)
            .map(|i| {
                let a = lower + i as f64 * step;
                let b = if i + 1 == panels { upper } else { a + step };
                self.rule.integrate(a, b, &self.integrand)
            })
            .sum()
    }

    pub fn value_at(&self, x: f64) -> f64 {
        self.between(0.0, x)
    }
}

/// One antiderivative of an integrand.
#[derive(Debug, Clone, PartialEq)]
pub enum Antiderivative {
    /// closed form whose derivative was checked against the integrand
    Closed(Expr),
    /// no closed form was found; evaluate `∫₀ˣ integrand` numerically
    Numeric { integrand: Expr, reason: String },
}

impl Antiderivative {
    pub fn is_closed(&self) -> bool {
        matches!(self, Antiderivative::Closed(_))
    }
}

/// Finds an antiderivative of `expr`, falling back to a numeric one.
///
/// A closed form is accepted only if its derivative agrees with `expr` at a fixed set of
/// probe points; failing to integrate is never an error.
pub fn antiderivative(expr: &Expr, var: &str) -> Antiderivative {
    let reason = match expr.integrate(var) {
        Ok(closed) => {
            let derivative = closed.diff(var).simplify();
            if derivative.equivalent_on(expr, var, &PROBE_POINTS, PROBE_TOLERANCE) {
                debug!("∫ {} d{} = {}", expr, var, closed);
                return Antiderivative::Closed(closed);
            }
            format!("derivative of {} does not match the integrand", closed)
        }
        Err(reason) => reason,
    };
    info!("no closed-form integral of {}: {}", expr, reason);
    Antiderivative::Numeric {
        integrand: expr.clone(),
        reason,
    }
}
