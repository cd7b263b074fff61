//! # Symbolic Engine Module
//!
//! Core symbolic expression type of the visualizer. An [`Expr`] is an immutable tree
//! over a single [`FreeVariable`]; it is produced by the parser and consumed by
//! differentiation, integration and numeric evaluation.
//!
//! ## Main Structures
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - the free variable, e.g. "x"
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tan`, `sqrt`
//!
//! `Ln` is not reachable from user input (the parser whitelist has no logarithm), it only
//! shows up in antiderivatives such as ∫ 1/x dx or ∫ tan(x) dx.
//!
//! ### Display
//! Expressions print with the minimal set of parentheses and Python-style `**` powers, so
//! `x**3*(x*cos(x) + 4*sin(x))` round-trips through the parser unchanged. This textual form
//! is also the legend label of the original function.
//!
//! ## Operator Overloading
//! `std::ops` traits (Add, Sub, Mul, Div, Neg) build trees with natural syntax:
//! `x.clone() * x + Expr::Const(1.0)`.

#![allow(non_camel_case_types)]

use std::f64;
use std::fmt;

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// # Examples
/// ```rust, ignore
/// use symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ** exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: log(x)
    Ln(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
    /// Tangent function: tan(x)
    tan(Box<Expr>),
    /// Principal square root: sqrt(x)
    sqrt(Box<Expr>),
}

/// The single independent variable shared by a function, its derivative and its integral.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeVariable {
    name: String,
}

impl FreeVariable {
    pub fn new(name: &str) -> Self {
        FreeVariable {
            name: name.trim().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variable as an expression node.
    pub fn expr(&self) -> Expr {
        Expr::Var(self.name.clone())
    }
}

impl Default for FreeVariable {
    fn default() -> Self {
        FreeVariable::new("x")
    }
}

impl fmt::Display for FreeVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// binding strength used by Display
const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_NEG: u8 = 3;
const PREC_POW: u8 = 4;
const PREC_ATOM: u8 = 5;

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => PREC_ADD,
            Expr::Mul(lhs, _) if matches!(lhs.as_ref(), Expr::Const(c) if *c == -1.0) => PREC_NEG,
            Expr::Mul(_, _) | Expr::Div(_, _) => PREC_MUL,
            Expr::Const(c) if *c < 0.0 => PREC_NEG,
            Expr::Pow(_, _) => PREC_POW,
            _ => PREC_ATOM,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter, min_prec: u8) -> fmt::Result {
        let own = self.precedence();
        if own < min_prec {
            write!(f, "(")?;
            self.fmt_bare(f)?;
            write!(f, ")")
        } else {
            self.fmt_bare(f)
        }
    }

    fn fmt_bare(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", format_constant(*val)),
            Expr::Add(lhs, rhs) => {
                lhs.fmt_prec(f, PREC_ADD)?;
                write!(f, " + ")?;
                rhs.fmt_prec(f, PREC_ADD + 1)
            }
            Expr::Sub(lhs, rhs) => {
                lhs.fmt_prec(f, PREC_ADD)?;
                write!(f, " - ")?;
                rhs.fmt_prec(f, PREC_ADD + 1)
            }
            Expr::Mul(lhs, rhs) => match lhs.as_ref() {
                Expr::Const(c) if *c == -1.0 => {
                    write!(f, "-")?;
                    rhs.fmt_prec(f, PREC_NEG)
                }
                _ => {
                    lhs.fmt_prec(f, PREC_MUL)?;
                    write!(f, "*")?;
                    rhs.fmt_prec(f, PREC_MUL + 1)
                }
            },
            Expr::Div(lhs, rhs) => {
                lhs.fmt_prec(f, PREC_MUL)?;
                write!(f, "/")?;
                rhs.fmt_prec(f, PREC_MUL + 1)
            }
            // right associative: the base needs brackets at equal strength, the exponent does not
            Expr::Pow(base, exp) => {
                base.fmt_prec(f, PREC_POW + 1)?;
                write!(f, "**")?;
                exp.fmt_prec(f, PREC_NEG)
            }
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "log({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tan(expr) => write!(f, "tan({})", expr),
            Expr::sqrt(expr) => write!(f, "sqrt({})", expr),
        }
    }
}

/// integral values print without a fractional part ("3", not "3.0")
fn format_constant(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        format!("{}", val)
    }
}

/// Display implementation for pretty printing symbolic expressions.
///
/// Parentheses are emitted only where precedence requires them.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_bare(f)
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => {
                left.contains_variable(var_name) || right.contains_variable(var_name)
            }
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tan(expr)
            | Expr::sqrt(expr) => expr.contains_variable(var_name),
        }
    }

    /// Substitutes a variable with a constant value throughout the expression.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        self.substitute_variable(var, &Expr::Const(value))
    }

    /// Replaces every occurrence of `var` with a copy of `expr`.
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        let sub = |e: &Expr| e.substitute_variable(var, expr).boxed();
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(sub(lhs), sub(rhs)),
            Expr::Sub(lhs, rhs) => Expr::Sub(sub(lhs), sub(rhs)),
            Expr::Mul(lhs, rhs) => Expr::Mul(sub(lhs), sub(rhs)),
            Expr::Div(lhs, rhs) => Expr::Div(sub(lhs), sub(rhs)),
            Expr::Pow(base, exp) => Expr::Pow(sub(base), sub(exp)),
            Expr::Exp(inner) => Expr::Exp(sub(inner)),
            Expr::Ln(inner) => Expr::Ln(sub(inner)),
            Expr::sin(inner) => Expr::sin(sub(inner)),
            Expr::cos(inner) => Expr::cos(sub(inner)),
            Expr::tan(inner) => Expr::tan(sub(inner)),
            Expr::sqrt(inner) => Expr::sqrt(sub(inner)),
        }
    }

    /// Returns the sorted, deduplicated names of all variables in the expression.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Var(name) => out.push(name.clone()),
            Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tan(expr)
            | Expr::sqrt(expr) => expr.collect_variables(out),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Var(_) | Expr::Const(_) => 1,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => 1 + lhs.node_count() + rhs.node_count(),
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tan(expr)
            | Expr::sqrt(expr) => 1 + expr.node_count(),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(c) if *c == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(c) if *c == 1.0)
    }

    /// Decomposes an expression linear in `var` into `(a, b)` with `expr == a*var + b`.
    ///
    /// Only constant coefficients are recognized; `None` means the expression is not
    /// visibly linear (it may still be linear after expansion).
    pub fn linear_coefficients(&self, var: &str) -> Option<(f64, f64)> {
        match self {
            Expr::Var(name) if name == var => Some((1.0, 0.0)),
            Expr::Var(_) => None,
            Expr::Const(c) => Some((0.0, *c)),
            Expr::Add(lhs, rhs) => {
                let (a1, b1) = lhs.linear_coefficients(var)?;
                let (a2, b2) = rhs.linear_coefficients(var)?;
                Some((a1 + a2, b1 + b2))
            }
            Expr::Sub(lhs, rhs) => {
                let (a1, b1) = lhs.linear_coefficients(var)?;
                let (a2, b2) = rhs.linear_coefficients(var)?;
                Some((a1 - a2, b1 - b2))
            }
            Expr::Mul(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
                (Expr::Const(c), other) | (other, Expr::Const(c)) => {
                    let (a, b) = other.linear_coefficients(var)?;
                    Some((c * a, c * b))
                }
                _ => None,
            },
            Expr::Div(lhs, rhs) => match rhs.as_ref() {
                Expr::Const(c) if *c != 0.0 => {
                    let (a, b) = lhs.linear_coefficients(var)?;
                    Some((a / c, b / c))
                }
                _ => None,
            },
            _ => None,
        }
    }
}
