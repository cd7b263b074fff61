//! The fixed set of function names the parser recognizes.
//!
//! Anything outside this list (and outside the free variable) is rejected by the parser
//! instead of being silently turned into a new symbol.
use crate::symbolic::symbolic_engine::Expr;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum KnownFunction {
    Sin,
    Cos,
    Tan,
    Exp,
    Sqrt,
}

impl KnownFunction {
    /// Looks a name up in the whitelist. Matching is case sensitive: `Sin` is not `sin`.
    pub fn lookup(name: &str) -> Option<KnownFunction> {
        KnownFunction::from_str(name).ok()
    }

    /// Builds the symbolic node this name stands for.
    pub fn apply(self, arg: Expr) -> Expr {
        let arg = Box::new(arg);
        match self {
            KnownFunction::Sin => Expr::sin(arg),
            KnownFunction::Cos => Expr::cos(arg),
            KnownFunction::Tan => Expr::tan(arg),
            KnownFunction::Exp => Expr::Exp(arg),
            KnownFunction::Sqrt => Expr::sqrt(arg),
        }
    }

    /// all whitelisted names, e.g. for help output
    pub fn names() -> Vec<String> {
        KnownFunction::iter().map(|f| f.to_string()).collect()
    }
}
