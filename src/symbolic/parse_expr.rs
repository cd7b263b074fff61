//! Turns a text formula into a symbolic [`Expr`] bound to one free variable.
//!
//! Parsing happens in two passes:
//! 1) a `nom` grammar builds an untyped syntax tree where every name is still a plain string;
//! 2) `resolve` binds the names: the free variable becomes `Expr::Var`, calls are looked up in
//!    the function whitelist, everything else is rejected.
//!
//! ```text
//!  sum     := product (('+' | '-') product)*
//!  product := unary (('*' | '/') unary)*
//!  unary   := '-' unary | '+' unary | power
//!  power   := primary (('**' | '^') unary)?       right associative
//!  primary := number | name '(' sum ')' | name | '(' sum ')'
//! ```
//! A leading minus binds weaker than `**`, so `-x**2` is `-(x**2)`.
//!# Example
//! ```
//! use CalculusVisualizer::symbolic::parse_expr::parse_expression;
//! use CalculusVisualizer::symbolic::symbolic_engine::FreeVariable;
//! let x = FreeVariable::new("x");
//! let f = parse_expression("x**3*(x*cos(x) + 4*sin(x))", &x).unwrap();
//! assert_eq!(f.to_string(), "x**3*(x*cos(x) + 4*sin(x))");
//! assert!(parse_expression("foo(x)", &x).is_err());
//! ```
use crate::symbolic::symbolic_engine::{Expr, FreeVariable};
use crate::symbolic::whitelist::KnownFunction;
use log::debug;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
};
use std::fmt;

/// deeper nesting than this is refused before the recursive grammar runs
const MAX_NESTING: usize = 128;
const MAX_INPUT_LEN: usize = 4096;
const MAX_TREE_DEPTH: usize = 2 * MAX_NESTING;

/// Why a formula could not be turned into an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// nothing but whitespace
    Empty,
    /// the grammar could not continue at byte offset `position`
    Syntax { position: usize },
    /// a valid prefix was followed by text that does not belong to it
    UnexpectedInput { position: usize, found: char },
    /// `name(...)` where `name` is not whitelisted
    UnknownFunction(String),
    /// a bare name that is not the free variable
    UnknownName(String),
    /// formula too long or too deeply nested
    TooComplex,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty expression"),
            ParseError::Syntax { position } => write!(f, "syntax error at position {}", position),
            ParseError::UnexpectedInput { position, found } => {
                write!(f, "unexpected '{}' at position {}", found, position)
            }
            ParseError::UnknownFunction(name) => write!(f, "unknown function '{}'", name),
            ParseError::UnknownName(name) => write!(f, "unknown name '{}'", name),
            ParseError::TooComplex => write!(f, "expression is too long or too deeply nested"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn from_char(c: char) -> BinOp {
        match c {
            '+' => BinOp::Add,
            '-' => BinOp::Sub,
            '*' => BinOp::Mul,
            '/' => BinOp::Div,
            _ => BinOp::Pow,
        }
    }
}

/// Untyped syntax tree, names are not yet checked.
#[derive(Debug, Clone, PartialEq)]
enum Syntax {
    Number(f64),
    Name(String),
    Call(String, Box<Syntax>),
    Neg(Box<Syntax>),
    Binary(BinOp, Box<Syntax>, Box<Syntax>),
}

type NomError<'a> = nom::error::Error<&'a str>;

fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = NomError<'a>>
where
    F: Parser<&'a str, Output = O, Error = NomError<'a>>,
{
    delimited(multispace0, inner, multispace0)
}

fn name(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, String::from).parse(input)
}

/// `12`, `0.5`, `.5`, `1e-3`; no sign, no `inf`/`nan`
fn number(input: &str) -> IResult<&str, f64> {
    let mantissa = alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    map_res(recognize((mantissa, exponent)), |s: &str| s.parse::<f64>()).parse(input)
}

fn call(input: &str) -> IResult<&str, Syntax> {
    map(
        (name, ws(char('(')), sum, char(')')),
        |(func, _, arg, _)| Syntax::Call(func, Box::new(arg)),
    )
    .parse(input)
}

fn primary(input: &str) -> IResult<&str, Syntax> {
    ws(alt((
        map(number, Syntax::Number),
        call,
        map(name, Syntax::Name),
        delimited(char('('), sum, char(')')),
    )))
    .parse(input)
}

fn power(input: &str) -> IResult<&str, Syntax> {
    let (input, base) = primary(input)?;
    let (input, exponent) = opt(preceded(ws(alt((tag("**"), tag("^")))), unary)).parse(input)?;
    let node = match exponent {
        Some(exponent) => Syntax::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)),
        None => base,
    };
    Ok((input, node))
}

/// A run of prefix signs is read in one loop; an odd number of `-` negates the operand.
fn unary(input: &str) -> IResult<&str, Syntax> {
    let (input, signs) = many0(ws(one_of("+-"))).parse(input)?;
    let (input, operand) = power(input)?;
    let minus_count = signs.iter().filter(|c| **c == '-').count();
    let node = if minus_count % 2 == 1 {
        Syntax::Neg(Box::new(operand))
    } else {
        operand
    };
    Ok((input, node))
}

fn fold_left(first: Syntax, rest: Vec<(char, Syntax)>) -> Syntax {
    rest.into_iter().fold(first, |acc, (op, rhs)| {
        Syntax::Binary(BinOp::from_char(op), Box::new(acc), Box::new(rhs))
    })
}

fn product(input: &str) -> IResult<&str, Syntax> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), unary)).parse(input)?;
    Ok((input, fold_left(first, rest)))
}

fn sum(input: &str) -> IResult<&str, Syntax> {
    let (input, first) = product(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), product)).parse(input)?;
    Ok((input, fold_left(first, rest)))
}

fn check_complexity(input: &str) -> Result<(), ParseError> {
    if input.len() > MAX_INPUT_LEN {
        return Err(ParseError::TooComplex);
    }
    let mut depth = 0usize;
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth > MAX_NESTING {
            return Err(ParseError::TooComplex);
        }
    }
    // every power operator is one more level of recursion: "x**x**x**..."
    let powers = input.matches("**").count() + input.matches('^').count();
    if powers > MAX_NESTING {
        return Err(ParseError::TooComplex);
    }
    Ok(())
}

/// Depth of the syntax tree, walked with an explicit stack.
fn syntax_depth(root: &Syntax) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 1usize)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        match node {
            Syntax::Number(_) | Syntax::Name(_) => {}
            Syntax::Call(_, inner) | Syntax::Neg(inner) => stack.push((inner, depth + 1)),
            Syntax::Binary(_, lhs, rhs) => {
                stack.push((lhs, depth + 1));
                stack.push((rhs, depth + 1));
            }
        }
    }
    deepest
}

fn resolve(syntax: Syntax, var: &FreeVariable) -> Result<Expr, ParseError> {
    match syntax {
        Syntax::Number(value) => Ok(Expr::Const(value)),
        Syntax::Name(name) => {
            if name == var.name() {
                Ok(var.expr())
            } else {
                Err(ParseError::UnknownName(name))
            }
        }
        Syntax::Call(func, arg) => match KnownFunction::lookup(&func) {
            Some(known) => Ok(known.apply(resolve(*arg, var)?)),
            None => Err(ParseError::UnknownFunction(func)),
        },
        Syntax::Neg(inner) => match *inner {
            Syntax::Number(value) => Ok(Expr::Const(-value)),
            other => Ok(-resolve(other, var)?),
        },
        Syntax::Binary(op, lhs, rhs) => {
            let lhs = resolve(*lhs, var)?;
            let rhs = resolve(*rhs, var)?;
            Ok(match op {
                BinOp::Add => lhs + rhs,
                BinOp::Sub => lhs - rhs,
                BinOp::Mul => lhs * rhs,
                BinOp::Div => lhs / rhs,
                BinOp::Pow => lhs.pow(rhs),
            })
        }
    }
}

/// Parses `text` into an expression of the free variable `var`.
///
/// Fails for malformed text and for any name that is neither `var` nor a whitelisted
/// function; it never invents new symbols.
pub fn parse_expression(text: &str, var: &FreeVariable) -> Result<Expr, ParseError> {
    let input = text.trim();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    check_complexity(input)?;
    let syntax = match sum(input) {
        Ok(("", syntax)) => syntax,
        Ok((rest, _)) => {
            let rest = rest.trim_start();
            let position = input.len() - rest.len();
            let found = rest.chars().next().unwrap_or(' ');
            return Err(ParseError::UnexpectedInput { position, found });
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(ParseError::Syntax {
                position: input.len() - e.input.len(),
            });
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(ParseError::Syntax {
                position: input.len(),
            });
        }
    };
    // differentiation, simplification and evaluation all recurse over the tree
    if syntax_depth(&syntax) > MAX_TREE_DEPTH {
        return Err(ParseError::TooComplex);
    }
    let expr = resolve(syntax, var)?;
    debug!("parsed '{}' as {}", input, expr);
    Ok(expr)
}

impl Expr {
    /// Parses a formula in the default free variable `x`.
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        parse_expression(input, &FreeVariable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Box<Expr> {
        Box::new(Expr::Var("x".to_string()))
    }

    fn parse(input: &str) -> Result<Expr, ParseError> {
        parse_expression(input, &FreeVariable::new("x"))
    }

    #[test]
    fn test_parse_constant() {
        assert_eq!(parse("42").unwrap(), Expr::Const(42.0));
        assert_eq!(parse(".5").unwrap(), Expr::Const(0.5));
        assert_eq!(parse("1e-3").unwrap(), Expr::Const(1e-3));
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(parse("x").unwrap(), Expr::Var("x".to_string()));
        assert_eq!(parse("  x  ").unwrap(), Expr::Var("x".to_string()));
    }

    #[test]
    fn test_parse_addition() {
        let expr = parse("x + 2").unwrap();
        assert_eq!(expr, Expr::Add(x(), Box::new(Expr::Const(2.0))));
    }

    #[test]
    fn test_parse_subtraction_is_left_associative() {
        let expr = parse("x - x - 1").unwrap();
        let expected = Expr::Sub(
            Box::new(Expr::Sub(x(), x())),
            Box::new(Expr::Const(1.0)),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_division_is_left_associative() {
        let expr = parse("x / 2 / 4").unwrap();
        let expected = Expr::Div(
            Box::new(Expr::Div(x(), Box::new(Expr::Const(2.0)))),
            Box::new(Expr::Const(4.0)),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_power_both_spellings() {
        let expected = Expr::Pow(x(), Box::new(Expr::Const(2.0)));
        assert_eq!(parse("x**2").unwrap(), expected);
        assert_eq!(parse("x^2").unwrap(), expected);
        assert_eq!(parse("x ** 2").unwrap(), expected);
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse("2**x**2").unwrap();
        let expected = Expr::Pow(
            Box::new(Expr::Const(2.0)),
            Box::new(Expr::Pow(x(), Box::new(Expr::Const(2.0)))),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_unary_minus_binds_weaker_than_power() {
        let expr = parse("-x**2").unwrap();
        let expected = -Expr::Pow(x(), Box::new(Expr::Const(2.0)));
        assert_eq!(expr, expected);
        let expr = parse("x**-2").unwrap();
        assert_eq!(expr, Expr::Pow(x(), Box::new(Expr::Const(-2.0))));
    }

    #[test]
    fn test_precedence_of_product_over_sum() {
        let expr = parse("1 + 2*x").unwrap();
        let expected = Expr::Add(
            Box::new(Expr::Const(1.0)),
            Box::new(Expr::Mul(Box::new(Expr::Const(2.0)), x())),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_whitelisted_functions() {
        assert_eq!(parse("sin(x)").unwrap(), Expr::sin(x()));
        assert_eq!(parse("cos(x)").unwrap(), Expr::cos(x()));
        assert_eq!(parse("tan(x)").unwrap(), Expr::tan(x()));
        assert_eq!(parse("exp(x)").unwrap(), Expr::Exp(x()));
        assert_eq!(parse("sqrt(x)").unwrap(), Expr::sqrt(x()));
        assert_eq!(parse("sin( cos(x) )").unwrap(), Expr::sin(Box::new(Expr::cos(x()))));
    }

    #[test]
    fn test_parse_brackets() {
        let expr = parse("(x + 1) * x").unwrap();
        let expected = Expr::Mul(
            Box::new(Expr::Add(x(), Box::new(Expr::Const(1.0)))),
            x(),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_default_expression_round_trips_through_display() {
        let input = "x**3*(x*cos(x) + 4*sin(x))";
        let expr = parse(input).unwrap();
        assert_eq!(expr.to_string(), input);
        assert_eq!(parse(&expr.to_string()).unwrap(), expr);
    }

    #[test]
    fn test_malformed_input_fails() {
        assert!(matches!(parse("x +* 2"), Err(ParseError::UnexpectedInput { .. })));
        assert!(matches!(parse("x +"), Err(ParseError::UnexpectedInput { .. })));
        assert!(parse("(x + 1").is_err());
        assert!(parse("x + 1)").is_err());
        assert!(parse("2x").is_err());
        assert!(parse("sin x").is_err());
        assert!(parse("*x").is_err());
        assert_eq!(parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_unknown_names_fail() {
        assert_eq!(
            parse("foo(x)"),
            Err(ParseError::UnknownFunction("foo".to_string()))
        );
        assert_eq!(parse("log(x)"), Err(ParseError::UnknownFunction("log".to_string())));
        assert_eq!(parse("x + y"), Err(ParseError::UnknownName("y".to_string())));
        assert_eq!(parse("pi"), Err(ParseError::UnknownName("pi".to_string())));
        assert_eq!(parse("x(2)"), Err(ParseError::UnknownFunction("x".to_string())));
    }

    #[test]
    fn test_other_free_variable() {
        let t = FreeVariable::new("t");
        let expr = parse_expression("sin(t)", &t).unwrap();
        assert_eq!(expr, Expr::sin(Box::new(Expr::Var("t".to_string()))));
        assert!(parse_expression("sin(x)", &t).is_err());
    }

    #[test]
    fn test_too_deep_nesting_is_rejected() {
        let deep = format!("{}x{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(parse(&deep), Err(ParseError::TooComplex));
    }

    #[test]
    fn test_long_sign_chains_parse_without_recursion() {
        let even = format!("{}x", "-".repeat(2000));
        assert_eq!(parse(&even), Ok(Expr::Var("x".to_string())));
        let odd = format!("{}x", "- ".repeat(2001));
        assert_eq!(parse(&odd), Ok(-Expr::Var("x".to_string())));
        assert_eq!(parse("+-+-2"), Ok(Expr::Const(2.0)));
        assert_eq!(parse("2 - -3").unwrap().to_string(), "2 - -3");
    }

    #[test]
    fn test_power_towers_are_limited() {
        let tall = format!("x{}", "**x".repeat(1000));
        assert_eq!(parse(&tall), Err(ParseError::TooComplex));
        let caret = format!("x{}", "^-x".repeat(1000));
        assert_eq!(parse(&caret), Err(ParseError::TooComplex));
        let short = format!("x{}", "**x".repeat(10));
        assert!(parse(&short).is_ok());
    }

    #[test]
    fn test_long_sums_are_limited() {
        let long = format!("x{}", " + x".repeat(600));
        assert_eq!(parse(&long), Err(ParseError::TooComplex));
        let moderate = format!("x{}", " + x".repeat(100));
        assert!(parse(&moderate).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = parse("foo(x)").unwrap_err();
        assert_eq!(err.to_string(), "unknown function 'foo'");
    }
}
