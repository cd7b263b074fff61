/// turns text like `x**3*(x*cos(x) + 4*sin(x))` into a symbolic expression
///
///# Example
/// ```
/// use CalculusVisualizer::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("x**2*sin(x)").unwrap();
/// println!("parsed_expression {}", parsed_expression);
/// assert_eq!(parsed_expression.to_string(), "x**2*sin(x)");
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
/// names of the functions the parser accepts
pub mod whitelist;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// 1) the expression tree and its printing
/// 2) differentiation and simplification
/// 3) closed-form integration with a numeric fallback
/// 4) turning an expression into a Rust closure
///# Example#
/// ```
/// use CalculusVisualizer::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x**2").unwrap();
/// let df_dx = f.diff("x").simplify();
/// assert_eq!(df_dx.to_string(), "2*x");
/// // evaluate the derivative
/// assert_eq!(df_dx.lambdify1D("x")(3.0), 6.0);
/// // compare numerical and analytical derivatives on a linspace
/// let (deviation, ok) = f.compare_num1D("x", 0.0, 10.0, 100, 1e-6);
/// println!("deviation = {}, ok = {}", deviation, ok);
/// assert!(ok);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
pub mod symbolic_engine_derivatives;
/// antiderivatives, definite integrals and Gauss-Legendre quadrature
pub mod symbolic_integration;
pub mod symbolic_simplify;
/// expression -> closure
pub mod symbolic_lambdify;
///______________________________________________________________________________________________________________________________________________
/// linspace and numerical derivative helpers
/// _____________________________________________________________________________________________________________________________________________
pub mod utils;
