//! Cost-formula compilation.
//!
//! Edge cost functions are declared as formula strings with one free
//! variable (the flow) and, optionally, named constants bound per edge:
//!
//! ```text
//! function BPR (f) t0 * (1 + 0.15 * (f / c) ^ 4)
//! dedge E1 A B BPR 10 2000
//! ```
//!
//! A [`Formula`] is parsed once, its constants are substituted by
//! [`Formula::bind`], and the result is compiled into a [`CostFunction`]:
//! a tree of closures taking the flow and returning a travel time. Compiled
//! functions are pure by construction (one numeric input, one numeric
//! output, no access to anything else).
//!
//! # Syntax
//!
//! - numbers: `2`, `0.15`, `1e-3`
//! - operators: `+ - * / ^` (`^` is right-associative and binds tighter
//!   than unary minus), parentheses
//! - functions: `exp`, `ln`, `log` (natural, or `log(x, base)`), `sqrt`,
//!   `abs`, `min`, `max`

mod parser;

use crate::error::{Result, RouteChoiceError};
use parser::{Expr, Func};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A parsed, not yet bound, cost formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses a formula string.
    pub fn parse(source: &str) -> Result<Self> {
        let expr = parser::parse(source).map_err(|message| RouteChoiceError::FormulaParse {
            formula: source.to_string(),
            message,
        })?;
        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// The original formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Identifiers used by the formula, in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.expr.collect_identifiers(&mut out);
        out
    }

    /// Identifiers other than `variable`, in order of first appearance.
    ///
    /// These are the constants an edge declaration must provide.
    pub fn constants(&self, variable: &str) -> Vec<String> {
        self.variables()
            .into_iter()
            .filter(|name| name != variable)
            .collect()
    }

    /// Substitutes `constants` and compiles the formula into a function of
    /// `variable`.
    ///
    /// Fails if any identifier other than `variable` is left unbound.
    pub fn bind(&self, variable: &str, constants: &HashMap<String, f64>) -> Result<CostFunction> {
        let bound = self.expr.substitute(constants).fold();
        if let Some(name) = bound
            .identifiers()
            .into_iter()
            .find(|name| name != variable)
        {
            return Err(RouteChoiceError::FormulaParse {
                formula: self.source.clone(),
                message: format!("unbound identifier `{name}`"),
            });
        }
        Ok(CostFunction {
            source: self.source.clone(),
            eval: compile(&bound),
        })
    }

    /// Binds constants positionally, in the order returned by
    /// [`constants`](Self::constants).
    ///
    /// Surplus values are ignored; missing values leave identifiers unbound
    /// and therefore fail.
    pub fn bind_positional(&self, variable: &str, values: &[f64]) -> Result<CostFunction> {
        let constants: HashMap<String, f64> = self
            .constants(variable)
            .into_iter()
            .zip(values.iter().copied())
            .collect();
        self.bind(variable, &constants)
    }
}

type Eval = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// A compiled, pure `flow -> travel time` function.
#[derive(Clone)]
pub struct CostFunction {
    source: String,
    eval: Eval,
}

impl CostFunction {
    /// Evaluates the function at `flow`.
    #[inline]
    pub fn eval(&self, flow: f64) -> f64 {
        (self.eval)(flow)
    }

    /// A function that ignores the flow.
    pub fn constant(value: f64) -> Self {
        Self {
            source: value.to_string(),
            eval: Arc::new(move |_| value),
        }
    }

    /// Compiles a formula whose only identifier is `variable`.
    pub fn compile(source: &str, variable: &str) -> Result<Self> {
        Formula::parse(source)?.bind(variable, &HashMap::new())
    }

    /// The formula this function was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for CostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CostFunction").field(&self.source).finish()
    }
}

/// Turns a bound expression into nested closures.
fn compile(expr: &Expr) -> Eval {
    match expr {
        Expr::Number(v) => {
            let v = *v;
            Arc::new(move |_| v)
        }
        // Only the free variable survives binding.
        Expr::Ident(_) => Arc::new(|x| x),
        Expr::Neg(inner) => {
            let inner = compile(inner);
            Arc::new(move |x| -inner(x))
        }
        Expr::Add(a, b) => {
            let (a, b) = (compile(a), compile(b));
            Arc::new(move |x| a(x) + b(x))
        }
        Expr::Sub(a, b) => {
            let (a, b) = (compile(a), compile(b));
            Arc::new(move |x| a(x) - b(x))
        }
        Expr::Mul(a, b) => {
            let (a, b) = (compile(a), compile(b));
            Arc::new(move |x| a(x) * b(x))
        }
        Expr::Div(a, b) => {
            let (a, b) = (compile(a), compile(b));
            Arc::new(move |x| a(x) / b(x))
        }
        Expr::Pow(a, b) => {
            let (a, b) = (compile(a), compile(b));
            Arc::new(move |x| a(x).powf(b(x)))
        }
        Expr::Call(func, args) => {
            let args: Vec<Eval> = args.iter().map(compile).collect();
            let func = *func;
            Arc::new(move |x| {
                let values: Vec<f64> = args.iter().map(|arg| arg(x)).collect();
                func.apply(&values)
            })
        }
    }
}

impl Func {
    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Func::Exp => args[0].exp(),
            Func::Ln => args[0].ln(),
            Func::Log => match args.get(1) {
                Some(base) => args[0].log(*base),
                None => args[0].ln(),
            },
            Func::Sqrt => args[0].sqrt(),
            Func::Abs => args[0].abs(),
            Func::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Func::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl Expr {
    fn collect_identifiers(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ident(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Neg(inner) => inner.collect_identifiers(out),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => {
                a.collect_identifiers(out);
                b.collect_identifiers(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|arg| arg.collect_identifiers(out)),
        }
    }

    fn identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn substitute(&self, constants: &HashMap<String, f64>) -> Expr {
        let sub = |e: &Expr| Box::new(e.substitute(constants));
        match self {
            Expr::Number(v) => Expr::Number(*v),
            Expr::Ident(name) => match constants.get(name) {
                Some(v) => Expr::Number(*v),
                None => Expr::Ident(name.clone()),
            },
            Expr::Neg(inner) => Expr::Neg(sub(inner)),
            Expr::Add(a, b) => Expr::Add(sub(a), sub(b)),
            Expr::Sub(a, b) => Expr::Sub(sub(a), sub(b)),
            Expr::Mul(a, b) => Expr::Mul(sub(a), sub(b)),
            Expr::Div(a, b) => Expr::Div(sub(a), sub(b)),
            Expr::Pow(a, b) => Expr::Pow(sub(a), sub(b)),
            Expr::Call(func, args) => {
                Expr::Call(*func, args.iter().map(|a| a.substitute(constants)).collect())
            }
        }
    }

    /// Collapses every subtree without identifiers into a number.
    fn fold(self) -> Expr {
        fn binary(
            a: Expr,
            b: Expr,
            op: fn(f64, f64) -> f64,
            rebuild: fn(Box<Expr>, Box<Expr>) -> Expr,
        ) -> Expr {
            match (a.fold(), b.fold()) {
                (Expr::Number(x), Expr::Number(y)) => Expr::Number(op(x, y)),
                (a, b) => rebuild(Box::new(a), Box::new(b)),
            }
        }
        match self {
            Expr::Neg(inner) => match inner.fold() {
                Expr::Number(v) => Expr::Number(-v),
                other => Expr::Neg(Box::new(other)),
            },
            Expr::Add(a, b) => binary(*a, *b, |x, y| x + y, Expr::Add),
            Expr::Sub(a, b) => binary(*a, *b, |x, y| x - y, Expr::Sub),
            Expr::Mul(a, b) => binary(*a, *b, |x, y| x * y, Expr::Mul),
            Expr::Div(a, b) => binary(*a, *b, |x, y| x / y, Expr::Div),
            Expr::Pow(a, b) => binary(*a, *b, f64::powf, Expr::Pow),
            Expr::Call(func, args) => {
                let args: Vec<Expr> = args.into_iter().map(Expr::fold).collect();
                let values: Option<Vec<f64>> = args
                    .iter()
                    .map(|a| match a {
                        Expr::Number(v) => Some(*v),
                        _ => None,
                    })
                    .collect();
                match values {
                    Some(values) => Expr::Number(func.apply(&values)),
                    None => Expr::Call(func, args),
                }
            }
            leaf => leaf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_linear_congestion() {
        let cost = CostFunction::compile("1 + f/100", "f").unwrap();
        assert!(approx(cost.eval(0.0), 1.0));
        assert!(approx(cost.eval(50.0), 1.5));
        assert!(approx(cost.eval(100.0), 2.0));
    }

    #[test]
    fn test_precedence_and_associativity() {
        let cost = CostFunction::compile("2 + 3 * f ^ 2 ^ 1 - -1", "f").unwrap();
        assert!(approx(cost.eval(2.0), 2.0 + 3.0 * 4.0 + 1.0));

        let cost = CostFunction::compile("-f^2", "f").unwrap();
        assert!(approx(cost.eval(3.0), -9.0));

        let cost = CostFunction::compile("(1 + f) / 2", "f").unwrap();
        assert!(approx(cost.eval(3.0), 2.0));
    }

    #[test]
    fn test_functions() {
        let cost = CostFunction::compile("max(1, sqrt(f)) + log(8, 2) + abs(-1)", "f").unwrap();
        assert!(approx(cost.eval(0.25), 1.0 + 3.0 + 1.0));
        assert!(approx(cost.eval(16.0), 4.0 + 3.0 + 1.0));
    }

    #[test]
    fn test_constants_bound_in_order_of_appearance() {
        let formula = Formula::parse("t0 * (1 + 0.15 * (f / c) ^ 4)").unwrap();
        assert_eq!(formula.variables(), vec!["t0", "f", "c"]);
        assert_eq!(formula.constants("f"), vec!["t0", "c"]);

        let cost = formula.bind_positional("f", &[10.0, 100.0]).unwrap();
        assert!(approx(cost.eval(0.0), 10.0));
        assert!(approx(cost.eval(100.0), 11.5));
    }

    #[test]
    fn test_constant_formula() {
        let formula = Formula::parse("a + b").unwrap();
        let cost = formula.bind_positional("f", &[1.5, 0.5]).unwrap();
        assert!(approx(cost.eval(0.0), 2.0));
        assert!(approx(cost.eval(1e6), 2.0));
    }

    #[test]
    fn test_unbound_identifier_is_rejected() {
        let formula = Formula::parse("t0 + f").unwrap();
        let err = formula.bind("f", &HashMap::new()).unwrap_err();
        assert!(matches!(err, RouteChoiceError::FormulaParse { .. }));
        assert!(err.to_string().contains("t0"));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "1 +", "(f", "f )", "2 $ f", "foo(f)", "min()", "1..2"] {
            assert!(
                matches!(Formula::parse(bad), Err(RouteChoiceError::FormulaParse { .. })),
                "`{bad}` should not parse"
            );
        }
    }

    #[test]
    fn test_domain_violation_is_not_finite() {
        let cost = CostFunction::compile("1 / (f - 10)", "f").unwrap();
        assert!(!cost.eval(10.0).is_finite());
        let cost = CostFunction::compile("sqrt(f - 10)", "f").unwrap();
        assert!(cost.eval(0.0).is_nan());
    }

    #[test]
    fn test_debug_shows_source() {
        let cost = CostFunction::compile("1 + f", "f").unwrap();
        assert_eq!(format!("{cost:?}"), "CostFunction(\"1 + f\")");
    }
}
