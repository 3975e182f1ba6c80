//! Formula syntax tree built from the `grammar.pest` parse.

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "formula/grammar.pest"]
struct FormulaParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Func {
    Exp,
    Ln,
    Log,
    Sqrt,
    Abs,
    Min,
    Max,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "exp" => Func::Exp,
            "ln" => Func::Ln,
            "log" => Func::Log,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            "min" => Func::Min,
            "max" => Func::Max,
            _ => return None,
        })
    }

    fn accepts(self, arity: usize) -> bool {
        match self {
            Func::Log => arity == 1 || arity == 2,
            Func::Min | Func::Max => arity >= 1,
            _ => arity == 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

/// Parses a complete formula.
pub(crate) fn parse(source: &str) -> Result<Expr, String> {
    let mut pairs = FormulaParser::parse(Rule::formula, source).map_err(|err| {
        let column = match err.line_col {
            pest::error::LineColLocation::Pos((_, col)) => col,
            pest::error::LineColLocation::Span((_, col), _) => col,
        };
        format!("column {column}: {}", err.variant.message())
    })?;
    let formula = next(&mut pairs)?;
    build_expr(next(&mut formula.into_inner())?)
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, String> {
    pairs
        .next()
        .ok_or_else(|| "incomplete expression".to_string())
}

fn build_expr(pair: Pair<'_, Rule>) -> Result<Expr, String> {
    chain(pair, build_term)
}

fn build_term(pair: Pair<'_, Rule>) -> Result<Expr, String> {
    chain(pair, build_unary)
}

/// Folds `operand (op operand)*` to the left.
fn chain(
    pair: Pair<'_, Rule>,
    operand: fn(Pair<'_, Rule>) -> Result<Expr, String>,
) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let mut lhs = operand(next(&mut inner)?)?;
    while let Some(op) = inner.next() {
        let (a, b) = (Box::new(lhs), Box::new(operand(next(&mut inner)?)?));
        lhs = match op.as_str() {
            "+" => Expr::Add(a, b),
            "-" => Expr::Sub(a, b),
            "*" => Expr::Mul(a, b),
            "/" => Expr::Div(a, b),
            other => return Err(format!("unknown operator `{other}`")),
        };
    }
    Ok(lhs)
}

fn build_unary(pair: Pair<'_, Rule>) -> Result<Expr, String> {
    let mut negations = 0;
    let mut body = None;
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::sign if child.as_str() == "-" => negations += 1,
            Rule::sign => {}
            _ => body = Some(build_power(child)?),
        }
    }
    let mut expr = body.ok_or_else(|| "sign without operand".to_string())?;
    for _ in 0..negations {
        expr = Expr::Neg(Box::new(expr));
    }
    Ok(expr)
}

fn build_power(pair: Pair<'_, Rule>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let base = build_primary(next(&mut inner)?)?;
    match inner.next() {
        Some(exponent) => Ok(Expr::Pow(Box::new(base), Box::new(build_unary(exponent)?))),
        None => Ok(base),
    }
}

fn build_primary(pair: Pair<'_, Rule>) -> Result<Expr, String> {
    match pair.as_rule() {
        Rule::number => pair
            .as_str()
            .parse()
            .map(Expr::Number)
            .map_err(|_| format!("invalid number `{}`", pair.as_str())),
        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = next(&mut inner)?.as_str();
            let func = Func::from_name(name).ok_or_else(|| format!("unknown function `{name}`"))?;
            let args = inner.map(build_expr).collect::<Result<Vec<_>, _>>()?;
            if !func.accepts(args.len()) {
                return Err(format!("`{name}` does not take {} argument(s)", args.len()));
            }
            Ok(Expr::Call(func, args))
        }
        Rule::expr => build_expr(pair),
        rule => Err(format!("unexpected {rule:?}")),
    }
}
