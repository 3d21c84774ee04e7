//! Evaluation of expression trees against live placeholder values.
//!
//! Ternaries are lazy: the condition is evaluated first and only the taken
//! branch is rendered, so a missing placeholder on the untaken side is not an
//! error.

use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

use super::ast::{CompareOp, Expr};
use super::functions::FunctionRegistry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("placeholder not found: {0}")]
    PlaceholderNotFound(String),

    #[error("function not found: {0}")]
    FunctionNotFound(String),

    #[error("invalid argument for {function}: {message}")]
    InvalidArgument { function: String, message: String },
}

/// Read access to named string values.
pub trait ValueSource {
    fn value(&self, name: &str) -> Option<&str>;
}

impl ValueSource for HashMap<String, String> {
    fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Evaluates expressions; borrows its value source and function table.
pub struct Evaluator<'a> {
    values: &'a dyn ValueSource,
    functions: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(values: &'a dyn ValueSource, functions: &'a FunctionRegistry) -> Self {
        Self { values, functions }
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<String, EvalError> {
        match expr {
            Expr::Text(text) => Ok(text.clone()),
            Expr::Number { literal, .. } => Ok(literal.clone()),
            Expr::Identifier(name) => self
                .values
                .value(name)
                .map(str::to_string)
                .ok_or_else(|| EvalError::PlaceholderNotFound(name.clone())),
            Expr::Function { name, args } => {
                let args = self.evaluate_all(args)?;
                self.functions.call(name, &args)
            }
            Expr::Pipe { input, name, args } => {
                let mut values = Vec::with_capacity(args.len() + 1);
                values.push(self.evaluate(input)?);
                values.extend(self.evaluate_all(args)?);
                self.functions.call(name, &values)
            }
            Expr::Comparison { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(bool_str(compare(*op, &left, &right)).to_string())
            }
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&self.evaluate(part)?);
                }
                Ok(out)
            }
            Expr::Ternary {
                condition,
                when_true,
                when_false,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(when_true)
                } else {
                    match when_false {
                        Some(expr) => self.evaluate(expr),
                        None => Ok(String::new()),
                    }
                }
            }
        }
    }

    fn evaluate_all(&self, exprs: &[Expr]) -> Result<Vec<String>, EvalError> {
        exprs.iter().map(|e| self.evaluate(e)).collect()
    }
}

/// Parse a value as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Truthiness used by ternaries and `not`.
///
/// Empty (after trimming) and `false` in any case are false; numbers are true
/// when non-zero; every other string is true.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("false") {
        return false;
    }
    match parse_number(value) {
        Some(n) => n != 0.0,
        None => true,
    }
}

/// Numeric comparison when both sides are numbers, lexical otherwise.
pub fn compare(op: CompareOp, left: &str, right: &str) -> bool {
    let ordering = match (parse_number(left), parse_number(right)) {
        (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    };
    match op {
        CompareOp::Less => ordering == Ordering::Less,
        CompareOp::Greater => ordering == Ordering::Greater,
        CompareOp::Equal => ordering == Ordering::Equal,
    }
}

pub fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Render a computed number, dropping the fraction when it is integral.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
