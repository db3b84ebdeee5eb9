use std::cmp::Ordering;

use serde_json::Value;

use crate::expr::{BinaryOp, EvalError, Expr, UnaryOp};
use crate::values::{Environment, format_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Formula,
    Guard,
}

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Missing,
            Value::Bool(flag) => Scalar::Bool(*flag),
            Value::Number(number) => number
                .as_f64()
                .map(Scalar::Number)
                .unwrap_or(Scalar::Missing),
            Value::String(text) => Scalar::Text(text.clone()),
            other => Scalar::Text(other.to_string()),
        }
    }

    /// Lenient numeric view used by arithmetic: blank text counts as zero.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Missing => None,
            Scalar::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Scalar::Number(number) => Some(*number),
            Scalar::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
                }
            }
        }
    }

    /// Numeric view used by comparisons: only numbers and numeric text.
    fn strict_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(number) => Some(*number),
            Scalar::Text(text) if !text.trim().is_empty() => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Scalar::Missing => false,
            Scalar::Bool(flag) => *flag,
            Scalar::Number(number) => *number != 0.0 && !number.is_nan(),
            Scalar::Text(text) => !text.is_empty() && !text.eq_ignore_ascii_case("false"),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Scalar::Missing => String::new(),
            Scalar::Bool(flag) => flag.to_string(),
            Scalar::Number(number) => format_number(*number),
            Scalar::Text(text) => text.clone(),
        }
    }
}

pub(crate) fn eval(expr: &Expr, env: &Environment, mode: Mode) -> Result<Scalar, EvalError> {
    match expr {
        Expr::Number(number) => Ok(Scalar::Number(*number)),
        Expr::Text(text) => Ok(Scalar::Text(text.clone())),
        Expr::Bool(flag) => Ok(Scalar::Bool(*flag)),
        Expr::Var(name) => match env.get(name) {
            Some(value) => Ok(Scalar::from_json(value)),
            None if mode == Mode::Guard => Ok(Scalar::Missing),
            None => Err(EvalError::UnknownVariable(name.clone())),
        },
        Expr::Unary { op, operand } => {
            let value = eval(operand, env, mode)?;
            match op {
                UnaryOp::Not => Ok(Scalar::Bool(!value.truthy())),
                UnaryOp::Neg => Ok(numeric(operand, &value, mode)?
                    .map(|number| Scalar::Number(-number))
                    .unwrap_or(Scalar::Missing)),
                UnaryOp::Plus => Ok(numeric(operand, &value, mode)?
                    .map(Scalar::Number)
                    .unwrap_or(Scalar::Missing)),
            }
        }
        Expr::Binary { op, left, right } => binary(*op, left, right, env, mode),
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, env, mode)?.truthy() {
                eval(then, env, mode)
            } else {
                eval(otherwise, env, mode)
            }
        }
        Expr::Call { function, args } => {
            let mut numbers = Vec::with_capacity(args.len());
            for arg in args {
                let value = eval(arg, env, mode)?;
                match numeric(arg, &value, mode)? {
                    Some(number) => numbers.push(number),
                    None => return Ok(Scalar::Missing),
                }
            }
            Ok(Scalar::Number(function.apply(&numbers)))
        }
    }
}

fn binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    env: &Environment,
    mode: Mode,
) -> Result<Scalar, EvalError> {
    // short-circuit; the deciding operand is returned as-is
    match op {
        BinaryOp::And => {
            let lhs = eval(left, env, mode)?;
            return if lhs.truthy() {
                eval(right, env, mode)
            } else {
                Ok(lhs)
            };
        }
        BinaryOp::Or => {
            let lhs = eval(left, env, mode)?;
            return if lhs.truthy() {
                Ok(lhs)
            } else {
                eval(right, env, mode)
            };
        }
        _ => {}
    }

    let lhs = eval(left, env, mode)?;
    let rhs = eval(right, env, mode)?;

    match op {
        BinaryOp::Eq => Ok(Scalar::Bool(equals(&lhs, &rhs).unwrap_or(false))),
        BinaryOp::NotEq => Ok(Scalar::Bool(
            equals(&lhs, &rhs).map(|equal| !equal).unwrap_or(false),
        )),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let result = ordering(&lhs, &rhs).is_some_and(|ordering| match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            });
            Ok(Scalar::Bool(result))
        }
        _ => {
            let (Some(a), Some(b)) = (numeric(left, &lhs, mode)?, numeric(right, &rhs, mode)?)
            else {
                return Ok(Scalar::Missing);
            };
            let number = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => a.powf(b),
            };
            Ok(Scalar::Number(number))
        }
    }
}

/// `None` when either side is missing; such comparisons are always false.
fn equals(lhs: &Scalar, rhs: &Scalar) -> Option<bool> {
    if matches!(lhs, Scalar::Missing) || matches!(rhs, Scalar::Missing) {
        return None;
    }
    Some(match (lhs.strict_number(), rhs.strict_number()) {
        (Some(a), Some(b)) => a == b,
        _ => lhs.display() == rhs.display(),
    })
}

fn ordering(lhs: &Scalar, rhs: &Scalar) -> Option<Ordering> {
    if matches!(lhs, Scalar::Missing) || matches!(rhs, Scalar::Missing) {
        return None;
    }
    match (lhs.strict_number(), rhs.strict_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(lhs.display().cmp(&rhs.display())),
    }
}

fn numeric(source: &Expr, value: &Scalar, mode: Mode) -> Result<Option<f64>, EvalError> {
    match value.as_number() {
        Some(number) => Ok(Some(number)),
        None if mode == Mode::Guard => Ok(None),
        None => Err(EvalError::NotNumeric(describe(source))),
    }
}

fn describe(source: &Expr) -> String {
    match source {
        Expr::Var(name) => name.clone(),
        Expr::Text(text) => format!("'{text}'"),
        _ => "expression".to_string(),
    }
}
