//! Sandboxed arithmetic/boolean expressions for calculator formulas and
//! result-section guards.
//!
//! Expressions are parsed by a small recursive-descent parser into [`Expr`] and
//! evaluated against an [`Environment`]; nothing in here touches files, the
//! network, or shared state.
//!
//! Two evaluation modes share one grammar:
//!
//! * formulas are strict: an unknown variable or a non-numeric operand is an
//!   [`EvalError`], and the result must be a finite number;
//! * guards are permissive: unknown variables and non-numeric operands become
//!   "missing", and any comparison involving a missing value is `false`.
//!
//! Malformed syntax is an error in both modes.

mod eval;
mod lexer;
mod parser;

use std::collections::BTreeSet;

use thiserror::Error;

use crate::values::Environment;

pub use eval::Scalar;
use eval::Mode;

/// Failure while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("unknown variable {0}")]
    UnknownVariable(String),
    #[error("unknown function {0}")]
    UnknownFunction(String),
    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },
    #[error("{0} is not numeric")]
    NotNumeric(String),
    #[error("result is not a finite number")]
    NonFinite,
}

impl EvalError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        EvalError::Syntax {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Built-in numeric functions. `Math.` prefixed spellings resolve to the same entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    Abs,
    Round,
    Floor,
    Ceil,
    Sqrt,
    Pow,
}

impl Function {
    pub fn lookup(name: &str) -> Option<Self> {
        let bare = name.strip_prefix("Math.").unwrap_or(name);
        let function = match bare {
            "min" => Function::Min,
            "max" => Function::Max,
            "abs" => Function::Abs,
            "round" => Function::Round,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "sqrt" => Function::Sqrt,
            "pow" => Function::Pow,
            _ => return None,
        };
        Some(function)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Abs => "abs",
            Function::Round => "round",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Sqrt => "sqrt",
            Function::Pow => "pow",
        }
    }

    fn check_arity(&self, count: usize) -> Result<(), &'static str> {
        match self {
            Function::Min | Function::Max if count == 0 => Err("at least 1"),
            Function::Min | Function::Max => Ok(()),
            Function::Pow if count != 2 => Err("2"),
            Function::Pow => Ok(()),
            _ if count != 1 => Err("1"),
            _ => Ok(()),
        }
    }

    fn apply(&self, args: &[f64]) -> f64 {
        match self {
            Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Function::Abs => args[0].abs(),
            Function::Round => args[0].round(),
            Function::Floor => args[0].floor(),
            Function::Ceil => args[0].ceil(),
            Function::Sqrt => args[0].sqrt(),
            Function::Pow => args[0].powf(args[1]),
        }
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        parser::parse(source)
    }

    /// Variable names referenced anywhere in the tree.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                names.insert(name.clone());
            }
            Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) => {}
            Expr::Unary { operand, .. } => operand.collect_variables(names),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_variables(names);
                then.collect_variables(names);
                otherwise.collect_variables(names);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }

    /// Evaluate as a formula.
    pub fn eval_number(&self, env: &Environment) -> Result<f64, EvalError> {
        let value = eval::eval(self, env, Mode::Formula)?;
        let number = value
            .as_number()
            .ok_or_else(|| EvalError::NotNumeric("result".into()))?;
        if number.is_finite() {
            Ok(number)
        } else {
            Err(EvalError::NonFinite)
        }
    }

    /// Evaluate as a guard. Missing data never fails, it only makes comparisons false.
    pub fn eval_bool(&self, env: &Environment) -> bool {
        eval::eval(self, env, Mode::Guard)
            .map(|value| value.truthy())
            .unwrap_or(false)
    }
}

/// Evaluate a calculator formula against captured values.
pub fn evaluate_formula(formula: &str, env: &Environment) -> Result<f64, EvalError> {
    Expr::parse(formula)?.eval_number(env)
}

/// Evaluate a boolean guard such as a result section's `showIf`.
pub fn evaluate_guard(expression: &str, env: &Environment) -> Result<bool, EvalError> {
    Ok(Expr::parse(expression)?.eval_bool(env))
}
