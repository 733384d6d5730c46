//! Arithmetic evaluated by the API handlers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of operation, as recorded in the history store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    /// Stored as `substract` to stay compatible with existing history files.
    #[serde(rename = "substract")]
    Subtract,
    Multiply,
    Divide,
    Sum,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Subtract => "substract",
            OperationKind::Multiply => "multiply",
            OperationKind::Divide => "divide",
            OperationKind::Sum => "sum",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("division by zero is prohibited")]
    DivisionByZero,

    #[error("provide at least 2 numbers")]
    NotEnoughOperands,

    #[error("{0} takes exactly 2 numbers")]
    WrongArity(OperationKind),
}

/// Evaluate `kind` over `inputs`.
///
/// The binary kinds take exactly two inputs; `Sum` takes two or more.
pub fn evaluate(kind: OperationKind, inputs: &[f64]) -> Result<f64, CalcError> {
    if kind == OperationKind::Sum {
        if inputs.len() < 2 {
            return Err(CalcError::NotEnoughOperands);
        }
        return Ok(inputs.iter().sum());
    }

    let [a, b] = inputs else {
        return Err(CalcError::WrongArity(kind));
    };

    match kind {
        OperationKind::Add => Ok(a + b),
        OperationKind::Subtract => Ok(a - b),
        OperationKind::Multiply => Ok(a * b),
        OperationKind::Divide if *b == 0.0 => Err(CalcError::DivisionByZero),
        OperationKind::Divide => Ok(a / b),
        OperationKind::Sum => unreachable!("handled above"),
    }
}
