use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed interval a solver was working on when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub lo: f64,
    pub hi: f64,
}

impl Bracket {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn midpoint(&self) -> f64 {
        self.lo + (self.hi - self.lo) / 2.0
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// Which part of the solver budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetExhausted {
    Iterations,
    TimeBudget,
}

impl fmt::Display for BudgetExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetExhausted::Iterations => write!(f, "iteration cap"),
            BudgetExhausted::TimeBudget => write!(f, "time budget"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FinCalcError {
    #[error("Invalid input: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Limit exceeded: {limit} allows at most {max}, got {actual}")]
    LimitExceeded {
        limit: String,
        max: String,
        actual: String,
    },

    #[error("No solution: {reason} (bracket {bracket}, {iterations} iterations)")]
    NoSolution {
        reason: String,
        iterations: u32,
        bracket: Bracket,
    },

    #[error("Solver timeout: {function} hit the {exhausted} after {iterations} iterations (last bracket {bracket})")]
    SolverTimeout {
        function: String,
        iterations: u32,
        bracket: Bracket,
        exhausted: BudgetExhausted,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FinCalcError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        FinCalcError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn limit_exceeded(
        limit: &str,
        max: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        FinCalcError::LimitExceeded {
            limit: limit.into(),
            max: max.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Stable machine-readable code for transport-level mapping.
    pub fn code(&self) -> &'static str {
        match self {
            FinCalcError::Validation { .. } => "VALIDATION_ERROR",
            FinCalcError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            FinCalcError::NoSolution { .. } => "NO_SOLUTION",
            FinCalcError::SolverTimeout { .. } => "SOLVER_TIMEOUT",
            FinCalcError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for failures the caller can fix by changing the request.
    pub fn is_caller_correctable(&self) -> bool {
        matches!(
            self,
            FinCalcError::Validation { .. } | FinCalcError::LimitExceeded { .. }
        )
    }
}

impl From<serde_json::Error> for FinCalcError {
    fn from(e: serde_json::Error) -> Self {
        FinCalcError::Serialization(e.to_string())
    }
}
