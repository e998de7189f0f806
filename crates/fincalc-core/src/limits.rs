//! Guard bounds shared by every engine.
//!
//! A [`GuardConfig`] is passed by reference into each calculation. The bounds
//! cap the computational cost of a single call (schedule length, cash-flow
//! count, solver budget) and the magnitude of accepted monetary amounts.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::types::Money;
use crate::FinCalcResult;

pub const DEFAULT_MAX_AMOUNT: Money = dec!(1000000000000);
pub const DEFAULT_MAX_AMORTIZATION_MONTHS: u32 = 600;
pub const DEFAULT_MAX_CASHFLOWS: usize = 1000;

pub const DEFAULT_SOLVER_TOLERANCE: f64 = 1e-12;
pub const DEFAULT_SOLVER_MAX_ITERATIONS: u32 = 200;
pub const DEFAULT_SOLVER_TIME_BUDGET_MS: u64 = 5_000;

/// Iteration and wall-clock budget for one root-finding run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverBudget {
    /// Convergence tolerance on both |f(x)| and the bracket half-width
    pub tolerance: f64,
    pub max_iterations: u32,
    pub time_budget_ms: u64,
}

impl Default for SolverBudget {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_SOLVER_TOLERANCE,
            max_iterations: DEFAULT_SOLVER_MAX_ITERATIONS,
            time_budget_ms: DEFAULT_SOLVER_TIME_BUDGET_MS,
        }
    }
}

impl SolverBudget {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = budget.as_millis().min(u64::MAX as u128) as u64;
        self
    }
}

/// Immutable numeric bounds injected into every engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Largest absolute monetary amount accepted as input
    pub max_amount: Money,
    /// Hard cap on amortization schedule length
    pub max_amortization_months: u32,
    /// Hard cap on the number of XIRR cash flows
    pub max_cashflows: usize,
    pub solver: SolverBudget,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_amount: DEFAULT_MAX_AMOUNT,
            max_amortization_months: DEFAULT_MAX_AMORTIZATION_MONTHS,
            max_cashflows: DEFAULT_MAX_CASHFLOWS,
            solver: SolverBudget::default(),
        }
    }
}

impl GuardConfig {
    #[must_use]
    pub fn with_max_amount(mut self, max_amount: Money) -> Self {
        self.max_amount = max_amount;
        self
    }

    #[must_use]
    pub fn with_max_amortization_months(mut self, months: u32) -> Self {
        self.max_amortization_months = months;
        self
    }

    #[must_use]
    pub fn with_max_cashflows(mut self, count: usize) -> Self {
        self.max_cashflows = count;
        self
    }

    #[must_use]
    pub fn with_solver(mut self, solver: SolverBudget) -> Self {
        self.solver = solver;
        self
    }

    /// Reject bounds that would make every call fail or never terminate.
    pub fn validate(&self) -> FinCalcResult<()> {
        if self.max_amount <= Decimal::ZERO {
            return Err(FinCalcError::validation(
                "max_amount",
                "Maximum amount must be positive",
            ));
        }
        if self.max_amortization_months == 0 {
            return Err(FinCalcError::validation(
                "max_amortization_months",
                "Maximum amortization months must be at least 1",
            ));
        }
        if self.max_cashflows < 2 {
            return Err(FinCalcError::validation(
                "max_cashflows",
                "Maximum cash flow count must allow at least 2 flows",
            ));
        }
        if !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0) {
            return Err(FinCalcError::validation(
                "solver.tolerance",
                "Solver tolerance must be a positive finite number",
            ));
        }
        if self.solver.max_iterations == 0 {
            return Err(FinCalcError::validation(
                "solver.max_iterations",
                "Solver iteration cap must be at least 1",
            ));
        }
        if self.solver.time_budget_ms == 0 {
            return Err(FinCalcError::validation(
                "solver.time_budget_ms",
                "Solver time budget must be positive",
            ));
        }
        Ok(())
    }

    /// Fail with `Validation` when `|amount|` exceeds the configured maximum.
    pub(crate) fn check_amount(&self, field: &str, amount: Money) -> FinCalcResult<()> {
        if amount.abs() > self.max_amount {
            return Err(FinCalcError::validation(
                field,
                format!("Absolute amount must not exceed {}", self.max_amount),
            ));
        }
        Ok(())
    }
}
