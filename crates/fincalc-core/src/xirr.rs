//! XIRR: internal rate of return over irregularly dated cash flows.
//!
//! Time is measured Actual/365 Fixed from the earliest cash-flow date:
//!
//! ```text
//! NPV(r) = Σ amount_i / (1 + r)^(days_i / 365)
//! ```
//!
//! The rate is found in two stages. A bracket is grown outward from the
//! initial guess until NPV changes sign, then a [`RootFinder`] refines it.
//! Bracket search constants:
//!
//! | constant | value |
//! |---|---|
//! | first step | 0.05 |
//! | growth | step doubles per attempt |
//! | attempts | 40 |
//! | lowest rate | -0.999999 |
//! | highest rate | 1e6 |

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{Bracket, FinCalcError};
use crate::limits::GuardConfig;
use crate::solvers::{require_converged, solver_result, Brent, RootFinder, SolverKind};
use crate::types::{with_metadata, CashFlow, ComputationOutput, Money, Rate, SolverResult, RATE_DP};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DAYS_PER_YEAR: f64 = 365.0;

const BRACKET_FIRST_STEP: f64 = 0.05;
const BRACKET_MAX_ATTEMPTS: u32 = 40;
const RATE_FLOOR: f64 = -0.999_999;
const RATE_CEILING: f64 = 1e6;

/// Root distance from a search limit, relative to bracket width, that
/// triggers a warning.
const EDGE_TOLERANCE: f64 = 1e-6;

const SAMPLE_RATES: [f64; 7] = [-0.9, -0.5, 0.0, 0.1, 0.5, 1.0, 2.0];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Net present value at `rate` (Actual/365 from the earliest date).
///
/// Evaluated in `f64`, the same arithmetic the solver uses, so
/// `npv(flows, xirr)` reports the solver's own residual.
pub fn npv(cashflows: &[CashFlow], rate: Rate) -> FinCalcResult<Money> {
    if cashflows.is_empty() {
        return Err(FinCalcError::validation("cashflows", "At least one cash flow is required"));
    }
    if rate <= -Decimal::ONE {
        return Err(FinCalcError::validation("rate", "Rate must be > -1"));
    }
    let flows = DatedFlows::new(cashflows);
    let value = flows.npv(rate.to_f64().unwrap_or(f64::NAN));
    Decimal::from_f64_retain(value)
        .ok_or_else(|| FinCalcError::limit_exceeded("decimal_range", Decimal::MAX, value))
}

/// XIRR rounded to 6 dp, refined with Brent's method.
pub fn xirr(cashflows: &[CashFlow], initial_guess: Rate, limits: &GuardConfig) -> FinCalcResult<Rate> {
    xirr_with(&Brent, cashflows, initial_guess, limits)
}

/// [`xirr`] with a caller-chosen root finder.
pub fn xirr_with(
    finder: &dyn RootFinder,
    cashflows: &[CashFlow],
    initial_guess: Rate,
    limits: &GuardConfig,
) -> FinCalcResult<Rate> {
    let result = solve(finder, cashflows, initial_guess, limits)?;
    Ok(result.value.round_dp(RATE_DP))
}

/// Unrounded XIRR with iteration count, solver name and warnings about
/// unstable cash-flow patterns.
pub fn xirr_explain(
    cashflows: &[CashFlow],
    initial_guess: Rate,
    limits: &GuardConfig,
) -> FinCalcResult<SolverResult> {
    solve(&Brent, cashflows, initial_guess, limits)
}

fn solve(
    finder: &dyn RootFinder,
    cashflows: &[CashFlow],
    initial_guess: Rate,
    limits: &GuardConfig,
) -> FinCalcResult<SolverResult> {
    validate(cashflows, initial_guess, limits)?;

    let flows = DatedFlows::new(cashflows);
    let objective = |r: f64| flows.npv(r);
    let guess = initial_guess.to_f64().unwrap_or(0.0);

    let bracket = find_bracket(&objective, guess)?;
    log::debug!("xirr bracket {bracket} from guess {guess}");

    let outcome = finder.find_root(&objective, bracket, &limits.solver)?;
    let outcome = require_converged(outcome, "xirr")?;

    let mut warnings = Vec::new();
    if near_search_limit(outcome.root, bracket) {
        warnings.push(format!(
            "Root {} lies at the edge of the search range {bracket}; the cash-flow pattern may be unstable",
            outcome.root
        ));
    }
    if flows.amount_sign_changes() > 1 {
        warnings.push(
            "Cash-flow signs change more than once; multiple IRRs may exist".to_string(),
        );
    }
    if sample_sign_changes(&objective) > 1 {
        warnings.push(
            "NPV changes sign more than once over sample rates; multiple IRRs may exist".to_string(),
        );
    }
    for w in &warnings {
        log::warn!("xirr: {w}");
    }

    solver_result(&outcome, finder, warnings)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(cashflows: &[CashFlow], initial_guess: Rate, limits: &GuardConfig) -> FinCalcResult<()> {
    if cashflows.len() > limits.max_cashflows {
        return Err(FinCalcError::limit_exceeded(
            "max_cashflows",
            limits.max_cashflows,
            cashflows.len(),
        ));
    }
    if cashflows.is_empty() {
        return Err(FinCalcError::validation("cashflows", "At least one cash flow is required"));
    }
    for (i, cf) in cashflows.iter().enumerate() {
        limits.check_amount(&format!("cashflows[{i}].amount"), cf.amount)?;
    }

    let has_negative = cashflows.iter().any(|cf| cf.amount < Decimal::ZERO);
    let has_positive = cashflows.iter().any(|cf| cf.amount > Decimal::ZERO);
    if !(has_negative && has_positive) {
        return Err(FinCalcError::validation(
            "cashflows",
            "Need at least one negative and one positive cash flow",
        ));
    }

    if initial_guess <= dec!(-1) {
        return Err(FinCalcError::validation("initial_guess", "Initial guess must be > -1"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Cash flows in date order as (year fraction, amount) pairs.
struct DatedFlows {
    flows: Vec<(f64, f64)>,
}

impl DatedFlows {
    fn new(cashflows: &[CashFlow]) -> Self {
        let mut sorted: Vec<&CashFlow> = cashflows.iter().collect();
        sorted.sort_by_key(|cf| cf.date);
        let epoch = sorted.first().map(|cf| cf.date);

        let flows = sorted
            .iter()
            .map(|cf| {
                let days = epoch.map_or(0, |e| (cf.date - e).num_days());
                (
                    days as f64 / DAYS_PER_YEAR,
                    cf.amount.to_f64().unwrap_or(f64::NAN),
                )
            })
            .collect();
        Self { flows }
    }

    fn npv(&self, rate: f64) -> f64 {
        let base = 1.0 + rate;
        self.flows
            .iter()
            .map(|&(t, amount)| amount * base.powf(-t))
            .sum()
    }

    /// Descartes' rule of signs: an upper bound on the number of positive roots
    /// in `1 / (1 + r)`.
    fn amount_sign_changes(&self) -> usize {
        sign_changes(self.flows.iter().map(|&(_, a)| a))
    }
}

fn sign_changes(values: impl Iterator<Item = f64>) -> usize {
    let signs: Vec<bool> = values
        .filter(|v| v.is_finite() && *v != 0.0)
        .map(|v| v > 0.0)
        .collect();
    signs.windows(2).filter(|w| w[0] != w[1]).count()
}

fn sample_sign_changes(objective: &dyn Fn(f64) -> f64) -> usize {
    sign_changes(SAMPLE_RATES.iter().map(|&r| objective(r)))
}

/// True when `a` and `b` straddle zero or either is exactly zero.
fn straddles_zero(a: f64, b: f64) -> bool {
    a == 0.0 || b == 0.0 || ((a < 0.0) != (b < 0.0) && !a.is_nan() && !b.is_nan())
}

/// Grow a bracket around `guess` until NPV changes sign.
///
/// Each attempt widens both sides by the current step, testing the new
/// upper interval before the new lower one, then doubles the step.
fn find_bracket(objective: &dyn Fn(f64) -> f64, guess: f64) -> FinCalcResult<Bracket> {
    let guess = guess.clamp(RATE_FLOOR, RATE_CEILING);
    let f_guess = objective(guess);
    let (mut lo, mut hi) = (guess, guess);
    let (mut f_lo, mut f_hi) = (f_guess, f_guess);
    let mut step = BRACKET_FIRST_STEP;

    for _ in 0..BRACKET_MAX_ATTEMPTS {
        let next_hi = (guess + step).min(RATE_CEILING);
        if next_hi > hi {
            let f_next = objective(next_hi);
            if straddles_zero(f_hi, f_next) {
                return Ok(Bracket::new(hi, next_hi));
            }
            hi = next_hi;
            f_hi = f_next;
        }

        let next_lo = (guess - step).max(RATE_FLOOR);
        if next_lo < lo {
            let f_next = objective(next_lo);
            if straddles_zero(f_next, f_lo) {
                return Ok(Bracket::new(next_lo, lo));
            }
            lo = next_lo;
            f_lo = f_next;
        }

        step *= 2.0;
    }

    let searched = Bracket::new(lo, hi);
    log::warn!("xirr: no sign change in {searched}");
    Err(FinCalcError::NoSolution {
        reason: format!("NPV does not change sign for rates in {searched}"),
        iterations: BRACKET_MAX_ATTEMPTS,
        bracket: searched,
    })
}

fn near_search_limit(root: f64, bracket: Bracket) -> bool {
    let margin = EDGE_TOLERANCE * bracket.width();
    (bracket.lo <= RATE_FLOOR && root - bracket.lo <= margin)
        || (bracket.hi >= RATE_CEILING && bracket.hi - root <= margin)
}

// ---------------------------------------------------------------------------
// Request-level wrappers
// ---------------------------------------------------------------------------

fn default_guess() -> Rate {
    dec!(0.1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrInput {
    pub cashflows: Vec<CashFlow>,
    #[serde(default = "default_guess")]
    pub initial_guess: Rate,
    #[serde(default)]
    pub solver: SolverKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrOutput {
    pub xirr: Rate,
    pub iterations: u32,
    pub solver: String,
    pub cashflow_count: usize,
}

pub fn calculate_xirr(input: &XirrInput, limits: &GuardConfig) -> FinCalcResult<ComputationOutput<XirrOutput>> {
    let start = Instant::now();
    let result = solve(input.solver.finder(), &input.cashflows, input.initial_guess, limits)?;

    Ok(with_metadata(
        "XIRR: Actual/365 NPV root via bracket expansion and bracketed refinement",
        input,
        result.warnings.clone(),
        start.elapsed().as_micros() as u64,
        XirrOutput {
            xirr: result.value.round_dp(RATE_DP),
            iterations: result.iterations,
            solver: result.solver,
            cashflow_count: input.cashflows.len(),
        },
    ))
}

pub fn calculate_xirr_explain(
    input: &XirrInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<SolverResult>> {
    let start = Instant::now();
    let result = solve(input.solver.finder(), &input.cashflows, input.initial_guess, limits)?;

    Ok(with_metadata(
        "XIRR: Actual/365 NPV root with solver diagnostics",
        input,
        result.warnings.clone(),
        start.elapsed().as_micros() as u64,
        result,
    ))
}
