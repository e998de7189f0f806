//! Bracketed root finding.
//!
//! Engines depend on the [`RootFinder`] trait, never on a concrete solver, so
//! the algorithm can be swapped without changing any engine's observable
//! behaviour:
//!
//! - [`Bisection`]: halves the bracket every step. Linear convergence, no
//!   assumptions beyond a sign change.
//! - [`Brent`]: inverse quadratic interpolation and secant steps with a
//!   bisection fallback. Superlinear on smooth objectives, never leaves the
//!   bracket.
//!
//! Both honour the same contract: the bracket must have opposite-sign
//! endpoint values, convergence is declared once `|f(x)|` or the bracket
//! half-width is within [`SolverBudget::tolerance`], and the run stops with
//! `converged = false` when the iteration cap or the wall-clock budget is
//! exhausted. The clock only decides *when* to abort; the numeric path is a
//! pure function of the inputs.
//!
//! # Example
//!
//! ```rust
//! use fincalc_core::error::Bracket;
//! use fincalc_core::limits::SolverBudget;
//! use fincalc_core::solvers::{Brent, RootFinder};
//!
//! let f = |x: f64| x * x - 2.0;
//! let outcome = Brent.find_root(&f, Bracket::new(1.0, 2.0), &SolverBudget::default()).unwrap();
//! assert!(outcome.converged);
//! assert!((outcome.root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```

mod bisection;
mod brent;

pub use bisection::Bisection;
pub use brent::Brent;

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Bracket, BudgetExhausted, FinCalcError};
use crate::limits::SolverBudget;
use crate::types::SolverResult;
use crate::FinCalcResult;

/// A bracketed root-finding algorithm.
pub trait RootFinder: Send + Sync {
    /// Finds `x` in `bracket` with `f(x) ≈ 0`.
    ///
    /// Returns `Err(NoSolution)` when the bracket is malformed or the
    /// endpoint values share a sign. Budget exhaustion is not an error here:
    /// the outcome carries `converged = false` and the reason.
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: Bracket,
        budget: &SolverBudget,
    ) -> FinCalcResult<RootOutcome>;

    /// Short algorithm name reported in solver metadata.
    fn name(&self) -> &'static str;
}

/// Algorithm selector for request-level inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    Brent,
    Bisection,
}

impl SolverKind {
    pub fn finder(self) -> &'static dyn RootFinder {
        match self {
            SolverKind::Brent => &Brent,
            SolverKind::Bisection => &Bisection,
        }
    }
}

/// Result of one root-finding run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOutcome {
    /// Best estimate of the root
    pub root: f64,
    /// f(root)
    pub residual: f64,
    pub iterations: u32,
    pub converged: bool,
    /// Set when the run stopped on the budget instead of converging
    pub exhausted: Option<BudgetExhausted>,
    /// Interval still known to contain the root when the run stopped
    pub bracket: Bracket,
}

/// Turn a non-converged outcome into `SolverTimeout`.
pub(crate) fn require_converged(outcome: RootOutcome, function: &str) -> FinCalcResult<RootOutcome> {
    if outcome.converged {
        return Ok(outcome);
    }
    Err(FinCalcError::SolverTimeout {
        function: function.into(),
        iterations: outcome.iterations,
        bracket: outcome.bracket,
        exhausted: outcome.exhausted.unwrap_or(BudgetExhausted::Iterations),
    })
}

/// Package a converged outcome for callers, keeping the root unrounded.
pub(crate) fn solver_result(
    outcome: &RootOutcome,
    finder: &dyn RootFinder,
    warnings: Vec<String>,
) -> FinCalcResult<SolverResult> {
    let value = Decimal::from_f64_retain(outcome.root).ok_or_else(|| FinCalcError::NoSolution {
        reason: format!("root {} has no decimal representation", outcome.root),
        iterations: outcome.iterations,
        bracket: outcome.bracket,
    })?;
    Ok(SolverResult {
        value,
        iterations: outcome.iterations,
        converged: outcome.converged,
        warnings,
        solver: finder.name().to_string(),
        residual: outcome.residual,
    })
}

/// True when `a` and `b` are nonzero and of opposite sign.
pub(crate) fn opposite_signs(a: f64, b: f64) -> bool {
    (a < 0.0 && b > 0.0) || (a > 0.0 && b < 0.0)
}

/// Evaluate the objective, clamping infinities so bracket arithmetic stays finite.
pub(crate) fn evaluate(f: &dyn Fn(f64) -> f64, x: f64, iterations: u32, bracket: Bracket) -> FinCalcResult<f64> {
    let fx = f(x);
    if fx.is_nan() {
        return Err(FinCalcError::NoSolution {
            reason: format!("objective is undefined at x = {x}"),
            iterations,
            bracket,
        });
    }
    Ok(fx.clamp(-f64::MAX, f64::MAX))
}

/// Wall-clock guard checked once per iteration.
pub(crate) struct BudgetClock {
    started: Instant,
    budget: Duration,
}

impl BudgetClock {
    pub(crate) fn start(budget: &SolverBudget) -> Self {
        Self {
            started: Instant::now(),
            budget: budget.time_budget(),
        }
    }

    pub(crate) fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }
}

/// How a run begins once the endpoints have been evaluated.
pub(crate) enum Start {
    /// An endpoint already satisfies the tolerance
    Root(RootOutcome),
    Bracketed { f_lo: f64, f_hi: f64 },
}

/// Validate the bracket and evaluate both endpoints.
pub(crate) fn start(
    f: &dyn Fn(f64) -> f64,
    bracket: Bracket,
    budget: &SolverBudget,
) -> FinCalcResult<Start> {
    if !(bracket.lo.is_finite() && bracket.hi.is_finite()) || bracket.lo >= bracket.hi {
        return Err(FinCalcError::NoSolution {
            reason: "bracket must be a finite interval with lo < hi".into(),
            iterations: 0,
            bracket,
        });
    }

    let f_lo = evaluate(f, bracket.lo, 0, bracket)?;
    let f_hi = evaluate(f, bracket.hi, 0, bracket)?;

    for (x, fx) in [(bracket.lo, f_lo), (bracket.hi, f_hi)] {
        if fx.abs() <= budget.tolerance {
            return Ok(Start::Root(RootOutcome {
                root: x,
                residual: fx,
                iterations: 0,
                converged: true,
                exhausted: None,
                bracket,
            }));
        }
    }

    if !opposite_signs(f_lo, f_hi) {
        return Err(FinCalcError::NoSolution {
            reason: format!("root is not bracketed: f(lo) = {f_lo:e}, f(hi) = {f_hi:e}"),
            iterations: 0,
            bracket,
        });
    }

    Ok(Start::Bracketed { f_lo, f_hi })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn finders() -> Vec<Box<dyn RootFinder>> {
        vec![Box::new(Bisection), Box::new(Brent)]
    }

    /// Price of a bullet bond per 100 face, annual coupons.
    fn bond_price(y: f64, coupon: f64, years: i32) -> f64 {
        let mut pv = 0.0;
        for t in 1..=years {
            pv += coupon / (1.0 + y).powi(t);
        }
        pv + 100.0 / (1.0 + y).powi(years)
    }

    #[test]
    fn test_all_finders_agree_on_ytm() {
        let f = |y: f64| bond_price(y, 6.0, 7) - 98.0;
        let budget = SolverBudget::default();
        let roots: Vec<f64> = finders()
            .iter()
            .map(|s| s.find_root(&f, Bracket::new(0.0, 0.2), &budget).unwrap().root)
            .collect();
        assert_relative_eq!(roots[0], roots[1], epsilon = 1e-10);
        assert!(f(roots[1]).abs() < 1e-8);
    }

    #[test]
    fn test_same_sign_bracket_is_no_solution() {
        let f = |x: f64| x * x + 1.0;
        for s in finders() {
            let err = s
                .find_root(&f, Bracket::new(-1.0, 1.0), &SolverBudget::default())
                .unwrap_err();
            assert!(matches!(err, FinCalcError::NoSolution { .. }), "{}", s.name());
        }
    }

    #[test]
    fn test_inverted_bracket_rejected() {
        let f = |x: f64| x - 0.5;
        let err = Brent
            .find_root(&f, Bracket::new(1.0, 0.0), &SolverBudget::default())
            .unwrap_err();
        assert_eq!(err.code(), "NO_SOLUTION");
    }

    #[test]
    fn test_endpoint_root_returned_without_iterating() {
        let f = |x: f64| x - 1.0;
        for s in finders() {
            let out = s
                .find_root(&f, Bracket::new(0.0, 1.0), &SolverBudget::default())
                .unwrap();
            assert!(out.converged);
            assert_eq!(out.iterations, 0);
            assert_eq!(out.root, 1.0);
        }
    }

    #[test]
    fn test_iteration_cap_reports_not_converged() {
        let f = |x: f64| x.powi(3) - 2.0;
        let budget = SolverBudget::default().with_max_iterations(3);
        for s in finders() {
            let out = s.find_root(&f, Bracket::new(0.0, 10.0), &budget).unwrap();
            assert!(!out.converged, "{}", s.name());
            assert_eq!(out.exhausted, Some(BudgetExhausted::Iterations));
            assert_eq!(out.iterations, 3);
            assert!(out.bracket.lo <= out.bracket.hi);
        }
    }

    #[test]
    fn test_time_budget_stops_slow_objective() {
        let f = |x: f64| {
            std::thread::sleep(Duration::from_millis(5));
            x - 0.123_456_789
        };
        let budget = SolverBudget::default()
            .with_time_budget(Duration::from_millis(1))
            .with_max_iterations(1_000);
        let out = Bisection.find_root(&f, Bracket::new(0.0, 1.0), &budget).unwrap();
        assert!(!out.converged);
        assert_eq!(out.exhausted, Some(BudgetExhausted::TimeBudget));

        let err = require_converged(out, "test").unwrap_err();
        assert_eq!(err.code(), "SOLVER_TIMEOUT");
    }

    #[test]
    fn test_infinite_endpoint_is_clamped() {
        // 1 / (x - 0.5) - 1 has a root at 1.5 but is infinite at 0.5
        let f = |x: f64| 1.0 / (x - 0.5) - 1.0;
        for s in finders() {
            let out = s
                .find_root(&f, Bracket::new(0.5, 3.0), &SolverBudget::default())
                .unwrap();
            assert!(out.converged, "{}", s.name());
            assert_relative_eq!(out.root, 1.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_solver_kind_parses_snake_case() {
        let kind: SolverKind = serde_json::from_str("\"bisection\"").unwrap();
        assert_eq!(kind.finder().name(), "bisection");
        assert_eq!(SolverKind::default().finder().name(), "brent");
    }

    #[test]
    fn test_solver_result_keeps_metadata() {
        let f = |x: f64| x - 0.25;
        let out = Brent.find_root(&f, Bracket::new(0.0, 1.0), &SolverBudget::default()).unwrap();
        let res = solver_result(&out, &Brent, vec!["note".into()]).unwrap();
        assert_eq!(res.solver, "brent");
        assert_eq!(res.value, Decimal::from_f64_retain(out.root).unwrap());
        assert_eq!(res.warnings, vec!["note".to_string()]);
    }

    #[test]
    fn test_deterministic() {
        let f = |x: f64| x.exp() - 3.0;
        let budget = SolverBudget::default();
        let a = Brent.find_root(&f, Bracket::new(0.0, 2.0), &budget).unwrap();
        let b = Brent.find_root(&f, Bracket::new(0.0, 2.0), &budget).unwrap();
        assert_eq!(a, b);
    }
}
