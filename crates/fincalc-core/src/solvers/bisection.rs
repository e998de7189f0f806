//! Bisection root-finding algorithm.

use crate::error::{Bracket, BudgetExhausted};
use crate::limits::SolverBudget;
use crate::solvers::{evaluate, opposite_signs, start, BudgetClock, RootFinder, RootOutcome, Start};
use crate::FinCalcResult;

/// Halves the bracket each iteration, keeping the half with the sign change.
///
/// Needs about `log2(width / tolerance)` iterations and makes no assumption
/// about smoothness, so it is the reference implementation the faster
/// solvers are checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bisection;

impl RootFinder for Bisection {
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: Bracket,
        budget: &SolverBudget,
    ) -> FinCalcResult<RootOutcome> {
        let clock = BudgetClock::start(budget);
        let (mut f_lo, f_hi) = match start(f, bracket, budget)? {
            Start::Root(outcome) => return Ok(outcome),
            Start::Bracketed { f_lo, f_hi } => (f_lo, f_hi),
        };

        let mut lo = bracket.lo;
        let mut hi = bracket.hi;
        let mut best = if f_lo.abs() < f_hi.abs() {
            (lo, f_lo)
        } else {
            (hi, f_hi)
        };

        for iteration in 1..=budget.max_iterations {
            if clock.expired() {
                return Ok(stopped(best, iteration - 1, Bracket::new(lo, hi), BudgetExhausted::TimeBudget));
            }

            let mid = lo + (hi - lo) / 2.0;
            let f_mid = evaluate(f, mid, iteration, Bracket::new(lo, hi))?;
            best = (mid, f_mid);

            if f_mid.abs() <= budget.tolerance || (hi - lo) / 2.0 <= budget.tolerance {
                log::debug!("bisection converged to {mid} after {iteration} iterations");
                return Ok(RootOutcome {
                    root: mid,
                    residual: f_mid,
                    iterations: iteration,
                    converged: true,
                    exhausted: None,
                    bracket: Bracket::new(lo, hi),
                });
            }

            if opposite_signs(f_lo, f_mid) {
                hi = mid;
            } else {
                lo = mid;
                f_lo = f_mid;
            }
        }

        Ok(stopped(
            best,
            budget.max_iterations,
            Bracket::new(lo, hi),
            BudgetExhausted::Iterations,
        ))
    }

    fn name(&self) -> &'static str {
        "bisection"
    }
}

fn stopped(best: (f64, f64), iterations: u32, bracket: Bracket, exhausted: BudgetExhausted) -> RootOutcome {
    log::warn!("bisection stopped on {exhausted} after {iterations} iterations, bracket {bracket}");
    RootOutcome {
        root: best.0,
        residual: best.1,
        iterations,
        converged: false,
        exhausted: Some(exhausted),
        bracket,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_2() {
        let f = |x: f64| x * x - 2.0;
        let out = Bisection
            .find_root(&f, Bracket::new(1.0, 2.0), &SolverBudget::default())
            .unwrap();
        assert!(out.converged);
        assert_relative_eq!(out.root, std::f64::consts::SQRT_2, epsilon = 1e-11);
    }

    #[test]
    fn test_negative_root() {
        let f = |x: f64| x + 1.0;
        let out = Bisection
            .find_root(&f, Bracket::new(-2.0, 0.5), &SolverBudget::default())
            .unwrap();
        assert_relative_eq!(out.root, -1.0, epsilon = 1e-11);
    }

    #[test]
    fn test_decreasing_function() {
        let f = |x: f64| 0.3 - x;
        let out = Bisection
            .find_root(&f, Bracket::new(0.0, 1.0), &SolverBudget::default())
            .unwrap();
        assert_relative_eq!(out.root, 0.3, epsilon = 1e-11);
        assert!(out.bracket.lo <= 0.3 && 0.3 <= out.bracket.hi);
    }

    #[test]
    fn test_iteration_count_matches_halvings() {
        // width 1 -> half-width <= 2^-10 after 10 halvings
        let f = |x: f64| x - 1.0 / 3.0;
        let budget = SolverBudget::default().with_tolerance(1.0 / 1024.0);
        let out = Bisection.find_root(&f, Bracket::new(0.0, 1.0), &budget).unwrap();
        assert!(out.converged);
        assert!(out.iterations <= 10, "took {}", out.iterations);
    }
}
