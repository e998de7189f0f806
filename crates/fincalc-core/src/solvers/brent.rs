//! Brent's root-finding algorithm.

use crate::error::{Bracket, BudgetExhausted};
use crate::limits::SolverBudget;
use crate::solvers::{evaluate, opposite_signs, start, BudgetClock, RootFinder, RootOutcome, Start};
use crate::FinCalcResult;

/// Brent's method: inverse quadratic interpolation and secant steps,
/// falling back to bisection whenever an interpolated step would leave the
/// bracket or shrink it too slowly.
///
/// Keeps the bisection guarantee (the root stays bracketed) with
/// superlinear convergence on smooth objectives such as bond price and NPV
/// curves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Brent;

impl RootFinder for Brent {
    #[allow(clippy::many_single_char_names)]
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        bracket: Bracket,
        budget: &SolverBudget,
    ) -> FinCalcResult<RootOutcome> {
        let clock = BudgetClock::start(budget);
        let (f_lo, f_hi) = match start(f, bracket, budget)? {
            Start::Root(outcome) => return Ok(outcome),
            Start::Bracketed { f_lo, f_hi } => (f_lo, f_hi),
        };

        // b is the current best estimate, c the contrapoint (f(b), f(c) of
        // opposite sign), a the previous b.
        let (mut a, mut fa) = (bracket.lo, f_lo);
        let (mut b, mut fb) = (bracket.hi, f_hi);
        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for iteration in 1..=budget.max_iterations {
            if !opposite_signs(fb, fc) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let current = Bracket::new(b.min(c), b.max(c));
            if clock.expired() {
                return Ok(stopped(b, fb, iteration - 1, current, BudgetExhausted::TimeBudget));
            }

            let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * budget.tolerance;
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol1 || fb.abs() <= budget.tolerance {
                log::debug!("brent converged to {b} after {iteration} iterations");
                return Ok(RootOutcome {
                    root: b,
                    residual: fb,
                    iterations: iteration,
                    converged: true,
                    exhausted: None,
                    bracket: current,
                });
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    // secant
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    // inverse quadratic interpolation
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
            fb = evaluate(f, b, iteration, current)?;
        }

        let bracket = Bracket::new(b.min(c), b.max(c));
        Ok(stopped(b, fb, budget.max_iterations, bracket, BudgetExhausted::Iterations))
    }

    fn name(&self) -> &'static str {
        "brent"
    }
}

fn stopped(root: f64, residual: f64, iterations: u32, bracket: Bracket, exhausted: BudgetExhausted) -> RootOutcome {
    log::warn!("brent stopped on {exhausted} after {iterations} iterations, bracket {bracket}");
    RootOutcome {
        root,
        residual,
        iterations,
        converged: false,
        exhausted: Some(exhausted),
        bracket,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::Bisection;
    use approx::assert_relative_eq;

    #[test]
    fn test_cubic() {
        // x^3 - x - 2 has a root near 1.52
        let f = |x: f64| x * x * x - x - 2.0;
        let out = Brent
            .find_root(&f, Bracket::new(1.0, 2.0), &SolverBudget::default())
            .unwrap();
        assert!(out.converged);
        assert_relative_eq!(out.root, 1.521_379_706_804_568, epsilon = 1e-10);
    }

    #[test]
    fn test_sin() {
        let f = |x: f64| x.sin();
        let out = Brent
            .find_root(&f, Bracket::new(3.0, 4.0), &SolverBudget::default())
            .unwrap();
        assert_relative_eq!(out.root, std::f64::consts::PI, epsilon = 1e-10);
    }

    #[test]
    fn test_faster_than_bisection() {
        let f = |x: f64| x * x - 2.0;
        let budget = SolverBudget::default();
        let brent = Brent.find_root(&f, Bracket::new(1.0, 2.0), &budget).unwrap();
        let bisect = Bisection.find_root(&f, Bracket::new(1.0, 2.0), &budget).unwrap();
        assert!(brent.iterations < bisect.iterations);
        assert!(brent.iterations < 20);
    }

    #[test]
    fn test_final_bracket_contains_root() {
        let f = |x: f64| (x - 0.07).powi(3);
        let out = Brent
            .find_root(&f, Bracket::new(-0.5, 1.0), &SolverBudget::default())
            .unwrap();
        assert!(out.converged);
        assert!(out.bracket.lo <= 0.07 + 1e-9 && 0.07 - 1e-9 <= out.bracket.hi);
    }
}
