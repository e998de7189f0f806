//! Plain fixed-coupon bond pricing and yield to maturity.
//!
//! A bond pays `face · coupon_rate / m` every period for
//! `n = trunc(years · m)` periods and the face value with the last coupon,
//! where `m` is the number of payments per year. Yields are nominal annual
//! rates compounded `m` times a year.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{Bracket, FinCalcError};
use crate::limits::GuardConfig;
use crate::solvers::{require_converged, solver_result, Brent, RootFinder, SolverKind};
use crate::time_value::{validate_annual_rate, validate_years, whole_periods};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SolverResult, Years, RATE_DP};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lowest yield searched (exclusive for pricing).
pub const YIELD_FLOOR: Rate = dec!(-0.99);

/// Highest yield searched.
pub const YIELD_CEILING: Rate = dec!(10);

const MAX_PAYMENTS_PER_YEAR: u32 = 12;

/// Decimal places for reported prices.
const PRICE_DP: u32 = 6;

fn yield_bracket() -> Bracket {
    Bracket::new(
        YIELD_FLOOR.to_f64().unwrap_or(-0.99),
        YIELD_CEILING.to_f64().unwrap_or(10.0),
    )
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Present value of the bond's cash flows at `ytm`. Unrounded.
///
/// Strictly decreasing in `ytm` for any positive face value.
pub fn price_from_yield(
    face: Money,
    coupon_rate: Rate,
    years: Years,
    ytm: Rate,
    payments_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<Money> {
    let terms = BondTerms::new(face, coupon_rate, years, payments_per_year, limits)?;
    if ytm <= YIELD_FLOOR || ytm > YIELD_CEILING {
        return Err(FinCalcError::validation(
            "ytm",
            format!("Yield must be in ({YIELD_FLOOR}, {YIELD_CEILING}]"),
        ));
    }
    terms.price(ytm)
}

/// Yield to maturity implied by `price`, rounded to 6 dp. Uses Brent's method.
pub fn yield_from_price(
    face: Money,
    coupon_rate: Rate,
    years: Years,
    price: Money,
    payments_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<Rate> {
    yield_from_price_with(&Brent, face, coupon_rate, years, price, payments_per_year, limits)
}

/// [`yield_from_price`] with a caller-chosen root finder.
pub fn yield_from_price_with(
    finder: &dyn RootFinder,
    face: Money,
    coupon_rate: Rate,
    years: Years,
    price: Money,
    payments_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<Rate> {
    let result = solve_yield(finder, face, coupon_rate, years, price, payments_per_year, limits)?;
    Ok(result.value.round_dp(RATE_DP))
}

/// Unrounded yield with solver metadata.
pub fn yield_from_price_explain(
    face: Money,
    coupon_rate: Rate,
    years: Years,
    price: Money,
    payments_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<SolverResult> {
    solve_yield(&Brent, face, coupon_rate, years, price, payments_per_year, limits)
}

fn solve_yield(
    finder: &dyn RootFinder,
    face: Money,
    coupon_rate: Rate,
    years: Years,
    price: Money,
    payments_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<SolverResult> {
    let terms = BondTerms::new(face, coupon_rate, years, payments_per_year, limits)?;
    if price <= Decimal::ZERO {
        return Err(FinCalcError::validation("price", "Price must be > 0"));
    }
    limits.check_amount("price", price)?;

    let target = price.to_f64().unwrap_or(f64::NAN);
    let objective = |y: f64| terms.price_f64(y) - target;
    let bracket = yield_bracket();

    let (f_lo, f_hi) = (objective(bracket.lo), objective(bracket.hi));
    if f_lo.is_finite() && f_hi.is_finite() && f_lo.abs() > limits.solver.tolerance
        && f_hi.abs() > limits.solver.tolerance
        && (f_lo > 0.0) == (f_hi > 0.0)
    {
        log::warn!("bond price {price} outside attainable range, f(lo) = {f_lo:e}, f(hi) = {f_hi:e}");
        return Err(FinCalcError::NoSolution {
            reason: format!(
                "price {price} is not attainable for yields in {bracket}: P(lo) - price = {f_lo:e}, P(hi) - price = {f_hi:e}"
            ),
            iterations: 0,
            bracket,
        });
    }

    let outcome = finder.find_root(&objective, bracket, &limits.solver)?;
    let outcome = require_converged(outcome, "yield_from_price")?;
    log::debug!(
        "{} found ytm {} in {} iterations",
        finder.name(),
        outcome.root,
        outcome.iterations
    );
    solver_result(&outcome, finder, Vec::new())
}

// ---------------------------------------------------------------------------
// Cash-flow terms
// ---------------------------------------------------------------------------

/// Validated coupon schedule.
#[derive(Debug, Clone, Copy)]
struct BondTerms {
    face: Money,
    coupon: Money,
    periods: u32,
    per_year: u32,
}

impl BondTerms {
    fn new(
        face: Money,
        coupon_rate: Rate,
        years: Years,
        payments_per_year: u32,
        limits: &GuardConfig,
    ) -> FinCalcResult<Self> {
        if face <= Decimal::ZERO {
            return Err(FinCalcError::validation("face_value", "Face value must be > 0"));
        }
        limits.check_amount("face_value", face)?;
        validate_annual_rate("coupon_rate", coupon_rate)?;
        validate_years(years)?;
        if !(1..=MAX_PAYMENTS_PER_YEAR).contains(&payments_per_year) {
            return Err(FinCalcError::validation(
                "payments_per_year",
                format!("Must be between 1 and {MAX_PAYMENTS_PER_YEAR}"),
            ));
        }

        let periods = whole_periods(years, payments_per_year)?;
        if periods as usize > limits.max_cashflows {
            return Err(FinCalcError::limit_exceeded("max_cashflows", limits.max_cashflows, periods));
        }

        Ok(Self {
            face,
            coupon: face * coupon_rate / Decimal::from(payments_per_year),
            periods,
            per_year: payments_per_year,
        })
    }

    /// Discount factors by repeated multiplication so each period costs one step.
    fn price(&self, ytm: Rate) -> FinCalcResult<Money> {
        let overflow = || FinCalcError::limit_exceeded("decimal_range", Decimal::MAX, "bond price overflow");
        let step = Decimal::ONE / (Decimal::ONE + ytm / Decimal::from(self.per_year));

        let mut discount = Decimal::ONE;
        let mut pv = Decimal::ZERO;
        for _ in 0..self.periods {
            discount = discount.checked_mul(step).ok_or_else(overflow)?;
            let coupon_pv = self.coupon.checked_mul(discount).ok_or_else(overflow)?;
            pv = pv.checked_add(coupon_pv).ok_or_else(overflow)?;
        }
        let face_pv = self.face.checked_mul(discount).ok_or_else(overflow)?;
        pv.checked_add(face_pv).ok_or_else(overflow)
    }

    fn price_f64(&self, ytm: f64) -> f64 {
        let face = self.face.to_f64().unwrap_or(f64::NAN);
        let coupon = self.coupon.to_f64().unwrap_or(f64::NAN);
        let step = 1.0 / (1.0 + ytm / f64::from(self.per_year));

        let mut discount = 1.0;
        let mut pv = 0.0;
        for _ in 0..self.periods {
            discount *= step;
            pv += coupon * discount;
        }
        pv + face * discount
    }
}

// ---------------------------------------------------------------------------
// Request-level wrappers
// ---------------------------------------------------------------------------

fn default_payments_per_year() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondPriceInput {
    pub face_value: Money,
    pub coupon_rate: Rate,
    pub years_to_maturity: Years,
    pub yield_to_maturity: Rate,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondPriceOutput {
    pub price: Money,
    /// Price per 100 of face
    pub price_pct: Decimal,
    pub coupon_payment: Money,
    pub periods: u32,
    /// Annual coupon / price
    pub current_yield: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondYieldInput {
    pub face_value: Money,
    pub coupon_rate: Rate,
    pub years_to_maturity: Years,
    pub price: Money,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
    #[serde(default)]
    pub solver: SolverKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondYieldOutput {
    pub yield_to_maturity: Rate,
    pub iterations: u32,
    pub solver: String,
    pub residual: f64,
}

pub fn calculate_bond_price(
    input: &BondPriceInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<BondPriceOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let price = price_from_yield(
        input.face_value,
        input.coupon_rate,
        input.years_to_maturity,
        input.yield_to_maturity,
        input.payments_per_year,
        limits,
    )?;
    let terms = BondTerms::new(
        input.face_value,
        input.coupon_rate,
        input.years_to_maturity,
        input.payments_per_year,
        limits,
    )?;

    if input.yield_to_maturity < Decimal::ZERO {
        warnings.push("Negative yield: price exceeds the undiscounted cash flows".into());
    }

    let current_yield = if price.is_zero() {
        Decimal::ZERO
    } else {
        (input.face_value * input.coupon_rate / price).round_dp(RATE_DP)
    };

    Ok(with_metadata(
        "Bond price: PV of level coupons and face at the periodic yield",
        input,
        warnings,
        start.elapsed().as_micros() as u64,
        BondPriceOutput {
            price: price.round_dp(PRICE_DP),
            price_pct: (price / input.face_value * dec!(100)).round_dp(PRICE_DP),
            coupon_payment: terms.coupon,
            periods: terms.periods,
            current_yield,
        },
    ))
}

pub fn calculate_bond_yield(
    input: &BondYieldInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<BondYieldOutput>> {
    let start = Instant::now();
    let result = solve_yield(
        input.solver.finder(),
        input.face_value,
        input.coupon_rate,
        input.years_to_maturity,
        input.price,
        input.payments_per_year,
        limits,
    )?;

    Ok(with_metadata(
        "Yield to maturity: bracketed root of P(y) − price on [-0.99, 10]",
        input,
        result.warnings.clone(),
        start.elapsed().as_micros() as u64,
        BondYieldOutput {
            yield_to_maturity: result.value.round_dp(RATE_DP),
            iterations: result.iterations,
            solver: result.solver,
            residual: result.residual,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::Bisection;

    fn limits() -> GuardConfig {
        GuardConfig::default()
    }

    #[test]
    fn test_solver_bracket_matches_pricing_range() {
        let bracket = yield_bracket();
        assert_eq!(Decimal::from_f64_retain(bracket.lo).map(|d| d.round_dp(6)), Some(YIELD_FLOOR));
        assert_eq!(Decimal::from_f64_retain(bracket.hi).map(|d| d.round_dp(6)), Some(YIELD_CEILING));
    }

    #[test]
    fn test_par_bond_prices_at_face() {
        let p = price_from_yield(dec!(1000), dec!(0.05), dec!(10), dec!(0.05), 2, &limits()).unwrap();
        assert!((p - dec!(1000)).abs() < dec!(0.000001), "price {p}");
    }

    #[test]
    fn test_zero_coupon_price() {
        // 1000 / 1.06^5 = 747.258173
        let p = price_from_yield(dec!(1000), Decimal::ZERO, dec!(5), dec!(0.06), 1, &limits()).unwrap();
        assert!((p - dec!(747.258173)).abs() < dec!(0.000001), "price {p}");
    }

    #[test]
    fn test_premium_and_discount() {
        let premium = price_from_yield(dec!(1000), dec!(0.08), dec!(10), dec!(0.06), 2, &limits()).unwrap();
        let discount = price_from_yield(dec!(1000), dec!(0.04), dec!(10), dec!(0.06), 2, &limits()).unwrap();
        assert!(premium > dec!(1000));
        assert!(discount < dec!(1000));
    }

    #[test]
    fn test_price_rejects_yield_at_floor() {
        let err = price_from_yield(dec!(1000), dec!(0.05), dec!(10), dec!(-0.99), 2, &limits()).unwrap_err();
        assert!(matches!(err, FinCalcError::Validation { ref field, .. } if field == "ytm"));
        assert!(price_from_yield(dec!(1000), dec!(0.05), dec!(10), dec!(10), 2, &limits()).is_ok());
    }

    #[test]
    fn test_payments_per_year_range() {
        for ppy in [0, 13] {
            let err = price_from_yield(dec!(1000), dec!(0.05), dec!(10), dec!(0.05), ppy, &limits()).unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR");
        }
    }

    #[test]
    fn test_yield_round_trip() {
        let p = price_from_yield(dec!(1000), dec!(0.05), dec!(10), dec!(0.0625), 2, &limits()).unwrap();
        let y = yield_from_price(dec!(1000), dec!(0.05), dec!(10), p, 2, &limits()).unwrap();
        assert_eq!(y, dec!(0.0625));
    }

    #[test]
    fn test_yield_with_bisection_matches_brent() {
        let price = dec!(950);
        let brent = yield_from_price(dec!(1000), dec!(0.05), dec!(10), price, 2, &limits()).unwrap();
        let bisect =
            yield_from_price_with(&Bisection, dec!(1000), dec!(0.05), dec!(10), price, 2, &limits()).unwrap();
        assert!((brent - bisect).abs() <= dec!(0.000001), "{brent} vs {bisect}");
    }

    #[test]
    fn test_explain_is_unrounded() {
        let res = yield_from_price_explain(dec!(1000), dec!(0.05), dec!(10), dec!(950), 2, &limits()).unwrap();
        assert!(res.converged);
        assert_eq!(res.solver, "brent");
        assert!(res.value.scale() > RATE_DP);
        assert!(res.residual.abs() <= 1e-6);
    }

    #[test]
    fn test_unattainable_price_is_no_solution() {
        // Far above P(-0.99) for a one-period bond
        let err = yield_from_price(dec!(100), dec!(0.05), dec!(1), dec!(1000000), 1, &limits()).unwrap_err();
        match err {
            FinCalcError::NoSolution { bracket, .. } => {
                assert_eq!(bracket, Bracket::new(-0.99, 10.0));
            }
            other => panic!("expected NoSolution, got {other:?}"),
        }
    }

    #[test]
    fn test_price_below_ceiling_value_is_no_solution() {
        // P(10) for a 1-year annual 5% bond on 100 face is 105 / 11 ≈ 9.545
        let err = yield_from_price(dec!(100), dec!(0.05), dec!(1), dec!(1), 1, &limits()).unwrap_err();
        assert_eq!(err.code(), "NO_SOLUTION");
    }

    #[test]
    fn test_periods_over_cashflow_cap() {
        let tight = GuardConfig::default().with_max_cashflows(10);
        let err = price_from_yield(dec!(1000), dec!(0.05), dec!(10), dec!(0.05), 2, &tight).unwrap_err();
        assert_eq!(err.code(), "LIMIT_EXCEEDED");
    }

    #[test]
    fn test_tight_iteration_cap_times_out() {
        let tight = GuardConfig::default().with_solver(
            crate::limits::SolverBudget::default().with_max_iterations(2),
        );
        let err = yield_from_price_with(&Bisection, dec!(1000), dec!(0.05), dec!(10), dec!(950), 2, &tight)
            .unwrap_err();
        assert_eq!(err.code(), "SOLVER_TIMEOUT");
    }

    #[test]
    fn test_price_wrapper() {
        let input = BondPriceInput {
            face_value: dec!(1000),
            coupon_rate: dec!(0.06),
            years_to_maturity: dec!(5),
            yield_to_maturity: dec!(0.06),
            payments_per_year: 2,
        };
        let out = calculate_bond_price(&input, &limits()).unwrap();
        assert_eq!(out.result.periods, 10);
        assert_eq!(out.result.coupon_payment, dec!(30));
        assert_eq!(out.result.price_pct, dec!(100));
        assert_eq!(out.result.current_yield, dec!(0.06));
    }
}
