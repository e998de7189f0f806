use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::limits::GuardConfig;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years, MONEY_DP};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Closed-form TVM
// ---------------------------------------------------------------------------

/// Future value with periodic compounding: `FV = P·(1 + r/n)^(n·t)`.
pub fn future_value(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    compounds_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<Money> {
    validate_amount("principal", principal, limits)?;
    validate_annual_rate("annual_rate", annual_rate)?;
    validate_years(years)?;
    validate_frequency("compounds_per_year", compounds_per_year)?;

    let n = Decimal::from(compounds_per_year);
    let periods = period_count(years, compounds_per_year)?;
    let factor = compound_factor(annual_rate / n, periods).ok_or_else(|| {
        FinCalcError::limit_exceeded("decimal_range", Decimal::MAX, "growth factor overflow")
    })?;

    let fv = principal.checked_mul(factor).ok_or_else(|| {
        FinCalcError::limit_exceeded("decimal_range", Decimal::MAX, "future value overflow")
    })?;
    Ok(fv.round_dp(MONEY_DP))
}

/// Present value of a single future amount: `PV = FV / (1 + r/n)^(n·t)`.
pub fn present_value(
    future_value: Money,
    annual_rate: Rate,
    years: Years,
    compounds_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<Money> {
    validate_amount("future_value", future_value, limits)?;
    validate_annual_rate("annual_rate", annual_rate)?;
    validate_years(years)?;
    validate_frequency("compounds_per_year", compounds_per_year)?;

    if annual_rate.is_zero() {
        return Ok(future_value.round_dp(MONEY_DP));
    }

    let n = Decimal::from(compounds_per_year);
    // A factor beyond Decimal range discounts any admissible amount below a cent
    let periods = period_count(years, compounds_per_year)?;
    let pv = match compound_factor(annual_rate / n, periods) {
        Some(factor) => future_value / factor,
        None => Decimal::ZERO,
    };
    Ok(pv.round_dp(MONEY_DP))
}

/// Level payment that amortises `present_value` over `trunc(years · payments_per_year)`
/// periods: `PMT = PV·r / (1 − (1+r)^−n)` with `r = annual_rate / payments_per_year`.
///
/// A zero rate degrades to straight division `PV / n`.
pub fn annuity_payment(
    present_value: Money,
    annual_rate: Rate,
    years: Years,
    payments_per_year: u32,
    limits: &GuardConfig,
) -> FinCalcResult<Money> {
    validate_amount("present_value", present_value, limits)?;
    validate_annual_rate("annual_rate", annual_rate)?;
    validate_years(years)?;
    validate_frequency("payments_per_year", payments_per_year)?;

    let periods = whole_periods(years, payments_per_year)?;
    let periodic_rate = annual_rate / Decimal::from(payments_per_year);
    Ok(level_payment(present_value, periodic_rate, periods).round_dp(MONEY_DP))
}

// ---------------------------------------------------------------------------
// Request-level wrappers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureValueInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
    #[serde(default = "default_compounds")]
    pub compounds_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureValueOutput {
    pub future_value: Money,
    /// Growth over the horizon (FV − P)
    pub total_interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentValueInput {
    pub future_value: Money,
    pub annual_rate: Rate,
    pub years: Years,
    #[serde(default = "default_compounds")]
    pub compounds_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentValueOutput {
    pub present_value: Money,
    /// FV − PV
    pub discount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityPaymentInput {
    pub present_value: Money,
    pub annual_rate: Rate,
    pub years: Years,
    #[serde(default = "default_payments")]
    pub payments_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityPaymentOutput {
    pub payment: Money,
    pub total_payments: u32,
    pub total_paid: Money,
    pub total_interest: Money,
}

fn default_compounds() -> u32 {
    1
}

fn default_payments() -> u32 {
    12
}

pub fn calculate_future_value(
    input: &FutureValueInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<FutureValueOutput>> {
    let start = Instant::now();
    let fv = future_value(
        input.principal,
        input.annual_rate,
        input.years,
        input.compounds_per_year,
        limits,
    )?;
    let output = FutureValueOutput {
        future_value: fv,
        total_interest: (fv - input.principal).round_dp(MONEY_DP),
    };
    Ok(with_metadata(
        "Future value: FV = P(1 + r/n)^(nt)",
        input,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    ))
}

pub fn calculate_present_value(
    input: &PresentValueInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<PresentValueOutput>> {
    let start = Instant::now();
    let pv = present_value(
        input.future_value,
        input.annual_rate,
        input.years,
        input.compounds_per_year,
        limits,
    )?;
    let output = PresentValueOutput {
        present_value: pv,
        discount: (input.future_value - pv).round_dp(MONEY_DP),
    };
    Ok(with_metadata(
        "Present value: PV = FV / (1 + r/n)^(nt)",
        input,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    ))
}

pub fn calculate_annuity_payment(
    input: &AnnuityPaymentInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<AnnuityPaymentOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let payment = annuity_payment(
        input.present_value,
        input.annual_rate,
        input.years,
        input.payments_per_year,
        limits,
    )?;
    let total_payments = whole_periods(input.years, input.payments_per_year)?;
    if is_truncated(input.years, input.payments_per_year, total_payments) {
        warnings.push(format!(
            "Term truncated to {total_payments} whole payment periods"
        ));
    }
    let total_paid = payment * Decimal::from(total_payments);
    let output = AnnuityPaymentOutput {
        payment,
        total_payments,
        total_paid,
        total_interest: total_paid - input.present_value,
    };
    Ok(with_metadata(
        "Level annuity payment: PMT = PV·r / (1 − (1+r)^−n)",
        input,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// `(1 + periodic_rate)^periods`, or `None` when it leaves Decimal range.
pub(crate) fn compound_factor(periodic_rate: Rate, periods: Decimal) -> Option<Decimal> {
    if periodic_rate.is_zero() {
        return Some(Decimal::ONE);
    }
    let base = Decimal::ONE + periodic_rate;
    if periods.fract().is_zero() {
        base.checked_powu(periods.to_u64()?)
    } else {
        base.checked_powd(periods)
    }
}

/// Unrounded level payment over `periods` at `periodic_rate`.
pub(crate) fn level_payment(present_value: Money, periodic_rate: Rate, periods: u32) -> Money {
    if periodic_rate.is_zero() {
        return present_value / Decimal::from(periods);
    }
    match compound_factor(periodic_rate, Decimal::from(periods)) {
        Some(factor) => {
            let discount = Decimal::ONE - Decimal::ONE / factor;
            // 1 + r rounds to exactly 1 for rates below Decimal precision
            if discount.is_zero() {
                return present_value / Decimal::from(periods);
            }
            present_value * periodic_rate / discount
        }
        // (1+r)^-n underflows: the payment is pure interest
        None => present_value * periodic_rate,
    }
}

/// `years · per_year`, or `LimitExceeded` when the product leaves Decimal range.
pub(crate) fn period_count(years: Years, per_year: u32) -> FinCalcResult<Decimal> {
    years.checked_mul(Decimal::from(per_year)).ok_or_else(|| {
        FinCalcError::limit_exceeded("periods", Decimal::MAX, format!("{years} years x {per_year}"))
    })
}

/// True when `whole` periods fall short of `years · per_year`.
pub(crate) fn is_truncated(years: Years, per_year: u32, whole: u32) -> bool {
    period_count(years, per_year).map_or(true, |exact| exact != Decimal::from(whole))
}

/// `trunc(years · per_year)`, which must be at least one period.
pub(crate) fn whole_periods(years: Years, per_year: u32) -> FinCalcResult<u32> {
    let periods = period_count(years, per_year)?.trunc();
    match periods.to_u32() {
        Some(n) if n >= 1 => Ok(n),
        Some(_) => Err(FinCalcError::validation(
            "years",
            "Term must cover at least one whole payment period",
        )),
        None => Err(FinCalcError::limit_exceeded(
            "periods",
            u32::MAX,
            periods,
        )),
    }
}

pub(crate) fn validate_amount(field: &str, amount: Money, limits: &GuardConfig) -> FinCalcResult<()> {
    if amount < Decimal::ZERO {
        return Err(FinCalcError::validation(field, "Amount must be >= 0"));
    }
    limits.check_amount(field, amount)
}

pub(crate) fn validate_annual_rate(field: &str, rate: Rate) -> FinCalcResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(FinCalcError::validation(
            field,
            "Rate must be between 0 and 1 (0% to 100%)",
        ));
    }
    Ok(())
}

pub(crate) fn validate_years(years: Years) -> FinCalcResult<()> {
    if years <= Decimal::ZERO {
        return Err(FinCalcError::validation("years", "Years must be > 0"));
    }
    Ok(())
}

pub(crate) fn validate_frequency(field: &str, per_year: u32) -> FinCalcResult<()> {
    if per_year == 0 {
        return Err(FinCalcError::validation(field, "Must be at least 1 per year"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn limits() -> GuardConfig {
        GuardConfig::default()
    }

    #[test]
    fn test_future_value_annual() {
        // 1000 at 5% for 10 years: 1000 * 1.05^10 = 1628.894627
        let fv = future_value(dec!(1000), dec!(0.05), dec!(10), 1, &limits()).unwrap();
        assert_eq!(fv, dec!(1628.89));
    }

    #[test]
    fn test_future_value_monthly() {
        // 10000 at 6% monthly for 5 years: 10000 * 1.005^60 = 13488.50
        let fv = future_value(dec!(10000), dec!(0.06), dec!(5), 12, &limits()).unwrap();
        assert_eq!(fv, dec!(13488.50));
    }

    #[test]
    fn test_future_value_fractional_years() {
        // 1000 at 10% annual for 1.5 years: 1000 * 1.1^1.5 = 1153.69
        let fv = future_value(dec!(1000), dec!(0.10), dec!(1.5), 1, &limits()).unwrap();
        assert!((fv - dec!(1153.69)).abs() <= dec!(0.01), "got {fv}");
    }

    #[test]
    fn test_present_value_basic() {
        let pv = present_value(dec!(10000), dec!(0.05), dec!(10), 1, &limits()).unwrap();
        // 10000 / 1.05^10 = 6139.13
        assert_eq!(pv, dec!(6139.13));
        assert!(pv < dec!(10000));
    }

    #[test]
    fn test_present_value_zero_rate() {
        let pv = present_value(dec!(10000), Decimal::ZERO, dec!(5), 12, &limits()).unwrap();
        assert_eq!(pv, dec!(10000));
    }

    #[test]
    fn test_annuity_payment_standard() {
        // 100000 at 6% monthly over 30 years: 599.55
        let pmt = annuity_payment(dec!(100000), dec!(0.06), dec!(30), 12, &limits()).unwrap();
        assert_eq!(pmt, dec!(599.55));
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let pmt = annuity_payment(dec!(12000), Decimal::ZERO, dec!(1), 12, &limits()).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_annuity_needs_one_period() {
        let err = annuity_payment(dec!(1000), dec!(0.05), dec!(0.5), 1, &limits()).unwrap_err();
        assert!(matches!(err, FinCalcError::Validation { ref field, .. } if field == "years"));
    }

    #[test]
    fn test_rejects_negative_principal() {
        let err = future_value(dec!(-1), dec!(0.05), dec!(1), 1, &limits()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_rejects_rate_above_one() {
        let err = present_value(dec!(100), dec!(1.5), dec!(1), 1, &limits()).unwrap_err();
        assert!(matches!(err, FinCalcError::Validation { ref field, .. } if field == "annual_rate"));
    }

    #[test]
    fn test_rejects_zero_compounding() {
        assert!(future_value(dec!(100), dec!(0.05), dec!(1), 0, &limits()).is_err());
    }

    #[test]
    fn test_amount_above_guard() {
        let tight = GuardConfig::default().with_max_amount(dec!(500));
        let err = future_value(dec!(501), dec!(0.05), dec!(1), 1, &tight).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_future_value_overflow_is_limit() {
        // 2^1000 is far outside Decimal range
        let err = future_value(dec!(1), dec!(1), dec!(1000), 1, &limits()).unwrap_err();
        assert_eq!(err.code(), "LIMIT_EXCEEDED");
    }

    #[test]
    fn test_annuity_wrapper_reports_totals() {
        let input = AnnuityPaymentInput {
            present_value: dec!(12000),
            annual_rate: Decimal::ZERO,
            years: dec!(1),
            payments_per_year: 12,
        };
        let out = calculate_annuity_payment(&input, &limits()).unwrap();
        assert_eq!(out.result.total_payments, 12);
        assert_eq!(out.result.total_paid, dec!(12000));
        assert_eq!(out.result.total_interest, Decimal::ZERO);
        assert!(out.warnings.is_empty());
    }

    proptest! {
        #[test]
        fn prop_present_value_inverts_future_value(
            principal_cents in 0i64..10_000_000_000,
            rate_bp in 0u32..=2_000,
            years in 1u32..=40,
            n in prop::sample::select(vec![1u32, 2, 4, 12, 365]),
        ) {
            let principal = Decimal::new(principal_cents, 2);
            let rate = Decimal::new(rate_bp as i64, 4);
            let years = Decimal::from(years);
            let fv = future_value(principal, rate, years, n, &limits()).unwrap();
            let pv = present_value(fv, rate, years, n, &limits()).unwrap();
            prop_assert!((pv - principal).abs() <= dec!(0.01), "P={} FV={} PV={}", principal, fv, pv);
        }
    }
}
