use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{monthly_rate, payoff_label, validate_loan};
use crate::error::FinCalcError;
use crate::limits::GuardConfig;
use crate::time_value::{is_truncated, level_payment};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years, MONEY_DP};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based payment number
    pub period: u32,
    pub payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub remaining_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    /// Contractual number of payments, `trunc(years · 12)`
    pub total_payments: u32,
    pub entries: Vec<AmortizationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageSummary {
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub payoff_months: u32,
    /// `YYYY-MM`, assuming the first payment falls in the `as_of` month
    pub payoff_date: String,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Level monthly payment, rounded up to the cent.
///
/// `annual_rate / 12` per month over `trunc(years · 12)` months; a zero rate
/// gives `principal / months`.
pub fn monthly_payment(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    limits: &GuardConfig,
) -> FinCalcResult<Money> {
    let months = validate_loan(principal, annual_rate, years, limits)?;
    Ok(rounded_payment(principal, annual_rate, months))
}

/// Month-by-month schedule ending on an exactly-zero balance.
///
/// The term may not exceed `min(max_months, limits.max_amortization_months)`;
/// a longer loan is rejected before any entry is built.
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    max_months: u32,
    limits: &GuardConfig,
) -> FinCalcResult<AmortizationSchedule> {
    let total_payments = validate_loan(principal, annual_rate, years, limits)?;
    if max_months == 0 {
        return Err(FinCalcError::validation("max_months", "Must be at least 1"));
    }

    let cap = max_months.min(limits.max_amortization_months);
    if total_payments > cap {
        return Err(FinCalcError::limit_exceeded(
            "max_amortization_months",
            cap,
            total_payments,
        ));
    }

    let payment = rounded_payment(principal, annual_rate, total_payments);
    let rate = monthly_rate(annual_rate);
    let mut entries = Vec::with_capacity(total_payments as usize);
    let mut balance = principal;

    for period in 1..=total_payments {
        if balance.is_zero() {
            break;
        }
        let interest = (balance * rate).round_dp(MONEY_DP);
        let mut principal_portion = (payment - interest).max(Decimal::ZERO);
        let mut paid = payment;

        // Final period, or the regular payment would overshoot: settle the balance
        if period == total_payments || principal_portion >= balance {
            principal_portion = balance;
            paid = principal_portion + interest;
        }

        balance -= principal_portion;
        entries.push(AmortizationEntry {
            period,
            payment: paid,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
        });
    }

    log::debug!(
        "amortized {principal} over {} of {total_payments} months",
        entries.len()
    );

    Ok(AmortizationSchedule {
        monthly_payment: payment,
        total_payments,
        entries,
    })
}

/// Lifetime totals derived from the full schedule.
pub fn summary(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    as_of: NaiveDate,
    limits: &GuardConfig,
) -> FinCalcResult<MortgageSummary> {
    let schedule = amortization_schedule(
        principal,
        annual_rate,
        years,
        limits.max_amortization_months,
        limits,
    )?;

    let total_paid: Money = schedule.entries.iter().map(|e| e.payment).sum();
    let payoff_months = schedule.entries.len() as u32;

    Ok(MortgageSummary {
        monthly_payment: schedule.monthly_payment,
        total_paid,
        total_interest: total_paid - principal,
        payoff_months,
        payoff_date: payoff_label(as_of, payoff_months)?,
    })
}

/// Level payment rounded up to the cent, so it always covers the first
/// month's rounded interest and the loan amortizes without a balloon.
pub(crate) fn rounded_payment(principal: Money, annual_rate: Rate, months: u32) -> Money {
    level_payment(principal, monthly_rate(annual_rate), months)
        .round_dp_with_strategy(MONEY_DP, RoundingStrategy::AwayFromZero)
}

// ---------------------------------------------------------------------------
// Request-level wrappers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgagePaymentOutput {
    pub monthly_payment: Money,
    pub total_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
    /// Defaults to the configured amortization cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSummaryInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
    /// Month of the first payment; today when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

pub fn calculate_mortgage_payment(
    input: &MortgageInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<MortgagePaymentOutput>> {
    let start = Instant::now();
    let total_months = validate_loan(input.principal, input.annual_rate, input.years, limits)?;
    let payment = monthly_payment(input.principal, input.annual_rate, input.years, limits)?;

    Ok(with_metadata(
        "Level monthly payment: M = P·r / (1 − (1+r)^−n), r = annual_rate / 12",
        input,
        term_warnings(input.years, total_months),
        start.elapsed().as_micros() as u64,
        MortgagePaymentOutput {
            monthly_payment: payment,
            total_months,
        },
    ))
}

pub fn calculate_amortization(
    input: &AmortizationInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let max_months = input.max_months.unwrap_or(limits.max_amortization_months);
    let schedule = amortization_schedule(
        input.principal,
        input.annual_rate,
        input.years,
        max_months,
        limits,
    )?;

    let mut warnings = term_warnings(input.years, schedule.total_payments);
    if (schedule.entries.len() as u32) < schedule.total_payments {
        warnings.push(format!(
            "Balance reached zero after {} of {} payments",
            schedule.entries.len(),
            schedule.total_payments
        ));
    }

    Ok(with_metadata(
        "Monthly amortization with per-period cent-rounded interest",
        input,
        warnings,
        start.elapsed().as_micros() as u64,
        schedule,
    ))
}

pub fn calculate_mortgage_summary(
    input: &MortgageSummaryInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<MortgageSummary>> {
    let start = Instant::now();
    let as_of = input
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let result = summary(input.principal, input.annual_rate, input.years, as_of, limits)?;

    Ok(with_metadata(
        "Mortgage lifetime totals from the amortization schedule",
        input,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        result,
    ))
}

fn term_warnings(years: Years, total_months: u32) -> Vec<String> {
    let mut warnings = Vec::new();
    if is_truncated(years, super::MONTHS_PER_YEAR, total_months) {
        warnings.push(format!("Term truncated to {total_months} whole months"));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn limits() -> GuardConfig {
        GuardConfig::default()
    }

    #[test]
    fn test_monthly_payment_30y() {
        let pmt = monthly_payment(dec!(300000), dec!(0.04), dec!(30), &limits()).unwrap();
        assert_eq!(pmt, dec!(1432.25));
    }

    #[test]
    fn test_monthly_payment_zero_rate() {
        let pmt = monthly_payment(dec!(120000), Decimal::ZERO, dec!(10), &limits()).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_monthly_payment_ignores_amortization_cap() {
        // 50 years exceeds a 12 month cap but only the schedule enforces it
        let tight = GuardConfig::default().with_max_amortization_months(12);
        assert!(monthly_payment(dec!(100000), dec!(0.05), dec!(50), &tight).is_ok());
    }

    #[test]
    fn test_schedule_zero_rate() {
        let s = amortization_schedule(dec!(120000), Decimal::ZERO, dec!(10), 600, &limits()).unwrap();
        assert_eq!(s.entries.len(), 120);
        assert!(s.entries.iter().all(|e| e.payment == dec!(1000) && e.interest_portion.is_zero()));
        assert_eq!(s.entries.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_first_entry() {
        let s = amortization_schedule(dec!(300000), dec!(0.04), dec!(30), 600, &limits()).unwrap();
        assert_eq!(
            s.entries[0],
            AmortizationEntry {
                period: 1,
                payment: dec!(1432.25),
                principal_portion: dec!(432.25),
                interest_portion: dec!(1000.00),
                remaining_balance: dec!(299567.75),
            }
        );
    }

    #[test]
    fn test_schedule_conserves_principal() {
        let principal = dec!(250000);
        let s = amortization_schedule(principal, dec!(0.065), dec!(25), 600, &limits()).unwrap();
        let repaid: Decimal = s.entries.iter().map(|e| e.principal_portion).sum();
        assert_eq!(repaid, principal);
        for e in &s.entries {
            assert_eq!(e.principal_portion + e.interest_portion, e.payment);
        }
        for pair in s.entries.windows(2) {
            assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
        }
        assert_eq!(s.entries.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_rejects_term_over_cap() {
        let err = amortization_schedule(dec!(100000), dec!(0.05), dec!(2), 12, &limits()).unwrap_err();
        match err {
            FinCalcError::LimitExceeded { limit, max, actual } => {
                assert_eq!(limit, "max_amortization_months");
                assert_eq!(max, "12");
                assert_eq!(actual, "24");
            }
            other => panic!("expected LimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_schedule_guard_cap_wins_over_request() {
        let err = amortization_schedule(dec!(100000), dec!(0.05), dec!(60), 10_000, &limits()).unwrap_err();
        assert_eq!(err.code(), "LIMIT_EXCEEDED");
    }

    #[test]
    fn test_payment_covering_only_interest_still_amortizes() {
        // 100 at 100%: exact payment 8.3333.. and first interest 8.33
        let s = amortization_schedule(dec!(100), Decimal::ONE, dec!(50), 600, &limits()).unwrap();
        assert_eq!(s.monthly_payment, dec!(8.34));
        assert!(s.entries[0].principal_portion > Decimal::ZERO);
        assert!(s.entries.iter().all(|e| e.payment <= s.monthly_payment));
        assert_eq!(s.entries.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_zero_principal_is_empty() {
        let s = amortization_schedule(Decimal::ZERO, dec!(0.05), dec!(30), 600, &limits()).unwrap();
        assert_eq!(s.monthly_payment, Decimal::ZERO);
        assert!(s.entries.is_empty());
    }

    #[test]
    fn test_summary_totals() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let s = summary(dec!(120000), Decimal::ZERO, dec!(10), as_of, &limits()).unwrap();
        assert_eq!(
            s,
            MortgageSummary {
                monthly_payment: dec!(1000),
                total_paid: dec!(120000),
                total_interest: Decimal::ZERO,
                payoff_months: 120,
                payoff_date: "2034-02".into(),
            }
        );
    }

    #[test]
    fn test_summary_interest_matches_schedule() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let s = summary(dec!(300000), dec!(0.04), dec!(30), as_of, &limits()).unwrap();
        assert_eq!(s.payoff_months, 360);
        assert_eq!(s.total_interest, s.total_paid - dec!(300000));
        // 1432.25 * 360 = 515610; the cent-exact schedule settles within a few dollars
        assert!((s.total_paid - dec!(515610)).abs() < dec!(5), "{}", s.total_paid);
        assert_eq!(s.payoff_date, "2054-12");
    }

    #[test]
    fn test_wrapper_warns_on_truncated_term() {
        let input = MortgageInput {
            principal: dec!(10000),
            annual_rate: dec!(0.05),
            years: dec!(1.05),
        };
        let out = calculate_mortgage_payment(&input, &limits()).unwrap();
        assert_eq!(out.result.total_months, 12);
        assert_eq!(out.warnings.len(), 1);
    }
}
