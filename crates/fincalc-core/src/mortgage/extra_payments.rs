use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::schedule::amortization_schedule;
use super::{monthly_rate, payoff_label};
use crate::limits::GuardConfig;
use crate::time_value::validate_amount;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years, MONEY_DP};
use crate::FinCalcResult;

/// Baseline schedule compared against a schedule with a fixed extra
/// principal payment every month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentOutcome {
    pub regular_monthly_payment: Money,
    /// Regular payment plus the extra amount
    pub total_monthly_payment: Money,
    pub original_payoff_months: u32,
    pub new_payoff_months: u32,
    pub months_saved: u32,
    pub original_total_interest: Money,
    pub new_total_interest: Money,
    pub interest_saved: Money,
    /// `YYYY-MM` of the accelerated final payment
    pub new_payoff_date: String,
}

/// Simulate paying `extra_monthly` on top of the regular payment.
///
/// Both runs use the same cent-rounding rules as [`amortization_schedule`].
/// The extra amount goes entirely to principal and is clamped to whatever
/// balance remains.
pub fn with_extra_payments(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    extra_monthly: Money,
    as_of: NaiveDate,
    limits: &GuardConfig,
) -> FinCalcResult<ExtraPaymentOutcome> {
    validate_amount("extra_monthly", extra_monthly, limits)?;
    let baseline = amortization_schedule(
        principal,
        annual_rate,
        years,
        limits.max_amortization_months,
        limits,
    )?;

    let original_payoff_months = baseline.entries.len() as u32;
    let original_total_interest: Money = baseline.entries.iter().map(|e| e.interest_portion).sum();

    let payment = baseline.monthly_payment;
    let rate = monthly_rate(annual_rate);
    let mut balance = principal;
    let mut new_payoff_months = 0u32;
    let mut new_total_interest = Decimal::ZERO;

    for period in 1..=baseline.total_payments {
        if balance.is_zero() {
            break;
        }
        let interest = (balance * rate).round_dp(MONEY_DP);
        let mut principal_portion = (payment - interest).max(Decimal::ZERO) + extra_monthly;
        if period == baseline.total_payments || principal_portion >= balance {
            principal_portion = balance;
        }

        balance -= principal_portion;
        new_total_interest += interest;
        new_payoff_months = period;
    }

    log::debug!(
        "extra {extra_monthly}/month pays off in {new_payoff_months} instead of {original_payoff_months} months"
    );

    Ok(ExtraPaymentOutcome {
        regular_monthly_payment: payment,
        total_monthly_payment: payment + extra_monthly,
        original_payoff_months,
        new_payoff_months,
        months_saved: original_payoff_months.saturating_sub(new_payoff_months),
        original_total_interest,
        new_total_interest,
        interest_saved: original_total_interest - new_total_interest,
        new_payoff_date: payoff_label(as_of, new_payoff_months)?,
    })
}

// ---------------------------------------------------------------------------
// Request-level wrapper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraPaymentsInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
    pub extra_monthly: Money,
    /// Month of the first payment; today when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

pub fn calculate_extra_payments(
    input: &ExtraPaymentsInput,
    limits: &GuardConfig,
) -> FinCalcResult<ComputationOutput<ExtraPaymentOutcome>> {
    let start = Instant::now();
    let as_of = input
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let outcome = with_extra_payments(
        input.principal,
        input.annual_rate,
        input.years,
        input.extra_monthly,
        as_of,
        limits,
    )?;

    let mut warnings = Vec::new();
    if input.extra_monthly.is_zero() {
        warnings.push("No extra payment given; outcome equals the baseline schedule".into());
    }

    Ok(with_metadata(
        "Accelerated amortization with a fixed monthly extra principal payment",
        input,
        warnings,
        start.elapsed().as_micros() as u64,
        outcome,
    ))
}
