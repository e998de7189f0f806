//! Fixed-rate mortgage analytics: level monthly payment, cent-exact
//! amortization schedules, lifetime summaries and extra-payment payoff
//! simulation.
//!
//! All displayed amounts are rounded to cents. Interest is rounded per
//! period before it is split from the payment, so every schedule entry
//! satisfies `principal_portion + interest_portion == payment` exactly and
//! the balance lands on zero.

pub mod extra_payments;
pub mod schedule;

pub use extra_payments::{calculate_extra_payments, with_extra_payments, ExtraPaymentOutcome, ExtraPaymentsInput};
pub use schedule::{
    amortization_schedule, calculate_amortization, calculate_mortgage_payment,
    calculate_mortgage_summary, monthly_payment, summary, AmortizationEntry,
    AmortizationInput, AmortizationSchedule, MortgageInput, MortgagePaymentOutput,
    MortgageSummary, MortgageSummaryInput,
};

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::error::FinCalcError;
use crate::limits::GuardConfig;
use crate::time_value::{validate_amount, validate_annual_rate, validate_years, whole_periods};
use crate::types::{Money, Rate, Years};
use crate::FinCalcResult;

pub(crate) const MONTHS_PER_YEAR: u32 = 12;

/// Shared loan validation. Returns the term in whole months.
pub(crate) fn validate_loan(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    limits: &GuardConfig,
) -> FinCalcResult<u32> {
    validate_amount("principal", principal, limits)?;
    validate_annual_rate("annual_rate", annual_rate)?;
    validate_years(years)?;
    whole_periods(years, MONTHS_PER_YEAR)
}

pub(crate) fn monthly_rate(annual_rate: Rate) -> Rate {
    annual_rate / Decimal::from(MONTHS_PER_YEAR)
}

/// `YYYY-MM` label of the month holding the last of `months` payments when
/// the first payment falls in the month of `as_of`.
pub(crate) fn payoff_label(as_of: NaiveDate, months: u32) -> FinCalcResult<String> {
    let first = as_of.with_day(1).unwrap_or(as_of);
    first
        .checked_add_months(Months::new(months.saturating_sub(1)))
        .map(|d| d.format("%Y-%m").to_string())
        .ok_or_else(|| FinCalcError::validation("as_of", "Payoff date is outside the calendar range"))
}
