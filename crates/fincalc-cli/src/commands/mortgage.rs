use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::mortgage::{
    self, AmortizationInput, ExtraPaymentsInput, MortgageInput, MortgageSummaryInput,
};
use fincalc_core::GuardConfig;

use crate::input::{self, required};

/// Loan terms shared by every mortgage command
#[derive(Args)]
pub struct LoanArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a decimal (e.g. 0.04 for 4%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

impl LoanArgs {
    fn terms(&self) -> Result<(Decimal, Decimal, Decimal), String> {
        Ok((
            self.principal.ok_or_else(|| required("principal"))?,
            self.annual_rate.ok_or_else(|| required("annual-rate"))?,
            self.years.ok_or_else(|| required("years"))?,
        ))
    }
}

/// Arguments for the monthly payment
#[derive(Args)]
pub struct MortgagePaymentArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct AmortizationArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Longest schedule to accept, in months (capped by the configured limit)
    #[arg(long)]
    pub max_months: Option<u32>,
}

/// Arguments for the lifetime summary
#[derive(Args)]
pub struct MortgageSummaryArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Month of the first payment, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the extra-payment simulation
#[derive(Args)]
pub struct ExtraPaymentsArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Extra principal paid every month
    #[arg(long)]
    pub extra_monthly: Option<Decimal>,

    /// Month of the first payment, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_mortgage_payment(
    args: MortgagePaymentArgs,
    limits: &GuardConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = &args.loan;
    let mortgage_input: MortgageInput = input::resolve(loan.input.as_deref(), || {
        let (principal, annual_rate, years) = loan.terms()?;
        Ok(MortgageInput {
            principal,
            annual_rate,
            years,
        })
    })?;

    let result = mortgage::calculate_mortgage_payment(&mortgage_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_amortization(args: AmortizationArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = &args.loan;
    let schedule_input: AmortizationInput = input::resolve(loan.input.as_deref(), || {
        let (principal, annual_rate, years) = loan.terms()?;
        Ok(AmortizationInput {
            principal,
            annual_rate,
            years,
            max_months: args.max_months,
        })
    })?;

    let result = mortgage::calculate_amortization(&schedule_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_mortgage_summary(
    args: MortgageSummaryArgs,
    limits: &GuardConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = &args.loan;
    let summary_input: MortgageSummaryInput = input::resolve(loan.input.as_deref(), || {
        let (principal, annual_rate, years) = loan.terms()?;
        Ok(MortgageSummaryInput {
            principal,
            annual_rate,
            years,
            as_of: args.as_of,
        })
    })?;

    let result = mortgage::calculate_mortgage_summary(&summary_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_extra_payments(args: ExtraPaymentsArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = &args.loan;
    let extra_input: ExtraPaymentsInput = input::resolve(loan.input.as_deref(), || {
        let (principal, annual_rate, years) = loan.terms()?;
        Ok(ExtraPaymentsInput {
            principal,
            annual_rate,
            years,
            extra_monthly: args.extra_monthly.ok_or_else(|| required("extra-monthly"))?,
            as_of: args.as_of,
        })
    })?;

    let result = mortgage::calculate_extra_payments(&extra_input, limits)?;
    Ok(serde_json::to_value(result)?)
}
