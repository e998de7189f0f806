use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::time_value::{
    self, AnnuityPaymentInput, FutureValueInput, PresentValueInput,
};
use fincalc_core::GuardConfig;

use crate::input::{self, required};

/// Arguments for future value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FutureValueArgs {
    /// Amount invested today
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal (e.g. 0.05 for 5%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Horizon in years (fractions allowed)
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Compounding periods per year
    #[arg(long, default_value = "1")]
    pub compounds_per_year: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for present value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PresentValueArgs {
    /// Amount received at the horizon
    #[arg(long)]
    pub future_value: Option<Decimal>,

    /// Annual discount rate as a decimal
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Horizon in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Compounding periods per year
    #[arg(long, default_value = "1")]
    pub compounds_per_year: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a level annuity payment
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnnuityPaymentArgs {
    /// Amount to amortise
    #[arg(long)]
    pub present_value: Option<Decimal>,

    /// Annual rate as a decimal
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Payments per year
    #[arg(long, default_value = "12")]
    pub payments_per_year: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_future_value(args: FutureValueArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let fv_input: FutureValueInput = input::resolve(args.input.as_deref(), || {
        Ok(FutureValueInput {
            principal: args.principal.ok_or_else(|| required("principal"))?,
            annual_rate: args.annual_rate.ok_or_else(|| required("annual-rate"))?,
            years: args.years.ok_or_else(|| required("years"))?,
            compounds_per_year: args.compounds_per_year,
        })
    })?;

    let result = time_value::calculate_future_value(&fv_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_present_value(args: PresentValueArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let pv_input: PresentValueInput = input::resolve(args.input.as_deref(), || {
        Ok(PresentValueInput {
            future_value: args.future_value.ok_or_else(|| required("future-value"))?,
            annual_rate: args.annual_rate.ok_or_else(|| required("annual-rate"))?,
            years: args.years.ok_or_else(|| required("years"))?,
            compounds_per_year: args.compounds_per_year,
        })
    })?;

    let result = time_value::calculate_present_value(&pv_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_annuity_payment(
    args: AnnuityPaymentArgs,
    limits: &GuardConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let annuity_input: AnnuityPaymentInput = input::resolve(args.input.as_deref(), || {
        Ok(AnnuityPaymentInput {
            present_value: args.present_value.ok_or_else(|| required("present-value"))?,
            annual_rate: args.annual_rate.ok_or_else(|| required("annual-rate"))?,
            years: args.years.ok_or_else(|| required("years"))?,
            payments_per_year: args.payments_per_year,
        })
    })?;

    let result = time_value::calculate_annuity_payment(&annuity_input, limits)?;
    Ok(serde_json::to_value(result)?)
}
