use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::fixed_income::{self, BondPriceInput, BondYieldInput};
use fincalc_core::solvers::SolverKind;
use fincalc_core::GuardConfig;

use crate::input::{self, required};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SolverArg {
    #[default]
    Brent,
    Bisection,
}

impl From<SolverArg> for SolverKind {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Brent => SolverKind::Brent,
            SolverArg::Bisection => SolverKind::Bisection,
        }
    }
}

/// Arguments for pricing a bond from its yield
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BondPriceArgs {
    /// Face (par) value
    #[arg(long)]
    pub face_value: Option<Decimal>,

    /// Annual coupon rate as a decimal
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    /// Years to maturity
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Yield to maturity as a decimal (may be negative, above -0.99)
    #[arg(long)]
    pub ytm: Option<Decimal>,

    /// Coupon payments per year (1-12)
    #[arg(long, default_value = "2")]
    pub payments_per_year: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for solving the yield implied by a price
#[derive(Args)]
pub struct BondYieldArgs {
    /// Face (par) value
    #[arg(long)]
    pub face_value: Option<Decimal>,

    /// Annual coupon rate as a decimal
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    /// Years to maturity
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Market price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Coupon payments per year (1-12)
    #[arg(long, default_value = "2")]
    pub payments_per_year: u32,

    /// Root-finding algorithm
    #[arg(long, value_enum, default_value_t = SolverArg::Brent)]
    pub solver: SolverArg,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_bond_price(args: BondPriceArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let price_input: BondPriceInput = input::resolve(args.input.as_deref(), || {
        Ok(BondPriceInput {
            face_value: args.face_value.ok_or_else(|| required("face-value"))?,
            coupon_rate: args.coupon_rate.ok_or_else(|| required("coupon-rate"))?,
            years_to_maturity: args.years.ok_or_else(|| required("years"))?,
            yield_to_maturity: args.ytm.ok_or_else(|| required("ytm"))?,
            payments_per_year: args.payments_per_year,
        })
    })?;

    let result = fixed_income::calculate_bond_price(&price_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bond_yield(args: BondYieldArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let yield_input: BondYieldInput = input::resolve(args.input.as_deref(), || {
        Ok(BondYieldInput {
            face_value: args.face_value.ok_or_else(|| required("face-value"))?,
            coupon_rate: args.coupon_rate.ok_or_else(|| required("coupon-rate"))?,
            years_to_maturity: args.years.ok_or_else(|| required("years"))?,
            price: args.price.ok_or_else(|| required("price"))?,
            payments_per_year: args.payments_per_year,
            solver: args.solver.into(),
        })
    })?;

    let result = fixed_income::calculate_bond_yield(&yield_input, limits)?;
    Ok(serde_json::to_value(result)?)
}
