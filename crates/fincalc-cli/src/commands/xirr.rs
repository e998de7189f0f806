use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::xirr::{self, XirrInput};
use fincalc_core::{CashFlow, GuardConfig};

use super::bonds::SolverArg;
use crate::input::{self, required};

/// Arguments for XIRR
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct XirrArgs {
    /// Dated cash flows as DATE:AMOUNT, comma separated
    /// (e.g. 2024-01-01:-10000,2024-12-31:11000)
    #[arg(long, value_delimiter = ',')]
    pub cashflows: Vec<String>,

    /// Starting rate for the bracket search
    #[arg(long, default_value = "0.1")]
    pub guess: Decimal,

    /// Root-finding algorithm
    #[arg(long, value_enum, default_value_t = SolverArg::Brent)]
    pub solver: SolverArg,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_xirr(args: XirrArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let xirr_input = resolve_input(args)?;
    let result = xirr::calculate_xirr(&xirr_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_xirr_explain(args: XirrArgs, limits: &GuardConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let xirr_input = resolve_input(args)?;
    let result = xirr::calculate_xirr_explain(&xirr_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

fn resolve_input(args: XirrArgs) -> Result<XirrInput, Box<dyn std::error::Error>> {
    input::resolve(args.input.as_deref(), || {
        if args.cashflows.is_empty() {
            return Err(required("cashflows").into());
        }
        let cashflows = args
            .cashflows
            .iter()
            .map(|s| parse_cashflow(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(XirrInput {
            cashflows,
            initial_guess: args.guess,
            solver: args.solver.into(),
        })
    })
}

fn parse_cashflow(spec: &str) -> Result<CashFlow, String> {
    let (date, amount) = spec
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("Cash flow '{spec}' must be DATE:AMOUNT"))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date in '{spec}': {e}"))?;
    let amount: Decimal = amount
        .parse()
        .map_err(|e| format!("Invalid amount in '{spec}': {e}"))?;
    Ok(CashFlow::new(date, amount))
}
