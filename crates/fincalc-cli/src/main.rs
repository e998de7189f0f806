mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::error::Error;
use std::process;

use fincalc_core::FinCalcError;

use commands::bonds::{BondPriceArgs, BondYieldArgs};
use commands::mortgage::{AmortizationArgs, ExtraPaymentsArgs, MortgagePaymentArgs, MortgageSummaryArgs};
use commands::tvm::{AnnuityPaymentArgs, FutureValueArgs, PresentValueArgs};
use commands::xirr::XirrArgs;

/// Time value of money, mortgage, bond and XIRR calculations
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Time value of money, mortgage, bond and XIRR calculations",
    long_about = "A CLI for stateless financial calculations with decimal precision. \
                  Supports future/present value, annuities, mortgage schedules and \
                  payoff simulation, bond price/yield, and XIRR over dated cash flows."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON file overriding guard limits (any subset of fields)
    #[arg(long, global = true)]
    limits: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Future value of a lump sum with periodic compounding
    FutureValue(FutureValueArgs),
    /// Present value of a future lump sum
    PresentValue(PresentValueArgs),
    /// Level payment that amortises a present value
    AnnuityPayment(AnnuityPaymentArgs),
    /// Monthly payment for a fixed-rate mortgage
    MortgagePayment(MortgagePaymentArgs),
    /// Month-by-month amortization schedule
    Amortization(AmortizationArgs),
    /// Lifetime totals and payoff month
    MortgageSummary(MortgageSummaryArgs),
    /// Payoff acceleration from a fixed extra monthly payment
    ExtraPayments(ExtraPaymentsArgs),
    /// Bond price from yield to maturity
    BondPrice(BondPriceArgs),
    /// Yield to maturity implied by a bond price
    BondYield(BondYieldArgs),
    /// Internal rate of return over dated cash flows
    Xirr(XirrArgs),
    /// XIRR with solver diagnostics and warnings
    XirrExplain(XirrArgs),
    /// Print the effective guard limits
    Limits,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let limits = match input::file::read_limits(cli.limits.as_deref()) {
        Ok(limits) => limits,
        Err(e) => fail(e.as_ref()),
    };

    let result: Result<serde_json::Value, Box<dyn Error>> = match cli.command {
        Commands::FutureValue(args) => commands::tvm::run_future_value(args, &limits),
        Commands::PresentValue(args) => commands::tvm::run_present_value(args, &limits),
        Commands::AnnuityPayment(args) => commands::tvm::run_annuity_payment(args, &limits),
        Commands::MortgagePayment(args) => commands::mortgage::run_mortgage_payment(args, &limits),
        Commands::Amortization(args) => commands::mortgage::run_amortization(args, &limits),
        Commands::MortgageSummary(args) => commands::mortgage::run_mortgage_summary(args, &limits),
        Commands::ExtraPayments(args) => commands::mortgage::run_extra_payments(args, &limits),
        Commands::BondPrice(args) => commands::bonds::run_bond_price(args, &limits),
        Commands::BondYield(args) => commands::bonds::run_bond_yield(args, &limits),
        Commands::Xirr(args) => commands::xirr::run_xirr(args, &limits),
        Commands::XirrExplain(args) => commands::xirr::run_xirr_explain(args, &limits),
        Commands::Limits => serde_json::to_value(&limits).map_err(Into::into),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e.as_ref()),
    }
}

fn fail(e: &(dyn Error + 'static)) -> ! {
    match e.downcast_ref::<FinCalcError>() {
        Some(fe) => eprintln!("{}: {}", format!("error[{}]", fe.code()).red().bold(), fe),
        None => eprintln!("{}: {}", "error".red().bold(), e),
    }
    process::exit(exit_code(e));
}

/// 2 for requests the caller can fix, 3 when no rate could be solved, 1 otherwise.
fn exit_code(e: &(dyn Error + 'static)) -> i32 {
    match e.downcast_ref::<FinCalcError>() {
        Some(fe) if fe.is_caller_correctable() => 2,
        Some(FinCalcError::NoSolution { .. } | FinCalcError::SolverTimeout { .. }) => 3,
        _ => 1,
    }
}
