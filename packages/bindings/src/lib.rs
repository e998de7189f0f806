use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use fincalc_core::{FinCalcError, FinCalcResult, GuardConfig};

/// Convert a calculation error into a napi::Error, prefixed with its code
/// so JS callers can branch on `[VALIDATION_ERROR]` etc.
fn to_napi_error(e: FinCalcError) -> napi::Error {
    napi::Error::from_reason(format!("[{}] {}", e.code(), e))
}

fn json_error(e: serde_json::Error) -> napi::Error {
    napi::Error::from_reason(format!("[INVALID_JSON] {e}"))
}

/// Parse the request, run it under the default limits, serialize the envelope.
fn run<I, O>(input_json: &str, calc: fn(&I, &GuardConfig) -> FinCalcResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(json_error)?;
    let output = calc(&input, &GuardConfig::default()).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(json_error)
}

// ---------------------------------------------------------------------------
// Time value of money
// ---------------------------------------------------------------------------

#[napi]
pub fn future_value(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::time_value::calculate_future_value)
}

#[napi]
pub fn present_value(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::time_value::calculate_present_value)
}

#[napi]
pub fn annuity_payment(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::time_value::calculate_annuity_payment)
}

// ---------------------------------------------------------------------------
// Mortgage
// ---------------------------------------------------------------------------

#[napi]
pub fn mortgage_payment(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::mortgage::calculate_mortgage_payment)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::mortgage::calculate_amortization)
}

#[napi]
pub fn mortgage_summary(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::mortgage::calculate_mortgage_summary)
}

#[napi]
pub fn extra_payments(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::mortgage::calculate_extra_payments)
}

// ---------------------------------------------------------------------------
// Fixed income
// ---------------------------------------------------------------------------

#[napi]
pub fn bond_price(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::fixed_income::calculate_bond_price)
}

#[napi]
pub fn bond_yield(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::fixed_income::calculate_bond_yield)
}

// ---------------------------------------------------------------------------
// XIRR
// ---------------------------------------------------------------------------

#[napi]
pub fn xirr(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::xirr::calculate_xirr)
}

#[napi]
pub fn xirr_explain(input_json: String) -> NapiResult<String> {
    run(&input_json, fincalc_core::xirr::calculate_xirr_explain)
}

/// Default guard limits as JSON.
#[napi]
pub fn default_limits() -> NapiResult<String> {
    serde_json::to_string(&GuardConfig::default()).map_err(json_error)
}
