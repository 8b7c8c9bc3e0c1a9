use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use finbuddy_core::loan::amortization::{self, LoanRequest};
use finbuddy_core::loan::comparison::{self, LoanComparisonInput};
use finbuddy_core::loan::export;
use finbuddy_core::round_money;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_request(input_json: &str) -> NapiResult<LoanRequest> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

/// Term and amounts needed for a bare EMI.
#[derive(Deserialize)]
struct EmiInput {
    loan_amount: Decimal,
    annual_rate_pct: Decimal,
    #[serde(default)]
    years: Option<u32>,
    #[serde(default)]
    months: Option<u32>,
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_emi(input_json: String) -> NapiResult<String> {
    let input: EmiInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let emi = amortization::calculate_emi(
        input.loan_amount,
        input.annual_rate_pct,
        input.years,
        input.months,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "emi": round_money(emi) })).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let request = parse_request(&input_json)?;
    let output = amortization::analyze_loan(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_loans(input_json: String) -> NapiResult<String> {
    let input: LoanComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::analyze_loan_comparison(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn prepayment_impact(input_json: String) -> NapiResult<String> {
    let request = parse_request(&input_json)?;
    let output = comparison::analyze_prepayment(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// CSV text of the schedule, for the browser to offer as a download.
#[napi]
pub fn schedule_to_csv(input_json: String) -> NapiResult<String> {
    let request = parse_request(&input_json)?;
    let result = amortization::generate_amortization_schedule(&request).map_err(to_napi_error)?;
    export::schedule_to_csv_string(&result).map_err(to_napi_error)
}
