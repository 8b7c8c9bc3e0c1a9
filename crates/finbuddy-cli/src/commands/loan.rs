use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use finbuddy_core::loan::amortization::{self, LoanRequest};
use finbuddy_core::loan::comparison::{self, LoanComparisonInput};
use finbuddy_core::loan::export;
use finbuddy_core::round_money;

use crate::input;

/// Arguments describing a single loan
#[derive(Args, Debug, Default)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount (principal)
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 8.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Tenure in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Tenure in months (takes precedence over --years)
    #[arg(long)]
    pub months: Option<u32>,

    /// Extra payment made every month
    #[arg(long)]
    pub extra_monthly: Option<Decimal>,

    /// One-time prepayment amount
    #[arg(long)]
    pub lump_sum: Option<Decimal>,

    /// Month (1-based) in which the lump sum is paid
    #[arg(long)]
    pub lump_sum_month: Option<u32>,

    /// Name for the loan
    #[arg(long)]
    pub label: Option<String>,
}

/// Arguments for loan comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON file with `{"loans": [...]}` or a bare array of loans
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for CSV export
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Destination CSV file (overwritten if it exists)
    #[arg(long)]
    pub path: String,
}

pub fn run_emi(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(&args)?;
    let emi = amortization::calculate_emi(
        request.loan_amount,
        request.annual_rate_pct,
        request.years,
        request.months,
    )?;
    Ok(json!({
        "result": {
            "emi": round_money(emi),
            "months": request.resolve_months()?,
            "monthly_rate": amortization::monthly_rate(request.annual_rate_pct),
        }
    }))
}

pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(&args)?;
    let result = amortization::analyze_loan(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_prepayment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(&args)?;
    let result = comparison::analyze_prepayment(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: Value = input::load_json(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for loan comparison")?;
    let comparison_input = parse_comparison(raw)?;
    let result = comparison::analyze_loan_comparison(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_export(args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(&args.loan)?;
    let result = amortization::generate_amortization_schedule(&request)?;
    export::export_schedule_to_csv(&result, &args.path)?;
    Ok(json!({
        "result": {
            "path": args.path,
            "rows": result.schedule.len(),
            "emi": result.emi,
            "months_taken": result.months_taken,
        }
    }))
}

/// `--input` file, then piped stdin, then individual flags.
fn read_request(args: &LoanArgs) -> Result<LoanRequest, Box<dyn std::error::Error>> {
    match input::load_json(args.input.as_deref())? {
        Some(request) => Ok(request),
        None => request_from_flags(args),
    }
}

fn request_from_flags(args: &LoanArgs) -> Result<LoanRequest, Box<dyn std::error::Error>> {
    let principal = args
        .principal
        .ok_or("--principal is required (or provide --input)")?;
    let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
    if args.years.is_none() && args.months.is_none() {
        return Err("--years or --months is required (or provide --input)".into());
    }

    Ok(LoanRequest {
        loan_amount: principal,
        annual_rate_pct: rate,
        years: args.years,
        months: args.months,
        extra_monthly: args.extra_monthly.unwrap_or(Decimal::ZERO),
        lump_sum: args.lump_sum.unwrap_or(Decimal::ZERO),
        lump_sum_month: args.lump_sum_month,
        label: args.label.clone(),
    })
}

/// Accept either `{"loans": [...]}` or a bare array.
fn parse_comparison(raw: Value) -> Result<LoanComparisonInput, Box<dyn std::error::Error>> {
    let parsed = match raw {
        Value::Array(_) => LoanComparisonInput {
            loans: serde_json::from_value(raw)?,
        },
        other => serde_json::from_value(other)?,
    };
    Ok(parsed)
}
