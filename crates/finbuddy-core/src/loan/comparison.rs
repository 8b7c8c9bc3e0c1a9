//! Side-by-side loan comparison and prepayment impact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinBuddyError;
use crate::loan::amortization::{generate_amortization_schedule, LoanRequest, LoanResult};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::FinBuddyResult;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Loans to compare, in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparisonInput {
    pub loans: Vec<LoanRequest>,
}

/// Outcome for one loan in a comparison. Exactly one of `result` and
/// `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<LoanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// EMI minus the EMI of the first successful entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi_difference: Option<Money>,
    /// Total interest minus that of the first successful entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_interest_difference: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparisonOutput {
    pub entries: Vec<ComparisonEntry>,
    pub successful: usize,
    pub failed: usize,
    /// Index of the entry with the lowest EMI (first wins on ties).
    pub lowest_emi_index: Option<usize>,
    /// Index of the entry with the lowest total interest (first wins on ties).
    pub lowest_total_interest_index: Option<usize>,
}

/// Baseline vs accelerated repayment of the same loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentImpact {
    pub emi: Money,
    pub baseline_months_taken: u32,
    pub accelerated_months_taken: u32,
    pub months_saved: u32,
    pub baseline_total_interest: Money,
    pub accelerated_total_interest: Money,
    pub interest_saved: Money,
    pub baseline_total_payment: Money,
    pub accelerated_total_payment: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Amortize every loan independently, preserving input order.
///
/// A bad entry yields its own error without affecting the others.
pub fn compare_loans(loans: &[LoanRequest]) -> Vec<FinBuddyResult<LoanResult>> {
    loans.iter().map(generate_amortization_schedule).collect()
}

/// Compare loans and summarise which is cheapest.
pub fn analyze_loan_comparison(
    input: &LoanComparisonInput,
) -> FinBuddyResult<ComputationOutput<LoanComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.loans.is_empty() {
        return Err(FinBuddyError::InvalidInput {
            field: "loans".into(),
            reason: "At least one loan is required".into(),
        });
    }

    let outcomes = compare_loans(&input.loans);

    let baseline = outcomes
        .iter()
        .find_map(|o| o.as_ref().ok())
        .map(|r| (r.emi, r.total_interest));

    let mut entries = Vec::with_capacity(outcomes.len());
    for (index, (loan, outcome)) in input.loans.iter().zip(outcomes).enumerate() {
        let entry = match outcome {
            Ok(result) => {
                let (emi_difference, total_interest_difference) = match baseline {
                    Some((emi, interest)) => (
                        Some(result.emi - emi),
                        Some(result.total_interest - interest),
                    ),
                    None => (None, None),
                };
                ComparisonEntry {
                    index,
                    label: loan.label.clone(),
                    result: Some(result),
                    error: None,
                    emi_difference,
                    total_interest_difference,
                }
            }
            Err(e) => {
                warnings.push(format!(
                    "Loan {} ({}) failed: {}",
                    index,
                    entry_name(loan, index),
                    e
                ));
                ComparisonEntry {
                    index,
                    label: loan.label.clone(),
                    result: None,
                    error: Some(e.to_string()),
                    emi_difference: None,
                    total_interest_difference: None,
                }
            }
        };
        entries.push(entry);
    }

    let successful = entries.iter().filter(|e| e.result.is_some()).count();
    let failed = entries.len() - successful;

    let output = LoanComparisonOutput {
        lowest_emi_index: lowest_by(&entries, |r| r.emi),
        lowest_total_interest_index: lowest_by(&entries, |r| r.total_interest),
        entries,
        successful,
        failed,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Independent amortization of each loan; differences against the first successful entry",
        &serde_json::json!({
            "loans": input.loans.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Measure how much time and interest the extra and lump-sum payments save.
pub fn analyze_prepayment(
    request: &LoanRequest,
) -> FinBuddyResult<ComputationOutput<PrepaymentImpact>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !request.is_accelerated() {
        warnings.push(
            "No extra or lump-sum payments configured; accelerated schedule equals baseline"
                .into(),
        );
    }

    let baseline = generate_amortization_schedule(&request.without_prepayments())?;
    let accelerated = generate_amortization_schedule(request)?;

    let impact = PrepaymentImpact {
        emi: accelerated.emi,
        baseline_months_taken: baseline.months_taken,
        accelerated_months_taken: accelerated.months_taken,
        months_saved: baseline.months_taken.saturating_sub(accelerated.months_taken),
        baseline_total_interest: baseline.total_interest,
        accelerated_total_interest: accelerated.total_interest,
        interest_saved: (baseline.total_interest - accelerated.total_interest).max(Decimal::ZERO),
        baseline_total_payment: baseline.total_payment,
        accelerated_total_payment: accelerated.total_payment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Prepayment impact — baseline EMI schedule vs schedule with extra and lump-sum payments",
        &serde_json::json!({
            "loan_amount": request.loan_amount.to_string(),
            "annual_rate_pct": request.annual_rate_pct.to_string(),
            "months": baseline.months,
            "extra_monthly": request.extra_monthly.to_string(),
            "lump_sum": request.lump_sum.to_string(),
            "lump_sum_month": request.lump_sum_month,
        }),
        warnings,
        elapsed,
        impact,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn entry_name(loan: &LoanRequest, index: usize) -> String {
    loan.label
        .clone()
        .unwrap_or_else(|| format!("loan #{}", index + 1))
}

fn lowest_by(entries: &[ComparisonEntry], key: impl Fn(&LoanResult) -> Money) -> Option<usize> {
    let mut best: Option<(usize, Money)> = None;
    for entry in entries {
        if let Some(result) = &entry.result {
            let value = key(result);
            match best {
                Some((_, current)) if value >= current => {}
                _ => best = Some((entry.index, value)),
            }
        }
    }
    best.map(|(index, _)| index)
}
