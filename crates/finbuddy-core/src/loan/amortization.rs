//! Monthly amortization engine.
//!
//! A loan is repaid with a level EMI; each month the interest on the
//! outstanding balance is charged and the rest of the EMI, plus any recurring
//! extra payment and a one-time lump sum, reduces principal. The simulation is
//! a fold over `(state, month) -> (row, state')` so every call is pure and
//! independent of any other.
//!
//! All arithmetic uses `rust_decimal::Decimal`. Rows are rounded to cents for
//! reporting; the balance carried into the next month and the running totals
//! stay unrounded, and the totals are rounded once at the end.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinBuddyError;
use crate::time_value::level_payment;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::FinBuddyResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Balances below one cent are treated as fully repaid.
const PAYOFF_EPSILON: Decimal = dec!(0.01);
/// The simulation gives up after this many multiples of the nominal term.
const SAFETY_MULTIPLIER: u32 = 10;
const MONTHS_PER_YEAR: u32 = 12;
/// Longest accepted tenure (100 years).
const MAX_TERM_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// A loan to amortize.
///
/// Rates are annual percentages and periods are always calendar months, so
/// `months` and `years * 12` describe the same thing. When both are given
/// `months` wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Principal borrowed.
    pub loan_amount: Money,
    /// Annual interest rate in percent (8.5 = 8.5% p.a.).
    pub annual_rate_pct: Percent,
    /// Tenure in whole years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
    /// Tenure in whole months. Takes precedence over `years`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<u32>,
    /// Fixed extra payment made every month on top of the EMI.
    #[serde(default)]
    pub extra_monthly: Money,
    /// One-time prepayment amount.
    #[serde(default)]
    pub lump_sum: Money,
    /// 1-based month in which `lump_sum` is paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lump_sum_month: Option<u32>,
    /// Free-form name shown in comparisons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One month of the amortization schedule, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    pub interest: Money,
    /// Principal repaid this month, including the extra payment.
    pub principal: Money,
    /// Extra payment actually applied after overshoot correction.
    pub extra_payment: Money,
    /// interest + principal (which already folds in the extra payment).
    pub total_payment: Money,
    pub balance: Money,
}

/// Full amortization result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub loan_amount: Money,
    pub annual_rate_pct: Percent,
    /// Nominal tenure in months.
    pub months: u32,
    pub emi: Money,
    pub total_interest: Money,
    pub total_payment: Money,
    /// Months actually needed to reach a zero balance.
    pub months_taken: u32,
    pub schedule: Vec<ScheduleRow>,
}

impl LoanRequest {
    /// Resolve the nominal tenure in months.
    pub fn resolve_months(&self) -> FinBuddyResult<u32> {
        let months = match (self.months, self.years) {
            (Some(m), _) => m,
            (None, Some(y)) => y.checked_mul(MONTHS_PER_YEAR).ok_or_else(|| {
                FinBuddyError::InvalidTerm(format!("{y} years overflows the month count"))
            })?,
            (None, None) => {
                return Err(FinBuddyError::InvalidTerm(
                    "Either years or months must be provided".into(),
                ))
            }
        };

        if months == 0 {
            return Err(FinBuddyError::InvalidTerm(
                "Tenure (months) must be > 0".into(),
            ));
        }
        if months > MAX_TERM_MONTHS {
            return Err(FinBuddyError::InvalidTerm(format!(
                "Tenure of {months} months exceeds the {MAX_TERM_MONTHS}-month maximum"
            )));
        }
        Ok(months)
    }

    /// True when extra or lump-sum payments may shorten the loan.
    pub fn is_accelerated(&self) -> bool {
        self.extra_monthly > Decimal::ZERO || self.lump_sum_month.is_some()
    }

    /// The same loan with every extra and lump-sum payment removed.
    pub fn without_prepayments(&self) -> LoanRequest {
        LoanRequest {
            extra_monthly: Decimal::ZERO,
            lump_sum: Decimal::ZERO,
            lump_sum_month: None,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monthly interest rate for an annual percentage rate.
pub fn monthly_rate(annual_rate_pct: Percent) -> Rate {
    annual_rate_pct / Decimal::from(MONTHS_PER_YEAR) / dec!(100)
}

/// Unrounded EMI for a loan.
///
/// `months` takes precedence over `years`; one of them is required.
pub fn calculate_emi(
    loan_amount: Money,
    annual_rate_pct: Percent,
    years: Option<u32>,
    months: Option<u32>,
) -> FinBuddyResult<Money> {
    let request = LoanRequest {
        loan_amount,
        annual_rate_pct,
        years,
        months,
        ..Default::default()
    };
    validate_amounts(&request)?;
    let months = request.resolve_months()?;
    level_payment(monthly_rate(annual_rate_pct), months, loan_amount)
}

/// Generate the monthly amortization schedule for a loan.
pub fn generate_amortization_schedule(request: &LoanRequest) -> FinBuddyResult<LoanResult> {
    let (months, plan) = build_plan(request)?;

    log::debug!(
        "amortizing {} at {}% over {} months (emi {})",
        request.loan_amount,
        request.annual_rate_pct,
        months,
        plan.emi
    );

    let (schedule, closing) = run_schedule(request.loan_amount, months, &plan)?;

    log::debug!(
        "loan repaid in {} of {} months",
        closing.month,
        months
    );

    Ok(LoanResult {
        loan_amount: request.loan_amount,
        annual_rate_pct: request.annual_rate_pct,
        months,
        emi: round_money(plan.emi),
        total_interest: round_money(closing.total_interest),
        total_payment: round_money(closing.total_payment),
        months_taken: closing.month,
        schedule,
    })
}

/// Amortize a loan and wrap the result with methodology, assumptions and
/// warnings about ignored or unreachable inputs.
pub fn analyze_loan(request: &LoanRequest) -> FinBuddyResult<ComputationOutput<LoanResult>> {
    let start = Instant::now();

    let result = generate_amortization_schedule(request)?;
    let warnings = request_warnings(request, &result);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level EMI amortization with monthly extra and lump-sum prepayments",
        &serde_json::json!({
            "loan_amount": request.loan_amount.to_string(),
            "annual_rate_pct": request.annual_rate_pct.to_string(),
            "monthly_rate": monthly_rate(request.annual_rate_pct).to_string(),
            "months": result.months,
            "extra_monthly": request.extra_monthly.to_string(),
            "lump_sum": request.lump_sum.to_string(),
            "lump_sum_month": request.lump_sum_month,
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct LumpSum {
    amount: Money,
    month: u32,
}

/// Everything that stays fixed for the life of the loan.
#[derive(Debug, Clone, PartialEq)]
struct PaymentPlan {
    monthly_rate: Rate,
    emi: Money,
    extra_monthly: Money,
    lump_sum: Option<LumpSum>,
}

impl PaymentPlan {
    fn is_accelerated(&self) -> bool {
        self.extra_monthly > Decimal::ZERO || self.lump_sum.is_some()
    }

    fn scheduled_extra(&self, month: u32) -> Money {
        let mut extra = self.extra_monthly.max(Decimal::ZERO);
        if let Some(lump) = self.lump_sum {
            if lump.month == month {
                // Anything above the balance is trimmed later.
                extra = extra.saturating_add(lump.amount);
            }
        }
        extra
    }
}

/// Running state carried from one month to the next. Never rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AmortState {
    month: u32,
    balance: Money,
    total_interest: Money,
    total_payment: Money,
}

impl AmortState {
    fn opening(principal: Money) -> Self {
        AmortState {
            month: 0,
            balance: principal,
            total_interest: Decimal::ZERO,
            total_payment: Decimal::ZERO,
        }
    }
}

fn build_plan(request: &LoanRequest) -> FinBuddyResult<(u32, PaymentPlan)> {
    validate_amounts(request)?;
    let months = request.resolve_months()?;

    if request.lump_sum < Decimal::ZERO {
        return Err(FinBuddyError::InvalidLumpSumConfiguration(
            "Lump sum cannot be negative".into(),
        ));
    }
    if request.lump_sum_month == Some(0) {
        return Err(FinBuddyError::InvalidLumpSumConfiguration(
            "Lump sum month is 1-based and must be at least 1".into(),
        ));
    }

    let rate = monthly_rate(request.annual_rate_pct);
    let emi = level_payment(rate, months, request.loan_amount)?;

    let plan = PaymentPlan {
        monthly_rate: rate,
        emi,
        extra_monthly: request.extra_monthly,
        lump_sum: request.lump_sum_month.map(|month| LumpSum {
            amount: request.lump_sum,
            month,
        }),
    };
    Ok((months, plan))
}

/// Advance the loan by one month.
fn amortize_month(
    state: AmortState,
    plan: &PaymentPlan,
) -> FinBuddyResult<(ScheduleRow, AmortState)> {
    let month = state.month + 1;
    let balance = state.balance;

    let interest = in_range(balance.checked_mul(plan.monthly_rate), "annual_rate_pct")?;
    let mut principal = in_range(plan.emi.checked_sub(interest), "annual_rate_pct")?;
    let mut extra = plan.scheduled_extra(month);

    // Overshoot: trim the extra first, then the regular principal.
    let room = in_range(balance.checked_sub(principal), "loan_amount")?;
    if extra > room {
        if room >= Decimal::ZERO {
            extra = room;
        } else {
            principal = balance;
            extra = Decimal::ZERO;
        }
    }

    let repaid = in_range(principal.checked_add(extra), "loan_amount")?;
    let paid = in_range(repaid.checked_add(interest), "loan_amount")?;
    let mut closing_balance = in_range(balance.checked_sub(repaid), "loan_amount")?;
    if closing_balance < PAYOFF_EPSILON {
        closing_balance = Decimal::ZERO;
    }

    let row = ScheduleRow {
        month,
        interest: round_money(interest),
        principal: round_money(principal + extra),
        extra_payment: round_money(extra),
        total_payment: round_money(paid),
        balance: round_money(closing_balance),
    };

    let next = AmortState {
        month,
        balance: closing_balance,
        total_interest: in_range(state.total_interest.checked_add(interest), "loan_amount")?,
        total_payment: in_range(state.total_payment.checked_add(paid), "loan_amount")?,
    };

    Ok((row, next))
}

fn in_range(value: Option<Decimal>, field: &str) -> FinBuddyResult<Decimal> {
    value.ok_or_else(|| FinBuddyError::InvalidInput {
        field: field.into(),
        reason: "Amortization overflows decimal range".into(),
    })
}

fn run_schedule(
    principal: Money,
    months: u32,
    plan: &PaymentPlan,
) -> FinBuddyResult<(Vec<ScheduleRow>, AmortState)> {
    let max_months = months.saturating_mul(SAFETY_MULTIPLIER);
    let mut schedule = Vec::with_capacity(months.min(MAX_TERM_MONTHS) as usize);
    let mut state = AmortState::opening(principal);

    loop {
        let (row, next) = amortize_month(state, plan)?;
        schedule.push(row);
        state = next;

        if state.balance <= Decimal::ZERO {
            break;
        }
        if state.month >= months && !plan.is_accelerated() {
            break;
        }
        if state.month >= max_months {
            return Err(FinBuddyError::NonConvergence {
                periods: state.month,
                remaining_balance: round_money(state.balance),
            });
        }
    }

    Ok((schedule, state))
}

// ---------------------------------------------------------------------------
// Validation & warnings
// ---------------------------------------------------------------------------

fn validate_amounts(request: &LoanRequest) -> FinBuddyResult<()> {
    if request.loan_amount <= Decimal::ZERO {
        return Err(FinBuddyError::InvalidInput {
            field: "loan_amount".into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if request.annual_rate_pct < Decimal::ZERO {
        return Err(FinBuddyError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if request.extra_monthly < Decimal::ZERO {
        return Err(FinBuddyError::InvalidInput {
            field: "extra_monthly".into(),
            reason: "Extra monthly payment cannot be negative".into(),
        });
    }
    Ok(())
}

fn request_warnings(request: &LoanRequest, result: &LoanResult) -> Vec<String> {
    let mut warnings = Vec::new();

    if let (Some(years), Some(months)) = (request.years, request.months) {
        warnings.push(format!(
            "Both years ({years}) and months ({months}) supplied; using {months} months"
        ));
    }

    match request.lump_sum_month {
        None if request.lump_sum > Decimal::ZERO => warnings.push(format!(
            "Lump sum of {} has no lump_sum_month and was ignored",
            request.lump_sum
        )),
        Some(month) if request.lump_sum > Decimal::ZERO && month > result.months_taken => {
            warnings.push(format!(
                "Lump sum month {month} is after payoff in month {}; lump sum not applied",
                result.months_taken
            ))
        }
        _ => {}
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    /// 500k home loan at 8.5% over 20 years.
    fn home_loan() -> LoanRequest {
        LoanRequest {
            loan_amount: dec!(500000),
            annual_rate_pct: dec!(8.5),
            months: Some(240),
            ..Default::default()
        }
    }

    /// Same loan with 2k extra every month and a 50k prepayment in month 24.
    fn accelerated_home_loan() -> LoanRequest {
        LoanRequest {
            extra_monthly: dec!(2000),
            lump_sum: dec!(50000),
            lump_sum_month: Some(24),
            ..home_loan()
        }
    }

    fn zero_rate_loan() -> LoanRequest {
        LoanRequest {
            loan_amount: dec!(120000),
            annual_rate_pct: Decimal::ZERO,
            months: Some(12),
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // 1. EMI
    // -----------------------------------------------------------------------
    #[test]
    fn test_emi_zero_rate_is_straight_line() {
        let emi = calculate_emi(dec!(120000), Decimal::ZERO, None, Some(12)).unwrap();
        assert_eq!(emi, dec!(10000));
    }

    #[test]
    fn test_emi_zero_rate_uneven_division() {
        let emi = calculate_emi(dec!(1000), Decimal::ZERO, None, Some(7)).unwrap();
        assert_eq!(emi, dec!(1000) / dec!(7));
    }

    #[test]
    fn test_emi_standard_annuity() {
        let emi = calculate_emi(dec!(100000), dec!(12), None, Some(12)).unwrap();
        assert_eq!(round_money(emi), dec!(8884.88));
    }

    #[test]
    fn test_emi_years_converted_to_months() {
        let by_years = calculate_emi(dec!(500000), dec!(8.5), Some(20), None).unwrap();
        let by_months = calculate_emi(dec!(500000), dec!(8.5), None, Some(240)).unwrap();
        assert_eq!(by_years, by_months);
        assert_eq!(round_money(by_years), dec!(4339.12));
    }

    #[test]
    fn test_emi_months_take_precedence_over_years() {
        let emi = calculate_emi(dec!(120000), Decimal::ZERO, Some(5), Some(12)).unwrap();
        assert_eq!(emi, dec!(10000));
    }

    #[test]
    fn test_emi_missing_term() {
        let result = calculate_emi(dec!(1000), dec!(5), None, None);
        assert!(matches!(result, Err(FinBuddyError::InvalidTerm(_))));
    }

    #[test]
    fn test_emi_zero_months() {
        let result = calculate_emi(dec!(1000), dec!(5), None, Some(0));
        assert!(matches!(result, Err(FinBuddyError::InvalidTerm(_))));
        let result = calculate_emi(dec!(1000), dec!(5), Some(0), None);
        assert!(matches!(result, Err(FinBuddyError::InvalidTerm(_))));
    }

    // -----------------------------------------------------------------------
    // 2. Validation
    // -----------------------------------------------------------------------
    #[test]
    fn test_rejects_non_positive_principal() {
        let req = LoanRequest {
            loan_amount: Decimal::ZERO,
            ..home_loan()
        };
        let err = generate_amortization_schedule(&req).unwrap_err();
        match err {
            FinBuddyError::InvalidInput { field, .. } => assert_eq!(field, "loan_amount"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_negative_rate() {
        let req = LoanRequest {
            annual_rate_pct: dec!(-1),
            ..home_loan()
        };
        assert!(matches!(
            generate_amortization_schedule(&req),
            Err(FinBuddyError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_extra() {
        let req = LoanRequest {
            extra_monthly: dec!(-5),
            ..home_loan()
        };
        assert!(matches!(
            generate_amortization_schedule(&req),
            Err(FinBuddyError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rejects_lump_sum_month_zero() {
        let req = LoanRequest {
            lump_sum: dec!(1000),
            lump_sum_month: Some(0),
            ..home_loan()
        };
        assert!(matches!(
            generate_amortization_schedule(&req),
            Err(FinBuddyError::InvalidLumpSumConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_negative_lump_sum() {
        let req = LoanRequest {
            lump_sum: dec!(-1000),
            lump_sum_month: Some(3),
            ..home_loan()
        };
        assert!(matches!(
            generate_amortization_schedule(&req),
            Err(FinBuddyError::InvalidLumpSumConfiguration(_))
        ));
    }

    // -----------------------------------------------------------------------
    // 3. Plain amortization
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_rate_schedule() {
        let result = generate_amortization_schedule(&zero_rate_loan()).unwrap();

        assert_eq!(result.emi, dec!(10000.00));
        assert_eq!(result.months_taken, 12);
        assert_eq!(result.schedule.len(), 12);
        assert_eq!(result.total_interest, Decimal::ZERO);
        assert_eq!(result.total_payment, dec!(120000));

        for (i, row) in result.schedule.iter().enumerate() {
            assert_eq!(row.month, i as u32 + 1);
            assert_eq!(row.interest, Decimal::ZERO);
            assert_eq!(row.principal, dec!(10000));
            assert_eq!(row.extra_payment, Decimal::ZERO);
        }
        assert_eq!(result.schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_plain_loan_runs_full_term() {
        let result = generate_amortization_schedule(&home_loan()).unwrap();

        assert_eq!(result.emi, dec!(4339.12));
        assert_eq!(result.months_taken, 240);
        assert_eq!(result.schedule.len(), 240);
        assert_eq!(result.schedule.last().unwrap().balance, Decimal::ZERO);
        assert!(
            (result.total_interest - dec!(541387.88)).abs() < dec!(0.05),
            "total interest {}",
            result.total_interest
        );
    }

    #[test]
    fn test_plain_loan_principal_sums_to_loan_amount() {
        let result = generate_amortization_schedule(&home_loan()).unwrap();
        let repaid: Money = result.schedule.iter().map(|r| r.principal).sum();
        assert!(
            (repaid - dec!(500000)).abs() < dec!(1.25),
            "principal repaid {repaid} should be ≈ 500000"
        );
    }

    #[test]
    fn test_short_loan_totals() {
        let req = LoanRequest {
            loan_amount: dec!(100000),
            annual_rate_pct: dec!(12),
            months: Some(12),
            ..Default::default()
        };
        let result = generate_amortization_schedule(&req).unwrap();
        assert_eq!(result.emi, dec!(8884.88));
        assert!((result.total_interest - dec!(6618.55)).abs() < dec!(0.02));
        assert_eq!(
            result.total_payment,
            round_money(result.total_interest + dec!(100000))
        );
    }

    #[test]
    fn test_balance_strictly_decreases() {
        let result = generate_amortization_schedule(&home_loan()).unwrap();
        let mut previous = dec!(500000);
        for row in &result.schedule {
            assert!(
                row.balance < previous,
                "month {}: balance {} not below {}",
                row.month,
                row.balance,
                previous
            );
            previous = row.balance;
        }
    }

    #[test]
    fn test_row_identity_holds() {
        let result = generate_amortization_schedule(&accelerated_home_loan()).unwrap();
        let mut previous = dec!(500000);
        for row in &result.schedule {
            assert!(row.balance >= Decimal::ZERO);
            assert!(
                (previous - row.principal - row.balance).abs() <= dec!(0.03),
                "month {}: {} - {} != {}",
                row.month,
                previous,
                row.principal,
                row.balance
            );
            assert!((row.total_payment - row.interest - row.principal).abs() <= dec!(0.01));
            previous = row.balance;
        }
    }

    // -----------------------------------------------------------------------
    // 4. Acceleration
    // -----------------------------------------------------------------------
    #[test]
    fn test_accelerated_loan_pays_off_early() {
        let baseline = generate_amortization_schedule(&home_loan()).unwrap();
        let result = generate_amortization_schedule(&accelerated_home_loan()).unwrap();

        assert_eq!(result.emi, dec!(4339.12));
        assert!(result.months_taken < 240);
        assert_eq!(result.months_taken, 102);
        assert_eq!(result.schedule.len() as u32, result.months_taken);
        assert!(result.total_interest < baseline.total_interest);
        assert!(
            (result.total_interest - dec!(193485.73)).abs() < dec!(0.05),
            "total interest {}",
            result.total_interest
        );
        assert_eq!(result.schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_lump_sum_applied_in_its_month() {
        let result = generate_amortization_schedule(&accelerated_home_loan()).unwrap();
        assert_eq!(result.schedule[22].extra_payment, dec!(2000));
        assert_eq!(result.schedule[23].extra_payment, dec!(52000));
        assert_eq!(result.schedule[24].extra_payment, dec!(2000));
    }

    #[test]
    fn test_extra_never_lengthens_or_costs_more() {
        let baseline = generate_amortization_schedule(&home_loan()).unwrap();
        for extra in [dec!(1), dec!(250), dec!(1000), dec!(10000)] {
            let req = LoanRequest {
                extra_monthly: extra,
                ..home_loan()
            };
            let result = generate_amortization_schedule(&req).unwrap();
            assert!(result.months_taken <= baseline.months_taken, "extra {extra}");
            assert!(result.total_interest <= baseline.total_interest, "extra {extra}");
        }
    }

    #[test]
    fn test_final_month_never_overpays() {
        let result = generate_amortization_schedule(&accelerated_home_loan()).unwrap();
        let n = result.schedule.len();
        let last = &result.schedule[n - 1];
        let previous_balance = result.schedule[n - 2].balance;

        assert!(
            last.total_payment <= previous_balance + last.interest + dec!(0.01),
            "final payment {} exceeds balance {} + interest {}",
            last.total_payment,
            previous_balance,
            last.interest
        );
        assert_eq!(last.balance, Decimal::ZERO);
    }

    #[test]
    fn test_lump_sum_larger_than_balance_is_trimmed() {
        let req = LoanRequest {
            loan_amount: dec!(10000),
            annual_rate_pct: dec!(6),
            months: Some(24),
            lump_sum: dec!(50000),
            lump_sum_month: Some(3),
            ..Default::default()
        };
        let result = generate_amortization_schedule(&req).unwrap();
        assert_eq!(result.months_taken, 3);

        let last = &result.schedule[2];
        let previous_balance = result.schedule[1].balance;
        assert_eq!(last.balance, Decimal::ZERO);
        assert!(last.extra_payment < dec!(50000));
        assert!((last.principal - previous_balance).abs() <= dec!(0.01));
    }

    #[test]
    fn test_huge_prepayments_clear_loan_in_first_month() {
        let req = LoanRequest {
            loan_amount: dec!(1000),
            annual_rate_pct: dec!(5),
            months: Some(12),
            extra_monthly: Decimal::MAX,
            lump_sum: Decimal::MAX,
            lump_sum_month: Some(1),
            ..Default::default()
        };
        let result = generate_amortization_schedule(&req).unwrap();

        assert_eq!(result.months_taken, 1);
        let row = &result.schedule[0];
        assert_eq!(row.principal, dec!(1000.00));
        assert_eq!(row.balance, Decimal::ZERO);
        assert!(row.extra_payment < dec!(1000));
    }

    #[test]
    fn test_zero_lump_sum_with_month_runs_full_term() {
        // A configured lump-sum month keeps the loan on the accelerated path,
        // so it ends on the zero balance rather than the nominal term check.
        let req = LoanRequest {
            lump_sum_month: Some(300),
            ..home_loan()
        };
        let result = generate_amortization_schedule(&req).unwrap();

        assert!(req.is_accelerated());
        assert_eq!(result.months_taken, 240);
        assert_eq!(result.schedule.len(), 240);
        assert_eq!(result.schedule.last().unwrap().balance, Decimal::ZERO);
        assert!(result.schedule.iter().all(|r| r.extra_payment.is_zero()));

        let out = analyze_loan(&req).unwrap();
        assert!(out.warnings.is_empty(), "warnings: {:?}", out.warnings);
    }

    #[test]
    fn test_lump_sum_without_month_is_ignored() {
        let req = LoanRequest {
            lump_sum: dec!(50000),
            ..home_loan()
        };
        let plain = generate_amortization_schedule(&home_loan()).unwrap();
        let result = generate_amortization_schedule(&req).unwrap();
        assert_eq!(result, plain);
    }

    // -----------------------------------------------------------------------
    // 5. Purity and safety bound
    // -----------------------------------------------------------------------
    #[test]
    fn test_identical_inputs_identical_outputs() {
        let a = generate_amortization_schedule(&accelerated_home_loan()).unwrap();
        let b = generate_amortization_schedule(&accelerated_home_loan()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_negative_amortization_hits_safety_bound() {
        // EMI far below the monthly interest: the balance grows every month.
        let plan = PaymentPlan {
            monthly_rate: dec!(0.01),
            emi: dec!(100),
            extra_monthly: dec!(1),
            lump_sum: None,
        };
        let err = run_schedule(dec!(100000), 12, &plan).unwrap_err();
        match err {
            FinBuddyError::NonConvergence {
                periods,
                remaining_balance,
            } => {
                assert_eq!(periods, 120);
                assert!(remaining_balance > dec!(100000));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overflowing_loan_is_an_error() {
        let req = LoanRequest {
            loan_amount: dec!(70000000000000000000000000000),
            annual_rate_pct: dec!(1200),
            months: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            generate_amortization_schedule(&req),
            Err(FinBuddyError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_tenure_above_maximum_is_rejected() {
        for req in [
            LoanRequest {
                months: Some(u32::MAX),
                ..zero_rate_loan()
            },
            LoanRequest {
                months: None,
                years: Some(101),
                ..zero_rate_loan()
            },
        ] {
            assert!(matches!(
                generate_amortization_schedule(&req),
                Err(FinBuddyError::InvalidTerm(_))
            ));
        }

        let longest = LoanRequest {
            loan_amount: dec!(1200),
            months: Some(MAX_TERM_MONTHS),
            ..zero_rate_loan()
        };
        let result = generate_amortization_schedule(&longest).unwrap();
        assert_eq!(result.months_taken, MAX_TERM_MONTHS);
        assert_eq!(result.emi, dec!(1.00));
    }

    #[test]
    fn test_amortize_month_keeps_state_unrounded() {
        let plan = PaymentPlan {
            monthly_rate: monthly_rate(dec!(8.5)),
            emi: dec!(4339.123456),
            extra_monthly: Decimal::ZERO,
            lump_sum: None,
        };
        let (row, next) = amortize_month(AmortState::opening(dec!(500000)), &plan).unwrap();
        assert_eq!(next.month, 1);
        assert_eq!(row.balance, round_money(next.balance));
        assert!(next.balance.scale() > 2);
    }

    // -----------------------------------------------------------------------
    // 6. Envelope
    // -----------------------------------------------------------------------
    #[test]
    fn test_analyze_loan_warns_on_both_terms() {
        let req = LoanRequest {
            years: Some(30),
            ..home_loan()
        };
        let out = analyze_loan(&req).unwrap();
        assert_eq!(out.result.months, 240);
        assert!(out.warnings.iter().any(|w| w.contains("Both years")));
    }

    #[test]
    fn test_analyze_loan_warns_on_unreachable_lump_sum() {
        let req = LoanRequest {
            lump_sum: dec!(1000),
            lump_sum_month: Some(500),
            ..home_loan()
        };
        let out = analyze_loan(&req).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("after payoff")));
    }

    #[test]
    fn test_analyze_loan_clean_request_has_no_warnings() {
        let out = analyze_loan(&accelerated_home_loan()).unwrap();
        assert!(out.warnings.is_empty(), "warnings: {:?}", out.warnings);
        assert_eq!(out.assumptions["months"], 240);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: LoanRequest = serde_json::from_str(
            r#"{ "loan_amount": "250000", "annual_rate_pct": 7.25, "years": 15 }"#,
        )
        .unwrap();
        assert_eq!(req.loan_amount, dec!(250000));
        assert_eq!(req.annual_rate_pct, dec!(7.25));
        assert_eq!(req.resolve_months().unwrap(), 180);
        assert_eq!(req.extra_monthly, Decimal::ZERO);
        assert!(!req.is_accelerated());
    }
}
