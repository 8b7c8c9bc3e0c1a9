use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::FinBuddyError;
use crate::types::{Money, Rate};
use crate::FinBuddyResult;

/// Growth factor `(1 + rate)^nper`.
///
/// Fails instead of panicking when the factor exceeds the Decimal range,
/// which happens for very high rates combined with very long terms.
pub fn compound_factor(rate: Rate, nper: u32) -> FinBuddyResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| FinBuddyError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: format!("(1 + {rate})^{nper} overflows decimal range"),
        })
}

/// Level payment that fully amortizes `principal` over `nper` periods.
///
/// Straight-line `principal / nper` at a zero rate, otherwise the annuity
/// formula `P · r · (1+r)^n / ((1+r)^n - 1)`. Returned as a positive amount.
pub fn level_payment(rate: Rate, nper: u32, principal: Money) -> FinBuddyResult<Money> {
    if nper == 0 {
        return Err(FinBuddyError::InvalidTerm(
            "Number of periods must be > 0".into(),
        ));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(FinBuddyError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    // Dividing first keeps the intermediate within range: factor / (factor - 1)
    // is close to 1 for long terms.
    factor
        .checked_div(denominator)
        .and_then(|f| f.checked_mul(rate))
        .and_then(|f| f.checked_mul(principal))
        .ok_or_else(|| FinBuddyError::InvalidInput {
            field: "loan_amount".into(),
            reason: format!("level payment on {principal} overflows decimal range"),
        })
}
