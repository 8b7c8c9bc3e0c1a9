//! Monthly loan amortization: EMI, schedules with extra and lump-sum
//! payments, side-by-side comparison and CSV export.

pub mod amortization;
pub mod comparison;

#[cfg(feature = "export")]
pub mod export;
