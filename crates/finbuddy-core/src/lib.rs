pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "loan")]
pub mod loan;

pub use error::FinBuddyError;
pub use types::*;

/// Standard result type for all finbuddy operations
pub type FinBuddyResult<T> = Result<T, FinBuddyError>;
