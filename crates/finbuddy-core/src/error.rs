use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinBuddyError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    #[error("Invalid lump sum configuration: {0}")]
    InvalidLumpSumConfiguration(String),

    #[error("Non-convergence: loan not repaid after {periods} periods (remaining balance: {remaining_balance})")]
    NonConvergence {
        periods: u32,
        remaining_balance: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinBuddyError {
    fn from(e: serde_json::Error) -> Self {
        FinBuddyError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "export")]
impl From<csv::Error> for FinBuddyError {
    fn from(e: csv::Error) -> Self {
        FinBuddyError::Csv(e.to_string())
    }
}
