//! Accounting errors

use agora_core::PublicId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountingError {
    #[error("No account for {0}")]
    UnknownAccount(PublicId),

    #[error("Invalid valuation range: low={low}, high={high}")]
    InvalidRange { low: String, high: String },
}

pub type Result<T> = std::result::Result<T, AccountingError>;
