//! Agora Accounting
//!
//! Bookkeeping for a simulation run:
//! 1. Accounts (money and goods per agent, reset between runs)
//! 2. Endowments granted at run start
//! 3. Private valuations sampled once per run
//! 4. Utility accumulated across runs and handed to a reporter

mod accounts;
mod endowment;
mod error;
mod utility;
mod valuation;

pub use accounts::AccountManager;
pub use endowment::{EndowmentConfig, EndowmentManager};
pub use error::{AccountingError, Result};
pub use utility::UtilityManager;
pub use valuation::{UniformValuation, ValuationManager};
