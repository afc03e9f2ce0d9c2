//! Agora Market
//!
//! Market state machine, the manager that owns a run's markets, and the
//! settlement verification every tick passes before it is committed.

pub mod error;
pub mod manager;
pub mod market;
pub mod settlement;

// Re-export main types for convenience
pub use error::{MarketError, Result};
pub use manager::{MarketBlock, MarketManager, MarketTemplate};
pub use market::{Market, MarketPhase};
pub use settlement::verify_zero_sum;
