//! Agora Core Domain
//!
//! Pure domain types for the Agora market simulation platform.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod apportion;
pub mod entities;
pub mod messages;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Accounting
    Account,
    AccountUpdate,
    // Market state
    Allocation,
    // Bids
    BidBundle,
    BundleKind,
    MAX_BID_AMOUNT,
    Endowment,
    Fill,
    // Valuations
    GeneralValuation,
    Ledger,
    MarketRecord,
    MarketState,
    // Settlement
    Order,
    Party,
    Side,
    SpecificValuation,
    TradeMessage,
    Tradeable,
    Transaction,
    TransactionId,
};
pub use messages::{
    BankUpdateMessage, InformationMessage, MechanismType, Message, RegistrationMessage,
    SimulationReportMessage, TradeRequestMessage, ValuationMessage,
};
pub use values::{
    MarketId, Money, Price, PrivateId, PublicId, Quantity, StepId, Timestamp, TradeableId,
};
