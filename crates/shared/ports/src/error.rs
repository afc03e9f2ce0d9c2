use agora_core::{Money, Party, Price, PublicId, Quantity};
use thiserror::Error;

/// Domain-level errors raised by market rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MechanismError {
    #[error("Net settlement position of {0} overflowed")]
    NetOverflow(Party),

    #[error("Negative settlement cost {cost} from {from} to {to}")]
    NegativeCost { from: Party, to: Party, cost: Money },

    #[error("Settlement order from {0} to itself")]
    SelfSettlement(Party),

    #[error("Settlement order names an anonymous party")]
    AnonymousParty,

    #[error("Settlement total {actual} does not match budget {expected}")]
    BudgetMismatch { expected: Money, actual: Money },

    #[error("Settlement cost overflowed: {price} x {quantity}")]
    Overflow { price: Price, quantity: Quantity },

    #[error("Malformed bid from {agent}: {reason}")]
    MalformedBid { agent: PublicId, reason: String },
}

pub type MechanismResult<T> = std::result::Result<T, MechanismError>;
