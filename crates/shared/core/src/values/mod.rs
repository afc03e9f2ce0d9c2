use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Monetary amount - uses Decimal so settlement never touches floating point
pub type Money = Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - uses Decimal for precision (fractional goods allowed)
pub type Quantity = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Connection-assigned agent identifier.
///
/// Never leaves the coordinator: reports and market state only carry
/// [`PublicId`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrivateId(pub Uuid);

impl PrivateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrivateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrivateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anonymized agent identifier, dense and sequential from 0 in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicId(pub u32);

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// Market identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub u32);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "market-{}", self.0)
    }
}

/// Identifier of a tradeable good (or a resource slot in congestion games)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeableId(pub u32);

impl fmt::Display for TradeableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Protocol step counter used to tag barrier rounds
pub type StepId = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_ids_are_unique() {
        assert_ne!(PrivateId::new(), PrivateId::new());
    }

    #[test]
    fn test_public_id_ordering() {
        assert!(PublicId(0) < PublicId(1));
        assert_eq!(PublicId(3).to_string(), "agent-3");
    }
}
