//! Agora Market Rules
//!
//! Implementations of the pluggable market rules (allocation, payment,
//! activity, query, termination, information revelation) and the
//! [`Mechanism`] registry that assembles them into a [`MarketRules`] bundle.

mod activity;
mod call_market;
mod cost_sharing;
mod query;
mod revelation;
mod sealed_bid;
mod termination;

pub use activity::{OneShotActivity, OpenActivity};
pub use call_market::{PriceTimeClearing, UniformPriceSettlement};
pub use cost_sharing::{CircularCostSharing, EqualCostSharing};
pub use query::MarketQuery;
pub use revelation::{AnonymizedLedger, FullLedger, OwnTradesOnly};
pub use sealed_bid::{Pricing, SealedBidAllocation, SealedBidPayment};
pub use termination::{AnyOf, Quiescence, TickBudget};

// Re-export the traits from ports for convenience
pub use agora_ports::{
    ActivityRule, AllocationRule, InformationRevelationPolicy, MarketRules, PaymentRule,
    QueryRule, TerminationCondition,
};

use agora_core::{BundleKind, MechanismType, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What agents may see of market outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Revelation {
    #[default]
    OwnTrades,
    Anonymized,
    Full,
}

impl Revelation {
    fn policy(&self) -> Box<dyn InformationRevelationPolicy> {
        match self {
            Revelation::OwnTrades => Box::new(OwnTradesOnly),
            Revelation::Anonymized => Box::new(AnonymizedLedger),
            Revelation::Full => Box::new(FullLedger),
        }
    }
}

/// Configurable market mechanism
///
/// `rounds` counts bidding rounds. A market ticks once when opened (nothing
/// to clear yet) and once after every round, so its tick budget is
/// `rounds + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Mechanism {
    CostSharing {
        slots: u32,
        total_cost: Money,
        rounds: u64,
        #[serde(default)]
        information: Revelation,
    },
    CallMarket {
        rounds: u64,
        /// Close early after a round in which nobody bid
        #[serde(default)]
        close_when_quiet: bool,
        #[serde(default)]
        information: Revelation,
    },
    SealedBid {
        pricing: Pricing,
        #[serde(default)]
        information: Revelation,
    },
}

impl Mechanism {
    /// Twelve slots sharing a cost of 24 over one round
    pub fn lemonade() -> Self {
        Mechanism::CostSharing {
            slots: 12,
            total_cost: Decimal::from(24),
            rounds: 1,
            information: Revelation::OwnTrades,
        }
    }

    pub fn mechanism_type(&self) -> MechanismType {
        match self {
            Mechanism::CostSharing { .. } => MechanismType::CostSharing,
            Mechanism::CallMarket { .. } => MechanismType::CallMarket,
            Mechanism::SealedBid { .. } => MechanismType::SealedBid,
        }
    }

    pub fn bundle_kind(&self) -> BundleKind {
        match self {
            Mechanism::CostSharing { .. } => BundleKind::Position,
            Mechanism::CallMarket { .. } => BundleKind::TwoSided,
            Mechanism::SealedBid { .. } => BundleKind::Sealed,
        }
    }

    /// Build a fresh rule set for one market
    pub fn rules(&self) -> MarketRules {
        let query = Box::new(MarketQuery::new(self.mechanism_type()));
        let kind = self.bundle_kind();

        match self {
            Mechanism::CostSharing {
                slots,
                total_cost,
                rounds,
                information,
            } => MarketRules::new(
                Box::new(CircularCostSharing::new(*slots)),
                Box::new(EqualCostSharing::new(*slots, *total_cost)),
                query,
                Box::new(OneShotActivity::new(kind)),
                information.policy(),
                Box::new(TickBudget::new(rounds + 1)),
            ),
            Mechanism::CallMarket {
                rounds,
                close_when_quiet,
                information,
            } => {
                let budget: Box<dyn TerminationCondition> = Box::new(TickBudget::new(rounds + 1));
                let termination: Box<dyn TerminationCondition> = if *close_when_quiet {
                    let quiet: Box<dyn TerminationCondition> = Box::new(Quiescence::new(2));
                    Box::new(AnyOf::new(vec![budget, quiet]))
                } else {
                    budget
                };
                MarketRules::new(
                    Box::new(PriceTimeClearing::new()),
                    Box::new(UniformPriceSettlement::new()),
                    query,
                    Box::new(OpenActivity::new(kind)),
                    information.policy(),
                    termination,
                )
            }
            Mechanism::SealedBid {
                pricing,
                information,
            } => MarketRules::new(
                Box::new(SealedBidAllocation::new()),
                Box::new(SealedBidPayment::new(*pricing)),
                query,
                Box::new(OneShotActivity::new(kind)),
                information.policy(),
                Box::new(TickBudget::new(2)),
            ),
        }
    }
}

/// Factory function to create mechanisms with default parameters by name
pub fn create_mechanism(name: &str) -> Option<Mechanism> {
    match name.to_lowercase().as_str() {
        "lemonade" | "cost-sharing" => Some(Mechanism::lemonade()),
        "call-market" | "call" => Some(Mechanism::CallMarket {
            rounds: 3,
            close_when_quiet: false,
            information: Revelation::Anonymized,
        }),
        "first-price" => Some(Mechanism::SealedBid {
            pricing: Pricing::FirstPrice,
            information: Revelation::OwnTrades,
        }),
        "second-price" | "vickrey" => Some(Mechanism::SealedBid {
            pricing: Pricing::SecondPrice,
            information: Revelation::OwnTrades,
        }),
        _ => None,
    }
}
