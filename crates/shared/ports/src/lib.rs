//! Agora Ports
//!
//! Port definitions (traits) for the Agora market simulation platform.
//! These define the boundaries between the coordination engine and the
//! pluggable mechanism rules and external collaborators.

mod error;
mod reporting;
mod rules;
mod valuation;

pub use error::{MechanismError, MechanismResult};
pub use reporting::{UtilityReporter, UtilityTable};
pub use rules::{
    ActivityRule, AllocationRule, InformationRevelationPolicy, MarketRules, PaymentRule,
    QueryRule, TerminationCondition,
};
pub use valuation::ValuationDistribution;
