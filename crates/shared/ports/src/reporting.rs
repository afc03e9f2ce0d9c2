use agora_core::{Money, PublicId};
use std::collections::BTreeMap;

/// Accumulated utility per agent over an experiment
pub type UtilityTable = BTreeMap<PublicId, Money>;

/// Destination for the final utility table (files, databases, dashboards)
pub trait UtilityReporter: Send + Sync {
    fn report(&self, utilities: &UtilityTable, names: &BTreeMap<PublicId, String>);
}
