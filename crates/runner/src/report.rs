//! Utility reporters

use std::collections::BTreeMap;

use agora_core::PublicId;
use agora_ports::{UtilityReporter, UtilityTable};

/// Writes the final utility table to the log, best agent first
#[derive(Debug, Default)]
pub struct LogReporter;

impl LogReporter {
    pub fn new() -> Self {
        Self
    }
}

/// Rows ordered by descending utility, ties by public id
fn ranked(utilities: &UtilityTable) -> Vec<(PublicId, rust_decimal::Decimal)> {
    let mut rows: Vec<_> = utilities.iter().map(|(a, u)| (*a, *u)).collect();
    rows.sort_by(|(a, x), (b, y)| y.cmp(x).then(a.cmp(b)));
    rows
}

impl UtilityReporter for LogReporter {
    fn report(&self, utilities: &UtilityTable, names: &BTreeMap<PublicId, String>) {
        log::info!("Final utility ({} agents)", utilities.len());
        for (agent, utility) in ranked(utilities) {
            let name = names.get(&agent).map(String::as_str).unwrap_or("-");
            log::info!("  {:<10} {:<20} {}", agent.to_string(), name, utility);
        }
    }
}

/// Writes the final utility table as one JSON line on stdout
#[derive(Debug, Default)]
pub struct JsonReporter;

impl UtilityReporter for JsonReporter {
    fn report(&self, utilities: &UtilityTable, names: &BTreeMap<PublicId, String>) {
        let rows: Vec<_> = ranked(utilities)
            .into_iter()
            .map(|(agent, utility)| {
                serde_json::json!({
                    "agent": agent.0,
                    "name": names.get(&agent),
                    "utility": utility,
                })
            })
            .collect();
        match serde_json::to_string(&rows) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("Failed to encode utility report: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ranked_orders_by_utility() {
        let table = UtilityTable::from([
            (PublicId(0), dec!(-12)),
            (PublicId(1), dec!(3)),
            (PublicId(2), dec!(3)),
        ]);
        let rows = ranked(&table);
        assert_eq!(
            rows.iter().map(|(a, _)| a.0).collect::<Vec<_>>(),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn test_reporters_accept_unnamed_agents() {
        let table = UtilityTable::from([(PublicId(0), dec!(1.5))]);
        let names = BTreeMap::new();
        LogReporter::new().report(&table, &names);
        JsonReporter.report(&table, &names);
    }
}
