use agora_core::{Party, PublicId, Transaction};
use agora_ports::InformationRevelationPolicy;

/// Agents see only the transactions they took part in
pub struct OwnTradesOnly;

impl InformationRevelationPolicy for OwnTradesOnly {
    fn sanitize(&self, transactions: &[Transaction], agent: PublicId) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| t.involves(agent))
            .cloned()
            .collect()
    }

    fn name(&self) -> &str {
        "Own Trades Only"
    }
}

/// Agents see every transaction, with other agents' identities hidden
pub struct AnonymizedLedger;

impl AnonymizedLedger {
    fn mask(party: Party, agent: PublicId) -> Party {
        match party {
            Party::Agent(id) if id != agent => Party::Anonymous,
            other => other,
        }
    }
}

impl InformationRevelationPolicy for AnonymizedLedger {
    fn sanitize(&self, transactions: &[Transaction], agent: PublicId) -> Vec<Transaction> {
        transactions
            .iter()
            .map(|t| {
                let mut masked = t.clone();
                masked.seller = Self::mask(t.seller, agent);
                masked.buyer = Self::mask(t.buyer, agent);
                masked
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Anonymized Ledger"
    }
}

/// Agents see the whole ledger
pub struct FullLedger;

impl InformationRevelationPolicy for FullLedger {
    fn sanitize(&self, transactions: &[Transaction], _agent: PublicId) -> Vec<Transaction> {
        transactions.to_vec()
    }

    fn name(&self) -> &str {
        "Full Ledger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{MarketId, TradeableId};
    use rust_decimal_macros::dec;

    fn ledger() -> Vec<Transaction> {
        let trade = |seller, buyer| {
            Transaction::new(
                MarketId(0),
                1,
                Party::Agent(PublicId(seller)),
                Party::Agent(PublicId(buyer)),
                TradeableId(0),
                dec!(1),
                dec!(10),
            )
        };
        vec![trade(1, 2), trade(3, 4), trade(2, 3)]
    }

    #[test]
    fn test_own_trades_only() {
        let visible = OwnTradesOnly.sanitize(&ledger(), PublicId(2));
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|t| t.involves(PublicId(2))));
    }

    #[test]
    fn test_anonymized_keeps_own_identity() {
        let visible = AnonymizedLedger.sanitize(&ledger(), PublicId(2));
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[0].seller, Party::Anonymous);
        assert_eq!(visible[0].buyer, Party::Agent(PublicId(2)));
        assert_eq!(visible[1].seller, Party::Anonymous);
        assert_eq!(visible[1].buyer, Party::Anonymous);
    }

    #[test]
    fn test_full_ledger() {
        let ledger = ledger();
        assert_eq!(FullLedger.sanitize(&ledger, PublicId(9)), ledger);
    }
}
