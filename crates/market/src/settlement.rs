//! Settlement verification
//!
//! Every tick's orders are checked before anything reaches a ledger or an
//! account. A failure here is fatal for the tick.

use std::collections::BTreeMap;

use agora_core::{Money, Order, Party};
use agora_ports::{MechanismError, MechanismResult};
use rust_decimal::Decimal;

/// Check that a tick's orders are internally consistent
///
/// Each order debits `from` and credits `to` by the same cost, so the net
/// positions always sum to zero once they can be computed. What is checked:
/// - every cost is non-negative
/// - no order settles a party with itself or names an anonymous party
/// - every party's net position fits in `Money`
/// - when `budget` is set, agents are charged exactly that much in total
pub fn verify_zero_sum(orders: &[Order], budget: Option<Money>) -> MechanismResult<()> {
    let mut nets: BTreeMap<Party, Money> = BTreeMap::new();

    for order in orders {
        if order.cost < Decimal::ZERO {
            return Err(MechanismError::NegativeCost {
                from: order.from,
                to: order.to,
                cost: order.cost,
            });
        }
        if order.from == order.to {
            return Err(MechanismError::SelfSettlement(order.from));
        }
        if order.from == Party::Anonymous || order.to == Party::Anonymous {
            return Err(MechanismError::AnonymousParty);
        }

        let from = nets.entry(order.from).or_insert(Decimal::ZERO);
        *from = from
            .checked_sub(order.cost)
            .ok_or(MechanismError::NetOverflow(order.from))?;
        let to = nets.entry(order.to).or_insert(Decimal::ZERO);
        *to = to
            .checked_add(order.cost)
            .ok_or(MechanismError::NetOverflow(order.to))?;
    }

    if let Some(expected) = budget {
        let agent_total = nets
            .iter()
            .filter(|(party, _)| matches!(party, Party::Agent(_)))
            .try_fold(Decimal::ZERO, |total, (party, net)| {
                total
                    .checked_sub(*net)
                    .ok_or(MechanismError::NetOverflow(*party))
            })?;
        if agent_total != expected {
            return Err(MechanismError::BudgetMismatch {
                expected,
                actual: agent_total,
            });
        }
    }

    Ok(())
}
