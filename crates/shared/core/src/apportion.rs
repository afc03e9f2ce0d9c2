//! Exact division of a money amount
//!
//! Shares are floored to [`SETTLEMENT_SCALE`] decimal places and the leftover
//! units are handed out by largest remainder (ties to the smaller key), so the
//! shares always add up to the total exactly and the result does not depend on
//! input order.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::values::Money;

/// Decimal places kept in settlement amounts
pub const SETTLEMENT_SCALE: u32 = 8;

/// Split `total` proportionally to `weights`.
///
/// Returns the shares in the same order as `weights`. Zero or negative total
/// weight yields all-zero shares.
pub fn apportion<K: Ord + Copy>(total: Money, weights: &[(K, Decimal)]) -> Vec<(K, Money)> {
    let weight_sum: Decimal = weights.iter().map(|(_, w)| *w).sum();
    if weights.is_empty() || weight_sum <= Decimal::ZERO {
        return weights.iter().map(|(k, _)| (*k, Decimal::ZERO)).collect();
    }

    let mut shares: Vec<(K, Money, Decimal)> = weights
        .iter()
        .map(|(key, weight)| {
            let raw = total * *weight / weight_sum;
            let floored =
                raw.round_dp_with_strategy(SETTLEMENT_SCALE, RoundingStrategy::ToNegativeInfinity);
            (*key, floored, raw - floored)
        })
        .collect();

    let unit = Decimal::new(1, SETTLEMENT_SCALE);
    let assigned: Money = shares.iter().map(|(_, s, _)| *s).sum();
    let residual = total - assigned;
    let units = (residual / unit).floor().to_i64().unwrap_or(0).max(0) as usize;

    let mut ranking: Vec<usize> = (0..shares.len()).collect();
    ranking.sort_by(|&a, &b| {
        shares[b]
            .2
            .cmp(&shares[a].2)
            .then_with(|| shares[a].0.cmp(&shares[b].0))
    });

    for i in 0..units {
        let idx = ranking[i % ranking.len()];
        shares[idx].1 += unit;
    }

    // sub-unit dust when `total` itself is finer than the settlement scale
    let dust = total - shares.iter().map(|(_, s, _)| *s).sum::<Money>();
    if !dust.is_zero() {
        shares[ranking[0]].1 += dust;
    }

    shares.into_iter().map(|(k, s, _)| (k, s)).collect()
}

/// Split `total` into `count` equal shares keyed by position
pub fn split_evenly(total: Money, count: usize) -> Vec<Money> {
    let weights: Vec<(usize, Decimal)> = (0..count).map(|i| (i, Decimal::ONE)).collect();
    apportion(total, &weights)
        .into_iter()
        .map(|(_, s)| s)
        .collect()
}
