//! Reconciler: diffs a desired ladder against the maker's resting orders
//! and emits a minimal `(cancel-set, place-set)`.
//!
//! Cancels are computed first and returned first. Callers must apply
//! them before placing, to free exposure budget on the exchange side
//! (see `MarketController::tick`).

use std::collections::{BTreeMap, BTreeSet};

use common::{Order, RestingOrder, Side};

use crate::planner::Ladder;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub cancels: Vec<String>,
    pub places: Vec<Order>,
}

/// `market_id` and `expiration_unix_ts` are stamped onto every emitted
/// `Order`; `own_orders` is the raw resting-orders table for both sides
/// (order ids are not recoverable from a `DenseBook` alone).
pub fn reconcile(
    market_id: &str,
    desired_yes: &Ladder,
    desired_no: &Ladder,
    own_orders: &[RestingOrder],
    expiration_unix_ts: i64,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    let (yes_cancels, yes_places) = reconcile_side(
        desired_yes,
        &resting_by_price(own_orders, true),
        market_id,
        Side::Yes,
        expiration_unix_ts,
    );
    let (no_cancels, no_places) = reconcile_side(
        desired_no,
        &resting_by_price(own_orders, false),
        market_id,
        Side::No,
        expiration_unix_ts,
    );

    plan.cancels.extend(yes_cancels);
    plan.cancels.extend(no_cancels);
    plan.places.extend(yes_places);
    plan.places.extend(no_places);
    plan
}

/// price -> (total resting quantity, order ids resting at that price), for
/// one side.
fn resting_by_price(own_orders: &[RestingOrder], is_yes: bool) -> BTreeMap<u8, (u32, Vec<String>)> {
    let mut by_price: BTreeMap<u8, (u32, Vec<String>)> = BTreeMap::new();
    for order in own_orders.iter().filter(|o| o.is_yes == is_yes) {
        let entry = by_price.entry(order.price).or_default();
        entry.0 += order.remaining_count;
        entry.1.push(order.order_id.clone());
    }
    by_price
}

fn reconcile_side(
    desired: &Ladder,
    resting: &BTreeMap<u8, (u32, Vec<String>)>,
    market_id: &str,
    side: Side,
    expiration_unix_ts: i64,
) -> (Vec<String>, Vec<Order>) {
    let mut cancels = Vec::new();
    let mut consistent = BTreeSet::new();

    for (&price, (current_resting, order_ids)) in resting.iter() {
        if *current_resting == 0 {
            continue;
        }
        match desired.get(&price) {
            Some(&qty) if qty == *current_resting => {
                consistent.insert(price);
            }
            _ => cancels.extend(order_ids.iter().cloned()),
        }
    }

    let places = desired
        .iter()
        .filter(|(price, _)| !consistent.contains(price))
        .map(|(&price, &count)| Order {
            market_id: market_id.to_string(),
            side,
            price,
            count,
            expiration_unix_ts,
            sell_position_capped: false,
        })
        .collect();

    (cancels, places)
}
