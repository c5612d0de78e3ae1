//! Pure ladder planner: `(profile, position, own orders, fair_value) ->
//! (desired_yes_ladder, desired_no_ladder)`.
//!
//! No I/O. Determinism here is what lets the reconciler find exact
//! equality against a previously-placed ladder: everything is integer
//! cents, truncated, never rounded.

use std::collections::BTreeMap;

use common::{DenseBook, MarketProfile, Position};

/// price (1..=99) -> quantity, ordered for deterministic reconciliation
/// and logging.
pub type Ladder = BTreeMap<u8, u32>;

/// Derive the desired yes/no ladders for one market at the current
/// `fair_value`.
pub fn plan(
    profile: &MarketProfile,
    position: Option<Position>,
    own_yes: &DenseBook,
    own_no: &DenseBook,
    fair_value: u8,
) -> (Ladder, Ladder) {
    let holds_yes = position.map(|p| p.position > 0).unwrap_or(false);
    let exposure_cents = position.map(|p| p.position_cost).unwrap_or(0);

    let yes_order_exposure: i64 = own_yes
        .nonzero_levels()
        .map(|(p, q)| p as i64 * q as i64)
        .sum();
    let no_order_exposure: i64 = own_no
        .nonzero_levels()
        .map(|(p, q)| p as i64 * q as i64)
        .sum();

    let desired_yes = plan_yes_side(profile, holds_yes, exposure_cents, yes_order_exposure, fair_value);
    let desired_no = plan_no_side(profile, holds_yes, exposure_cents, no_order_exposure, fair_value);
    (desired_yes, desired_no)
}

fn plan_yes_side(
    profile: &MarketProfile,
    holds_yes: bool,
    exposure_cents: i64,
    yes_order_exposure: i64,
    fair_value: u8,
) -> Ladder {
    let mut ladder = Ladder::new();
    let cumulative_yes_exposure = if holds_yes { exposure_cents } else { -exposure_cents }
        + yes_order_exposure;

    let per_level_qty =
        profile.instant_liquidity_cents as i64 / profile.depth as i64 / fair_value as i64;
    let top_yes = fair_value as i64 - (profile.spread as i64 - 1) / 2;

    for i in 0..profile.depth as i64 {
        let p = top_yes - i;
        if p < 1 {
            break;
        }
        if let Some(max_yes) = profile.max_yes_price {
            if p > max_yes as i64 {
                break;
            }
        }
        if let Some(min_yes) = profile.min_yes_price {
            if p < min_yes as i64 {
                break;
            }
        }
        if p * per_level_qty + cumulative_yes_exposure > profile.max_exposure_cents as i64 {
            break;
        }
        ladder.insert(p as u8, per_level_qty as u32);
    }
    ladder
}

fn plan_no_side(
    profile: &MarketProfile,
    holds_yes: bool,
    exposure_cents: i64,
    no_order_exposure: i64,
    fair_value: u8,
) -> Ladder {
    let mut ladder = Ladder::new();
    let no_fair = 100 - fair_value as i64;
    let cumulative_no_exposure = if holds_yes { -exposure_cents } else { exposure_cents }
        + no_order_exposure;

    let per_level_no = profile.instant_liquidity_cents as i64 / profile.depth as i64 / no_fair;
    let top_no = no_fair - (profile.spread as i64 - 1) / 2;

    for i in 0..profile.depth as i64 {
        let p = top_no - i;
        if p < 1 {
            break;
        }
        let equivalent_yes_price = 100 - p;
        if let Some(max_yes) = profile.max_yes_price {
            if equivalent_yes_price > max_yes as i64 {
                break;
            }
        }
        if let Some(min_yes) = profile.min_yes_price {
            if equivalent_yes_price < min_yes as i64 {
                break;
            }
        }
        if p * per_level_no + cumulative_no_exposure > profile.max_exposure_cents as i64 {
            break;
        }
        ladder.insert(p as u8, per_level_no as u32);
    }
    ladder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_profile() -> MarketProfile {
        MarketProfile {
            market_ticker: "ABC".into(),
            instant_liquidity_cents: 10000,
            max_exposure_cents: 50000,
            price_stickyness: 10,
            spread: 5,
            depth: 3,
            max_spread: None,
            max_yes_price: None,
            min_yes_price: None,
            snipe_timeout_seconds: None,
            clear_time: None,
        }
    }

    // S1 - fresh seed.
    #[test]
    fn fresh_seed_matches_expected_symmetric_ladder() {
        let profile = base_profile();
        let (yes, no) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 50);

        let expected: Ladder = [(48, 66), (47, 66), (46, 66)].into_iter().collect();
        assert_eq!(yes, expected);
        assert_eq!(no, expected);
    }

    // S2 - inventory damping: fair_value already adjusted to 47 by the
    // controller; the planner just re-derives the ladder at that price.
    #[test]
    fn recomputes_around_adjusted_fair_value() {
        let profile = base_profile();
        let position = Position {
            position: 30,
            position_cost: 1500,
        };
        let (yes, _no) = plan(
            &profile,
            Some(position),
            &DenseBook::empty(),
            &DenseBook::empty(),
            47,
        );
        // top_yes = 47 - 2 = 45
        assert_eq!(yes.keys().copied().max(), Some(45));
    }

    #[test]
    fn spread_one_means_top_price_equals_fair_value() {
        let mut profile = base_profile();
        profile.spread = 1;
        profile.depth = 1;
        let (yes, no) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 50);
        assert_eq!(yes.keys().copied().collect::<Vec<_>>(), vec![50]);
        assert_eq!(no.keys().copied().collect::<Vec<_>>(), vec![50]);
    }

    #[test]
    fn depth_one_produces_at_most_one_level_per_side() {
        let mut profile = base_profile();
        profile.depth = 1;
        let (yes, no) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 50);
        assert!(yes.len() <= 1);
        assert!(no.len() <= 1);
    }

    #[test]
    fn empty_position_table_means_zero_exposure_and_not_holding_yes() {
        let profile = base_profile();
        // With no position, symmetric ladders are produced either side of
        // 50 cents regardless of which branch of `holds_yes` fires.
        let (yes, no) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 50);
        assert_eq!(yes, no);
    }

    #[test]
    fn extreme_fair_value_does_not_divide_by_zero() {
        let profile = base_profile();
        // no_fair = 100 - 99 = 1, fair_value = 99: both divisions are by
        // nonzero values.
        let (_yes, no) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 99);
        assert!(no.keys().all(|&p| (1..=99).contains(&p)));

        let (yes, _no) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 1);
        assert!(yes.keys().all(|&p| (1..=99).contains(&p)));
    }

    #[test]
    fn max_exposure_cap_is_respected() {
        let mut profile = base_profile();
        profile.max_exposure_cents = 100;
        profile.instant_liquidity_cents = 10000;
        let (yes, _) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 50);
        for (p, q) in yes.iter() {
            assert!(*p as u32 * q <= profile.max_exposure_cents);
        }
    }

    #[test]
    fn respects_min_and_max_yes_price_clamps() {
        let mut profile = base_profile();
        profile.max_yes_price = Some(48);
        profile.min_yes_price = Some(47);
        let (yes, _) = plan(&profile, None, &DenseBook::empty(), &DenseBook::empty(), 50);
        for p in yes.keys() {
            assert!(*p <= 48 && *p >= 47);
        }
    }
}
