//! Market controller: owns per-market state and runs one tick of the
//! quoting loop for a single market.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{orderbook, Error, ExchangeClient, MarketProfile, PerMarketState, Position};
use tracing::{debug, error, info, warn};

use crate::{planner, reconciler};

/// What happened on a tick. Carries no control-flow meaning beyond "is
/// this market still active" - used for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Retired,
    CooldownSkip,
    QuiescentSkip,
    SpreadSkip,
    Sniped,
    Quoted { cancelled: usize, placed: usize },
}

/// Owns one `PerMarketState` row per market_id, lazily initialised on
/// first tick.
#[derive(Debug, Default)]
pub struct MarketController {
    states: HashMap<String, PerMarketState>,
}

impl MarketController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the state row for a retired market. The scheduler calls this
    /// after removing the market from the active set.
    pub fn retire(&mut self, market_id: &str) {
        self.states.remove(market_id);
    }

    pub async fn tick(
        &mut self,
        market_id: &str,
        profile: &MarketProfile,
        now: DateTime<Utc>,
        positions: &HashMap<String, Position>,
        client: &mut ExchangeClient,
    ) -> Result<TickOutcome, Error> {
        let details = client.get_market(market_id).await?;

        if let Some(clear_time) = profile.clear_time {
            if now > clear_time {
                cancel_everything(market_id, client).await?;
                info!("Clearing: {} (passed clear time)", market_id);
                return Ok(TickOutcome::Retired);
            }
        }
        if details.status != "active" {
            cancel_everything(market_id, client).await?;
            info!("Stopping: {} (closed)", market_id);
            return Ok(TickOutcome::Retired);
        }

        let state = self.states.entry(market_id.to_string()).or_default();

        if let (Some(last_snipe), Some(timeout_secs)) =
            (state.last_snipe_at, profile.snipe_timeout_seconds)
        {
            if now - last_snipe < chrono::Duration::seconds(timeout_secs) {
                return Ok(TickOutcome::CooldownSkip);
            }
        }

        if details.volume == 0 {
            return Ok(TickOutcome::QuiescentSkip);
        }

        let spread_size = details.yes_ask as i64 - details.yes_bid as i64;
        let mid = details.yes_bid as i64 + spread_size / 2;

        if let Some(max_spread) = profile.max_spread {
            if spread_size > max_spread as i64 {
                return Ok(TickOutcome::SpreadSkip);
            }
        }

        if let Some(fair_value) = state.fair_value {
            if (fair_value as i64 - mid).abs() > spread_size / 2 {
                state.fair_value = None;
                state.last_position = 0;
                state.last_snipe_at = Some(now);
                return Ok(TickOutcome::Sniped);
            }
        }

        let current_position = positions.get(market_id).map(|p| p.position).unwrap_or(0);

        if state.fair_value.is_none() {
            state.fair_value = Some(mid as u8);
            state.last_position = current_position;
        }

        let delta_pos = current_position - state.last_position;
        let delta_fv = -(delta_pos / profile.price_stickyness as i64);
        let new_fair_value = state.fair_value.expect("seeded above") as i64 + delta_fv;
        if !(1..=99).contains(&new_fair_value) {
            return Err(Error::invariant(format!(
                "fair_value {new_fair_value} out of range for {market_id}"
            )));
        }
        state.fair_value = Some(new_fair_value as u8);
        // `-delta_fv * price_stickyness` is the amount of inventory actually
        // consumed by this adjustment; the remainder stays "owed" to the
        // next tick, preserving the modular invariant in `PerMarketState`.
        state.last_position -= delta_fv * profile.price_stickyness as i64;
        let fair_value = new_fair_value as u8;

        let own_orders = client.list_resting_orders(market_id).await?;
        let (own_yes, own_no) = orderbook::own_books_from_orders(&own_orders);
        let position = positions.get(market_id).copied();
        let (desired_yes, desired_no) = planner::plan(profile, position, &own_yes, &own_no, fair_value);

        let expiration_unix_ts = profile.clear_time.map(|t| t.timestamp()).unwrap_or(0);
        let plan = reconciler::reconcile(
            market_id,
            &desired_yes,
            &desired_no,
            &own_orders,
            expiration_unix_ts,
        );

        if !plan.cancels.is_empty() {
            if let Err(err) = client.cancel_orders(&plan.cancels).await {
                warn!("cancel failed in {market_id}, retrying once: {err}");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                client.cancel_orders(&plan.cancels).await?;
            }
        }

        let placed = if plan.places.is_empty() {
            0
        } else {
            match client.place_orders(&plan.places).await {
                Ok(rows) => rows.len(),
                Err(err) => {
                    error!("Failed to place orders in {}: {}", market_id, err);
                    0
                }
            }
        };

        debug!(cancelled = plan.cancels.len(), placed, "quoted {market_id}");
        Ok(TickOutcome::Quoted {
            cancelled: plan.cancels.len(),
            placed,
        })
    }
}

async fn cancel_everything(market_id: &str, client: &mut ExchangeClient) -> Result<(), Error> {
    let own_orders = client.list_resting_orders(market_id).await?;
    let ids: Vec<String> = own_orders.into_iter().map(|o| o.order_id).collect();
    client.cancel_orders(&ids).await
}
