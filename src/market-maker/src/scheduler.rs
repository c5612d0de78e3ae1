//! Top-level loop: drives the controller over the active market set,
//! pacing requests and retiring terminated markets.

use std::collections::HashMap;

use chrono::Utc;
use common::{Error, ExchangeClient, MarketProfile};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::controller::{MarketController, TickOutcome};

const MARKET_TIMEOUT_SECS: u64 = 1;
const POLLING_FREQUENCY_SECS: u64 = 15;

pub struct Scheduler {
    client: ExchangeClient,
    controller: MarketController,
    active: HashMap<String, MarketProfile>,
}

impl Scheduler {
    pub fn new(client: ExchangeClient, markets: Vec<MarketProfile>) -> Self {
        let active = markets
            .into_iter()
            .map(|m| (m.market_ticker.clone(), m))
            .collect();
        Self {
            client,
            controller: MarketController::new(),
            active,
        }
    }

    /// Zero the book for every active market; no quoting.
    pub async fn run_clear(&mut self) -> Result<(), Error> {
        let market_ids: Vec<String> = self.active.keys().cloned().collect();
        for market_id in market_ids {
            let orders = self.client.list_resting_orders(&market_id).await?;
            let ids: Vec<String> = orders.into_iter().map(|o| o.order_id).collect();
            self.client.cancel_orders(&ids).await?;
        }
        Ok(())
    }

    /// Run `clear` once, then loop the quoting cycle until the active set
    /// is empty or `ctrl_c` resolves.
    pub async fn run_make(&mut self) -> Result<(), Error> {
        self.run_clear().await?;

        loop {
            if self.active.is_empty() {
                break;
            }

            let positions = match self.client.list_positions().await {
                Ok(positions) => positions,
                Err(err) => {
                    warn!(error = %err, "could not fetch positions this cycle, continuing");
                    tokio::select! {
                        _ = sleep(std::time::Duration::from_secs(POLLING_FREQUENCY_SECS)) => {}
                        _ = tokio::signal::ctrl_c() => return Ok(()),
                    }
                    continue;
                }
            };
            let market_ids: Vec<String> = self.active.keys().cloned().collect();
            info!("Managing active markets: {:?}", market_ids);

            for market_id in market_ids {
                let Some(profile) = self.active.get(&market_id).cloned() else {
                    continue;
                };
                let now = Utc::now();
                match self
                    .controller
                    .tick(&market_id, &profile, now, &positions, &mut self.client)
                    .await
                {
                    Ok(TickOutcome::Retired) => {
                        self.active.remove(&market_id);
                        self.controller.retire(&market_id);
                    }
                    Ok(_) => {}
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        warn!(ticker = %market_id, error = %err, "tick failed, continuing");
                    }
                }
                sleep(std::time::Duration::from_secs(MARKET_TIMEOUT_SECS)).await;
            }

            tokio::select! {
                _ = sleep(std::time::Duration::from_secs(POLLING_FREQUENCY_SECS)) => {}
                _ = tokio::signal::ctrl_c() => {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
