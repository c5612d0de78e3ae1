//! Shared data model: market profiles, orders, and per-market state.
//!
//! Prices and quantities are plain integer cents/contracts throughout:
//! the exchange's wire format is integer cents and the ladder planner's
//! determinism depends on integer arithmetic, so no decimal type is used
//! in this path.

use serde::{Deserialize, Serialize};

/// A resting-order side. `price(yes) + price(no) = 100` by market
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn is_yes(&self) -> bool {
        matches!(self, Side::Yes)
    }
}

/// An order placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub market_id: String,
    pub side: Side,
    /// Price in integer cents, 1..=99.
    pub price: u8,
    pub count: u32,
    pub expiration_unix_ts: i64,
    #[serde(default)]
    pub sell_position_capped: bool,
}

/// Per-market parameters loaded from a strategy file. Immutable once
/// loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketProfile {
    pub market_ticker: String,
    pub instant_liquidity_cents: u32,
    pub max_exposure_cents: u32,
    /// Inventory->price damping: one unit of fair-value adjustment
    /// requires this many contracts of inventory change. Must be >= 1.
    pub price_stickyness: u32,
    /// Width in cents between the top yes and top no quotes. Must be odd
    /// and >= 1.
    pub spread: u32,
    /// Number of price levels per side. Must be >= 1.
    pub depth: u32,
    pub max_spread: Option<u32>,
    pub max_yes_price: Option<u8>,
    pub min_yes_price: Option<u8>,
    pub snipe_timeout_seconds: Option<i64>,
    /// RFC3339 wall-clock deadline at which the market is cancelled and
    /// retired.
    pub clear_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// A named collection of market profiles for one exchange environment.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyProfile {
    pub env: crate::environment::Environment,
    pub markets: Vec<MarketProfile>,
    /// The key this profile was loaded under. Not part of the YAML body;
    /// filled in by the loader for logging purposes.
    #[serde(default)]
    pub name: String,
}

/// Per-market state owned by the market controller; one row per
/// `market_id`, lazily initialised on first tick.
#[derive(Debug, Clone)]
pub struct PerMarketState {
    /// The maker's current theoretical yes-price, 1..=99. `None` before
    /// the first seed.
    pub fair_value: Option<u8>,
    /// Signed contracts (positive => long yes, negative => long no) at
    /// which `fair_value` was last reconciled.
    pub last_position: i64,
    /// Wall-clock time of the most recent snipe event.
    pub last_snipe_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl PerMarketState {
    pub fn new() -> Self {
        Self {
            fair_value: None,
            last_position: 0,
            last_snipe_at: None,
        }
    }
}

impl Default for PerMarketState {
    fn default() -> Self {
        Self::new()
    }
}

/// A maker's position in one market, as reported by `list_positions`.
/// `position_cost` is always non-negative; the sign of `position`
/// disambiguates yes vs. no.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position {
    pub position: i64,
    pub position_cost: i64,
}
