//! Common library shared by the market-maker binary.
//!
//! Provides the exchange session model: credentials, authentication,
//! the typed HTTP client, the shared data model, and dense order-book
//! views.

pub mod auth;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod exchange;
pub mod models;
pub mod orderbook;

pub use auth::AuthSession;
pub use credentials::{load_credentials, Credentials};
pub use environment::Environment;
pub use error::Error;
pub use exchange::{ExchangeClient, MarketDetails, MarketRow, PlacedOrderRow};
pub use models::{MarketProfile, Order, PerMarketState, Position, Side, StrategyProfile};
pub use orderbook::{DenseBook, RestingOrder};
