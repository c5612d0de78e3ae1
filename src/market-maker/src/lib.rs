//! Quoting control loop: ladder planner, reconciler, market controller,
//! and scheduler, built over the `common` exchange client.

pub mod controller;
pub mod planner;
pub mod reconciler;
pub mod scheduler;
pub mod strategy;

pub use controller::{MarketController, TickOutcome};
pub use planner::Ladder;
pub use reconciler::{reconcile, ReconcilePlan};
pub use scheduler::Scheduler;
