//! Domain services.
//!
//! The ranking engine lives here, behind the handlers and in front of the
//! ranked store. Handlers construct a [`LeaderboardService`] per request
//! from the shared store handle; the service itself is a cheap Arc clone.

mod leaderboard;

pub use leaderboard::{LeaderboardError, LeaderboardService};
