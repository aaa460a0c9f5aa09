//! Ranked storage (Redis).
//!
//! The single store behind the ranking engine. See [`rankings`] for the key
//! layout and the atomicity story.

mod rankings;

pub use rankings::{RankedEntry, RankingStore, RedisRankingStore, WrittenEntry};

#[cfg(test)]
pub use rankings::MockRankingStore;
