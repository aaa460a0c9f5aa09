//! Shared test utilities for API handler tests.
//!
//! Provides a `TestStateBuilder` for constructing `AppState` instances
//! backed by a mocked ranking store.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::TestStateBuilder;
//!
//! let mut store = MockRankingStore::new();
//! store.expect_cardinality().returning(|_| Ok(10));
//!
//! let state = TestStateBuilder::new().with_rankings(store).build();
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::state::AppState;
use crate::stores::MockRankingStore;

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8880,
        redis_url: "redis://test".to_string(),
        max_returned_members: 2000,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// Builder for constructing test `AppState` with a custom store mock.
///
/// Uses a default (empty) mock when none is set, so tests only configure
/// the expectations they actually need.
pub struct TestStateBuilder {
    rankings: Option<MockRankingStore>,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self { rankings: None }
    }

    pub fn with_rankings(mut self, store: MockRankingStore) -> Self {
        self.rankings = Some(store);
        self
    }

    pub fn build(self) -> AppState {
        AppState {
            config: test_config(),
            rankings: Arc::new(self.rankings.unwrap_or_else(MockRankingStore::new)),
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
