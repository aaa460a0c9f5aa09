use std::sync::Arc;

use crate::{config::Config, stores::RankingStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub rankings: Arc<dyn RankingStore>,
}
