use std::sync::Arc;

use crate::{
    clock::Clock,
    config::Config,
    services::{completion::CompletionClient, practice::PracticeClient},
};
use axum::extract::FromRef;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub completion: Arc<dyn CompletionClient>,
    pub practice: PracticeClient,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        config: Config,
        clock: Arc<dyn Clock>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        let practice = PracticeClient::new(config.practice_service_url.clone());
        Self {
            pool,
            config,
            clock,
            completion,
            practice,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Clock> {
    fn from_ref(state: &AppState) -> Self {
        state.clock.clone()
    }
}

impl FromRef<AppState> for PracticeClient {
    fn from_ref(state: &AppState) -> Self {
        state.practice.clone()
    }
}
