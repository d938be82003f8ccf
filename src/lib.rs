use std::sync::Arc;

use cache::operations::UsageStore;
use config::Config;
use services::{QuoteProvider, RateTracker, StockService};
use ws::ConnectionDirectory;

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod result;
pub mod router;
pub mod routes;
pub mod services;
pub mod utils;
pub mod ws;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tracker: RateTracker,
    pub stocks: StockService,
    pub connections: ConnectionDirectory,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn UsageStore>,
        provider: Arc<dyn QuoteProvider>,
    ) -> Self {
        let tracker = RateTracker::new(store);
        let stocks = StockService::new(tracker.clone(), provider);
        Self {
            config,
            tracker,
            stocks,
            connections: ConnectionDirectory::new(),
        }
    }
}
