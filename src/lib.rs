use std::sync::Arc;

use cache::ResponseCache;
use config::Config;
use database::RecordStore;
use steam::SteamApi;

pub mod assets;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod routes;
pub mod steam;
pub mod utils;

#[cfg(test)]
mod testing;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub steam: Arc<dyn SteamApi>,
    pub store: Arc<dyn RecordStore>,
    pub cache: ResponseCache,
}
