use std::env;
use std::time::Duration;

use anyhow::{Context, bail};

pub const DEFAULT_STEAM_API_BASE: &str = "https://api.steampowered.com";
pub const DEFAULT_STEAM_ASSET_BASE: &str =
    "https://cdn.akamai.steamstatic.com/steamcommunity/public/images/";

/// 响应缓存时长上限，一年
const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 3600;

/// 用户记录的持久化后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown RECORD_STORE backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub steam_api_key: String,
    pub steam_api_base: String,
    pub steam_asset_base: String,
    pub server_host: String,
    pub server_port: u16,
    pub record_store: StoreBackend,
    pub redis_url: String,
    pub database_url: Option<String>,
    /// 以 data URI 内嵌头像与头像框，否则直接引用 CDN 链接
    pub embed_assets: bool,
    pub response_cache_ttl_secs: u64,
    pub response_cache_capacity: u64,
    pub upstream_timeout_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            steam_api_key: String::new(),
            steam_api_base: DEFAULT_STEAM_API_BASE.to_string(),
            steam_asset_base: DEFAULT_STEAM_ASSET_BASE.to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            record_store: StoreBackend::Redis,
            redis_url: "redis://127.0.0.1/".to_string(),
            database_url: None,
            embed_assets: false,
            response_cache_ttl_secs: 24 * 3600,
            response_cache_capacity: 10_000,
            upstream_timeout_secs: 10,
            rate_limit_window_secs: 60,
            rate_limit_requests: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Config::default();

        // 缓存时长以小时为单位，允许写成 "24h"
        let cache_ttl_hours = env::var("RESPONSE_CACHE_TTL")
            .ok()
            .and_then(|v| v.trim().trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(24);

        let record_store = match env::var("RECORD_STORE") {
            Ok(v) => StoreBackend::parse(&v)?,
            Err(_) => defaults.record_store,
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        if record_store == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when RECORD_STORE=postgres");
        }

        let server_port = match env::var("SERVER_PORT") {
            Ok(v) => v.parse().context("SERVER_PORT must be a port number")?,
            Err(_) => defaults.server_port,
        };

        let config = Config {
            steam_api_key: env::var("STEAM_API_KEY").unwrap_or_default(),
            steam_api_base: env::var("STEAM_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.steam_api_base),
            steam_asset_base: env::var("STEAM_ASSET_BASE").unwrap_or(defaults.steam_asset_base),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            record_store,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            database_url,
            embed_assets: env::var("EMBED_ASSETS")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(defaults.embed_assets),
            response_cache_ttl_secs: cache_ttl_hours.saturating_mul(3600).min(MAX_CACHE_TTL_SECS),
            response_cache_capacity: env::var("RESPONSE_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.response_cache_capacity),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout_secs),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_window_secs),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_requests),
        };

        tracing::info!(
            server_host = %config.server_host,
            server_port = config.server_port,
            record_store = ?config.record_store,
            embed_assets = config.embed_assets,
            cache_ttl_secs = config.response_cache_ttl_secs,
            "configuration loaded"
        );

        Ok(config)
    }

    pub fn response_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.response_cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
