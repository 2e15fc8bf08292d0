// 响应缓存模块
// 以完整请求路径为键，缓存已解析的视图，命中时不再访问存储或上游

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

use crate::render::RenderedView;

#[derive(Clone)]
struct CacheEntry {
    view: RenderedView,
    ttl: Duration,
}

/// 每个条目使用写入时指定的过期时间
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// 进程内响应缓存，重启后不保留
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: u64, default_ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .expire_after(EntryTtl)
            .build();

        tracing::info!(
            cache_capacity = capacity,
            cache_ttl_secs = default_ttl.as_secs(),
            "response cache initialized"
        );

        Self { inner, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<RenderedView> {
        let entry = self.inner.get(key).await;
        match &entry {
            Some(_) => tracing::debug!(key = %key, "response cache hit"),
            None => tracing::debug!(key = %key, "response cache miss"),
        }
        entry.map(|e| e.view)
    }

    /// 同一键并发写入时后写者覆盖
    pub async fn set(&self, key: &str, view: RenderedView, ttl: Duration) {
        self.inner
            .insert(key.to_string(), CacheEntry { view, ttl })
            .await;
    }
}
