// 持久化存储模块
// 以 SteamID 为主键保存用户记录，并维护个性化名称索引

pub mod keys;
pub mod models;
pub mod repositories;

use async_trait::async_trait;

use crate::error::AppError;

pub use models::{ProfileBackground, UserRecord};
pub use repositories::{MemoryRecordStore, PgRecordStore, RedisRecordStore};

/// 用户记录存储
///
/// 记录不会过期，也不会被删除；过期策略由响应缓存负责。
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_by_id(&self, id: u64) -> Result<Option<UserRecord>, AppError>;

    /// 通过个性化名称查找，名称不区分大小写
    async fn get_by_vanity(&self, vanity: &str) -> Result<Option<UserRecord>, AppError>;

    /// 插入或更新记录，主记录与个性化名称索引要么同时写入，要么都不写入。
    /// 个性化名称已绑定其他 SteamID 时返回 `AppError::Store`。
    async fn put(&self, record: &UserRecord) -> Result<(), AppError>;

    /// 最近创建的记录，按创建时间倒序
    async fn latest(&self, limit: usize) -> Result<Vec<UserRecord>, AppError>;
}

pub(crate) fn vanity_conflict(vanity: &str, bound_to: u64) -> AppError {
    AppError::Store(format!(
        "vanity url {vanity} is already bound to steam id {bound_to}"
    ))
}

/// 个性化名称已绑定到其他 SteamID 时拒绝写入
pub(crate) fn check_vanity_binding(record: &UserRecord, bound: Option<u64>) -> Result<(), AppError> {
    match (&record.vanity_url, bound) {
        (Some(vanity), Some(bound)) if bound != record.id => Err(vanity_conflict(vanity, bound)),
        _ => Ok(()),
    }
}

/// 与已存记录合并后的待写入内容
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedPut {
    pub record: UserRecord,
    /// 需要从索引中删除的旧个性化名称
    pub stale_vanity: Option<String>,
}

/// 新记录不带个性化名称时沿用旧名称；名称变化时旧索引项失效
pub(crate) fn prepare_put(record: &UserRecord, previous_vanity: Option<String>) -> PreparedPut {
    let mut stored = record.clone();
    let mut stale_vanity = None;
    match (&stored.vanity_url, previous_vanity) {
        (None, previous) => stored.vanity_url = previous,
        (Some(_), Some(old)) if !stored.vanity_matches(&old) => stale_vanity = Some(old),
        _ => {}
    }
    PreparedPut {
        record: stored,
        stale_vanity,
    }
}
