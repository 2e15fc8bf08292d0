// Steam Web API 客户端
// 只实现渲染头像与资料卡所需的几个接口

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::database::ProfileBackground;
use crate::error::AppError;

pub use client::SteamClient;

/// 玩家摘要中与渲染相关的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub display_name: String,
    /// 静态头像（avatarfull）
    pub avatar_full: String,
}

/// 上游调用接口
///
/// 每个调用都带超时且不重试，失败立即返回 `AppError::Upstream`。
/// 返回空字符串表示账号没有对应物品，不是错误。
#[async_trait]
pub trait SteamApi: Send + Sync {
    /// 个性化名称解析为 SteamID，没有匹配时返回 `AppError::NotFound`
    async fn resolve_vanity(&self, api_key: &str, vanity: &str) -> Result<u64, AppError>;

    async fn avatar_frame(&self, api_key: &str, steam_id: u64) -> Result<String, AppError>;

    async fn animated_avatar(&self, api_key: &str, steam_id: u64) -> Result<String, AppError>;

    /// 上游不认识该 SteamID 时返回 `AppError::NotFound`
    async fn player_summary(&self, api_key: &str, steam_id: u64)
    -> Result<PlayerSummary, AppError>;

    async fn profile_background(
        &self,
        api_key: &str,
        steam_id: u64,
    ) -> Result<ProfileBackground, AppError>;

    /// 下载 CDN 上的图片
    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError>;
}
