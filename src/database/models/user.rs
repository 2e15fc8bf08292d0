use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 个人资料背景（迷你资料卡背景）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileBackground {
    pub image_url: String,
    pub webm_url: String,
    pub mp4_url: String,
}

/// 已解析的 Steam 用户及其头像资源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Steam64 ID，主键，一经分配不再改变
    pub id: u64,
    pub display_name: String,
    /// 个性化名称，存在时唯一
    pub vanity_url: Option<String>,
    /// 头像链接或 data URI
    pub avatar: String,
    /// 头像框链接或 data URI，空字符串表示没有头像框
    pub frame: String,
    /// 仅在资料卡模式下获取过才有值
    pub background: Option<ProfileBackground>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// 资料卡模式需要背景，尚未获取时不能直接使用
    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// 个性化名称是否与给定名称相同（不区分大小写）
    pub fn vanity_matches(&self, name: &str) -> bool {
        self.vanity_url
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case(name))
    }
}
