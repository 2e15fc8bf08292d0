//! 响应渲染
//!
//! 纯函数：把用户记录转换为视图，再输出 SVG 或 JSON，不访问存储和上游。

mod svg;

use serde::Serialize;

use crate::assets::FetchMode;
use crate::database::UserRecord;
use crate::resolver::format_steam_id;

pub const CONTENT_TYPE_SVG: &str = "image/svg+xml";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// 头像视图，同时是 JSON 输出的字段集
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarView {
    pub steamid: String,
    pub display_name: String,
    pub avatar_url: String,
    pub frame_url: String,
}

/// 资料卡视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub avatar: AvatarView,
    pub webm_url: String,
    pub mp4_url: String,
    pub image_url: String,
}

/// 缓存中保存的视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RenderedView {
    Avatar(AvatarView),
    Profile(ProfileView),
}

impl RenderedView {
    pub fn from_record(record: &UserRecord, mode: FetchMode) -> Self {
        let avatar = AvatarView {
            steamid: format_steam_id(record.id),
            display_name: record.display_name.clone(),
            avatar_url: record.avatar.clone(),
            frame_url: record.frame.clone(),
        };

        match mode {
            FetchMode::AvatarOnly => RenderedView::Avatar(avatar),
            FetchMode::WithProfile => {
                let background = record.background.clone().unwrap_or_default();
                RenderedView::Profile(ProfileView {
                    avatar,
                    webm_url: background.webm_url,
                    mp4_url: background.mp4_url,
                    image_url: background.image_url,
                })
            }
        }
    }

    pub fn avatar(&self) -> &AvatarView {
        match self {
            RenderedView::Avatar(avatar) => avatar,
            RenderedView::Profile(profile) => &profile.avatar,
        }
    }

    pub fn steam_id(&self) -> &str {
        &self.avatar().steamid
    }

    pub fn avatar_url(&self) -> &str {
        &self.avatar().avatar_url
    }

    pub fn frame_url(&self) -> &str {
        &self.avatar().frame_url
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    SvgAvatar,
    SvgProfile,
    Json,
}

impl OutputFormat {
    /// 由请求的路由模式和 `?format=` 决定
    pub fn for_request(mode: FetchMode, json: bool) -> Self {
        match (json, mode) {
            (true, _) => OutputFormat::Json,
            (false, FetchMode::AvatarOnly) => OutputFormat::SvgAvatar,
            (false, FetchMode::WithProfile) => OutputFormat::SvgProfile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: &'static str,
    pub body: String,
}

/// 渲染视图。资料卡格式遇到没有背景的头像视图时只输出头像。
pub fn compose(view: &RenderedView, format: OutputFormat) -> Rendered {
    let markup = match (format, view) {
        (OutputFormat::Json, _) => {
            return Rendered {
                content_type: CONTENT_TYPE_JSON,
                // 视图只包含字符串字段，序列化不会失败
                body: serde_json::to_string(view).unwrap_or_default(),
            };
        }
        (OutputFormat::SvgProfile, RenderedView::Profile(profile)) => svg::profile(profile),
        (OutputFormat::SvgProfile, RenderedView::Avatar(avatar)) => svg::avatar(avatar),
        (OutputFormat::SvgAvatar, view) => svg::avatar(view.avatar()),
    };
    Rendered {
        content_type: CONTENT_TYPE_SVG,
        body: markup.into_string(),
    }
}
