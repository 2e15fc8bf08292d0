//! 头像资源获取
//!
//! 头像框、头像（动态优先，回退到静态）以及资料卡背景相互独立，
//! 并发请求；任意一个失败都会终止整个获取过程。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::database::ProfileBackground;
use crate::error::AppError;
use crate::steam::SteamApi;

const MIME_ANIMATED_AVATAR: &str = "image/gif";
const MIME_STATIC_AVATAR: &str = "image/png";
const MIME_FRAME: &str = "image/apng";

/// 获取范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    AvatarOnly,
    WithProfile,
}

/// 图片的引用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMode {
    /// 直接引用 CDN 链接
    Link,
    /// 下载后以 base64 data URI 内嵌
    Inline,
}

impl EmbedMode {
    pub fn from_flag(embed: bool) -> Self {
        if embed { EmbedMode::Inline } else { EmbedMode::Link }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSet {
    pub display_name: String,
    pub avatar: String,
    pub frame: String,
    pub background: Option<ProfileBackground>,
}

/// 选中的头像及是否为动态头像
struct SelectedAvatar {
    display_name: String,
    url: String,
    animated: bool,
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

async fn select_avatar(
    steam: &dyn SteamApi,
    api_key: &str,
    steam_id: u64,
) -> Result<SelectedAvatar, AppError> {
    // 玩家摘要总是需要（提供昵称），与动态头像并发获取
    let (animated, summary) = tokio::try_join!(
        steam.animated_avatar(api_key, steam_id),
        steam.player_summary(api_key, steam_id),
    )?;

    if animated.is_empty() {
        Ok(SelectedAvatar {
            display_name: summary.display_name,
            url: summary.avatar_full,
            animated: false,
        })
    } else {
        Ok(SelectedAvatar {
            display_name: summary.display_name,
            url: animated,
            animated: true,
        })
    }
}

async fn fetch_background(
    steam: &dyn SteamApi,
    api_key: &str,
    steam_id: u64,
    mode: FetchMode,
) -> Result<Option<ProfileBackground>, AppError> {
    match mode {
        FetchMode::AvatarOnly => Ok(None),
        FetchMode::WithProfile => steam.profile_background(api_key, steam_id).await.map(Some),
    }
}

async fn embed(
    steam: &dyn SteamApi,
    url: &str,
    mime: &str,
    embed: EmbedMode,
) -> Result<String, AppError> {
    if url.is_empty() || embed == EmbedMode::Link {
        return Ok(url.to_string());
    }
    let bytes = steam.download(url).await?;
    Ok(data_uri(mime, &bytes))
}

pub async fn fetch_assets(
    steam: &dyn SteamApi,
    api_key: &str,
    steam_id: u64,
    mode: FetchMode,
    embed_mode: EmbedMode,
) -> Result<AssetSet, AppError> {
    let (frame_url, avatar, background) = tokio::try_join!(
        steam.avatar_frame(api_key, steam_id),
        select_avatar(steam, api_key, steam_id),
        fetch_background(steam, api_key, steam_id, mode),
    )?;

    let avatar_mime = if avatar.animated {
        MIME_ANIMATED_AVATAR
    } else {
        MIME_STATIC_AVATAR
    };
    let (avatar_src, frame_src) = tokio::try_join!(
        embed(steam, &avatar.url, avatar_mime, embed_mode),
        embed(steam, &frame_url, MIME_FRAME, embed_mode),
    )?;

    tracing::debug!(
        steam_id,
        animated = avatar.animated,
        has_frame = !frame_src.is_empty(),
        "assets fetched"
    );

    Ok(AssetSet {
        display_name: avatar.display_name,
        avatar: avatar_src,
        frame: frame_src,
        background,
    })
}
