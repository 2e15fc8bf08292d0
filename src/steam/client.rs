use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::models::{
    AnimatedAvatarBody, AvatarFrameBody, Envelope, MiniProfileBackgroundBody,
    PlayerSummariesBody, VanityResolution,
};
use super::{PlayerSummary, SteamApi};
use crate::config::Config;
use crate::database::ProfileBackground;
use crate::error::AppError;
use crate::resolver::format_steam_id;

const RESOLVE_VANITY_URL: &str = "/ISteamUser/ResolveVanityURL/v1/";
const GET_AVATAR_FRAME: &str = "/IPlayerService/GetAvatarFrame/v1/";
const GET_ANIMATED_AVATAR: &str = "/IPlayerService/GetAnimatedAvatar/v1/";
const GET_PLAYER_SUMMARIES: &str = "/ISteamUser/GetPlayerSummaries/v2/";
const GET_MINI_PROFILE_BACKGROUND: &str = "/IPlayerService/GetMiniProfileBackground/v1/";

/// 基于 reqwest 的 Steam Web API 客户端
#[derive(Clone)]
pub struct SteamClient {
    http: reqwest::Client,
    api_base: String,
    asset_base: String,
}

impl SteamClient {
    pub fn new(
        api_base: impl Into<String>,
        asset_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("steam-avatars/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            asset_base: asset_base.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.steam_api_base.clone(),
            config.steam_asset_base.clone(),
            config.upstream_timeout(),
        )
    }

    /// 发起一次 GET 请求并解析信封，调用名用于错误上下文
    async fn get<T: DeserializeOwned>(
        &self,
        call: &'static str,
        path: &str,
        api_key: &str,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .query(&[("key", api_key)])
            .query(params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::upstream(call, e.without_url()))?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| AppError::upstream(call, e.without_url()))?;

        Ok(envelope.response)
    }

    /// 社区物品路径是相对 CDN 的，空路径表示没有该物品
    fn asset_url(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.asset_base, path)
    }

    fn background_from(&self, body: MiniProfileBackgroundBody) -> ProfileBackground {
        let item = body.profile_background.unwrap_or_default();
        ProfileBackground {
            image_url: self.asset_url(&item.image_large),
            webm_url: self.asset_url(&item.movie_webm),
            mp4_url: self.asset_url(&item.movie_mp4),
        }
    }
}

fn steam_id_from(call: &'static str, vanity: &str, body: VanityResolution) -> Result<u64, AppError> {
    if body.success != 1 {
        return Err(AppError::NotFound(format!("vanity url {}", vanity)));
    }
    body.steamid
        .as_deref()
        .unwrap_or_default()
        .parse::<u64>()
        .map_err(|e| AppError::upstream(call, format!("malformed steamid: {}", e)))
}

fn summary_from(steam_id: u64, body: PlayerSummariesBody) -> Result<PlayerSummary, AppError> {
    let player = body
        .players
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("steam id {}", steam_id)))?;

    Ok(PlayerSummary {
        display_name: player.personaname,
        avatar_full: player.avatarfull,
    })
}

#[async_trait]
impl SteamApi for SteamClient {
    async fn resolve_vanity(&self, api_key: &str, vanity: &str) -> Result<u64, AppError> {
        let body: VanityResolution = self
            .get("ResolveVanityURL", RESOLVE_VANITY_URL, api_key, &[("vanityurl", vanity)])
            .await?;
        steam_id_from("ResolveVanityURL", vanity, body)
    }

    async fn avatar_frame(&self, api_key: &str, steam_id: u64) -> Result<String, AppError> {
        let id = format_steam_id(steam_id);
        let body: AvatarFrameBody = self
            .get("GetAvatarFrame", GET_AVATAR_FRAME, api_key, &[("steamid", id.as_str())])
            .await?;
        let item = body.avatar_frame.unwrap_or_default();
        Ok(self.asset_url(&item.image_small))
    }

    async fn animated_avatar(&self, api_key: &str, steam_id: u64) -> Result<String, AppError> {
        let id = format_steam_id(steam_id);
        let body: AnimatedAvatarBody = self
            .get("GetAnimatedAvatar", GET_ANIMATED_AVATAR, api_key, &[("steamid", id.as_str())])
            .await?;
        let item = body.avatar.unwrap_or_default();
        Ok(self.asset_url(&item.image_small))
    }

    async fn player_summary(
        &self,
        api_key: &str,
        steam_id: u64,
    ) -> Result<PlayerSummary, AppError> {
        let id = format_steam_id(steam_id);
        let body: PlayerSummariesBody = self
            .get("GetPlayerSummaries", GET_PLAYER_SUMMARIES, api_key, &[("steamids", id.as_str())])
            .await?;
        summary_from(steam_id, body)
    }

    async fn profile_background(
        &self,
        api_key: &str,
        steam_id: u64,
    ) -> Result<ProfileBackground, AppError> {
        let id = format_steam_id(steam_id);
        let body: MiniProfileBackgroundBody = self
            .get(
                "GetMiniProfileBackground",
                GET_MINI_PROFILE_BACKGROUND,
                api_key,
                &[("steamid", id.as_str())],
            )
            .await?;
        Ok(self.background_from(body))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::upstream("DownloadAsset", e))?
            .bytes()
            .await
            .map_err(|e| AppError::upstream("DownloadAsset", e))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_STEAM_API_BASE, DEFAULT_STEAM_ASSET_BASE};
    use crate::steam::models::ProfileBackgroundItem;

    fn client() -> SteamClient {
        SteamClient::new(
            DEFAULT_STEAM_API_BASE,
            DEFAULT_STEAM_ASSET_BASE,
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn asset_paths_are_prefixed_with_cdn() {
        let client = client();
        assert_eq!(
            client.asset_url("items/570/frame.png"),
            format!("{}items/570/frame.png", DEFAULT_STEAM_ASSET_BASE)
        );
        assert_eq!(client.asset_url(""), "");
        assert_eq!(
            client.asset_url("https://avatars.steamstatic.com/x_full.jpg"),
            "https://avatars.steamstatic.com/x_full.jpg"
        );
    }

    #[test]
    fn unsuccessful_resolution_is_not_found() {
        let body = VanityResolution {
            steamid: None,
            success: 42,
            message: Some("No match".to_string()),
        };
        let err = steam_id_from("ResolveVanityURL", "nobody", body).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn successful_resolution_parses_id() {
        let body = VanityResolution {
            steamid: Some("76561197960287930".to_string()),
            success: 1,
            message: None,
        };
        assert_eq!(
            steam_id_from("ResolveVanityURL", "gabelogannewell", body).unwrap(),
            76561197960287930
        );
    }

    #[test]
    fn garbage_steamid_is_upstream_error() {
        let body = VanityResolution {
            steamid: Some("not-a-number".to_string()),
            success: 1,
            message: None,
        };
        let err = steam_id_from("ResolveVanityURL", "x", body).unwrap_err();
        assert!(matches!(err, AppError::Upstream { call: "ResolveVanityURL", .. }));
    }

    #[test]
    fn empty_player_list_is_not_found() {
        let err = summary_from(1, PlayerSummariesBody::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn missing_background_yields_empty_urls() {
        let client = client();
        let background = client.background_from(MiniProfileBackgroundBody::default());
        assert_eq!(background, ProfileBackground::default());

        let background = client.background_from(MiniProfileBackgroundBody {
            profile_background: Some(ProfileBackgroundItem {
                image_large: "items/bg.jpg".to_string(),
                movie_webm: "items/bg.webm".to_string(),
                movie_mp4: "items/bg.mp4".to_string(),
                ..Default::default()
            }),
        });
        assert!(background.webm_url.ends_with("items/bg.webm"));
        assert!(background.mp4_url.starts_with(DEFAULT_STEAM_ASSET_BASE));
    }
}
