//! Steam Web API 响应结构
//!
//! 所有接口都返回 `{ "response": { ... } }` 形式的信封；
//! 账号没有拥有某个物品时内层字段会直接缺失，因此字段都带默认值。

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub response: T,
}

/// ISteamUser/ResolveVanityURL
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VanityResolution {
    pub steamid: Option<String>,
    /// 1 表示成功，42 表示没有匹配
    pub success: i32,
    pub message: Option<String>,
}

/// 头像、头像框等社区物品
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommunityItem {
    pub appid: u32,
    pub communityitemid: String,
    pub image_large: String,
    pub image_small: String,
    pub name: String,
}

/// IPlayerService/GetAvatarFrame
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AvatarFrameBody {
    pub avatar_frame: Option<CommunityItem>,
}

/// IPlayerService/GetAnimatedAvatar
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnimatedAvatarBody {
    pub avatar: Option<CommunityItem>,
}

/// ISteamUser/GetPlayerSummaries
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayerSummariesBody {
    pub players: Vec<Player>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Player {
    pub steamid: String,
    pub personaname: String,
    pub avatarfull: String,
    pub profileurl: String,
    pub realname: Option<String>,
}

/// IPlayerService/GetMiniProfileBackground
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MiniProfileBackgroundBody {
    pub profile_background: Option<ProfileBackgroundItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileBackgroundItem {
    pub appid: u32,
    pub communityitemid: String,
    pub image_large: String,
    pub movie_webm: String,
    pub movie_mp4: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_means_nothing_owned() {
        let body: Envelope<AvatarFrameBody> =
            serde_json::from_str(r#"{"response":{}}"#).unwrap();
        assert!(body.response.avatar_frame.is_none());
    }

    #[test]
    fn failed_vanity_resolution() {
        let body: Envelope<VanityResolution> =
            serde_json::from_str(r#"{"response":{"success":42,"message":"No match"}}"#).unwrap();
        assert_eq!(body.response.success, 42);
        assert!(body.response.steamid.is_none());
    }

    #[test]
    fn player_summary_ignores_unknown_fields() {
        let json = r#"{"response":{"players":[{
            "steamid":"76561197960287930",
            "communityvisibilitystate":3,
            "personaname":"Rabscuttle",
            "avatarfull":"https://avatars.steamstatic.com/c5d5_full.jpg"
        }]}}"#;
        let body: Envelope<PlayerSummariesBody> = serde_json::from_str(json).unwrap();
        assert_eq!(body.response.players[0].personaname, "Rabscuttle");
        assert!(body.response.players[0].realname.is_none());
    }
}
