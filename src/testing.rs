//! 测试用的上游替身与状态构造

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::AppState;
use crate::cache::ResponseCache;
use crate::config::{Config, StoreBackend};
use crate::database::{MemoryRecordStore, ProfileBackground, UserRecord};
use crate::error::AppError;
use crate::steam::{PlayerSummary, SteamApi};

pub const GABE_ID: u64 = 76561197960287930;
pub const GABE_VANITY: &str = "gabelogannewell";
pub const GABE_NAME: &str = "Rabscuttle";
pub const GABE_AVATAR_FULL: &str =
    "https://avatars.steamstatic.com/c5d56249ee5d28a07db4ac9f7f60af961fab5426_full.jpg";
pub const GABE_FRAME: &str =
    "https://cdn.akamai.steamstatic.com/steamcommunity/public/images/items/2855140/frame.png";

/// 内存中的 Steam Web API 替身，记录每一次调用
#[derive(Default)]
pub struct FakeSteam {
    pub vanities: HashMap<String, u64>,
    pub frames: HashMap<u64, String>,
    pub animated: HashMap<u64, String>,
    pub players: HashMap<u64, PlayerSummary>,
    pub backgrounds: HashMap<u64, ProfileBackground>,
    /// 这些调用会返回上游错误
    pub failing: HashSet<&'static str>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeSteam {
    /// 拥有头像框、没有动态头像的账号
    pub fn gabe() -> Self {
        let mut steam = FakeSteam::default();
        steam.vanities.insert(GABE_VANITY.to_string(), GABE_ID);
        steam.frames.insert(GABE_ID, GABE_FRAME.to_string());
        steam.players.insert(
            GABE_ID,
            PlayerSummary {
                display_name: GABE_NAME.to_string(),
                avatar_full: GABE_AVATAR_FULL.to_string(),
            },
        );
        steam.backgrounds.insert(
            GABE_ID,
            ProfileBackground {
                image_url: "https://cdn.example/bg.jpg".to_string(),
                webm_url: "https://cdn.example/bg.webm".to_string(),
                mp4_url: "https://cdn.example/bg.mp4".to_string(),
            },
        );
        steam
    }

    pub fn failing_on(mut self, call: &'static str) -> Self {
        self.failing.insert(call);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    pub fn vanity_calls(&self) -> usize {
        self.calls_to("ResolveVanityURL")
    }

    fn record(&self, call: &'static str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(call) {
            return Err(AppError::upstream(call, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SteamApi for FakeSteam {
    async fn resolve_vanity(&self, _api_key: &str, vanity: &str) -> Result<u64, AppError> {
        self.record("ResolveVanityURL")?;
        self.vanities
            .get(vanity)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("vanity url {}", vanity)))
    }

    async fn avatar_frame(&self, _api_key: &str, steam_id: u64) -> Result<String, AppError> {
        self.record("GetAvatarFrame")?;
        Ok(self.frames.get(&steam_id).cloned().unwrap_or_default())
    }

    async fn animated_avatar(&self, _api_key: &str, steam_id: u64) -> Result<String, AppError> {
        self.record("GetAnimatedAvatar")?;
        Ok(self.animated.get(&steam_id).cloned().unwrap_or_default())
    }

    async fn player_summary(
        &self,
        _api_key: &str,
        steam_id: u64,
    ) -> Result<PlayerSummary, AppError> {
        self.record("GetPlayerSummaries")?;
        self.players
            .get(&steam_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("steam id {}", steam_id)))
    }

    async fn profile_background(
        &self,
        _api_key: &str,
        steam_id: u64,
    ) -> Result<ProfileBackground, AppError> {
        self.record("GetMiniProfileBackground")?;
        Ok(self.backgrounds.get(&steam_id).cloned().unwrap_or_default())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        self.record("DownloadAsset")?;
        Ok(format!("bytes of {url}").into_bytes())
    }
}

pub fn record_for(id: u64, vanity: Option<&str>) -> UserRecord {
    UserRecord {
        id,
        display_name: format!("user {id}"),
        vanity_url: vanity.map(str::to_string),
        avatar: format!("https://avatars.steamstatic.com/{id}_full.jpg"),
        frame: String::new(),
        background: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn test_config() -> Config {
    Config {
        steam_api_key: "server-key".to_string(),
        record_store: StoreBackend::Memory,
        ..Config::default()
    }
}

/// 使用内存存储和替身上游构造应用状态
pub fn test_state(steam: FakeSteam) -> (AppState, Arc<FakeSteam>, Arc<MemoryRecordStore>) {
    test_state_with(test_config(), steam)
}

pub fn test_state_with(
    config: Config,
    steam: FakeSteam,
) -> (AppState, Arc<FakeSteam>, Arc<MemoryRecordStore>) {
    let steam = Arc::new(steam);
    let store = Arc::new(MemoryRecordStore::new());
    let cache = ResponseCache::new(config.response_cache_capacity, config.response_cache_ttl());
    let state = AppState {
        config: Arc::new(config),
        steam: steam.clone(),
        store: store.clone(),
        cache,
    };
    (state, steam, store)
}
