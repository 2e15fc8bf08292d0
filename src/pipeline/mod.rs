//! 请求处理流程
//!
//! 响应缓存 → 存储 → 身份解析 + 资源获取 → 回写存储与缓存。
//! 任何失败都不会写入部分记录。

use chrono::Utc;

use crate::AppState;
use crate::assets::{EmbedMode, FetchMode, fetch_assets};
use crate::database::UserRecord;
use crate::error::AppError;
use crate::render::RenderedView;
use crate::resolver::{SteamQuery, resolve};

/// 找到或构建用户记录
pub async fn lookup_record(
    state: &AppState,
    api_key: &str,
    raw_query: &str,
    mode: FetchMode,
) -> Result<UserRecord, AppError> {
    let query = SteamQuery::parse(raw_query)?;
    let resolved = resolve(state.store.as_ref(), state.steam.as_ref(), api_key, &query).await?;

    let existing = match resolved.record {
        Some(record) => Some(record),
        None => state.store.get_by_id(resolved.id).await?,
    };

    match existing {
        Some(record) => complete_record(state, api_key, record, resolved.vanity, mode).await,
        None => {
            let assets = fetch_assets(
                state.steam.as_ref(),
                api_key,
                resolved.id,
                mode,
                EmbedMode::from_flag(state.config.embed_assets),
            )
            .await?;

            let record = UserRecord {
                id: resolved.id,
                display_name: assets.display_name,
                vanity_url: resolved.vanity,
                avatar: assets.avatar,
                frame: assets.frame,
                background: assets.background,
                created_at: Utc::now(),
                updated_at: None,
            };
            state.store.put(&record).await?;

            tracing::info!(steam_id = record.id, vanity = ?record.vanity_url, "new user record stored");
            Ok(record)
        }
    }
}

/// 已有记录缺少本次请求需要的数据时补齐：
/// 新解析出的个性化名称，或资料卡模式下的背景
async fn complete_record(
    state: &AppState,
    api_key: &str,
    mut record: UserRecord,
    vanity: Option<String>,
    mode: FetchMode,
) -> Result<UserRecord, AppError> {
    let mut changed = false;

    if let Some(vanity) = vanity {
        if !record.vanity_matches(&vanity) {
            record.vanity_url = Some(vanity);
            changed = true;
        }
    }

    if mode == FetchMode::WithProfile && !record.has_background() {
        let background = state.steam.profile_background(api_key, record.id).await?;
        record.background = Some(background);
        changed = true;
    }

    if changed {
        record.updated_at = Some(Utc::now());
        state.store.put(&record).await?;
        tracing::debug!(steam_id = record.id, "user record updated");
    }

    Ok(record)
}

/// 以请求路径为缓存键获取视图
pub async fn fetch_view(
    state: &AppState,
    cache_key: &str,
    api_key: &str,
    raw_query: &str,
    mode: FetchMode,
) -> Result<RenderedView, AppError> {
    if let Some(view) = state.cache.get(cache_key).await {
        return Ok(view);
    }

    let record = lookup_record(state, api_key, raw_query, mode).await?;
    let view = RenderedView::from_record(&record, mode);
    state
        .cache
        .set(cache_key, view.clone(), state.cache.default_ttl())
        .await;

    Ok(view)
}
