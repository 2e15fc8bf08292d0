use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::{
    AppState, database::UserRecord, error::AppError, resolver::format_steam_id,
    utils::success_to_api_response,
};

/// 首页展示的最近用户数量
const LATEST_LIMIT: usize = 12;

#[derive(Debug, Serialize)]
pub struct LatestUser {
    pub steamid: String,
    pub display_name: String,
    pub vanity_url: Option<String>,
    pub avatar_url: String,
    pub frame_url: String,
}

impl From<UserRecord> for LatestUser {
    fn from(record: UserRecord) -> Self {
        LatestUser {
            steamid: format_steam_id(record.id),
            display_name: record.display_name,
            vanity_url: record.vanity_url,
            avatar_url: record.avatar,
            frame_url: record.frame,
        }
    }
}

/// 最近保存的用户
pub async fn latest_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<LatestUser> = state
        .store
        .latest(LATEST_LIMIT)
        .await?
        .into_iter()
        .map(LatestUser::from)
        .collect();

    Ok((StatusCode::OK, success_to_api_response(users)))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务器时间
    pub timestamp: i64,
}

/// 健康检查接口
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        success_to_api_response(HealthResponse {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }),
    )
}
