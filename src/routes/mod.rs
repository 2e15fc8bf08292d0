pub mod avatar;
pub mod home;
pub mod search;

use axum::{Router, routing::get};

use crate::AppState;

/// 全部公开路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::latest_users).post(search::search))
        .route("/health", get(home::health))
        .route("/avatar/{name}", get(avatar::avatar))
        .route("/profile/{name}", get(avatar::profile))
        .with_state(state)
}
