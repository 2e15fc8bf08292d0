use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use super::model::RenderParams;
use crate::{
    AppState,
    assets::FetchMode,
    error::QueryFailure,
    pipeline,
    render::{self, OutputFormat},
};

/// 浏览器与 CDN 缓存一天
const CACHE_CONTROL_VALUE: &str = "public, max-age=86400";

async fn render_view(
    state: &AppState,
    uri: &OriginalUri,
    name: &str,
    params: &RenderParams,
    mode: FetchMode,
) -> Result<Response, QueryFailure> {
    let api_key = params.api_key(&state.config.steam_api_key);

    let view = pipeline::fetch_view(state, uri.path(), api_key, name, mode)
        .await
        .map_err(|e| e.for_query(name))?;

    let rendered = render::compose(&view, OutputFormat::for_request(mode, params.wants_json()));
    Ok((
        [
            (header::CONTENT_TYPE, rendered.content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL_VALUE),
        ],
        rendered.body,
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn avatar(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RenderParams>,
    uri: OriginalUri,
) -> Result<Response, QueryFailure> {
    render_view(&state, &uri, &name, &params, FetchMode::AvatarOnly).await
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RenderParams>,
    uri: OriginalUri,
) -> Result<Response, QueryFailure> {
    render_view(&state, &uri, &name, &params, FetchMode::WithProfile).await
}
