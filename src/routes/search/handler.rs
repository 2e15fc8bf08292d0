use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    AppState,
    assets::FetchMode,
    pipeline,
    resolver::format_steam_id,
    utils::{error_codes, error_to_api_response},
};

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub name: String,
    pub target: Option<String>,
}

/// 跳转目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Avatar,
    Profile,
}

impl SearchTarget {
    pub fn parse(target: Option<&str>) -> Self {
        match target.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("profile") => SearchTarget::Profile,
            _ => SearchTarget::Avatar,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            SearchTarget::Avatar => "avatar",
            SearchTarget::Profile => "profile",
        }
    }
}

/// 解析并保存用户，然后跳转到对应的头像或资料卡地址
#[axum::debug_handler]
pub async fn search(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response::<()>(error_codes::VALIDATION_ERROR, "name is required".to_string()),
        )
            .into_response();
    }

    tracing::info!(query = %name, "searching for steam user");

    let target = SearchTarget::parse(form.target.as_deref());
    match pipeline::lookup_record(&state, &state.config.steam_api_key, name, FetchMode::AvatarOnly)
        .await
    {
        Ok(record) => Redirect::to(&format!(
            "/{}/{}",
            target.path(),
            format_steam_id(record.id)
        ))
        .into_response(),
        Err(e) => e.for_query(name).into_response(),
    }
}
