use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::utils::{error_codes, error_to_api_response};

/// 服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 查询串为空或格式非法，不会发起任何上游调用
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// 个性化名称无法解析，或上游不认识该 SteamID
    #[error("not found: {0}")]
    NotFound(String),

    /// Steam Web API 返回非成功状态、超时或响应格式错误
    #[error("upstream call {call} failed: {message}")]
    Upstream { call: &'static str, message: String },

    /// 持久化存储不可用或索引写入失败
    #[error("store error: {0}")]
    Store(String),
}

impl AppError {
    pub fn upstream(call: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::Upstream {
            call,
            message: err.to_string(),
        }
    }

    /// 附带原始查询串，便于客户端重试
    pub fn for_query(self, query: &str) -> QueryFailure {
        QueryFailure {
            query: query.to_string(),
            error: self,
        }
    }

    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::InvalidQuery(_) => (StatusCode::NOT_FOUND, error_codes::VALIDATION_ERROR),
            AppError::NotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, error_codes::NOT_FOUND),
            AppError::Upstream { .. } => (StatusCode::BAD_GATEWAY, error_codes::UPSTREAM_ERROR),
            AppError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, error_codes::STORE_ERROR),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (status, error_to_api_response::<()>(code, self.to_string())).into_response()
    }
}

/// 失败请求的查询回显
#[derive(Debug, Serialize)]
pub struct QueryEcho {
    pub query: String,
}

/// 带查询串的错误响应
#[derive(Debug)]
pub struct QueryFailure {
    pub query: String,
    pub error: AppError,
}

impl IntoResponse for QueryFailure {
    fn into_response(self) -> Response {
        let (status, code) = self.error.status_and_code();
        if status.is_server_error() {
            tracing::warn!(query = %self.query, error = %self.error, "request failed");
        }
        let mut body = error_to_api_response(code, self.error.to_string());
        body.0.resp_data = Some(QueryEcho { query: self.query });
        (status, body).into_response()
    }
}
