use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::Script;

use crate::{
    config::Config,
    utils::{error_codes, error_to_api_response},
};

/// 基于 Redis 计数器的按 IP 限流
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
    script: Script,
}

/// 没有过期时间的计数器（新建或上次设置失败）补上窗口
const HIT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if redis.call('TTL', KEYS[1]) < 0 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// 携带自己 API key 的请求不受限流约束
pub(crate) fn has_own_key(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        q.split('&').any(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            name == "key" && !value.is_empty()
        })
    })
}

/// 客户端 IP：优先反向代理头，其次连接地址
pub(crate) fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

fn rate_limit_key(ip: &str) -> String {
    format!("steam:rate_limit:{}", ip)
}

impl RateLimiter {
    pub fn new(redis: Arc<redis::Client>, config: Arc<Config>) -> Self {
        Self {
            redis,
            config,
            script: Script::new(HIT_SCRIPT),
        }
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Response {
        if has_own_key(req.uri().query()) {
            return next.run(req).await;
        }

        let ip = client_ip(&req);
        match self.hit(&ip).await {
            Ok(count) if count > u64::from(self.config.rate_limit_requests) => {
                tracing::debug!(%ip, count, "rate limit exceeded");
                let window = self.config.rate_limit_window().as_secs();
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    error_to_api_response::<()>(
                        error_codes::RATE_LIMIT,
                        format!("too many requests, retry in {} seconds", window),
                    ),
                )
                    .into_response()
            }
            Ok(_) => next.run(req).await,
            Err(e) => {
                // 计数器不可用时放行
                tracing::warn!(%ip, error = %e, "rate limiter unavailable");
                next.run(req).await
            }
        }
    }

    /// 计数加一并确保计数器带过期时间，一次往返原子完成
    async fn hit(&self, ip: &str) -> Result<u64, redis::RedisError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        self.script
            .key(rate_limit_key(ip))
            .arg(self.config.rate_limit_window().as_secs().max(1))
            .invoke_async(&mut conn)
            .await
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
