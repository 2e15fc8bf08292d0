use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use steam_avatars::{
    AppState,
    cache::ResponseCache,
    config::{Config, StoreBackend},
    database::{MemoryRecordStore, PgRecordStore, RecordStore, RedisRecordStore},
    middleware::{RateLimiter, log_errors, rate_limit},
    routes,
    steam::SteamClient,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Steam 头像与资料卡 SVG 服务
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Steam Web API key
    #[arg(short, long, env = "STEAM_API_KEY")]
    key: Option<String>,

    /// 监听端口，覆盖 SERVER_PORT
    #[arg(short, long)]
    port: Option<u16>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置，命令行参数优先
    let mut config = Config::from_env().expect("Failed to load configuration");
    let cli = Cli::parse();
    if let Some(key) = cli.key.filter(|k| !k.is_empty()) {
        config.steam_api_key = key;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    if config.steam_api_key.is_empty() {
        tracing::error!("no Steam API key: set STEAM_API_KEY or pass --key");
        std::process::exit(1);
    }
    let config = Arc::new(config);

    // 设置 Redis 客户端，限流与 redis 存储共用
    let redis_client = Arc::new(
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client"),
    );

    // 选择用户记录存储
    let store: Arc<dyn RecordStore> = match config.record_store {
        StoreBackend::Redis => Arc::new(RedisRecordStore::new(redis_client.clone())),
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL is required for postgres");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'steam_avatars';")
                            .await?;
                        Ok(())
                    })
                })
                .connect(database_url)
                .await
                .expect("Failed to connect to Postgres");
            let store = PgRecordStore::new(pool);
            store.init().await.expect("Failed to create schema");
            Arc::new(store)
        }
        StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
    };
    tracing::info!(backend = ?config.record_store, "record store ready");

    let steam = SteamClient::from_config(&config).expect("Failed to build HTTP client");
    let cache = ResponseCache::new(config.response_cache_capacity, config.response_cache_ttl());

    // 设置应用状态
    let state = AppState {
        config: config.clone(),
        steam: Arc::new(steam),
        store,
        cache,
    };

    let router = routes::router(state).layer(axum::middleware::from_fn(log_errors));

    // 内存存储时通常没有 Redis，不启用限流
    let router = if config.record_store == StoreBackend::Memory {
        tracing::warn!("rate limiting disabled for the memory record store");
        router
    } else {
        let rate_limiter = Arc::new(RateLimiter::new(redis_client, config.clone()));
        router.layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
    };

    let app = router
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}
