use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::{ProfileBackground, RecordStore, UserRecord};
use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS steam_users (
    id BIGINT PRIMARY KEY,
    display_name TEXT NOT NULL DEFAULT '',
    vanity_url TEXT,
    avatar TEXT NOT NULL DEFAULT '',
    frame TEXT NOT NULL DEFAULT '',
    background_image TEXT,
    background_webm TEXT,
    background_mp4 TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ
);
CREATE UNIQUE INDEX IF NOT EXISTS steam_users_vanity_idx ON steam_users (lower(vanity_url));
CREATE INDEX IF NOT EXISTS steam_users_created_idx ON steam_users (created_at DESC);
"#;

const SELECT_COLUMNS: &str = r#"
    SELECT id, display_name, vanity_url, avatar, frame,
           background_image, background_webm, background_mp4,
           created_at, updated_at
    FROM steam_users
"#;

/// steam_users 表的一行
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    display_name: String,
    vanity_url: Option<String>,
    avatar: String,
    frame: String,
    background_image: Option<String>,
    background_webm: Option<String>,
    background_mp4: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id)
            .map_err(|_| AppError::Store(format!("negative steam id in store: {}", row.id)))?;

        let background = match (row.background_image, row.background_webm, row.background_mp4) {
            (None, None, None) => None,
            (image, webm, mp4) => Some(ProfileBackground {
                image_url: image.unwrap_or_default(),
                webm_url: webm.unwrap_or_default(),
                mp4_url: mp4.unwrap_or_default(),
            }),
        };

        Ok(UserRecord {
            id,
            display_name: row.display_name,
            vanity_url: row.vanity_url,
            avatar: row.avatar,
            frame: row.frame,
            background,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn to_db_id(id: u64) -> Result<i64, AppError> {
    i64::try_from(id).map_err(|_| AppError::Store(format!("steam id out of range: {}", id)))
}

/// 基于 Postgres 的关系型存储
///
/// 个性化名称是表中的一列，唯一索引保证不会被绑定到第二个 SteamID。
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建表，已存在时不做任何事
    pub async fn init(&self) -> Result<(), AppError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get_by_id(&self, id: u64) -> Result<Option<UserRecord>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(to_db_id(id)?)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn get_by_vanity(&self, vanity: &str) -> Result<Option<UserRecord>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_COLUMNS} WHERE lower(vanity_url) = lower($1)"
        ))
        .bind(vanity)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn put(&self, record: &UserRecord) -> Result<(), AppError> {
        let background = record.background.as_ref();

        // 单条语句完成插入或更新；唯一索引冲突时整条写入失败
        let result = sqlx::query(
            r#"
            INSERT INTO steam_users
                (id, display_name, vanity_url, avatar, frame,
                 background_image, background_webm, background_mp4,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                vanity_url = COALESCE(EXCLUDED.vanity_url, steam_users.vanity_url),
                avatar = EXCLUDED.avatar,
                frame = EXCLUDED.frame,
                background_image = COALESCE(EXCLUDED.background_image, steam_users.background_image),
                background_webm = COALESCE(EXCLUDED.background_webm, steam_users.background_webm),
                background_mp4 = COALESCE(EXCLUDED.background_mp4, steam_users.background_mp4),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(to_db_id(record.id)?)
        .bind(&record.display_name)
        .bind(&record.vanity_url)
        .bind(&record.avatar)
        .bind(&record.frame)
        .bind(background.map(|b| b.image_url.as_str()))
        .bind(background.map(|b| b.webm_url.as_str()))
        .bind(background.map(|b| b.mp4_url.as_str()))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(steam_id = record.id, "user record stored in postgres");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Store(format!(
                "vanity url {} is already bound to another steam id",
                record.vanity_url.as_deref().unwrap_or_default()
            ))),
            Err(e) => {
                tracing::error!("Failed to store user record {}: {:?}", record.id, e);
                Err(e.into())
            }
        }
    }

    async fn latest(&self, limit: usize) -> Result<Vec<UserRecord>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }
}
