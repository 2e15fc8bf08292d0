//! 身份解析：把用户输入的字符串解析为 SteamID
//!
//! 17 位纯数字直接视为 SteamID；其余视为个性化名称，
//! 先查存储中的个性化名称索引，未命中再调用上游。

use crate::database::{RecordStore, UserRecord};
use crate::error::AppError;
use crate::steam::SteamApi;

const STEAM_ID_LEN: usize = 17;
const MAX_VANITY_LEN: usize = 64;

/// 用户输入的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SteamQuery {
    Id(u64),
    Vanity(String),
}

impl SteamQuery {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::InvalidQuery("empty query".to_string()));
        }

        if is_steam_id(raw) {
            let id = raw
                .parse::<u64>()
                .map_err(|_| AppError::InvalidQuery(raw.to_string()))?;
            return Ok(SteamQuery::Id(id));
        }

        let illegal = |c: char| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '&');
        if raw.chars().count() > MAX_VANITY_LEN || raw.contains(illegal) {
            return Err(AppError::InvalidQuery(raw.to_string()));
        }

        Ok(SteamQuery::Vanity(raw.to_string()))
    }
}

/// 17 位纯数字
pub fn is_steam_id(name: &str) -> bool {
    name.len() == STEAM_ID_LEN && name.bytes().all(|b| b.is_ascii_digit())
}

/// SteamID 的规范文本形式，不足 17 位时补前导零
pub fn format_steam_id(id: u64) -> String {
    format!("{:0width$}", id, width = STEAM_ID_LEN)
}

/// 解析结果
#[derive(Debug, Clone)]
pub struct Resolved {
    pub id: u64,
    /// 通过上游解析得到的个性化名称，调用方负责持久化
    pub vanity: Option<String>,
    /// 个性化名称索引命中时的已存记录
    pub record: Option<UserRecord>,
}

pub async fn resolve(
    store: &dyn RecordStore,
    steam: &dyn SteamApi,
    api_key: &str,
    query: &SteamQuery,
) -> Result<Resolved, AppError> {
    match query {
        SteamQuery::Id(id) => Ok(Resolved {
            id: *id,
            vanity: None,
            record: None,
        }),
        SteamQuery::Vanity(name) => {
            if let Some(record) = store.get_by_vanity(name).await? {
                tracing::debug!(vanity = %name, steam_id = record.id, "vanity index hit");
                return Ok(Resolved {
                    id: record.id,
                    vanity: None,
                    record: Some(record),
                });
            }

            let id = steam.resolve_vanity(api_key, name).await?;
            tracing::info!(vanity = %name, steam_id = id, "resolved vanity url upstream");
            Ok(Resolved {
                id,
                vanity: Some(name.clone()),
                record: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryRecordStore;
    use crate::testing::{FakeSteam, GABE_ID, GABE_VANITY, record_for};

    #[test]
    fn seventeen_digits_is_an_id() {
        assert_eq!(
            SteamQuery::parse("76561197960287930").unwrap(),
            SteamQuery::Id(76561197960287930)
        );
        assert_eq!(
            SteamQuery::parse(" 76561197960287930 ").unwrap(),
            SteamQuery::Id(76561197960287930)
        );
    }

    #[test]
    fn other_shapes_are_vanity_names() {
        for raw in ["7656119796028793", "765611979602879300", "7656119796028793a", "gaben"] {
            assert_eq!(
                SteamQuery::parse(raw).unwrap(),
                SteamQuery::Vanity(raw.to_string()),
                "{raw}"
            );
        }
    }

    #[test]
    fn empty_or_malformed_input_is_invalid() {
        let too_long = "v".repeat(65);
        for raw in ["", "   ", "two words", "a/b", "x?key=1", too_long.as_str()] {
            assert!(
                matches!(SteamQuery::parse(raw), Err(AppError::InvalidQuery(_))),
                "{raw}"
            );
        }
    }

    #[tokio::test]
    async fn numeric_id_needs_no_lookup() {
        let store = MemoryRecordStore::new();
        let steam = FakeSteam::default();

        for id in [GABE_ID, 10_000_000_000_000_000, 99_999_999_999_999_999] {
            let raw = id.to_string();
            let query = SteamQuery::parse(&raw).unwrap();
            let resolved = resolve(&store, &steam, "key", &query).await.unwrap();
            assert_eq!(format_steam_id(resolved.id), raw);
            assert!(resolved.record.is_none());
        }
        assert_eq!(steam.total_calls(), 0);
    }

    #[tokio::test]
    async fn leading_zeros_survive_resolution() {
        let store = MemoryRecordStore::new();
        let steam = FakeSteam::default();

        let raw = "00000000000000042";
        let query = SteamQuery::parse(raw).unwrap();
        assert_eq!(query, SteamQuery::Id(42));

        let resolved = resolve(&store, &steam, "key", &query).await.unwrap();
        assert_eq!(format_steam_id(resolved.id), raw);
        assert!(is_steam_id(&format_steam_id(resolved.id)));
        assert_eq!(steam.total_calls(), 0);
    }

    #[test]
    fn canonical_form_is_seventeen_digits() {
        assert_eq!(format_steam_id(GABE_ID), "76561197960287930");
        assert_eq!(format_steam_id(0), "00000000000000000");
        assert_eq!(format_steam_id(7), "00000000000000007");
    }

    #[tokio::test]
    async fn stored_vanity_skips_upstream() {
        let store = MemoryRecordStore::new();
        store
            .put(&record_for(GABE_ID, Some(GABE_VANITY)))
            .await
            .unwrap();
        let steam = FakeSteam::default();

        let query = SteamQuery::parse(GABE_VANITY).unwrap();
        let resolved = resolve(&store, &steam, "key", &query).await.unwrap();

        assert_eq!(resolved.id, GABE_ID);
        assert!(resolved.record.is_some());
        assert!(resolved.vanity.is_none());
        assert_eq!(steam.total_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_vanity_resolves_upstream() {
        let store = MemoryRecordStore::new();
        let steam = FakeSteam::gabe();

        let query = SteamQuery::parse(GABE_VANITY).unwrap();
        let resolved = resolve(&store, &steam, "key", &query).await.unwrap();

        assert_eq!(resolved.id, GABE_ID);
        assert_eq!(resolved.vanity.as_deref(), Some(GABE_VANITY));
        assert_eq!(steam.vanity_calls(), 1);
        // 解析器本身不写存储
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unmatched_vanity_is_not_found() {
        let store = MemoryRecordStore::new();
        let steam = FakeSteam::default();

        let query = SteamQuery::parse("nobody-home").unwrap();
        let err = resolve(&store, &steam, "key", &query).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
