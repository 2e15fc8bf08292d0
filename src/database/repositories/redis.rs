use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient, Script};

use crate::database::{
    PreparedPut, RecordStore, UserRecord, keys, prepare_put, vanity_conflict,
};
use crate::error::AppError;

/// 乐观写入的最大尝试次数
const MAX_PUT_ATTEMPTS: usize = 3;

/// 比较并写入：主记录与读取时不一致则要求重试；
/// 个性化名称已绑定其他 SteamID 时拒绝；否则一次性写入记录、索引和最近列表。
///
/// KEYS: 记录, 最近列表, 新名称索引, 旧名称索引
/// ARGV: 读取时的记录 JSON（无则为空）, 新记录 JSON, SteamID, 创建时间, 有新名称, 有旧名称
const PUT_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if (current or '') ~= ARGV[1] then
  return 'retry'
end
if ARGV[5] == '1' then
  local bound = redis.call('GET', KEYS[3])
  if bound and bound ~= ARGV[3] then
    return 'conflict:' .. bound
  end
end
redis.call('SET', KEYS[1], ARGV[2])
if ARGV[6] == '1' and redis.call('GET', KEYS[4]) == ARGV[3] then
  redis.call('DEL', KEYS[4])
end
if ARGV[5] == '1' then
  redis.call('SET', KEYS[3], ARGV[3])
end
redis.call('ZADD', KEYS[2], ARGV[4], ARGV[3])
return 'ok'
"#;

/// 写入脚本的返回结果
#[derive(Debug, PartialEq, Eq)]
enum PutOutcome {
    Stored,
    Retry,
    Conflict(u64),
}

fn parse_put_reply(reply: &str) -> Result<PutOutcome, AppError> {
    match reply {
        "ok" => Ok(PutOutcome::Stored),
        "retry" => Ok(PutOutcome::Retry),
        other => other
            .strip_prefix("conflict:")
            .and_then(|id| id.parse().ok())
            .map(PutOutcome::Conflict)
            .ok_or_else(|| AppError::Store(format!("unexpected reply from put script: {}", other))),
    }
}

/// 基于 Redis 的键值存储
///
/// 每条记录以 JSON 保存在 `steam:user:{id}`，个性化名称索引保存在
/// `steam:vanity:{name}`，写入由一个 Lua 脚本原子完成。
#[derive(Clone)]
pub struct RedisRecordStore {
    redis: Arc<RedisClient>,
    put_script: Script,
}

impl RedisRecordStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self {
            redis,
            put_script: Script::new(PUT_SCRIPT),
        }
    }

    fn decode(json: &str) -> Result<UserRecord, AppError> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Store(format!("corrupted user record: {}", e)))
    }

    fn encode(record: &UserRecord) -> Result<String, AppError> {
        serde_json::to_string(record)
            .map_err(|e| AppError::Store(format!("failed to encode user record: {}", e)))
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn get_by_id(&self, id: u64) -> Result<Option<UserRecord>, AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let json: Option<String> = conn.get(keys::user_record_key(id)).await?;
        json.as_deref().map(Self::decode).transpose()
    }

    async fn get_by_vanity(&self, vanity: &str) -> Result<Option<UserRecord>, AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let id: Option<u64> = conn.get(keys::vanity_index_key(vanity)).await?;
        match id {
            Some(id) => {
                let json: Option<String> = conn.get(keys::user_record_key(id)).await?;
                if json.is_none() {
                    tracing::warn!(vanity = %vanity, steam_id = id, "vanity index points to a missing record");
                }
                json.as_deref().map(Self::decode).transpose()
            }
            None => Ok(None),
        }
    }

    async fn put(&self, record: &UserRecord) -> Result<(), AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let user_key = keys::user_record_key(record.id);

        for attempt in 1..=MAX_PUT_ATTEMPTS {
            let previous: Option<String> = conn.get(&user_key).await?;
            let previous_vanity = match previous.as_deref() {
                Some(json) => Self::decode(json)?.vanity_url,
                None => None,
            };

            let PreparedPut {
                record: stored,
                stale_vanity,
            } = prepare_put(record, previous_vanity);
            let json = Self::encode(&stored)?;

            let reply: String = self
                .put_script
                .key(&user_key)
                .key(keys::latest_users_key())
                .key(stored.vanity_url.as_deref().map(keys::vanity_index_key).unwrap_or_default())
                .key(stale_vanity.as_deref().map(keys::vanity_index_key).unwrap_or_default())
                .arg(previous.unwrap_or_default())
                .arg(json)
                .arg(stored.id)
                .arg(stored.created_at.timestamp())
                .arg(if stored.vanity_url.is_some() { "1" } else { "0" })
                .arg(if stale_vanity.is_some() { "1" } else { "0" })
                .invoke_async(&mut conn)
                .await?;

            match parse_put_reply(&reply)? {
                PutOutcome::Stored => {
                    tracing::debug!(steam_id = stored.id, vanity = ?stored.vanity_url, "user record stored in redis");
                    return Ok(());
                }
                PutOutcome::Conflict(bound) => {
                    let vanity = stored.vanity_url.as_deref().unwrap_or_default();
                    return Err(vanity_conflict(vanity, bound));
                }
                PutOutcome::Retry => {
                    tracing::debug!(steam_id = stored.id, attempt, "user record changed during put, retrying");
                }
            }
        }

        Err(AppError::Store(format!(
            "user record {} kept changing during put",
            record.id
        )))
    }

    async fn latest(&self, limit: usize) -> Result<Vec<UserRecord>, AppError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let ids: Vec<u64> = conn
            .zrevrange(keys::latest_users_key(), 0, limit as isize - 1)
            .await?;

        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            let json: Option<String> = conn.get(keys::user_record_key(id)).await?;
            if let Some(json) = json {
                users.push(Self::decode(&json)?);
            }
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record_for;

    #[test]
    fn script_replies_are_parsed() {
        assert_eq!(parse_put_reply("ok").unwrap(), PutOutcome::Stored);
        assert_eq!(parse_put_reply("retry").unwrap(), PutOutcome::Retry);
        assert_eq!(
            parse_put_reply("conflict:76561197960287930").unwrap(),
            PutOutcome::Conflict(76561197960287930)
        );
        assert!(matches!(parse_put_reply("conflict:abc"), Err(AppError::Store(_))));
        assert!(matches!(parse_put_reply("QUEUED"), Err(AppError::Store(_))));
    }

    #[test]
    fn corrupted_record_is_a_store_error() {
        let err = RedisRecordStore::decode("{not json").unwrap_err();
        assert!(matches!(err, AppError::Store(msg) if msg.starts_with("corrupted user record")));
    }

    #[test]
    fn encoded_record_decodes_back() {
        let record = record_for(7, Some("seven"));
        let json = RedisRecordStore::encode(&record).unwrap();
        assert_eq!(RedisRecordStore::decode(&json).unwrap(), record);
    }
}
