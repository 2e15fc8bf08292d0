/// 用户记录键前缀
const USER_RECORD_PREFIX: &str = "steam:user:";

/// 个性化名称索引键前缀
const VANITY_INDEX_PREFIX: &str = "steam:vanity:";

/// 按创建时间排序的用户集合
const LATEST_USERS_KEY: &str = "steam:users:latest";

/// 生成用户记录键
pub fn user_record_key(id: u64) -> String {
    format!("{}{}", USER_RECORD_PREFIX, id)
}

/// 生成个性化名称索引键，名称不区分大小写
pub fn vanity_index_key(vanity: &str) -> String {
    format!("{}{}", VANITY_INDEX_PREFIX, vanity.to_ascii_lowercase())
}

pub fn latest_users_key() -> &'static str {
    LATEST_USERS_KEY
}
