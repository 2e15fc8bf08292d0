mod memory;
mod postgres;
mod redis;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;
pub use redis::RedisRecordStore;
