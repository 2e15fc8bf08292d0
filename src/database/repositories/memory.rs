use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::database::{PreparedPut, RecordStore, UserRecord, check_vanity_binding, prepare_put};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    users: HashMap<u64, UserRecord>,
    vanity: HashMap<String, u64>,
}

/// 进程内存储，主表与索引共用一把锁
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.read().map(|t| t.users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> AppError {
    AppError::Store("memory store lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_by_id(&self, id: u64) -> Result<Option<UserRecord>, AppError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.users.get(&id).cloned())
    }

    async fn get_by_vanity(&self, vanity: &str) -> Result<Option<UserRecord>, AppError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables
            .vanity
            .get(&vanity.to_ascii_lowercase())
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn put(&self, record: &UserRecord) -> Result<(), AppError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;

        let bound = record
            .vanity_url
            .as_ref()
            .and_then(|vanity| tables.vanity.get(&vanity.to_ascii_lowercase()).copied());
        check_vanity_binding(record, bound)?;

        let previous_vanity = tables
            .users
            .get(&record.id)
            .and_then(|u| u.vanity_url.clone());
        let PreparedPut {
            record: stored,
            stale_vanity,
        } = prepare_put(record, previous_vanity);

        if let Some(old) = stale_vanity {
            tables.vanity.remove(&old.to_ascii_lowercase());
        }
        if let Some(vanity) = &stored.vanity_url {
            tables.vanity.insert(vanity.to_ascii_lowercase(), stored.id);
        }
        tables.users.insert(stored.id, stored);
        Ok(())
    }

    async fn latest(&self, limit: usize) -> Result<Vec<UserRecord>, AppError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let mut users: Vec<UserRecord> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        users.truncate(limit);
        Ok(users)
    }
}
