//! Local persistence of the task list and the session.
//!
//! The local copy is the source of truth: every write is awaited by the caller
//! and failures surface as [`LifeSyncError::StorageFault`].

use anyhow::Context;

use crate::{
    error::{LifeSyncError, Result},
    kv::KvStore,
    models::{Session, Task},
};

pub const TASKS_KEY: &str = "ls_tasks";
pub const SESSION_KEY: &str = "ls_user_session";

#[derive(Clone)]
pub struct LocalStore {
    kv: KvStore,
}

impl LocalStore {
    pub fn new(kv: impl Into<KvStore>) -> Self {
        Self { kv: kv.into() }
    }

    pub fn in_memory() -> Self {
        Self::new(KvStore::in_memory())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.kv.get(key).await.map_err(LifeSyncError::storage)
    }

    pub async fn set(&self, key: &str, value: String) -> Result<()> {
        self.kv.set(key, value).await.map_err(LifeSyncError::storage)
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.kv.remove(key).await.map_err(LifeSyncError::storage)
    }

    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        match self.get(TASKS_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .context("stored task list is not valid JSON")
                .map_err(LifeSyncError::storage),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        let serialized = encode_tasks(tasks)?;
        self.set(TASKS_KEY, serialized).await
    }

    pub async fn load_session(&self) -> Result<Option<Session>> {
        match self.get(SESSION_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .context("stored session is not valid JSON")
                .map_err(LifeSyncError::storage),
            None => Ok(None),
        }
    }

    pub async fn save_session(&self, session: &Session) -> Result<()> {
        let serialized = serde_json::to_string(session)
            .context("failed to serialize session")
            .map_err(LifeSyncError::storage)?;
        self.set(SESSION_KEY, serialized).await
    }

    pub async fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_KEY).await
    }
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String> {
    serde_json::to_string(tasks)
        .context("failed to serialize task list")
        .map_err(LifeSyncError::storage)
}
