use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};

use crate::db::Database;

/// String key-value storage, either SQLite-backed or process-local.
#[derive(Clone)]
pub enum KvStore {
    Sqlite(Database),
    Memory(Arc<Mutex<HashMap<String, String>>>),
}

impl KvStore {
    pub fn in_memory() -> Self {
        KvStore::Memory(Arc::new(Mutex::new(HashMap::new())))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            KvStore::Sqlite(db) => db.get_value(key).await,
            KvStore::Memory(map) => Ok(lock(map)?.get(key).cloned()),
        }
    }

    pub async fn set(&self, key: &str, value: String) -> Result<()> {
        match self {
            KvStore::Sqlite(db) => db.set_value(key, value).await,
            KvStore::Memory(map) => {
                lock(map)?.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        match self {
            KvStore::Sqlite(db) => db.remove_value(key).await,
            KvStore::Memory(map) => {
                lock(map)?.remove(key);
                Ok(())
            }
        }
    }
}

impl From<Database> for KvStore {
    fn from(db: Database) -> Self {
        KvStore::Sqlite(db)
    }
}

fn lock(
    map: &Mutex<HashMap<String, String>>,
) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
    map.lock().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_and_sqlite_backends_agree() -> Result<()> {
        for store in [KvStore::in_memory(), KvStore::from(Database::open_in_memory()?)] {
            assert_eq!(store.get("k").await?, None);
            store.set("k", "v1".into()).await?;
            store.set("k", "v2".into()).await?;
            assert_eq!(store.get("k").await?.as_deref(), Some("v2"));
            store.remove("k").await?;
            assert_eq!(store.get("k").await?, None);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_clones_share_contents() -> Result<()> {
        let store = KvStore::in_memory();
        let other = store.clone();
        store.set("shared", "yes".into()).await?;
        assert_eq!(other.get("shared").await?.as_deref(), Some("yes"));
        Ok(())
    }
}
