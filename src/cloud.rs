//! Simulated cloud backend.
//!
//! Every call sleeps for an artificial latency and may fail at random (or
//! deterministically while marked offline). Buckets are plain JSON values keyed
//! per user in a key-value store of their own, so a real network client could replace
//! this type without touching callers.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time;
use uuid::Uuid;

use crate::{
    error::{LifeSyncError, Result},
    kv::KvStore,
    models::{Session, Task},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudSettings {
    pub latency_ms: u64,
    pub logout_latency_ms: u64,
    /// Probability in `[0, 1]` that a push or pull fails.
    pub failure_rate: f64,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            latency_ms: 800,
            logout_latency_ms: 200,
            failure_rate: 0.0,
        }
    }
}

#[derive(Clone)]
pub struct CloudService {
    buckets: KvStore,
    latency: Duration,
    logout_latency: Duration,
    failure_rate: f64,
    offline: Arc<AtomicBool>,
    push_attempts: Arc<AtomicUsize>,
}

impl CloudService {
    pub fn new(buckets: impl Into<KvStore>, settings: &CloudSettings) -> Self {
        Self {
            buckets: buckets.into(),
            latency: Duration::from_millis(settings.latency_ms),
            logout_latency: Duration::from_millis(settings.logout_latency_ms),
            failure_rate: settings.failure_rate.clamp(0.0, 1.0),
            offline: Arc::new(AtomicBool::new(false)),
            push_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// While offline every push and pull fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn push_attempts(&self) -> usize {
        self.push_attempts.load(Ordering::SeqCst)
    }

    pub async fn login(&self, identifier: &str) -> Result<Session> {
        time::sleep(self.latency).await;

        let email = identifier.trim();
        let (local, domain) = email
            .split_once('@')
            .ok_or_else(|| LifeSyncError::Auth(format!("'{email}' is not an email address")))?;
        if local.is_empty() || domain.is_empty() {
            return Err(LifeSyncError::Auth(format!(
                "'{email}' is not an email address"
            )));
        }

        Ok(Session {
            id: user_id_for(email),
            email: email.to_string(),
            name: local.to_string(),
            avatar: Some(format!(
                "https://ui-avatars.com/api/?name={email}&background=6366f1&color=fff"
            )),
        })
    }

    pub async fn logout(&self) {
        time::sleep(self.logout_latency).await;
    }

    pub async fn push_tasks(&self, user_id: &str, tasks: &[Task]) -> Result<()> {
        self.push_attempts.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_string(tasks)
            .map_err(|err| LifeSyncError::Sync(format!("failed to encode tasks: {err}")))?;

        time::sleep(self.latency).await;
        self.fail_if_unreachable("push")?;

        self.buckets
            .set(&bucket_key(user_id), payload)
            .await
            .map_err(|err| LifeSyncError::Sync(format!("{err:#}")))?;
        debug!("pushed {} tasks for user {}", tasks.len(), user_id);
        Ok(())
    }

    pub async fn pull_tasks(&self, user_id: &str) -> Result<Option<Vec<Task>>> {
        time::sleep(self.latency).await;
        self.fail_if_unreachable("pull")?;

        let raw = self
            .buckets
            .get(&bucket_key(user_id))
            .await
            .map_err(|err| LifeSyncError::Sync(format!("{err:#}")))?;

        match raw {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|err| {
                LifeSyncError::Sync(format!("bucket for {user_id} is corrupt: {err}"))
            }),
            None => Ok(None),
        }
    }

    fn fail_if_unreachable(&self, operation: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            warn!("cloud {operation} failed: offline");
            return Err(LifeSyncError::Sync(format!("{operation} failed: offline")));
        }

        if self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate) {
            warn!("cloud {operation} failed: simulated outage");
            return Err(LifeSyncError::Sync(format!(
                "{operation} failed: simulated outage"
            )));
        }

        Ok(())
    }
}

/// Same address, same bucket.
pub fn user_id_for(email: &str) -> String {
    let normalized = email.trim().to_ascii_lowercase();
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{normalized}").as_bytes()).to_string()
}

fn bucket_key(user_id: &str) -> String {
    format!("cloud_db_{user_id}_tasks")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use chrono::Utc;

    fn cloud() -> CloudService {
        CloudService::new(KvStore::in_memory(), &CloudSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_derives_stable_identity() {
        let cloud = cloud();
        let first = cloud.login("ada@example.com").await.unwrap();
        let second = cloud.login("  ada@example.com ").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "ada");
        assert_eq!(first.email, "ada@example.com");
        assert!(first.avatar.unwrap().contains("ada@example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_rejects_non_email() {
        let cloud = cloud();
        for bad in ["", "ada", "@example.com", "ada@"] {
            let result = cloud.login(bad).await;
            assert!(matches!(result, Err(LifeSyncError::Auth(_))), "{bad:?} accepted");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_of_unknown_user_is_absent() {
        let cloud = cloud();
        assert_eq!(cloud.pull_tasks("nobody").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_then_pull_returns_bucket() {
        let cloud = cloud();
        let now = Utc::now();
        let tasks = vec![Task::new("Sync me", None, now, TaskPriority::Medium, now).unwrap()];

        cloud.push_tasks("u1", &tasks).await.unwrap();
        assert_eq!(cloud.pull_tasks("u1").await.unwrap(), Some(tasks));
        assert_eq!(cloud.pull_tasks("u2").await.unwrap(), None);
        assert_eq!(cloud.push_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_calls_fail_with_sync_error() {
        let cloud = cloud();
        cloud.set_offline(true);

        assert!(matches!(cloud.push_tasks("u1", &[]).await, Err(LifeSyncError::Sync(_))));
        assert!(matches!(cloud.pull_tasks("u1").await, Err(LifeSyncError::Sync(_))));

        cloud.set_offline(false);
        assert!(cloud.push_tasks("u1", &[]).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_certain_failure_rate_always_fails() {
        let settings = CloudSettings {
            failure_rate: 1.0,
            ..CloudSettings::default()
        };
        let cloud = CloudService::new(KvStore::in_memory(), &settings);
        assert!(cloud.push_tasks("u1", &[]).await.is_err());
    }
}
