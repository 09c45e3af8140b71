//! Logged-in identity and the sync status indicator.

use std::sync::{Arc, RwLock};

use log::{info, warn};
use tokio::sync::watch;

use crate::{
    cloud::CloudService,
    error::Result,
    models::{Session, SyncStatus},
    store::LocalStore,
};

#[derive(Clone)]
pub struct AuthState {
    session: Arc<RwLock<Option<Session>>>,
    status_tx: Arc<watch::Sender<SyncStatus>>,
    store: LocalStore,
    cloud: CloudService,
}

impl AuthState {
    pub fn new(store: LocalStore, cloud: CloudService) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            session: Arc::new(RwLock::new(None)),
            status_tx: Arc::new(status_tx),
            store,
            cloud,
        }
    }

    /// Picks up a session persisted by an earlier run.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let saved = self.store.load_session().await?;
        if let Some(session) = &saved {
            info!("Restored session for {}", session.email);
        }
        self.replace_session(saved.clone());
        Ok(saved)
    }

    pub fn current(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.current().map(|session| session.id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id().is_some()
    }

    /// Leaves all state untouched when the cloud rejects the identifier.
    pub async fn login(&self, identifier: &str) -> Result<Session> {
        let session = self.cloud.login(identifier).await.inspect_err(|err| {
            warn!("Login failed: {err}");
        })?;

        self.store.save_session(&session).await?;
        self.replace_session(Some(session.clone()));
        info!("Logged in as {} ({})", session.email, session.id);
        Ok(session)
    }

    pub async fn logout(&self) -> Result<()> {
        self.cloud.logout().await;
        self.replace_session(None);
        self.store.clear_session().await?;
        self.set_sync_status(SyncStatus::Idle);
        info!("Logged out");
        Ok(())
    }

    pub fn sync_status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    pub fn set_sync_status(&self, status: SyncStatus) {
        self.status_tx.send_replace(status);
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    fn replace_session(&self, session: Option<Session>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}
