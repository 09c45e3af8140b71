use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{
    auth::AuthState,
    cloud::CloudService,
    error::Result,
    models::{SyncStatus, Task, TaskId, TaskView},
    notify::NotificationEmitter,
    store::LocalStore,
};

use super::{scanner::due_scan_loop, state::TaskList, SyncSettings};

struct PendingPush {
    timer: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the canonical task list.
///
/// Every mutation is written to the local store before the call returns and,
/// while a session is active, schedules a debounced push of the whole list.
/// A background scanner flags due tasks and raises one notification each.
#[derive(Clone)]
pub struct TaskSynchronizer {
    tasks: Arc<Mutex<TaskList>>,
    store: LocalStore,
    cloud: CloudService,
    auth: AuthState,
    notifier: Arc<dyn NotificationEmitter>,
    pending_push: Arc<Mutex<Option<PendingPush>>>,
    scanner: Arc<Mutex<Option<JoinHandle<()>>>>,
    shutdown: CancellationToken,
    debounce: Duration,
    scan_interval: Duration,
}

impl TaskSynchronizer {
    pub fn new(
        store: LocalStore,
        cloud: CloudService,
        auth: AuthState,
        notifier: Arc<dyn NotificationEmitter>,
        settings: &SyncSettings,
    ) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(TaskList::default())),
            store,
            cloud,
            auth,
            notifier,
            pending_push: Arc::new(Mutex::new(None)),
            scanner: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
            debounce: settings.debounce(),
            scan_interval: settings.scan_interval(),
        }
    }

    /// Replaces the in-memory list with whatever the local store holds.
    pub async fn load(&self) -> Result<usize> {
        let saved = self.store.load_tasks().await?;
        let count = saved.len();
        *self.tasks.lock().await = TaskList::new(saved);
        debug!("loaded {count} tasks from local store");
        Ok(count)
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().await.as_slice().to_vec()
    }

    pub async fn view(&self) -> TaskView {
        TaskView::from_tasks(self.tasks.lock().await.as_slice())
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.auth.sync_status()
    }

    pub async fn add(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        info!("adding task {} ({})", task.id, task.title);
        tasks.add(task);
        self.persist_and_sync(&tasks).await
    }

    pub async fn toggle_complete(&self, id: &TaskId) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        if !tasks.toggle_complete(id) {
            debug!("toggle ignored: no task {id}");
            return Ok(false);
        }
        self.persist_and_sync(&tasks).await?;
        Ok(true)
    }

    pub async fn delete(&self, id: &TaskId) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        if !tasks.delete(id) {
            debug!("delete ignored: no task {id}");
            return Ok(false);
        }
        self.persist_and_sync(&tasks).await?;
        Ok(true)
    }

    /// Local write first, always; the remote push only follows when someone is
    /// logged in. Callers hold the list lock so writes land in mutation order.
    async fn persist_and_sync(&self, tasks: &TaskList) -> Result<()> {
        self.store.save_tasks(tasks.as_slice()).await?;
        if self.auth.is_logged_in() {
            self.schedule_push().await;
        }
        Ok(())
    }

    async fn schedule_push(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let mut pending = self.pending_push.lock().await;
        if let Some(previous) = pending.take() {
            previous.timer.cancel();
        }

        let timer = self.shutdown.child_token();
        let deadline = Instant::now() + self.debounce;
        let this = self.clone();
        let timer_for_task = timer.clone();
        let handle = tokio::spawn(async move {
            this.push_after_quiet_period(timer_for_task, deadline).await
        });

        *pending = Some(PendingPush { timer, handle });
    }

    async fn push_after_quiet_period(&self, timer: CancellationToken, deadline: Instant) {
        tokio::select! {
            _ = timer.cancelled() => return,
            _ = time::sleep_until(deadline) => {}
        }

        // Past this point a newer mutation no longer cancels us; only shutdown does.
        let Some(user_id) = self.auth.user_id() else {
            return;
        };
        let snapshot = self.tasks().await;

        self.auth.set_sync_status(SyncStatus::Syncing);
        let outcome = tokio::select! {
            _ = self.shutdown.cancelled() => {
                self.auth.set_sync_status(SyncStatus::Idle);
                return;
            }
            outcome = self.cloud.push_tasks(&user_id, &snapshot) => outcome,
        };

        match outcome {
            Ok(()) => {
                debug!("pushed {} tasks", snapshot.len());
                self.auth.set_sync_status(SyncStatus::Synced);
            }
            Err(err) => {
                warn!("push failed, keeping local copy: {err}");
                self.auth.set_sync_status(SyncStatus::Error);
            }
        }
    }

    /// Waits for the currently scheduled push, if any, to finish.
    pub async fn settle(&self) {
        let pending = self.pending_push.lock().await.take();
        if let Some(pending) = pending {
            if let Err(err) = pending.handle.await {
                warn!("push task ended abnormally: {err}");
            }
        }
    }

    /// Pulls the user's bucket. A non-empty bucket replaces the local list
    /// wholesale; an empty or missing one leaves it alone. The replacement is
    /// stored locally but never pushed back.
    pub async fn on_login(&self, user_id: &str) -> Result<()> {
        self.auth.set_sync_status(SyncStatus::Syncing);

        let pulled = tokio::select! {
            _ = self.shutdown.cancelled() => {
                self.auth.set_sync_status(SyncStatus::Idle);
                return Ok(());
            }
            pulled = self.cloud.pull_tasks(user_id) => pulled,
        };

        match pulled {
            Ok(Some(remote)) if !remote.is_empty() => {
                let mut tasks = self.tasks.lock().await;
                info!("replacing {} local tasks with {} from cloud", tasks.len(), remote.len());
                tasks.replace(remote);
                self.store.save_tasks(tasks.as_slice()).await?;
            }
            Ok(_) => debug!("cloud bucket for {user_id} is empty; keeping local tasks"),
            Err(err) => {
                warn!("pull failed, keeping local copy: {err}");
                self.auth.set_sync_status(SyncStatus::Error);
                return Ok(());
            }
        }

        self.auth.set_sync_status(SyncStatus::Synced);
        Ok(())
    }

    /// Drops any push that has not been dispatched yet. Local tasks stay.
    pub async fn on_logout(&self) {
        if let Some(pending) = self.pending_push.lock().await.take() {
            pending.timer.cancel();
        }
    }

    /// Notifies every task that is open, not yet notified and due at `now`.
    pub async fn scan_due_tasks(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tasks = self.tasks.lock().await;
        let newly_due = tasks.mark_due(now);
        if newly_due.is_empty() {
            return Ok(0);
        }

        for task in &newly_due {
            self.notifier.emit(
                &task.notification_title(),
                task.notification_body(),
                task.id.as_str(),
            );
        }

        self.persist_and_sync(&tasks).await?;
        Ok(newly_due.len())
    }

    pub async fn start(&self) {
        if self.shutdown.is_cancelled() {
            warn!("synchronizer already shut down; scanner not started");
            return;
        }

        let mut scanner = self.scanner.lock().await;
        if let Some(handle) = scanner.take() {
            handle.abort();
        }

        let this = self.clone();
        let period = self.scan_interval;
        let token = self.shutdown.child_token();
        *scanner = Some(tokio::spawn(due_scan_loop(this, period, token)));
        info!("due scanner started ({}s period)", period.as_secs());
    }

    /// Stops the scanner and any pending or in-flight push. Nothing touches
    /// the cloud or the notifier afterwards.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let pending = self.pending_push.lock().await.take();
        if let Some(pending) = pending {
            let _ = pending.handle.await;
        }

        let scanner = self.scanner.lock().await.take();
        if let Some(handle) = scanner {
            if let Err(err) = handle.await {
                warn!("due scanner ended abnormally: {err}");
            }
        }
    }
}
