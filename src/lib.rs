pub mod assist;
pub mod auth;
pub mod cli;
pub mod cloud;
pub mod db;
pub mod error;
pub mod kv;
pub mod models;
pub mod notify;
pub mod settings;
pub mod store;
pub mod sync;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use log::info;

use auth::AuthState;
use cli::{Cli, Commands};
use cloud::CloudService;
use db::Database;
use error::Result;
use kv::KvStore;
use models::Session;
use notify::{ConsoleNotifier, NotificationEmitter};
use settings::{AppSettings, SettingsStore};
use store::LocalStore;
use sync::TaskSynchronizer;

pub const APP_NAME: &str = "LifeSync";
pub const DEBUG_ENV: &str = "LIFESYNC_DEBUG";

/// Everything one running instance shares: the local store, the simulated
/// cloud, the session and the synchronizer built on top of them.
#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub cloud: CloudService,
    pub auth: AuthState,
    pub sync: TaskSynchronizer,
    pub notifier: Arc<dyn NotificationEmitter>,
}

impl AppState {
    /// Opens (or creates) the on-disk stores under `data_dir`, restores the
    /// persisted session and loads the saved task list.
    pub async fn open(
        data_dir: &std::path::Path,
        settings: &AppSettings,
        notifier: Arc<dyn NotificationEmitter>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let local = Database::new(data_dir.join("local.sqlite3"))?;
        let cloud = Database::new(data_dir.join("cloud.sqlite3"))?;

        let state = Self::with_backends(local, cloud, settings, notifier);
        state.restore().await?;
        Ok(state)
    }

    pub fn with_backends(
        local: impl Into<KvStore>,
        cloud: impl Into<KvStore>,
        settings: &AppSettings,
        notifier: Arc<dyn NotificationEmitter>,
    ) -> Self {
        let store = LocalStore::new(local);
        let cloud = CloudService::new(cloud, &settings.cloud);
        let auth = AuthState::new(store.clone(), cloud.clone());
        let sync = TaskSynchronizer::new(
            store.clone(),
            cloud.clone(),
            auth.clone(),
            notifier.clone(),
            &settings.sync,
        );

        Self {
            store,
            cloud,
            auth,
            sync,
            notifier,
        }
    }

    pub async fn restore(&self) -> Result<Option<Session>> {
        let session = self.auth.restore().await?;
        self.sync.load().await?;
        Ok(session)
    }

    /// Establishes the session, then pulls the user's cloud bucket.
    pub async fn login(&self, identifier: &str) -> Result<Session> {
        let session = self.auth.login(identifier).await?;
        self.sync.on_login(&session.id).await?;
        Ok(session)
    }

    /// Local tasks survive logout; only the session and pending push go.
    pub async fn logout(&self) -> Result<()> {
        self.sync.on_logout().await;
        self.auth.logout().await
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("lifesync")
}

pub async fn run() -> anyhow::Result<()> {
    let level = if std::env::var(DEBUG_ENV).is_ok() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);

    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;
    let settings = settings_store.snapshot();
    let notifier: Arc<dyn NotificationEmitter> =
        Arc::new(ConsoleNotifier::new(settings.notifications.permission));

    let state = AppState::open(&data_dir, &settings, notifier).await?;
    info!("{APP_NAME} data directory: {}", data_dir.display());

    let outcome = match cli.command {
        Commands::Add(args) => cli::tasks::run_add(&state, args).await,
        Commands::SmartAdd(args) => cli::tasks::run_smart_add(&state, &settings, args).await,
        Commands::List(args) => cli::tasks::run_list(&state, args).await,
        Commands::Toggle { id } => cli::tasks::run_toggle(&state, &id).await,
        Commands::Delete { id } => cli::tasks::run_delete(&state, &id).await,
        Commands::Login { email } => cli::account::run_login(&state, &email).await,
        Commands::Logout => cli::account::run_logout(&state).await,
        Commands::Status => cli::account::run_status(&state).await,
        Commands::Pull => cli::account::run_pull(&state).await,
        Commands::Watch => cli::watch::run(&state).await,
        Commands::Notifications { command } => {
            cli::notifications::run(&state, &settings_store, command)
        }
        Commands::City { query } => cli::tasks::run_city(&settings, &query).await,
    };

    // One-shot commands leave at most one push behind; let it land.
    state.sync.settle().await;
    outcome
}
