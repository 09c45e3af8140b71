use std::sync::Arc;

use chrono::{Duration, Utc};
use lifesync::{
    cloud::CloudSettings,
    models::{Task, TaskPriority},
    notify::{NotificationEmitter, Permission, RecordingNotifier},
    settings::AppSettings,
    sync::SyncSettings,
    AppState,
};
use tempfile::TempDir;

fn fast_settings() -> AppSettings {
    AppSettings {
        sync: SyncSettings {
            debounce_ms: 10,
            scan_interval_secs: 15,
        },
        cloud: CloudSettings {
            latency_ms: 0,
            logout_latency_ms: 0,
            failure_rate: 0.0,
        },
        ..AppSettings::default()
    }
}

fn notifier() -> Arc<dyn NotificationEmitter> {
    Arc::new(RecordingNotifier::new(Permission::Granted))
}

#[tokio::test]
async fn test_tasks_and_session_survive_restart() {
    let dir = TempDir::new().unwrap();
    let now = Utc::now();

    let expected = {
        let state = AppState::open(dir.path(), &fast_settings(), notifier())
            .await
            .unwrap();
        state.login("grace@example.com").await.unwrap();

        let first = Task::new(
            "Renew passport",
            Some("bring photos".into()),
            now + Duration::days(3),
            TaskPriority::High,
            now,
        )
        .unwrap();
        let first_id = first.id.clone();
        state.sync.add(first).await.unwrap();
        state
            .sync
            .add(Task::new("Water plants", None, now, TaskPriority::Low, now).unwrap())
            .await
            .unwrap();
        state.sync.toggle_complete(&first_id).await.unwrap();
        state.sync.settle().await;
        state.sync.tasks().await
    };

    let reopened = AppState::open(dir.path(), &fast_settings(), notifier())
        .await
        .unwrap();

    assert_eq!(reopened.sync.tasks().await, expected);
    let session = reopened.auth.current().unwrap();
    assert_eq!(session.email, "grace@example.com");

    // The simulated cloud is on disk too.
    let remote = reopened.cloud.pull_tasks(&session.id).await.unwrap();
    assert_eq!(remote, Some(expected));
}

#[tokio::test]
async fn test_second_device_picks_up_cloud_copy_on_login() {
    let laptop_dir = TempDir::new().unwrap();
    let phone_dir = TempDir::new().unwrap();
    let now = Utc::now();

    let laptop = AppState::open(laptop_dir.path(), &fast_settings(), notifier())
        .await
        .unwrap();
    laptop.login("lin@example.com").await.unwrap();
    laptop
        .sync
        .add(Task::new("Book flights", None, now, TaskPriority::Medium, now).unwrap())
        .await
        .unwrap();
    laptop.sync.settle().await;

    // Both devices talk to the same cloud store.
    let phone = AppState::with_backends(
        lifesync::db::Database::new(phone_dir.path().join("local.sqlite3")).unwrap(),
        lifesync::db::Database::new(laptop_dir.path().join("cloud.sqlite3")).unwrap(),
        &fast_settings(),
        notifier(),
    );
    phone.restore().await.unwrap();
    phone
        .sync
        .add(Task::new("Phone note", None, now, TaskPriority::Low, now).unwrap())
        .await
        .unwrap();

    phone.login("lin@example.com").await.unwrap();

    let titles: Vec<String> = phone
        .sync
        .tasks()
        .await
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["Book flights".to_string()]);
}

#[tokio::test]
async fn test_logout_keeps_local_tasks_across_restart() {
    let dir = TempDir::new().unwrap();
    let now = Utc::now();

    {
        let state = AppState::open(dir.path(), &fast_settings(), notifier())
            .await
            .unwrap();
        state.login("kim@example.com").await.unwrap();
        state
            .sync
            .add(Task::new("Keep me", None, now, TaskPriority::Medium, now).unwrap())
            .await
            .unwrap();
        state.sync.settle().await;
        state.logout().await.unwrap();
    }

    let reopened = AppState::open(dir.path(), &fast_settings(), notifier())
        .await
        .unwrap();
    assert!(reopened.auth.current().is_none());
    assert_eq!(reopened.sync.tasks().await.len(), 1);
}
