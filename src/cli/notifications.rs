use anyhow::Result;
use clap::Subcommand;

use crate::{
    notify::{NotificationEmitter, Permission},
    settings::SettingsStore,
    AppState, APP_NAME,
};

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// Allow due-task alerts
    Enable,
    /// Block due-task alerts
    Disable,
    /// Show the current permission
    Status,
    /// Send a sample alert
    Test,
}

pub fn run(
    state: &AppState,
    settings: &SettingsStore,
    command: NotificationCommands,
) -> Result<()> {
    match command {
        NotificationCommands::Enable => {
            let permission = enable(state.notifier.as_ref(), settings)?;
            println!("Notifications {}", permission.as_str());
        }
        NotificationCommands::Disable => {
            disable(state.notifier.as_ref(), settings)?;
            println!("Notifications denied");
        }
        NotificationCommands::Status => {
            println!("Notifications {}", settings.notification_permission().as_str());
        }
        NotificationCommands::Test => {
            if state.notifier.permission() != Permission::Granted {
                println!("Run `lifesync notifications enable` first");
                return Ok(());
            }
            state
                .notifier
                .emit(APP_NAME, "Notifications are working.", "lifesync-test");
        }
    }
    Ok(())
}

/// Running `enable` is itself the user's answer, so an earlier denial is
/// lifted before asking. A grant is confirmed with an alert.
pub fn enable(notifier: &dyn NotificationEmitter, settings: &SettingsStore) -> Result<Permission> {
    if notifier.permission() == Permission::Denied {
        notifier.set_permission(Permission::Default);
    }

    let permission = notifier.request_permission();
    settings.update_notification_permission(permission)?;

    if permission == Permission::Granted {
        notifier.emit(
            "Notifications Enabled",
            "You will receive task reminders.",
            "lifesync-enabled",
        );
    }
    Ok(permission)
}

pub fn disable(notifier: &dyn NotificationEmitter, settings: &SettingsStore) -> Result<()> {
    notifier.set_permission(Permission::Denied);
    settings.update_notification_permission(Permission::Denied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.json")).unwrap()
    }

    #[test]
    fn test_enable_grants_persists_and_confirms() {
        let dir = TempDir::new().unwrap();
        let store = settings(&dir);
        let notifier = RecordingNotifier::new(Permission::Default);

        assert_eq!(enable(&notifier, &store).unwrap(), Permission::Granted);
        assert_eq!(store.notification_permission(), Permission::Granted);

        let emitted = notifier.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].title, "Notifications Enabled");
        assert_eq!(emitted[0].body, "You will receive task reminders.");
    }

    #[test]
    fn test_enable_after_disable_grants_again() {
        let dir = TempDir::new().unwrap();
        let store = settings(&dir);
        let notifier = RecordingNotifier::new(Permission::Granted);

        disable(&notifier, &store).unwrap();
        assert_eq!(notifier.permission(), Permission::Denied);
        assert_eq!(store.notification_permission(), Permission::Denied);
        notifier.emit("Task Due: x", "body", "1");
        assert!(notifier.emitted().is_empty());

        assert_eq!(enable(&notifier, &store).unwrap(), Permission::Granted);
        assert_eq!(notifier.emitted().len(), 1);
    }
}
