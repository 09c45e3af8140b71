//! Local notification surface.

use std::{
    collections::HashSet,
    sync::{Mutex, RwLock},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    #[default]
    Default,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Default => "default",
        }
    }
}

pub trait NotificationEmitter: Send + Sync {
    fn permission(&self) -> Permission;

    /// Never returns [`Permission::Default`].
    fn request_permission(&self) -> Permission;

    /// Applies a choice the user made outside of a prompt.
    fn set_permission(&self, permission: Permission);

    /// No-op unless permission is granted. Repeats of `tag` replace the
    /// earlier alert instead of stacking.
    fn emit(&self, title: &str, body: &str, tag: &str);
}

/// Prints alerts to stdout.
pub struct ConsoleNotifier {
    permission: RwLock<Permission>,
    shown_tags: Mutex<HashSet<String>>,
}

impl ConsoleNotifier {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission: RwLock::new(permission),
            shown_tags: Mutex::new(HashSet::new()),
        }
    }
}

impl NotificationEmitter for ConsoleNotifier {
    fn permission(&self) -> Permission {
        self.permission
            .read()
            .map(|guard| *guard)
            .unwrap_or(Permission::Denied)
    }

    fn request_permission(&self) -> Permission {
        let Ok(mut guard) = self.permission.write() else {
            return Permission::Denied;
        };
        // A terminal can always show text; only an explicit denial sticks.
        if *guard != Permission::Denied {
            *guard = Permission::Granted;
        }
        *guard
    }

    fn set_permission(&self, permission: Permission) {
        if let Ok(mut guard) = self.permission.write() {
            *guard = permission;
        }
    }

    fn emit(&self, title: &str, body: &str, tag: &str) {
        if self.permission() != Permission::Granted {
            warn!("Cannot send notification: permission not granted ({title})");
            return;
        }

        let first_time = match self.shown_tags.lock() {
            Ok(mut tags) => tags.insert(tag.to_string()),
            Err(_) => true,
        };
        if !first_time {
            debug!("notification {tag} replaced");
            return;
        }

        info!("notification {tag}: {title}");
        println!("\u{1F514} {title}\n   {body}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedNotification {
    pub title: String,
    pub body: String,
    pub tag: String,
}

/// Keeps every accepted alert in memory; handy for embedding and tests.
pub struct RecordingNotifier {
    permission: RwLock<Permission>,
    emitted: Mutex<Vec<EmittedNotification>>,
}

impl RecordingNotifier {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission: RwLock::new(permission),
            emitted: Mutex::new(Vec::new()),
        }
    }

    pub fn emitted(&self) -> Vec<EmittedNotification> {
        self.emitted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl NotificationEmitter for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.permission
            .read()
            .map(|guard| *guard)
            .unwrap_or(Permission::Denied)
    }

    fn request_permission(&self) -> Permission {
        let Ok(mut guard) = self.permission.write() else {
            return Permission::Denied;
        };
        if *guard == Permission::Default {
            *guard = Permission::Granted;
        }
        *guard
    }

    fn set_permission(&self, permission: Permission) {
        if let Ok(mut guard) = self.permission.write() {
            *guard = permission;
        }
    }

    fn emit(&self, title: &str, body: &str, tag: &str) {
        if self.permission() != Permission::Granted {
            return;
        }
        if let Ok(mut emitted) = self.emitted.lock() {
            emitted.push(EmittedNotification {
                title: title.to_string(),
                body: body.to_string(),
                tag: tag.to_string(),
            });
        }
    }
}
