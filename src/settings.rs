use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::{assist::AssistSettings, cloud::CloudSettings, notify::Permission, sync::SyncSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationSettings {
    pub permission: Permission,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub sync: SyncSettings,
    pub cloud: CloudSettings,
    pub assist: AssistSettings,
    pub notifications: NotificationSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppSettings>,
}

impl SettingsStore {
    /// Missing or unreadable JSON falls back to defaults; only I/O errors on
    /// an existing file are reported.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("ignoring malformed settings at {}: {err}", path.display());
                AppSettings::default()
            })
        } else {
            AppSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> AppSettings {
        self.data
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn notification_permission(&self) -> Permission {
        self.snapshot().notifications.permission
    }

    pub fn update_notification_permission(&self, permission: Permission) -> Result<()> {
        self.update(|settings| settings.notifications.permission = permission)
    }

    pub fn update(&self, apply: impl FnOnce(&mut AppSettings)) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        apply(&mut *guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &AppSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
