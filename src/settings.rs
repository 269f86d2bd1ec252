use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::models::SessionSettings;

pub const DEFAULT_FRAME_RATE_HZ: u32 = 60;
const MAX_FRAME_RATE_HZ: u32 = 240;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertSettings {
    pub enabled: bool,
    /// Audible chime when built with the `chime` feature; terminal bell otherwise.
    pub chime: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            chime: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub defaults: SessionSettings,
    pub alert: AlertSettings,
    pub frame_rate_hz: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            defaults: SessionSettings::default(),
            alert: AlertSettings::default(),
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }
}

impl UserSettings {
    pub fn frame_interval(&self) -> Duration {
        let hz = self.frame_rate_hz.clamp(1, MAX_FRAME_RATE_HZ);
        Duration::from_secs_f64(1.0 / f64::from(hz))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> UserSettings {
        self.read().clone()
    }

    pub fn defaults(&self) -> SessionSettings {
        self.read().defaults.clone()
    }

    pub fn alert(&self) -> AlertSettings {
        self.read().alert.clone()
    }

    pub fn frame_interval(&self) -> Duration {
        self.read().frame_interval()
    }

    pub fn update_defaults(&self, defaults: SessionSettings) -> Result<()> {
        let defaults = defaults.validate()?;
        let mut guard = self.write();
        guard.defaults = defaults;
        self.persist(&guard)
    }

    pub fn update_alert(&self, alert: AlertSettings) -> Result<()> {
        let mut guard = self.write();
        guard.alert = alert;
        self.persist(&guard)
    }

    pub fn update_frame_rate(&self, hz: u32) -> Result<()> {
        let mut guard = self.write();
        guard.frame_rate_hz = hz.clamp(1, MAX_FRAME_RATE_HZ);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
