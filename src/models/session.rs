use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_INTERVAL_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Running,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "Running",
            SessionStatus::Paused => "Paused",
            SessionStatus::Completed => "Completed",
        }
    }
}

/// One rejected field of a [`SessionSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Please enter a phrase.")]
    EmptyPhrase,
    #[error("Repetitions must be a number greater than 0.")]
    TargetCount,
    #[error("Interval must be at least 0.5 seconds.")]
    Interval,
}

/// Every field error found while validating settings, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.0))]
pub struct InvalidSettings(pub Vec<SettingsError>);

fn join_errors(errors: &[SettingsError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub phrase: String,
    pub target_count: u32,
    /// Hold time per repetition, in seconds.
    pub interval: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            phrase: "Subhan'Allah".into(),
            target_count: 33,
            interval: 2.0,
        }
    }
}

impl SessionSettings {
    /// Trims the phrase and checks every field, returning all failures at once.
    pub fn validate(self) -> Result<Self, InvalidSettings> {
        let phrase = self.phrase.trim().to_string();
        let mut errors = Vec::new();

        if phrase.is_empty() {
            errors.push(SettingsError::EmptyPhrase);
        }
        if self.target_count == 0 {
            errors.push(SettingsError::TargetCount);
        }
        if !self.interval.is_finite() || self.interval < MIN_INTERVAL_SECS {
            errors.push(SettingsError::Interval);
        }

        if errors.is_empty() {
            Ok(Self { phrase, ..self })
        } else {
            Err(InvalidSettings(errors))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Creation time as RFC 3339 with millisecond precision; also the sort key.
    pub id: String,
    pub phrase: String,
    pub target_count: u32,
    pub interval: f64,
    pub current_count: u32,
    pub status: SessionStatus,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, settings: SessionSettings, now: DateTime<Utc>) -> Self {
        Self {
            id,
            phrase: settings.phrase,
            target_count: settings.target_count,
            interval: settings.interval,
            current_count: 1,
            status: SessionStatus::Running,
            updated_at: now,
        }
    }

    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            phrase: self.phrase.clone(),
            target_count: self.target_count,
            interval: self.interval,
        }
    }

    pub fn interval_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval)
            .unwrap_or_else(|_| Duration::from_secs_f64(MIN_INTERVAL_SECS))
    }

    pub fn display_count(&self) -> u32 {
        self.current_count.min(self.target_count)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.id)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn apply(&mut self, update: &SessionUpdate, now: DateTime<Utc>) {
        if let Some(count) = update.current_count {
            self.current_count = count;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

pub fn session_id_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Partial change to one session record, matched by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub id: String,
    pub current_count: Option<u32>,
    pub status: Option<SessionStatus>,
}
