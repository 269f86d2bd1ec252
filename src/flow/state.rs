use serde::Serialize;

use crate::models::{SessionStatus, SessionUpdate};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    FadingIn,
    FadingOut,
    Holding,
}

/// Count/status report sent to the session controller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub id: String,
    pub current_count: u32,
    pub status: SessionStatus,
}

impl From<ProgressUpdate> for SessionUpdate {
    fn from(update: ProgressUpdate) -> Self {
        Self {
            id: update.id,
            current_count: Some(update.current_count),
            status: Some(update.status),
        }
    }
}

/// Read-only projection of the engine for rendering.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub phrase: String,
    /// Visual emphasis in `[0, 1]`.
    pub intensity: f64,
    pub display_count: u32,
    pub target_count: u32,
    pub run_state: SessionStatus,
    pub phase: Phase,
}
