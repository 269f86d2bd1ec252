use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};

use crate::models::{
    session_id_at, InvalidSettings, Session, SessionSettings, SessionStatus, SessionUpdate,
};

use super::store::SessionStore;

/// Owns the session list and the active-session designation, and mirrors
/// every change into the store. Store failures are logged and swallowed.
pub struct SessionController<S: SessionStore> {
    store: S,
    /// Newest first.
    sessions: Vec<Session>,
    active_id: Option<String>,
}

impl<S: SessionStore> SessionController<S> {
    /// Loads history. A record still marked running was interrupted by a crash
    /// or kill and comes back paused.
    pub async fn load(store: S) -> Self {
        let mut sessions = match store.load().await {
            Ok(sessions) => sessions,
            Err(err) => {
                error!("Failed to load session history: {err:?}");
                Vec::new()
            }
        };
        sessions.sort_by(|a, b| b.id.cmp(&a.id));

        let now = Utc::now();
        let mut recovered = Vec::new();
        for session in sessions
            .iter_mut()
            .filter(|session| session.status == SessionStatus::Running)
        {
            warn!(
                "Recovered interrupted session {}; marking as Paused",
                session.id
            );
            session.status = SessionStatus::Paused;
            session.updated_at = now;
            recovered.push(session.clone());
        }

        let controller = Self {
            store,
            sessions,
            active_id: None,
        };
        if !recovered.is_empty() {
            controller.persist(recovered).await;
        }
        controller
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn find(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == id)
    }

    pub fn latest(&self) -> Option<&Session> {
        self.sessions.first()
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<&Session> {
        self.active_id.as_deref().and_then(|id| self.find(id))
    }

    /// Form defaults: the newest session's settings, else the configured ones.
    pub fn initial_settings(&self, defaults: &SessionSettings) -> SessionSettings {
        self.latest()
            .map(Session::settings)
            .unwrap_or_else(|| defaults.clone())
    }

    pub async fn begin(&mut self, settings: SessionSettings) -> Result<Session, InvalidSettings> {
        self.begin_at(settings, Utc::now()).await
    }

    async fn begin_at(
        &mut self,
        settings: SessionSettings,
        now: DateTime<Utc>,
    ) -> Result<Session, InvalidSettings> {
        let settings = settings.validate()?;

        let mut changed = self.pause_running_except(None, now);
        let session = Session::new(self.next_id(now), settings, now);
        self.sessions.insert(0, session.clone());
        self.active_id = Some(session.id.clone());
        info!(
            "Began session {} ({} x {:?}, {}s)",
            session.id, session.target_count, session.phrase, session.interval
        );

        changed.push(session.clone());
        self.persist(changed).await;
        Ok(session)
    }

    /// Makes `id` the active running session. A completed session starts over
    /// from the first repetition. Unknown ids are ignored.
    pub async fn resume(&mut self, id: &str) -> Option<Session> {
        if self.find(id).is_none() {
            debug!("resume ignored, no session {id}");
            return None;
        }

        let now = Utc::now();
        let mut changed = self.pause_running_except(Some(id), now);

        let session = self.find_mut(id)?;
        if session.status == SessionStatus::Completed {
            session.current_count = 1;
        }
        session.status = SessionStatus::Running;
        session.updated_at = now;
        let resumed = session.clone();

        self.active_id = Some(resumed.id.clone());
        changed.push(resumed.clone());
        self.persist(changed).await;
        Some(resumed)
    }

    /// Pauses the active session and clears the designation.
    pub async fn cancel(&mut self) {
        let Some(id) = self.active_id.take() else {
            return;
        };

        let now = Utc::now();
        let Some(session) = self.find_mut(&id) else {
            return;
        };
        session.status = SessionStatus::Paused;
        session.updated_at = now;
        let cancelled = session.clone();
        self.persist(vec![cancelled]).await;
    }

    /// Leaves the active session without touching its record.
    pub fn close(&mut self) {
        self.active_id = None;
    }

    pub async fn update(&mut self, update: SessionUpdate) {
        let now = Utc::now();
        let Some(session) = self.find_mut(&update.id) else {
            debug!("update ignored, no session {}", update.id);
            return;
        };
        session.apply(&update, now);
        let updated = session.clone();
        self.persist(vec![updated]).await;
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|session| session.id == id)
    }

    /// Keeps at most one session running.
    fn pause_running_except(&mut self, keep: Option<&str>, now: DateTime<Utc>) -> Vec<Session> {
        let mut changed = Vec::new();
        for session in self.sessions.iter_mut().filter(|session| {
            session.status == SessionStatus::Running && Some(session.id.as_str()) != keep
        }) {
            session.status = SessionStatus::Paused;
            session.updated_at = now;
            changed.push(session.clone());
        }
        changed
    }

    /// Timestamp id, nudged 1 ms past the newest existing id if the clock has not moved on.
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let candidate = session_id_at(now);
        let Some(newest) = self.sessions.iter().map(|session| session.id.as_str()).max() else {
            return candidate;
        };
        if candidate.as_str() > newest {
            return candidate;
        }

        match DateTime::parse_from_rfc3339(newest) {
            Ok(newest) => session_id_at(newest.with_timezone(&Utc) + Duration::milliseconds(1)),
            Err(_) => candidate,
        }
    }

    async fn persist(&self, sessions: Vec<Session>) {
        if let Err(err) = self.store.save(sessions).await {
            error!("Failed to persist sessions: {err:?}");
        }
    }
}
