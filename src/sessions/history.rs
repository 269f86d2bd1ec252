use chrono::{DateTime, Duration, Local, Utc};

use crate::models::{Session, SessionStatus};

pub const DEFAULT_WINDOW_HOURS: i64 = 24;

pub fn default_window() -> Duration {
    Duration::hours(DEFAULT_WINDOW_HOURS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Repeat,
    Resume,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Repeat => "repeat",
            HistoryAction::Resume => "resume",
        }
    }
}

/// Which sessions the history listing shows.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// `None` lists everything regardless of age.
    pub window: Option<Duration>,
    pub status: Option<SessionStatus>,
}

impl HistoryFilter {
    fn accepts(&self, session: &Session, now: DateTime<Utc>) -> bool {
        if let Some(status) = self.status {
            if session.status != status {
                return false;
            }
        }
        match self.window {
            Some(window) => session
                .created_at()
                .is_some_and(|created| created > now - window),
            None => true,
        }
    }
}

/// Sessions accepted by `filter` as of `now`, newest first.
pub fn filter<'a>(
    sessions: &'a [Session],
    now: DateTime<Utc>,
    filter: &HistoryFilter,
) -> Vec<&'a Session> {
    let mut matched: Vec<&Session> = sessions
        .iter()
        .filter(|session| filter.accepts(session, now))
        .collect();
    matched.sort_by(|a, b| b.id.cmp(&a.id));
    matched
}

pub fn action_for(session: &Session) -> HistoryAction {
    if session.status == SessionStatus::Completed {
        HistoryAction::Repeat
    } else {
        HistoryAction::Resume
    }
}

pub fn outcome_label(session: &Session) -> String {
    match session.status {
        SessionStatus::Completed => "Completed".to_string(),
        _ => format!(
            "Incomplete ({}/{})",
            session.display_count(),
            session.target_count
        ),
    }
}

/// One listing line: id, local creation time, phrase, outcome and the offered action.
pub fn describe(session: &Session) -> String {
    let created = session
        .created_at()
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "---------- --:--".to_string());
    format!(
        "{id}  {created}  {phrase:<24}  {outcome:<18}  [{action}]",
        id = session.id,
        phrase = session.phrase,
        outcome = outcome_label(session),
        action = action_for(session).as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{session_id_at, SessionSettings};
    use chrono::TimeZone;

    fn session(hours_ago: i64, status: SessionStatus, now: DateTime<Utc>) -> Session {
        let created = now - Duration::hours(hours_ago);
        let mut session = Session::new(
            session_id_at(created),
            SessionSettings {
                phrase: format!("phrase {hours_ago}"),
                target_count: 10,
                interval: 1.0,
            },
            created,
        );
        session.status = status;
        session.current_count = 4;
        session
    }

    fn last_day() -> HistoryFilter {
        HistoryFilter {
            window: Some(default_window()),
            status: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn recent_keeps_last_day_newest_first() {
        let now = now();
        let sessions = vec![
            session(30, SessionStatus::Completed, now),
            session(1, SessionStatus::Paused, now),
            session(5, SessionStatus::Completed, now),
        ];

        let listed: Vec<&str> = filter(&sessions, now, &last_day())
            .into_iter()
            .map(|s| s.phrase.as_str())
            .collect();
        assert_eq!(listed, vec!["phrase 1", "phrase 5"]);
    }

    #[test]
    fn filter_by_status_and_without_window() {
        let now = now();
        let sessions = vec![
            session(30, SessionStatus::Completed, now),
            session(1, SessionStatus::Paused, now),
            session(5, SessionStatus::Completed, now),
        ];

        let completed = filter(
            &sessions,
            now,
            &HistoryFilter {
                window: None,
                status: Some(SessionStatus::Completed),
            },
        );
        let listed: Vec<&str> = completed.iter().map(|s| s.phrase.as_str()).collect();
        assert_eq!(listed, vec!["phrase 5", "phrase 30"]);
    }

    #[test]
    fn unparseable_ids_fall_outside_the_window() {
        let now = now();
        let mut odd = session(1, SessionStatus::Paused, now);
        odd.id = "legacy".into();
        let sessions = [odd];
        assert!(filter(&sessions, now, &last_day()).is_empty());
        assert_eq!(filter(&sessions, now, &HistoryFilter::default()).len(), 1);
    }

    #[test]
    fn labels_and_actions_follow_status() {
        let now = now();
        let done = session(1, SessionStatus::Completed, now);
        let paused = session(1, SessionStatus::Paused, now);

        assert_eq!(outcome_label(&done), "Completed");
        assert_eq!(action_for(&done), HistoryAction::Repeat);
        assert_eq!(outcome_label(&paused), "Incomplete (4/10)");
        assert_eq!(action_for(&paused), HistoryAction::Resume);
        assert!(describe(&paused).ends_with("[resume]"));
    }

    #[test]
    fn listing_line_carries_the_creation_date() {
        let now = now();
        let older = session(50, SessionStatus::Completed, now);
        let created = older.created_at().unwrap().with_timezone(&Local);

        let line = describe(&older);
        assert!(line.contains(&created.format("%Y-%m-%d %H:%M").to_string()));
        assert_ne!(describe(&older), describe(&session(2, SessionStatus::Completed, now)));
    }
}
