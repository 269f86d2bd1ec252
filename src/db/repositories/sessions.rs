use std::future::Future;

use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_status, to_count},
    Database,
};
use crate::models::Session;
use crate::sessions::SessionStore;

fn row_to_session(row: &Row) -> Result<Session> {
    let target_count: i64 = row.get("target_count")?;
    let current_count: i64 = row.get("current_count")?;
    let status: String = row.get("status")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Session {
        id: row.get("id")?,
        phrase: row.get("phrase")?,
        target_count: to_count(target_count, "target_count")?,
        interval: row.get("interval_secs")?,
        current_count: to_count(current_count, "current_count")?,
        status: parse_status(&status)?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn load_sessions(&self) -> Result<Vec<Session>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phrase, target_count, interval_secs, current_count, status, updated_at
                 FROM sessions
                 ORDER BY id DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    /// Upserts every record in one transaction. Nothing is ever deleted.
    pub async fn save_sessions(&self, sessions: Vec<Session>) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO sessions (id, phrase, target_count, interval_secs, current_count, status, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                         phrase = excluded.phrase,
                         target_count = excluded.target_count,
                         interval_secs = excluded.interval_secs,
                         current_count = excluded.current_count,
                         status = excluded.status,
                         updated_at = excluded.updated_at",
                )?;

                for session in &sessions {
                    stmt.execute(params![
                        session.id,
                        session.phrase,
                        session.target_count,
                        session.interval,
                        session.current_count,
                        session.status.as_str(),
                        session.updated_at.to_rfc3339(),
                    ])
                    .with_context(|| format!("failed to save session {}", session.id))?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

impl SessionStore for Database {
    fn load(&self) -> impl Future<Output = Result<Vec<Session>>> + Send {
        self.load_sessions()
    }

    fn save(&self, sessions: Vec<Session>) -> impl Future<Output = Result<()>> + Send {
        self.save_sessions(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{session_id_at, SessionSettings, SessionStatus};
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    fn session_at(minute: u32, phrase: &str) -> Session {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, minute, 0).unwrap();
        Session::new(
            session_id_at(at),
            SessionSettings {
                phrase: phrase.into(),
                target_count: 33,
                interval: 1.5,
            },
            at,
        )
    }

    #[tokio::test]
    async fn saved_sessions_load_newest_first() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("dhikrflow.sqlite3")).unwrap();

        let older = session_at(1, "SubhanAllah");
        let newer = session_at(2, "Alhamdulillah");
        db.save_sessions(vec![older.clone(), newer.clone()])
            .await
            .unwrap();

        let loaded = db.load_sessions().await.unwrap();
        assert_eq!(loaded, vec![newer, older]);
    }

    #[tokio::test]
    async fn save_updates_existing_records_in_place() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("dhikrflow.sqlite3")).unwrap();

        let mut session = session_at(5, "Allahu Akbar");
        db.save_sessions(vec![session.clone()]).await.unwrap();

        session.current_count = 33;
        session.status = SessionStatus::Completed;
        session.updated_at = session.updated_at + Duration::minutes(2);
        db.save_sessions(vec![session.clone()]).await.unwrap();

        let loaded = db.load_sessions().await.unwrap();
        assert_eq!(loaded, vec![session]);
    }

    #[tokio::test]
    async fn records_survive_reopen_through_store_trait() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dhikrflow.sqlite3");
        let session = session_at(7, "La ilaha illallah");

        {
            let db = Database::new(path.clone()).unwrap();
            SessionStore::save(&db, vec![session.clone()]).await.unwrap();
        }

        let reopened = Database::new(path).unwrap();
        assert_eq!(SessionStore::load(&reopened).await.unwrap(), vec![session]);
    }
}
