use std::future::Future;

use anyhow::Result;

use crate::models::Session;

/// Durable home of the session list.
pub trait SessionStore: Send + Sync {
    /// Every stored session, newest first.
    fn load(&self) -> impl Future<Output = Result<Vec<Session>>> + Send;

    /// Inserts or replaces each record by id. Records missing from `sessions`
    /// are left alone.
    fn save(&self, sessions: Vec<Session>) -> impl Future<Output = Result<()>> + Send;
}
