use std::io::{self, Write};

use anyhow::Result;

use crate::models::{Session, SessionStatus};
use crate::sessions::history::describe;
use crate::settings::UserSettings;

pub fn write_history<W: Write>(out: &mut W, sessions: &[&Session]) -> io::Result<()> {
    if sessions.is_empty() {
        return writeln!(out, "No sessions yet.");
    }
    for session in sessions {
        writeln!(out, "{}", describe(session))?;
    }
    Ok(())
}

pub fn write_settings<W: Write>(out: &mut W, settings: &UserSettings) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    match session.status {
        SessionStatus::Completed => writeln!(
            out,
            "{}: completed {} of {}.",
            session.phrase, session.target_count, session.target_count
        ),
        _ => writeln!(
            out,
            "{}: stopped at {} of {}. Resume with `dhikrflow resume {}`.",
            session.phrase,
            session.display_count(),
            session.target_count,
            session.id
        ),
    }
}
