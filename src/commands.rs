use std::io;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::info;

use crate::alert;
use crate::cli::{BeginArgs, HistoryArgs, ResumeArgs, SettingsSetArgs};
use crate::db::Database;
use crate::models::{Session, SessionSettings};
use crate::screens::{flow, listing};
use crate::sessions::history::{self, default_window, HistoryFilter};
use crate::sessions::SessionController;
use crate::settings::AlertSettings;
use crate::AppState;

async fn load_controller(state: &AppState) -> SessionController<Database> {
    SessionController::load(state.db.clone()).await
}

pub async fn begin(state: &AppState, args: BeginArgs) -> Result<()> {
    let mut controller = load_controller(state).await;
    let base = controller.initial_settings(&state.settings.defaults());
    let settings = SessionSettings {
        phrase: args.phrase.unwrap_or(base.phrase),
        target_count: args.count.unwrap_or(base.target_count),
        interval: args.interval.unwrap_or(base.interval),
    };

    let session = controller.begin(settings).await?;
    run_flow(state, &mut controller, session).await
}

pub async fn resume(state: &AppState, args: ResumeArgs) -> Result<()> {
    let mut controller = load_controller(state).await;
    let id = if args.latest {
        controller
            .latest()
            .map(|session| session.id.clone())
            .ok_or_else(|| anyhow!("No sessions to resume."))?
    } else {
        args.id.context("a session id or --latest is required")?
    };

    let session = controller
        .resume(&id)
        .await
        .ok_or_else(|| anyhow!("No session with id {id}."))?;
    run_flow(state, &mut controller, session).await
}

async fn run_flow(
    state: &AppState,
    controller: &mut SessionController<Database>,
    session: Session,
) -> Result<()> {
    let alert = alert::from_settings(&state.settings.alert());
    info!("Opening flow screen for {}", session.id);

    if let Some(finished) =
        flow::run(controller, session, state.settings.frame_interval(), alert).await
    {
        listing::write_summary(&mut io::stdout().lock(), &finished)?;
    }
    Ok(())
}

pub async fn history(state: &AppState, args: HistoryArgs) -> Result<()> {
    let controller = load_controller(state).await;
    let filter = HistoryFilter {
        window: (!args.all).then(default_window),
        status: args.status.map(Into::into),
    };

    let sessions = history::filter(controller.sessions(), Utc::now(), &filter);
    listing::write_history(&mut io::stdout().lock(), &sessions)?;
    Ok(())
}

pub fn settings_show(state: &AppState) -> Result<()> {
    listing::write_settings(&mut io::stdout().lock(), &state.settings.snapshot())
}

pub fn settings_set(state: &AppState, args: SettingsSetArgs) -> Result<()> {
    let store = &state.settings;

    if args.phrase.is_some() || args.count.is_some() || args.interval.is_some() {
        let current = store.defaults();
        store.update_defaults(SessionSettings {
            phrase: args.phrase.unwrap_or(current.phrase),
            target_count: args.count.unwrap_or(current.target_count),
            interval: args.interval.unwrap_or(current.interval),
        })?;
    }

    if args.alert.is_some() || args.chime.is_some() {
        let current = store.alert();
        store.update_alert(AlertSettings {
            enabled: args.alert.map_or(current.enabled, |toggle| toggle.is_on()),
            chime: args.chime.map_or(current.chime, |toggle| toggle.is_on()),
        })?;
    }

    if let Some(fps) = args.fps {
        store.update_frame_rate(fps)?;
    }

    settings_show(state)
}
