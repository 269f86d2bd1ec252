mod alert;
mod cli;
mod commands;
mod db;
mod flow;
mod models;
mod screens;
mod sessions;
mod settings;
mod utils;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{BeginArgs, Cli, Commands, SettingsSubcommand};
use db::Database;
use log::LevelFilter;
use settings::SettingsStore;

const DB_FILE: &str = "dhikrflow.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

pub(crate) struct AppState {
    pub(crate) db: Database,
    pub(crate) settings: SettingsStore,
}

impl AppState {
    fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        Ok(Self {
            db: Database::new(data_dir.join(DB_FILE))?,
            settings: SettingsStore::new(data_dir.join(SETTINGS_FILE))?,
        })
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // RUST_LOG, when set, refines the verbosity flag.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(dir) => Ok(dir),
        None => dirs::data_dir()
            .map(|dir| dir.join("dhikrflow"))
            .ok_or_else(|| anyhow!("no data directory on this platform; pass --data-dir")),
    }
}

async fn dispatch(state: &AppState, command: Option<Commands>) -> Result<()> {
    match command.unwrap_or_else(|| Commands::Begin(BeginArgs::default())) {
        Commands::Begin(args) => commands::begin(state, args).await,
        Commands::Resume(args) => commands::resume(state, args).await,
        Commands::History(args) => commands::history(state, args).await,
        Commands::Settings(settings) => match settings.subcommand {
            SettingsSubcommand::Show => commands::settings_show(state),
            SettingsSubcommand::Set(args) => commands::settings_set(state, args),
        },
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("DhikrFlow starting up...");

    let state = AppState::open(&data_dir(cli.data_dir)?)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(dispatch(&state, cli.command));

    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_background();
    result
}
