//! Command-line surface.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::models::SessionStatus;

/// Paced recitation counter for the terminal.
#[derive(Parser, Debug)]
#[command(name = "dhikrflow", author, version, about)]
pub struct Cli {
    /// Directory holding the session database and settings file.
    #[arg(long, global = true, env = "DHIKRFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `begin` with the last session's settings.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new session.
    Begin(BeginArgs),

    /// Continue a paused session, or repeat a completed one.
    Resume(ResumeArgs),

    /// List past sessions.
    History(HistoryArgs),

    /// Show or change stored defaults.
    Settings(SettingsCommand),
}

/// Arguments for `begin`. Anything left out comes from the newest session,
/// then from the stored defaults.
#[derive(Args, Debug, Default)]
pub struct BeginArgs {
    /// Phrase to recite.
    #[arg(short, long)]
    pub phrase: Option<String>,

    /// Number of repetitions.
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Seconds each repetition is held (at least 0.5).
    #[arg(short, long)]
    pub interval: Option<f64>,
}

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("target").required(true).multiple(false))]
pub struct ResumeArgs {
    /// Session id as shown by `history`.
    #[arg(group = "target")]
    pub id: Option<String>,

    /// Pick the newest session.
    #[arg(long, group = "target")]
    pub latest: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Include sessions older than 24 hours.
    #[arg(long)]
    pub all: bool,

    /// Only sessions with this status.
    #[arg(long)]
    pub status: Option<StatusArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Running,
    Paused,
    Completed,
}

impl From<StatusArg> for SessionStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Running => SessionStatus::Running,
            StatusArg::Paused => SessionStatus::Paused,
            StatusArg::Completed => SessionStatus::Completed,
        }
    }
}

#[derive(Args, Debug)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub subcommand: SettingsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsSubcommand {
    /// Print the stored settings.
    Show,

    /// Change stored settings.
    Set(SettingsSetArgs),
}

#[derive(Args, Debug)]
pub struct SettingsSetArgs {
    /// Default phrase.
    #[arg(long)]
    pub phrase: Option<String>,

    /// Default number of repetitions.
    #[arg(long)]
    pub count: Option<u32>,

    /// Default hold time in seconds.
    #[arg(long)]
    pub interval: Option<f64>,

    /// Completion alert.
    #[arg(long)]
    pub alert: Option<Toggle>,

    /// Audible chime instead of the terminal bell, when built with audio.
    #[arg(long)]
    pub chime: Option<Toggle>,

    /// Screen refresh rate in frames per second.
    #[arg(long)]
    pub fps: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_begin_with_defaults() {
        let cli = Cli::try_parse_from(["dhikrflow"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn begin_flags_parse() {
        let cli =
            Cli::try_parse_from(["dhikrflow", "-vv", "begin", "-p", "Alhamdulillah", "-n", "99", "-i", "1.5"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Begin(args)) => {
                assert_eq!(args.phrase.as_deref(), Some("Alhamdulillah"));
                assert_eq!(args.count, Some(99));
                assert_eq!(args.interval, Some(1.5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn resume_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["dhikrflow", "resume"]).is_err());
        assert!(Cli::try_parse_from(["dhikrflow", "resume", "abc", "--latest"]).is_err());
        assert!(Cli::try_parse_from(["dhikrflow", "resume", "--latest"]).is_ok());
    }

    #[test]
    fn history_status_filter() {
        let cli = Cli::try_parse_from(["dhikrflow", "history", "--status", "paused"]).unwrap();
        match cli.command {
            Some(Commands::History(args)) => {
                assert!(!args.all);
                assert_eq!(args.status.map(SessionStatus::from), Some(SessionStatus::Paused));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn settings_set_parses_toggles() {
        let cli = Cli::try_parse_from(["dhikrflow", "settings", "set", "--alert", "off", "--fps", "30"])
            .unwrap();
        match cli.command {
            Some(Commands::Settings(SettingsCommand {
                subcommand: SettingsSubcommand::Set(args),
            })) => {
                assert_eq!(args.alert, Some(Toggle::Off));
                assert_eq!(args.fps, Some(30));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
