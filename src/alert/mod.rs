#[cfg(feature = "chime")]
pub mod chime;

use std::io::Write;
use std::sync::Arc;

use log::debug;

use crate::settings::AlertSettings;

/// One-shot side effect fired when a session completes.
pub trait CompletionAlert: Send + Sync {
    fn notify(&self);
}

/// Alerts disabled.
pub struct SilentAlert;

impl CompletionAlert for SilentAlert {
    fn notify(&self) {}
}

/// Rings the terminal bell. Terminals without a bell just ignore it.
pub struct TerminalBell;

impl CompletionAlert for TerminalBell {
    fn notify(&self) {
        let mut out = std::io::stdout();
        if let Err(err) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            debug!("terminal bell unavailable: {err}");
        }
    }
}

pub fn from_settings(settings: &AlertSettings) -> Arc<dyn CompletionAlert> {
    if !settings.enabled {
        return Arc::new(SilentAlert);
    }

    #[cfg(feature = "chime")]
    {
        if settings.chime {
            return Arc::new(chime::ChimeAlert::new());
        }
    }

    Arc::new(TerminalBell)
}
