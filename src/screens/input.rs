use crate::models::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Reset,
    Cancel,
}

impl Confirm {
    pub fn prompt(&self) -> &'static str {
        match self {
            Confirm::Reset => "Start over from the first repetition? (y/N)",
            Confirm::Cancel => "Stop this session? Progress is kept. (y/N)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pause,
    Resume,
    Toggle,
    Reset,
    Cancel,
    Leave,
    /// Waiting on a yes/no answer.
    Ask(Confirm),
    Dismissed,
    Ignored,
}

/// Turns typed lines into flow commands. Reset and cancel only go through
/// after a `y` on the following line.
#[derive(Debug, Default)]
pub struct ConfirmGate {
    pending: Option<Confirm>,
}

impl ConfirmGate {
    #[cfg(test)]
    pub fn pending(&self) -> Option<Confirm> {
        self.pending
    }

    pub fn handle(&mut self, line: &str, status: SessionStatus) -> Action {
        let input = line.trim().to_ascii_lowercase();

        if let Some(pending) = self.pending.take() {
            return match (input.as_str(), pending) {
                ("y" | "yes", Confirm::Reset) => Action::Reset,
                ("y" | "yes", Confirm::Cancel) => Action::Cancel,
                _ => Action::Dismissed,
            };
        }

        if status == SessionStatus::Completed {
            return match input.as_str() {
                "x" => Action::Reset,
                "q" => Action::Leave,
                _ => Action::Ignored,
            };
        }

        match input.as_str() {
            "p" => Action::Pause,
            "r" => Action::Resume,
            "t" => Action::Toggle,
            "" if line.contains(' ') => Action::Toggle,
            "x" => self.ask(Confirm::Reset),
            "c" => self.ask(Confirm::Cancel),
            "q" => Action::Leave,
            _ => Action::Ignored,
        }
    }

    /// Ctrl-C: a cancel that needs no answer.
    pub fn interrupt(&mut self) -> Action {
        self.pending = None;
        Action::Cancel
    }

    fn ask(&mut self, confirm: Confirm) -> Action {
        self.pending = Some(confirm);
        Action::Ask(confirm)
    }
}
