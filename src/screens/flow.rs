use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::signal;

use crate::alert::CompletionAlert;
use crate::flow::{FlowChannels, FlowDriver, Frame, PhaseEngine, SystemClock};
use crate::models::{Session, SessionStatus};
use crate::sessions::{SessionController, SessionStore};

use super::input::{Action, ConfirmGate};
use super::render::{command_hint, frame_line};

/// Why the flow screen closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Cancelled,
    Left,
    Finished,
}

/// Single-line terminal surface. Write failures are dropped; the session
/// keeps counting without a screen.
struct Screen {
    out: io::Stdout,
}

impl Screen {
    fn new() -> Self {
        Self { out: io::stdout() }
    }

    fn draw(&mut self, frame: &Frame) {
        let line = frame_line(frame);
        self.write(format_args!("\r\x1b[2K{line}"));
    }

    fn notice(&mut self, text: &str) {
        self.write(format_args!("\r\x1b[2K{text}\n"));
    }

    fn finish(&mut self) {
        self.write(format_args!("\n"));
    }

    fn write(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(err) = self.out.write_fmt(args).and_then(|_| self.out.flush()) {
            debug!("screen write failed: {err}");
        }
    }
}

/// Runs the flow screen for `session` until the user cancels or leaves, or
/// until completion once stdin has closed. Returns the session as recorded
/// afterwards.
pub async fn run<S: SessionStore>(
    controller: &mut SessionController<S>,
    session: Session,
    frame_interval: Duration,
    alert: Arc<dyn CompletionAlert>,
) -> Option<Session> {
    let engine = PhaseEngine::new(&session, SystemClock);
    let (mut driver, channels) = FlowDriver::new(engine, frame_interval, alert);
    let FlowChannels {
        mut frames,
        mut progress,
    } = channels;

    let mut screen = Screen::new();
    let mut gate = ConfirmGate::default();
    screen.notice(command_hint(driver.status()));
    driver.start().await;

    let mut lines = BufReader::new(stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let exit = loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break Exit::Finished;
                }
                let frame = frames.borrow_and_update().clone();
                screen.draw(&frame);
                if frame.run_state == SessionStatus::Completed {
                    if !stdin_open {
                        break Exit::Finished;
                    }
                    screen.notice(command_hint(SessionStatus::Completed));
                }
            }
            Some(update) = progress.recv() => {
                controller.update(update.into()).await;
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("stdin closed; running until completion");
                        stdin_open = false;
                        match driver.status() {
                            SessionStatus::Running => continue,
                            SessionStatus::Paused => break Exit::Left,
                            SessionStatus::Completed => break Exit::Finished,
                        }
                    }
                    Err(err) => {
                        warn!("Failed to read command input: {err}");
                        stdin_open = false;
                        continue;
                    }
                };

                match gate.handle(&line, driver.status()) {
                    Action::Pause => driver.pause().await,
                    Action::Resume => driver.resume().await,
                    Action::Toggle => driver.toggle().await,
                    Action::Reset => {
                        driver.reset().await;
                        screen.notice(command_hint(driver.status()));
                    }
                    Action::Cancel => break Exit::Cancelled,
                    Action::Leave => break Exit::Left,
                    Action::Ask(confirm) => screen.notice(confirm.prompt()),
                    Action::Dismissed => screen.notice(command_hint(driver.status())),
                    Action::Ignored => {}
                }
            }
            _ = &mut ctrl_c => {
                gate.interrupt();
                if driver.status() == SessionStatus::Completed {
                    break Exit::Left;
                }
                break Exit::Cancelled;
            }
        }
    };

    driver.shutdown().await;
    let final_status = driver.status();
    drop(driver);
    while let Some(update) = progress.recv().await {
        controller.update(update.into()).await;
    }
    screen.finish();

    let id = session.id;
    if pauses_on_exit(exit, final_status) {
        controller.cancel().await;
    } else {
        controller.close();
    }
    controller.find(&id).cloned()
}

/// Cancelling pauses the record. Leaving a finished session keeps it finished.
fn pauses_on_exit(exit: Exit, status: SessionStatus) -> bool {
    match exit {
        Exit::Finished => false,
        Exit::Left => status != SessionStatus::Completed,
        Exit::Cancelled => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaving_a_finished_session_does_not_pause_it() {
        assert!(!pauses_on_exit(Exit::Finished, SessionStatus::Completed));
        assert!(!pauses_on_exit(Exit::Left, SessionStatus::Completed));
    }

    #[test]
    fn cancel_and_leave_pause_unfinished_sessions() {
        assert!(pauses_on_exit(Exit::Cancelled, SessionStatus::Running));
        assert!(pauses_on_exit(Exit::Cancelled, SessionStatus::Completed));
        assert!(pauses_on_exit(Exit::Left, SessionStatus::Running));
        assert!(pauses_on_exit(Exit::Left, SessionStatus::Paused));
    }
}
