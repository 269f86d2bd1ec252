use std::time::Duration;

use tokio::time::Instant;

use crate::models::{Session, SessionStatus};

use super::clock::Clock;
use super::state::{Frame, Phase, ProgressUpdate};

pub const FADE_DURATION: Duration = Duration::from_millis(1500);

/// Fade-in, fade-out, hold cycle for one active session.
///
/// Progress is always derived from `now - phase_started_at`, so ticking twice
/// with the same timestamp is a no-op and a late tick cascades through every
/// phase whose budget has already elapsed.
pub struct PhaseEngine<C: Clock> {
    clock: C,
    session_id: String,
    phrase: String,
    target_count: u32,
    interval: Duration,
    fade: Duration,
    current_count: u32,
    status: SessionStatus,
    phase: Phase,
    intensity: f64,
    /// Set lazily by the first tick after (re)start.
    phase_started_at: Option<Instant>,
    paused_at: Option<Instant>,
    torn_down: bool,
}

impl<C: Clock> PhaseEngine<C> {
    pub fn new(session: &Session, clock: C) -> Self {
        let intensity = if session.status == SessionStatus::Completed {
            1.0
        } else {
            0.0
        };

        Self {
            clock,
            session_id: session.id.clone(),
            phrase: session.phrase.clone(),
            target_count: session.target_count,
            interval: session.interval_duration(),
            fade: FADE_DURATION,
            current_count: session.current_count,
            status: session.status,
            phase: Phase::FadingIn,
            intensity,
            phase_started_at: None,
            paused_at: None,
            torn_down: false,
        }
    }

    #[cfg(test)]
    pub fn with_fade(mut self, fade: Duration) -> Self {
        self.fade = fade;
        self
    }

    #[cfg(test)]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn current_count(&self) -> u32 {
        self.current_count
    }

    #[cfg(test)]
    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Whether the frame loop should keep scheduling ticks.
    pub fn is_running(&self) -> bool {
        !self.torn_down && self.status == SessionStatus::Running
    }

    /// Mount-time report. A session that arrives paused has nothing new to say.
    pub fn initial_report(&self) -> Option<ProgressUpdate> {
        if self.torn_down || self.status == SessionStatus::Paused {
            return None;
        }
        Some(self.report())
    }

    pub fn frame(&self) -> Frame {
        Frame {
            phrase: self.phrase.clone(),
            intensity: self.intensity,
            display_count: self.current_count.min(self.target_count),
            target_count: self.target_count,
            run_state: self.status,
            phase: self.phase,
        }
    }

    pub fn tick(&mut self) -> Vec<ProgressUpdate> {
        let now = self.clock.now();
        self.tick_at(now)
    }

    pub fn tick_at(&mut self, now: Instant) -> Vec<ProgressUpdate> {
        let mut updates = Vec::new();
        if !self.is_running() {
            return updates;
        }

        let mut started_at = *self.phase_started_at.get_or_insert(now);

        loop {
            let elapsed = now.saturating_duration_since(started_at);
            match self.phase {
                Phase::FadingIn => {
                    if elapsed < self.fade {
                        self.intensity = fraction(elapsed, self.fade);
                        break;
                    }
                    self.intensity = 1.0;
                    started_at += self.fade;
                    self.phase = Phase::FadingOut;
                }
                Phase::FadingOut => {
                    if elapsed < self.fade {
                        self.intensity = 1.0 - fraction(elapsed, self.fade);
                        break;
                    }
                    self.intensity = 0.0;
                    started_at += self.fade;
                    self.phase = Phase::Holding;
                }
                Phase::Holding => {
                    if elapsed < self.interval {
                        break;
                    }
                    started_at += self.interval;

                    if self.current_count >= self.target_count {
                        self.status = SessionStatus::Completed;
                        self.intensity = 1.0;
                        updates.push(self.report());
                        break;
                    }

                    self.current_count = self.current_count.saturating_add(1);
                    self.phase = Phase::FadingIn;
                    updates.push(self.report());
                }
            }
        }

        self.phase_started_at = Some(started_at);
        updates
    }

    pub fn pause(&mut self) -> Option<ProgressUpdate> {
        let now = self.clock.now();
        self.pause_at(now)
    }

    pub fn pause_at(&mut self, now: Instant) -> Option<ProgressUpdate> {
        if !self.is_running() {
            return None;
        }
        self.paused_at = Some(now);
        self.status = SessionStatus::Paused;
        Some(self.report())
    }

    pub fn resume(&mut self) -> Option<ProgressUpdate> {
        let now = self.clock.now();
        self.resume_at(now)
    }

    pub fn resume_at(&mut self, now: Instant) -> Option<ProgressUpdate> {
        if self.torn_down || self.status != SessionStatus::Paused {
            return None;
        }

        // Shift the anchor by the paused span so elapsed picks up where it froze.
        if let (Some(started_at), Some(paused_at)) = (self.phase_started_at, self.paused_at) {
            self.phase_started_at = Some(started_at + now.saturating_duration_since(paused_at));
        }
        self.paused_at = None;
        self.status = SessionStatus::Running;
        Some(self.report())
    }

    /// Back to the first repetition and running. Reports only if count or status moved.
    pub fn reset(&mut self) -> Option<ProgressUpdate> {
        if self.torn_down {
            return None;
        }

        let changed = self.current_count != 1 || self.status != SessionStatus::Running;
        self.current_count = 1;
        self.intensity = 0.0;
        self.phase = Phase::FadingIn;
        self.phase_started_at = None;
        self.paused_at = None;
        self.status = SessionStatus::Running;

        changed.then(|| self.report())
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    fn report(&self) -> ProgressUpdate {
        ProgressUpdate {
            id: self.session_id.clone(),
            current_count: self.current_count,
            status: self.status,
        }
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}
