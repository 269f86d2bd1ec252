use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alert::CompletionAlert;
use crate::models::SessionStatus;

use super::clock::Clock;
use super::engine::PhaseEngine;
use super::state::{Frame, ProgressUpdate};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Receiving ends handed to the presentation layer.
pub struct FlowChannels {
    /// Latest frame only; slow renderers skip frames.
    pub frames: watch::Receiver<Frame>,
    /// Every count/status report, in order.
    pub progress: mpsc::UnboundedReceiver<ProgressUpdate>,
}

struct Outputs {
    frames: watch::Sender<Frame>,
    progress: mpsc::UnboundedSender<ProgressUpdate>,
    alert: Arc<dyn CompletionAlert>,
}

impl Outputs {
    fn report(&self, update: ProgressUpdate) {
        // Receiver gone means the screen is shutting down.
        let _ = self.progress.send(update);
    }

    fn publish(&self, frame: Frame) {
        self.frames.send_replace(frame);
    }
}

/// Runs a [`PhaseEngine`] at frame cadence on a tokio task.
///
/// The frame task only exists while the engine is running. Pausing, completing
/// or shutting down stops it; `pause` and `shutdown` also join it, so no tick
/// runs after they return.
pub struct FlowDriver<C: Clock> {
    engine: Arc<Mutex<PhaseEngine<C>>>,
    outputs: Arc<Outputs>,
    frame_interval: Duration,
    ticker: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl<C: Clock> FlowDriver<C> {
    pub fn new(
        engine: PhaseEngine<C>,
        frame_interval: Duration,
        alert: Arc<dyn CompletionAlert>,
    ) -> (Self, FlowChannels) {
        let (frames_tx, frames_rx) = watch::channel(engine.frame());
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();

        let driver = Self {
            engine: Arc::new(Mutex::new(engine)),
            outputs: Arc::new(Outputs {
                frames: frames_tx,
                progress: progress_tx,
                alert,
            }),
            frame_interval,
            ticker: None,
            cancel_token: None,
        };

        let channels = FlowChannels {
            frames: frames_rx,
            progress: progress_rx,
        };

        (driver, channels)
    }

    #[cfg(test)]
    pub fn frame(&self) -> Frame {
        lock_engine(&self.engine).frame()
    }

    pub fn status(&self) -> SessionStatus {
        lock_engine(&self.engine).status()
    }

    pub async fn start(&mut self) {
        let running = {
            let engine = lock_engine(&self.engine);
            if let Some(update) = engine.initial_report() {
                self.outputs.report(update);
            }
            self.outputs.publish(engine.frame());
            engine.is_running()
        };

        if running {
            self.spawn_ticker().await;
        }
    }

    pub async fn pause(&mut self) {
        let paused = {
            let mut engine = lock_engine(&self.engine);
            let update = engine.pause();
            let paused = update.is_some();
            if let Some(update) = update {
                self.outputs.report(update);
                self.outputs.publish(engine.frame());
            }
            paused
        };

        if paused {
            self.cancel_ticker().await;
        }
    }

    pub async fn resume(&mut self) {
        let resumed = {
            let mut engine = lock_engine(&self.engine);
            let update = engine.resume();
            let resumed = update.is_some();
            if let Some(update) = update {
                self.outputs.report(update);
                self.outputs.publish(engine.frame());
            }
            resumed
        };

        if resumed {
            self.spawn_ticker().await;
        }
    }

    pub async fn toggle(&mut self) {
        match self.status() {
            SessionStatus::Running => self.pause().await,
            SessionStatus::Paused => self.resume().await,
            SessionStatus::Completed => {}
        }
    }

    pub async fn reset(&mut self) {
        self.cancel_ticker().await;

        let running = {
            let mut engine = lock_engine(&self.engine);
            if let Some(update) = engine.reset() {
                self.outputs.report(update);
            }
            self.outputs.publish(engine.frame());
            engine.is_running()
        };

        if running {
            self.spawn_ticker().await;
        }
    }

    /// Stops the frame task and freezes the engine for good.
    pub async fn shutdown(&mut self) {
        self.cancel_ticker().await;
        lock_engine(&self.engine).teardown();
        log_info!("flow driver shut down");
    }

    async fn spawn_ticker(&mut self) {
        self.cancel_ticker().await;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(frame_loop(
            Arc::clone(&self.engine),
            Arc::clone(&self.outputs),
            self.frame_interval,
            cancel_token.clone(),
        ));

        self.ticker = Some(handle);
        self.cancel_token = Some(cancel_token);
        log_debug!("frame task started");
    }

    async fn cancel_ticker(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.ticker.take() {
            if let Err(err) = handle.await {
                log_warn!("frame task failed to join: {err}");
            }
        }
    }
}

impl<C: Clock> Drop for FlowDriver<C> {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        lock_engine(&self.engine).teardown();
    }
}

async fn frame_loop<C: Clock>(
    engine: Arc<Mutex<PhaseEngine<C>>>,
    outputs: Arc<Outputs>,
    frame_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let (completed, running) = {
                    let mut engine = lock_engine(&engine);
                    let updates = engine.tick();
                    let completed = updates
                        .iter()
                        .any(|update| update.status == SessionStatus::Completed);
                    for update in updates {
                        outputs.report(update);
                    }
                    outputs.publish(engine.frame());
                    (completed, engine.is_running())
                };

                if completed {
                    log_info!("session completed, firing alert");
                    outputs.alert.notify();
                }
                if !running {
                    break;
                }
            }
        }
    }
}

fn lock_engine<C: Clock>(engine: &Mutex<PhaseEngine<C>>) -> MutexGuard<'_, PhaseEngine<C>> {
    match engine.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::clock::SystemClock;
    use crate::models::{session_id_at, Session, SessionSettings};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAlert(AtomicUsize);

    impl CompletionAlert for CountingAlert {
        fn notify(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session(target_count: u32, interval: f64) -> Session {
        let now = Utc::now();
        Session::new(
            session_id_at(now),
            SessionSettings {
                phrase: "Alhamdulillah".into(),
                target_count,
                interval,
            },
            now,
        )
    }

    fn driver_for(
        session: &Session,
        alert: Arc<CountingAlert>,
    ) -> (FlowDriver<SystemClock>, FlowChannels) {
        FlowDriver::new(
            PhaseEngine::new(session, SystemClock),
            Duration::from_millis(16),
            alert,
        )
    }

    fn drain(channels: &mut FlowChannels) -> Vec<ProgressUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = channels.progress.try_recv() {
            updates.push(update);
        }
        updates
    }

    fn summary(updates: &[ProgressUpdate]) -> Vec<(u32, SessionStatus)> {
        updates
            .iter()
            .map(|update| (update.current_count, update.status))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn runs_session_to_completion_and_alerts_once() {
        let alert = Arc::new(CountingAlert::default());
        let (mut driver, mut channels) = driver_for(&session(3, 0.5), alert.clone());

        driver.start().await;
        time::sleep(Duration::from_secs(20)).await;

        assert_eq!(
            summary(&drain(&mut channels)),
            vec![
                (1, SessionStatus::Running),
                (2, SessionStatus::Running),
                (3, SessionStatus::Running),
                (3, SessionStatus::Completed),
            ]
        );
        assert_eq!(alert.0.load(Ordering::SeqCst), 1);

        let frame = channels.frames.borrow().clone();
        assert_eq!(frame.run_state, SessionStatus::Completed);
        assert_eq!(frame.display_count, 3);
        assert_eq!(frame.intensity, 1.0);

        driver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticking_and_resume_continues() {
        let alert = Arc::new(CountingAlert::default());
        let (mut driver, mut channels) = driver_for(&session(5, 0.5), alert);

        driver.start().await;
        time::sleep(Duration::from_secs(1)).await;
        driver.pause().await;
        assert_eq!(
            summary(&drain(&mut channels)),
            vec![(1, SessionStatus::Running), (1, SessionStatus::Paused)]
        );

        let frozen = channels.frames.borrow().clone();
        time::sleep(Duration::from_secs(30)).await;
        assert!(drain(&mut channels).is_empty());
        assert_eq!(*channels.frames.borrow(), frozen);

        driver.pause().await;
        assert!(drain(&mut channels).is_empty());

        driver.resume().await;
        assert_eq!(
            summary(&drain(&mut channels)),
            vec![(1, SessionStatus::Running)]
        );

        // One second of the 3.5 s cycle was spent before pausing.
        time::sleep(Duration::from_millis(2400)).await;
        assert!(drain(&mut channels).is_empty());
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            summary(&drain(&mut channels)),
            vec![(2, SessionStatus::Running)]
        );

        driver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_all_further_mutation() {
        let alert = Arc::new(CountingAlert::default());
        let (mut driver, mut channels) = driver_for(&session(2, 0.5), alert.clone());

        driver.start().await;
        time::sleep(Duration::from_millis(500)).await;
        driver.shutdown().await;
        drain(&mut channels);

        time::sleep(Duration::from_secs(60)).await;
        driver.resume().await;
        driver.reset().await;
        assert!(drain(&mut channels).is_empty());
        assert_eq!(driver.frame().display_count, 1);
        assert_eq!(alert.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_after_completion_runs_again() {
        let alert = Arc::new(CountingAlert::default());
        let (mut driver, mut channels) = driver_for(&session(1, 0.5), alert.clone());

        driver.start().await;
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(driver.status(), SessionStatus::Completed);
        drain(&mut channels);

        driver.reset().await;
        assert_eq!(
            summary(&drain(&mut channels)),
            vec![(1, SessionStatus::Running)]
        );
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            summary(&drain(&mut channels)),
            vec![(1, SessionStatus::Completed)]
        );
        assert_eq!(alert.0.load(Ordering::SeqCst), 2);

        driver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn paused_session_starts_idle() {
        let mut paused = session(3, 0.5);
        paused.status = SessionStatus::Paused;
        paused.current_count = 2;

        let (mut driver, mut channels) =
            driver_for(&paused, Arc::new(CountingAlert::default()));
        driver.start().await;
        time::sleep(Duration::from_secs(10)).await;

        assert!(drain(&mut channels).is_empty());
        assert_eq!(channels.frames.borrow().display_count, 2);
        assert_eq!(channels.frames.borrow().intensity, 0.0);

        driver.toggle().await;
        assert_eq!(
            summary(&drain(&mut channels)),
            vec![(2, SessionStatus::Running)]
        );
        driver.shutdown().await;
    }
}
