use std::f32::consts::PI;
use std::sync::{
    mpsc::{self, Sender},
    Mutex,
};
use std::thread;
use std::time::Duration;

use rodio::{OutputStream, Sink, Source};

use super::CompletionAlert;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

const CHIME_FREQ_HZ: f32 = 880.0;
const CHIME_MS: u32 = 600;

/// Short decaying sine tone.
pub struct Chime {
    freq: f32,
    sample_rate: u32,
    num_sample: u32,
    total_samples: u32,
}

impl Chime {
    pub fn new(freq: f32) -> Self {
        let sample_rate = 44100;
        Self {
            freq,
            sample_rate,
            num_sample: 0,
            total_samples: sample_rate * CHIME_MS / 1000,
        }
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        self.num_sample += 1;

        let t = self.num_sample as f32 / self.sample_rate as f32;
        let envelope = (-6.0 * t).exp();
        Some((2.0 * PI * self.freq * t).sin() * envelope * 0.3)
    }
}

impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total_samples - self.num_sample) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(u64::from(CHIME_MS)))
    }
}

enum ChimeCommand {
    Play,
}

/// Plays [`Chime`] on a dedicated audio thread that owns the non-`Send` output stream.
pub struct ChimeAlert {
    tx: Mutex<Option<Sender<ChimeCommand>>>,
}

impl ChimeAlert {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<ChimeCommand>, String> {
        let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<ChimeCommand>();

        thread::Builder::new()
            .name("dhikrflow-chime".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        ChimeCommand::Play => {
                            if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                                log_debug!("chime skipped: {err}");
                                continue;
                            }
                            if let Some(ref s) = sink {
                                s.append(Chime::new(CHIME_FREQ_HZ));
                            }
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        *guard = Some(tx.clone());
        Ok(tx)
    }
}

impl Default for ChimeAlert {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionAlert for ChimeAlert {
    fn notify(&self) {
        let result = self
            .ensure_thread()
            .and_then(|tx| tx.send(ChimeCommand::Play).map_err(|e| e.to_string()));
        if let Err(err) = result {
            log_error!("Failed to queue completion chime: {err}");
        }
    }
}
