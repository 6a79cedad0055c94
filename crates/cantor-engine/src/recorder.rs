//! Recording session: start → accumulate → stop → finalize.
//!
//! While recording, the audio thread sends every master-mix frame to a
//! collector thread through a bounded queue. Stopping signals the collector,
//! which drains what is queued, encodes a 32-bit float stereo WAV and parks
//! the result. The finalized [`Recording`] only exists after that.

use crossbeam_channel::{Receiver, Sender, select};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Frames buffered between the audio thread and the collector.
pub const RECORD_QUEUE: usize = 1 << 18;

/// A finalized recording: WAV bytes of the master mix.
#[derive(Debug, Clone)]
pub struct Recording {
    wav: Arc<[u8]>,
    frames: usize,
    sample_rate: u32,
}

impl Recording {
    /// Encoded WAV file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.wav
    }

    /// Size of the encoded file.
    pub fn len(&self) -> usize {
        self.wav.len()
    }

    /// True if nothing was encoded.
    pub fn is_empty(&self) -> bool {
        self.wav.is_empty()
    }

    /// Captured stereo frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Sample rate of the capture.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / f64::from(self.sample_rate)
    }

    /// Write the WAV bytes to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.wav)
    }
}

enum State {
    Idle,
    Recording {
        stop: Sender<()>,
        worker: JoinHandle<Option<Recording>>,
    },
    Finalizing(JoinHandle<Option<Recording>>),
}

/// Control-side recording state machine.
pub(crate) struct Recorder {
    sample_rate: u32,
    state: State,
    finished: Option<Recording>,
}

impl Recorder {
    pub(crate) fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: State::Idle,
            finished: None,
        }
    }

    pub(crate) fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// Begin a session and return the sender the audio thread feeds.
    ///
    /// `Ok(None)` when already recording. A previous finalized recording is
    /// discarded.
    pub(crate) fn start(&mut self) -> std::io::Result<Option<Sender<(f32, f32)>>> {
        if self.is_recording() {
            return Ok(None);
        }
        self.collect_finished(None);
        self.finished = None;

        let (frames_tx, frames_rx) = crossbeam_channel::bounded(RECORD_QUEUE);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let sample_rate = self.sample_rate;
        let worker = std::thread::Builder::new()
            .name("cantor-recorder".into())
            .spawn(move || collect(&frames_rx, &stop_rx, sample_rate))?;

        self.state = State::Recording {
            stop: stop_tx,
            worker,
        };
        tracing::info!(sample_rate, "recording started");
        Ok(Some(frames_tx))
    }

    /// Stop the session and let the collector finalize in the background.
    /// No-op unless recording.
    pub(crate) fn stop(&mut self) {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Recording { stop, worker } => {
                let _ = stop.send(());
                self.state = State::Finalizing(worker);
                tracing::info!("recording stopped, finalizing");
            }
            other => self.state = other,
        }
    }

    /// The finalized recording, if finalization has completed.
    pub(crate) fn recording(&mut self) -> Option<Recording> {
        self.collect_finished(Some(Duration::ZERO));
        self.finished.clone()
    }

    /// Wait up to `timeout` for finalization.
    pub(crate) fn wait(&mut self, timeout: Duration) -> Option<Recording> {
        self.collect_finished(Some(timeout));
        self.finished.clone()
    }

    /// Join a finalizing collector once it is done, waiting at most
    /// `timeout` (`None` waits as long as it takes).
    fn collect_finished(&mut self, timeout: Option<Duration>) {
        let State::Finalizing(worker) = &self.state else {
            return;
        };
        if let Some(timeout) = timeout {
            let deadline = Instant::now() + timeout;
            while !worker.is_finished() {
                if Instant::now() >= deadline {
                    return;
                }
                std::thread::sleep(Duration::from_millis(2));
            }
        }
        if let State::Finalizing(worker) = std::mem::replace(&mut self.state, State::Idle) {
            match worker.join() {
                Ok(recording) => self.finished = recording,
                Err(_) => tracing::error!("recorder thread panicked"),
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn collect(
    frames: &Receiver<(f32, f32)>,
    stop: &Receiver<()>,
    sample_rate: u32,
) -> Option<Recording> {
    let mut samples: Vec<f32> = Vec::new();
    loop {
        select! {
            recv(frames) -> frame => match frame {
                Ok((l, r)) => {
                    samples.extend([l, r]);
                    for (l, r) in frames.try_iter() {
                        samples.extend([l, r]);
                    }
                }
                Err(_) => break,
            },
            recv(stop) -> _ => {
                for (l, r) in frames.try_iter() {
                    samples.extend([l, r]);
                }
                break;
            }
        }
    }

    let frames = samples.len() / 2;
    match cantor_io::encode_wav(&samples, 2, sample_rate) {
        Ok(wav) => {
            tracing::info!(frames, bytes = wav.len(), "recording finalized");
            Some(Recording {
                wav: wav.into(),
                frames,
                sample_rate,
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode recording");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_before_stop() {
        let mut recorder = Recorder::new(48000);
        let tx = recorder.start().unwrap().unwrap();
        tx.send((0.1, 0.2)).unwrap();
        assert!(recorder.recording().is_none());
        recorder.stop();
        let recording = recorder.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(recording.frames(), 1);
        assert!(recording.len() > 44);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut recorder = Recorder::new(48000);
        assert!(recorder.start().unwrap().is_some());
        assert!(recorder.start().unwrap().is_none());
        recorder.stop();
        recorder.stop();
        assert!(recorder.wait(Duration::from_secs(5)).is_some());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn stop_without_start_is_a_noop() {
        let mut recorder = Recorder::new(48000);
        recorder.stop();
        assert!(recorder.recording().is_none());
    }

    #[test]
    fn dropped_sender_finalizes_too() {
        let mut recorder = Recorder::new(48000);
        let tx = recorder.start().unwrap().unwrap();
        for _ in 0..480 {
            tx.send((0.5, -0.5)).unwrap();
        }
        drop(tx);
        recorder.stop();
        let recording = recorder.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(recording.frames(), 480);
        assert!((recording.duration_secs() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn new_session_discards_previous_recording() {
        let mut recorder = Recorder::new(48000);
        let _tx = recorder.start().unwrap();
        recorder.stop();
        assert!(recorder.wait(Duration::from_secs(5)).is_some());
        let _tx = recorder.start().unwrap();
        assert!(recorder.recording().is_none());
    }
}
