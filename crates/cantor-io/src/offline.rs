//! Deterministic backend driven by hand.
//!
//! [`OfflineBackend`] builds streams that never run on their own. The paired
//! [`OfflineDriver`] pulls blocks through them: each [`OfflineDriver::render`]
//! first hands queued microphone samples to the input callback, then runs the
//! output callback once. Offline renders and engine tests use it to get
//! bit-reproducible output without a sound card.
//!
//! ```rust
//! use cantor_io::{AudioBackend, BackendStreamConfig, OfflineBackend};
//!
//! let (backend, driver) = OfflineBackend::new();
//! let _stream = backend
//!     .build_output_stream(
//!         &BackendStreamConfig::default(),
//!         Box::new(|out: &mut [f32]| out.fill(0.25)),
//!         Box::new(|_| {}),
//!     )
//!     .unwrap();
//!
//! let block = driver.render(64);
//! assert_eq!(block.len(), 128);
//! assert!(block.iter().all(|&s| s == 0.25));
//! ```

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
use crate::{AudioDevice, Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Name of the single device the offline backend exposes.
pub const OFFLINE_DEVICE: &str = "offline";

struct Slot<C> {
    id: u64,
    config: BackendStreamConfig,
    callback: C,
}

#[derive(Default)]
struct Shared {
    next_id: u64,
    output: Option<Slot<OutputCallback>>,
    input: Option<Slot<InputCallback>>,
    pending_input: VecDeque<f32>,
    input_failure: Option<String>,
    output_failure: Option<String>,
    input_requests: Vec<BackendStreamConfig>,
}

impl Shared {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Input,
    Output,
}

/// Keeps an offline stream registered until dropped.
struct OfflineStream {
    shared: Arc<Mutex<Shared>>,
    id: u64,
    direction: Direction,
}

impl Drop for OfflineStream {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        match self.direction {
            Direction::Input => {
                if shared.input.as_ref().is_some_and(|s| s.id == self.id) {
                    shared.input = None;
                    shared.pending_input.clear();
                }
            }
            Direction::Output => {
                if shared.output.as_ref().is_some_and(|s| s.id == self.id) {
                    shared.output = None;
                }
            }
        }
    }
}

/// Backend whose streams only advance when an [`OfflineDriver`] renders.
pub struct OfflineBackend {
    shared: Arc<Mutex<Shared>>,
}

impl OfflineBackend {
    /// A backend and the driver that pulls audio through it.
    pub fn new() -> (Self, OfflineDriver) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            OfflineDriver { shared },
        )
    }

    fn device() -> AudioDevice {
        AudioDevice {
            name: OFFLINE_DEVICE.to_string(),
            is_input: true,
            is_output: true,
            default_sample_rate: 48000,
        }
    }
}

impl AudioBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![Self::device()])
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(Self::device()))
    }

    fn default_input_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(Self::device()))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let mut shared = self.shared.lock();
        if let Some(reason) = &shared.output_failure {
            return Err(Error::Stream(reason.clone()));
        }

        let id = shared.allocate_id();
        shared.output = Some(Slot {
            id,
            config: config.clone(),
            callback,
        });
        tracing::debug!(id, buffer_size = config.buffer_size, "offline output stream");

        Ok(StreamHandle::new(OfflineStream {
            shared: Arc::clone(&self.shared),
            id,
            direction: Direction::Output,
        }))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let mut shared = self.shared.lock();
        shared.input_requests.push(config.clone());
        if let Some(reason) = &shared.input_failure {
            return Err(Error::Stream(reason.clone()));
        }

        let id = shared.allocate_id();
        shared.input = Some(Slot {
            id,
            config: config.clone(),
            callback,
        });
        tracing::debug!(id, "offline input stream");

        Ok(StreamHandle::new(OfflineStream {
            shared: Arc::clone(&self.shared),
            id,
            direction: Direction::Input,
        }))
    }
}

/// Control side of an [`OfflineBackend`]. Cheap to clone.
#[derive(Clone)]
pub struct OfflineDriver {
    shared: Arc<Mutex<Shared>>,
}

impl OfflineDriver {
    /// Run one block of `frames` frames.
    ///
    /// Queued microphone samples (zero-padded when short) go to the input
    /// stream first, then the output stream renders. Returns the interleaved
    /// output, or an empty vector when no output stream is open.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut shared = self.shared.lock();
        let Shared {
            input,
            output,
            pending_input,
            ..
        } = &mut *shared;

        if let Some(slot) = input {
            let wanted = frames * slot.config.channels as usize;
            let available = wanted.min(pending_input.len());
            let mut block: Vec<f32> = pending_input.drain(..available).collect();
            block.resize(wanted, 0.0);
            (slot.callback)(&block);
        }

        match output {
            Some(slot) => {
                let mut block = vec![0.0; frames * slot.config.channels as usize];
                (slot.callback)(&mut block);
                block
            }
            None => Vec::new(),
        }
    }

    /// Render `blocks` blocks of the output stream's buffer size and
    /// concatenate them.
    pub fn render_blocks(&self, blocks: usize) -> Vec<f32> {
        let frames = self.output_config().map_or(128, |c| c.buffer_size as usize);
        let mut out = Vec::new();
        for _ in 0..blocks {
            out.extend(self.render(frames));
        }
        out
    }

    /// Queue interleaved microphone samples for the input stream. Dropped if
    /// no input stream is open.
    pub fn feed_input(&self, samples: &[f32]) {
        let mut shared = self.shared.lock();
        if shared.input.is_some() {
            shared.pending_input.extend(samples.iter().copied());
        }
    }

    /// Make input stream construction fail with `reason`, or succeed again
    /// with `None`.
    pub fn fail_input(&self, reason: Option<&str>) {
        self.shared.lock().input_failure = reason.map(str::to_string);
    }

    /// Make output stream construction fail with `reason`, or succeed again
    /// with `None`.
    pub fn fail_output(&self, reason: Option<&str>) {
        self.shared.lock().output_failure = reason.map(str::to_string);
    }

    /// True while an input stream is open.
    pub fn has_input(&self) -> bool {
        self.shared.lock().input.is_some()
    }

    /// True while an output stream is open.
    pub fn has_output(&self) -> bool {
        self.shared.lock().output.is_some()
    }

    /// Configuration of the open output stream.
    pub fn output_config(&self) -> Option<BackendStreamConfig> {
        self.shared.lock().output.as_ref().map(|s| s.config.clone())
    }

    /// Every input stream request so far, including failed ones.
    pub fn input_requests(&self) -> Vec<BackendStreamConfig> {
        self.shared.lock().input_requests.clone()
    }
}

impl std::fmt::Debug for OfflineDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineDriver")
            .field("has_input", &self.has_input())
            .field("has_output", &self.has_output())
            .finish()
    }
}
