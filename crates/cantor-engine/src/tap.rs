//! Visualization tap: an analyser fed from the master mix.
//!
//! The audio thread pushes mono samples into a bounded queue and never
//! blocks; a full queue drops samples and counts them. Reads drain the
//! queue into the analyser first, so each read reflects the most recent
//! audio. Reading touches only the tap's own analyser state.

use cantor_analysis::Analyser;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Queue depth between the audio thread and the tap, in samples.
pub const TAP_QUEUE: usize = 16384;

/// Audio-thread end of the tap.
pub(crate) struct TapWriter {
    tx: Sender<f32>,
    dropped: Arc<AtomicU64>,
}

impl TapWriter {
    #[inline]
    pub(crate) fn push(&self, sample: f32) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(sample) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Read side of the visualization tap.
///
/// Shared as `Arc<VisualizationTap>`; every read takes `&self`.
pub struct VisualizationTap {
    rx: Receiver<f32>,
    analyser: Mutex<Analyser>,
    dropped: Arc<AtomicU64>,
    disconnected: AtomicBool,
    sample_rate: f32,
}

impl VisualizationTap {
    /// A tap with a default analyser (fft size 2048, smoothing 0.8) and the
    /// writer the audio thread feeds.
    pub(crate) fn new(sample_rate: f32) -> (Self, TapWriter) {
        let (tx, rx) = crossbeam_channel::bounded(TAP_QUEUE);
        let dropped = Arc::new(AtomicU64::new(0));
        (
            Self {
                rx,
                analyser: Mutex::new(Analyser::default()),
                dropped: Arc::clone(&dropped),
                disconnected: AtomicBool::new(false),
                sample_rate,
            },
            TapWriter { tx, dropped },
        )
    }

    /// Sample rate of the tapped signal.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of frequency bins per read.
    pub fn frequency_bin_count(&self) -> usize {
        self.analyser.lock().frequency_bin_count()
    }

    /// False once the graph feeding this tap has been torn down.
    pub fn is_live(&self) -> bool {
        !self.disconnected.load(Ordering::Acquire)
    }

    /// Samples lost to a full queue since the last call.
    pub fn take_dropped(&self) -> u64 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Byte-scaled smoothed magnitudes (`0..=255` over −100..−30 dB).
    pub fn byte_frequency_data(&self, out: &mut [u8]) {
        let mut analyser = self.analyser.lock();
        self.drain_into(&mut analyser);
        analyser.byte_frequency_data(out);
    }

    /// Smoothed magnitudes in dB.
    pub fn float_frequency_data(&self, out: &mut [f32]) {
        let mut analyser = self.analyser.lock();
        self.drain_into(&mut analyser);
        analyser.float_frequency_data(out);
    }

    /// Most recent samples scaled to `0..=255` around 128.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let mut analyser = self.analyser.lock();
        self.drain_into(&mut analyser);
        analyser.byte_time_domain_data(out);
    }

    /// Most recent samples.
    pub fn float_time_domain_data(&self, out: &mut [f32]) {
        let mut analyser = self.analyser.lock();
        self.drain_into(&mut analyser);
        analyser.float_time_domain_data(out);
    }

    fn drain_into(&self, analyser: &mut Analyser) {
        loop {
            match self.rx.try_recv() {
                Ok(sample) => analyser.push(sample),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected.store(true, Ordering::Release);
                    break;
                }
            }
        }
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            tracing::warn!(dropped, "visualization tap queue overflowed");
        }
    }
}

impl std::fmt::Debug for VisualizationTap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizationTap")
            .field("sample_rate", &self.sample_rate)
            .field("queued", &self.rx.len())
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}
