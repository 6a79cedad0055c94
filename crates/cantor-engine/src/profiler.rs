//! Spectral profiler.
//!
//! Samples a [`VisualizationTap`] every [`PROFILE_INTERVAL`] for a fixed
//! duration and reduces the byte frequency reads to a
//! [`SpectralFingerprint`]. Runs on its own thread, is cancellable, and
//! resolves with [`SpectralFingerprint::ZERO`] when cancelled or when the
//! tap goes away mid-run.

use crate::tap::VisualizationTap;
use cantor_analysis::{BandEdges, FingerprintAccumulator, SpectralFingerprint};
use crossbeam_channel::{Receiver, Sender, select};
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;

/// Time between tap reads.
pub const PROFILE_INTERVAL: Duration = Duration::from_millis(100);

/// Number of reads a profile of `duration` takes: one per whole interval.
pub fn sample_count(duration: Duration) -> usize {
    (duration.as_millis() / PROFILE_INTERVAL.as_millis()) as usize
}

/// Accumulates tap reads toward a fingerprint.
///
/// The threaded [`ProfileHandle`] drives one of these on a timer; offline
/// callers drive it by hand after rendering each interval of audio.
#[derive(Debug)]
pub struct SpectralProfiler {
    accumulator: FingerprintAccumulator,
    read: Vec<u8>,
    wanted: usize,
}

/// Outcome of one profiler step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileStep {
    /// More reads are needed.
    Pending,
    /// All reads are in.
    Done(SpectralFingerprint),
}

impl SpectralProfiler {
    /// A profiler taking `samples` reads of `bins` bins at `sample_rate`.
    pub fn new(sample_rate: f32, bins: usize, samples: usize) -> Self {
        Self {
            accumulator: FingerprintAccumulator::new(BandEdges::new(sample_rate, bins)),
            read: vec![0; bins],
            wanted: samples,
        }
    }

    /// A profiler sized for `tap` and `duration`.
    pub fn for_tap(tap: &VisualizationTap, duration: Duration) -> Self {
        Self::new(tap.sample_rate(), tap.frequency_bin_count(), sample_count(duration))
    }

    /// Reads taken so far.
    pub fn reads(&self) -> usize {
        self.accumulator.reads()
    }

    /// Take one read from `tap`.
    pub fn sample(&mut self, tap: &VisualizationTap) -> ProfileStep {
        if self.is_done() {
            return ProfileStep::Done(self.accumulator.finish());
        }
        tap.byte_frequency_data(&mut self.read);
        self.accumulator.add(&self.read);
        if self.is_done() {
            ProfileStep::Done(self.accumulator.finish())
        } else {
            ProfileStep::Pending
        }
    }

    fn is_done(&self) -> bool {
        self.accumulator.reads() >= self.wanted
    }
}

/// A running profile.
#[derive(Debug)]
pub struct ProfileHandle {
    cancel: Sender<()>,
    worker: Option<JoinHandle<SpectralFingerprint>>,
}

impl ProfileHandle {
    /// Start profiling `tap` for `duration` on a background thread.
    ///
    /// A dead `Weak` resolves with the zero fingerprint straight away.
    pub fn spawn(tap: Weak<VisualizationTap>, duration: Duration) -> Self {
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(1);
        let worker = std::thread::Builder::new()
            .name("cantor-profiler".into())
            .spawn(move || run(&tap, duration, &cancel_rx));
        let worker = match worker {
            Ok(worker) => Some(worker),
            Err(e) => {
                tracing::error!(error = %e, "could not start profiler thread");
                None
            }
        };
        Self {
            cancel: cancel_tx,
            worker,
        }
    }

    /// True once the profile has resolved.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop early. [`wait`](Self::wait) then yields the zero fingerprint.
    pub fn cancel(&self) {
        let _ = self.cancel.try_send(());
    }

    /// Block until the profile resolves.
    pub fn wait(mut self) -> SpectralFingerprint {
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(fingerprint)) => fingerprint,
            Some(Err(_)) => {
                tracing::error!("profiler thread panicked");
                SpectralFingerprint::ZERO
            }
            None => SpectralFingerprint::ZERO,
        }
    }
}

fn run(
    tap: &Weak<VisualizationTap>,
    duration: Duration,
    cancel: &Receiver<()>,
) -> SpectralFingerprint {
    let Some(mut profiler) = tap
        .upgrade()
        .map(|tap| SpectralProfiler::for_tap(&tap, duration))
    else {
        tracing::debug!("no visualization tap, profile is empty");
        return SpectralFingerprint::ZERO;
    };
    if profiler.wanted == 0 {
        return SpectralFingerprint::ZERO;
    }

    tracing::info!(samples = profiler.wanted, "profiling started");
    let ticker = crossbeam_channel::tick(PROFILE_INTERVAL);
    loop {
        select! {
            recv(cancel) -> _ => {
                tracing::info!(reads = profiler.reads(), "profiling cancelled");
                return SpectralFingerprint::ZERO;
            }
            recv(ticker) -> _ => {
                let Some(tap) = tap.upgrade().filter(|tap| tap.is_live()) else {
                    tracing::warn!(
                        reads = profiler.reads(),
                        "visualization tap vanished mid-profile"
                    );
                    return SpectralFingerprint::ZERO;
                };
                if let ProfileStep::Done(fingerprint) = profiler.sample(&tap) {
                    tracing::info!(?fingerprint, "profiling finished");
                    return fingerprint;
                }
            }
        }
    }
}
