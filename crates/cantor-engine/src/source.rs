//! Source slots and file playback.

use cantor_core::{SmoothedParam, semitones_to_ratio};
use cantor_io::DecodedBuffer;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What is feeding a slot of the graph.
///
/// The engine keeps two slots: the input slot (`None`, `Microphone` or
/// `VocalTrack`) runs through the effects chain, the bypass slot (`None` or
/// `BackingTrack`) goes straight to the sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveSource {
    /// Nothing connected
    #[default]
    None,
    /// Live capture
    Microphone,
    /// Backing file, bypassing the effects
    BackingTrack,
    /// Vocal file, through the effects
    VocalTrack,
}

/// The two file roles the engine holds buffers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// Accompaniment, played around the effects chain
    Backing,
    /// Pre-recorded vocal, played through the effects chain
    Vocal,
}

impl FileRole {
    /// Lowercase role name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backing => "backing",
            Self::Vocal => "vocal",
        }
    }
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback instance ids the audio thread reports as finished.
///
/// Each playback gets a fresh id from the control side; the audio thread
/// stores the id when that playback runs out, so a stale finish can never
/// be mistaken for the end of a newer one.
#[derive(Debug, Default)]
pub(crate) struct PlaybackStatus {
    vocal_finished: AtomicU64,
    backing_finished: AtomicU64,
}

impl PlaybackStatus {
    pub(crate) fn mark_finished(&self, role: FileRole, id: u64) {
        self.slot(role).store(id, Ordering::Release);
    }

    pub(crate) fn is_finished(&self, role: FileRole, id: u64) -> bool {
        self.slot(role).load(Ordering::Acquire) == id
    }

    fn slot(&self, role: FileRole) -> &AtomicU64 {
        match role {
            FileRole::Vocal => &self.vocal_finished,
            FileRole::Backing => &self.backing_finished,
        }
    }
}

/// One playback of a decoded buffer.
///
/// The read position advances by the playback rate, so a detune in
/// semitones plays the file `2^(st/12)` times faster. The rate glides like
/// every other parameter once playback has started.
pub(crate) struct FilePlayer {
    buffer: Arc<DecodedBuffer>,
    position: f64,
    rate: SmoothedParam,
    looping: bool,
    id: u64,
}

impl FilePlayer {
    pub(crate) fn new(
        buffer: Arc<DecodedBuffer>,
        detune_semitones: f32,
        looping: bool,
        id: u64,
        sample_rate: f32,
    ) -> Self {
        Self {
            buffer,
            position: 0.0,
            rate: SmoothedParam::automation(semitones_to_ratio(detune_semitones), sample_rate),
            looping,
            id,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Retarget the detune of a running playback.
    pub(crate) fn set_detune(&mut self, semitones: f32) {
        self.rate.set_target(semitones_to_ratio(semitones));
    }

    /// Next stereo frame, or `None` once a non-looping playback has run out.
    #[inline]
    pub(crate) fn next_frame(&mut self) -> Option<(f32, f32)> {
        let frames = self.buffer.frames() as f64;
        if frames == 0.0 {
            return None;
        }
        if self.position >= frames {
            if !self.looping {
                return None;
            }
            self.position %= frames;
        }
        let frame = self.buffer.frame_at(self.position);
        self.position += f64::from(self.rate.advance());
        Some(frame)
    }
}

/// What the audio thread reads for the input slot.
pub(crate) enum InputNode {
    None,
    Microphone(Receiver<f32>),
    Vocal(FilePlayer),
}

impl InputNode {
    /// Next mono sample for the chain. A finished vocal empties the slot and
    /// reports its id.
    #[inline]
    pub(crate) fn next_sample(&mut self, status: &PlaybackStatus) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Microphone(rx) => {
                let sample = rx.try_recv().unwrap_or(0.0);
                if sample.is_finite() { sample } else { 0.0 }
            }
            Self::Vocal(player) => match player.next_frame() {
                Some((l, r)) => (l + r) * 0.5,
                None => {
                    status.mark_finished(FileRole::Vocal, player.id());
                    *self = Self::None;
                    0.0
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Arc<DecodedBuffer> {
        let mono: Vec<f32> = (0..frames).map(|i| i as f32).collect();
        Arc::new(DecodedBuffer::from_mono(&mono, 48000))
    }

    #[test]
    fn plays_to_the_end_then_stops() {
        let mut player = FilePlayer::new(ramp(4), 0.0, false, 1, 48000.0);
        let frames: Vec<_> = std::iter::from_fn(|| player.next_frame()).collect();
        assert_eq!(frames, vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert_eq!(player.next_frame(), None);
    }

    #[test]
    fn looping_wraps() {
        let mut player = FilePlayer::new(ramp(3), 0.0, true, 1, 48000.0);
        let firsts: Vec<f32> = (0..7).filter_map(|_| player.next_frame()).map(|f| f.0).collect();
        assert_eq!(firsts, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn octave_detune_doubles_rate() {
        let mut player = FilePlayer::new(ramp(100), 12.0, false, 1, 48000.0);
        let count = std::iter::from_fn(|| player.next_frame()).count();
        assert!((49..=51).contains(&count), "{count} frames");
    }

    #[test]
    fn detune_changes_glide() {
        let mut player = FilePlayer::new(ramp(48000), 0.0, false, 1, 48000.0);
        player.set_detune(12.0);
        player.next_frame();
        let a = player.next_frame().map(|f| f.0);
        let b = player.next_frame().map(|f| f.0);
        let step = b.zip(a).map(|(b, a)| b - a);
        assert!(step.is_some_and(|s| s > 1.0 && s < 1.01), "{step:?}");
    }

    #[test]
    fn empty_buffer_finishes_immediately() {
        let buffer = Arc::new(DecodedBuffer::from_interleaved(Vec::new(), 48000));
        let mut player = FilePlayer::new(buffer, 0.0, true, 1, 48000.0);
        assert_eq!(player.next_frame(), None);
    }

    #[test]
    fn finished_vocal_clears_slot_and_reports() {
        let status = PlaybackStatus::default();
        let mut node = InputNode::Vocal(FilePlayer::new(ramp(2), 0.0, false, 7, 48000.0));
        node.next_sample(&status);
        node.next_sample(&status);
        assert!(!status.is_finished(FileRole::Vocal, 7));
        node.next_sample(&status);
        assert!(status.is_finished(FileRole::Vocal, 7));
        assert!(matches!(node, InputNode::None));
    }

    #[test]
    fn microphone_sanitizes_non_finite() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        tx.send(f32::NAN).unwrap();
        tx.send(0.5).unwrap();
        let status = PlaybackStatus::default();
        let mut node = InputNode::Microphone(rx);
        assert_eq!(node.next_sample(&status), 0.0);
        assert_eq!(node.next_sample(&status), 0.5);
        assert_eq!(node.next_sample(&status), 0.0);
    }
}
