//! Container decode into stereo buffers at the engine rate.
//!
//! Any container symphonia can probe (WAV, MP3, FLAC, AAC/MP4, Ogg Vorbis) is
//! decoded to interleaved stereo: mono sources are duplicated, channels past
//! the second are dropped. The result is resampled by linear interpolation to
//! the requested rate so playback can index frames directly.

use crate::{Error, Result};
use std::io::{Cursor, ErrorKind};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

/// Decoded audio, interleaved stereo `[L0, R0, L1, R1, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedBuffer {
    /// Wrap interleaved stereo samples. A trailing odd sample is dropped.
    pub fn from_interleaved(mut samples: Vec<f32>, sample_rate: u32) -> Self {
        samples.truncate(samples.len() & !1);
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duplicate a mono signal into both channels.
    pub fn from_mono(mono: &[f32], sample_rate: u32) -> Self {
        let samples = mono.iter().flat_map(|&s| [s, s]).collect();
        Self {
            samples,
            sample_rate,
        }
    }

    /// Interleaved stereo samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// True when the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Frame `index` as `(left, right)`, silence past the end.
    #[inline]
    pub fn frame(&self, index: usize) -> (f32, f32) {
        match self.samples.get(2 * index..2 * index + 2) {
            Some(&[l, r]) => (l, r),
            _ => (0.0, 0.0),
        }
    }

    /// Linearly interpolated frame at a fractional `position`.
    #[inline]
    pub fn frame_at(&self, position: f64) -> (f32, f32) {
        if position < 0.0 {
            return (0.0, 0.0);
        }
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let (l0, r0) = self.frame(index);
        let (l1, r1) = self.frame(index + 1);
        (l0 + (l1 - l0) * frac, r0 + (r1 - r0) * frac)
    }

    /// Mono mix `(L + R) / 2`.
    pub fn to_mono(&self) -> Vec<f32> {
        self.samples
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) * 0.5)
            .collect()
    }
}

/// Decode a file, using its extension as a probe hint.
pub fn decode_file(path: impl AsRef<Path>, target_rate: u32) -> Result<DecodedBuffer> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let extension = path.extension().and_then(|ext| ext.to_str());
    tracing::debug!(path = %path.display(), "decoding file");
    decode_source(Box::new(file), extension, target_rate)
}

/// Decode an in-memory container. `extension` is an optional probe hint.
pub fn decode_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
    target_rate: u32,
) -> Result<DecodedBuffer> {
    decode_source(Box::new(Cursor::new(bytes)), extension, target_rate)
}

fn decode_source(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
    target_rate: u32,
) -> Result<DecodedBuffer> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("failed to probe container: {e}")))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode("container has no default track".into()))?;
    let track_id = track.id;
    let source_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("track has no sample rate".into()))?;

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {e}")))?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(Error::Decode(format!("failed to read packet: {err}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let audio = match decoder.decode(&packet) {
            Ok(audio) => audio,
            Err(SymphoniaError::DecodeError(reason)) => {
                skipped += 1;
                tracing::warn!(reason, "skipping corrupt packet");
                continue;
            }
            Err(err) => return Err(Error::Decode(format!("failed to decode packet: {err}"))),
        };

        let spec = *audio.spec();
        let channels = spec.channels.count();
        if channels == 0 {
            continue;
        }
        let mut buffer = SampleBuffer::<f32>::new(audio.capacity() as u64, spec);
        buffer.copy_interleaved_ref(audio);

        for frame in buffer.samples().chunks_exact(channels) {
            let left = frame[0];
            let right = if channels == 1 { left } else { frame[1] };
            samples.push(left);
            samples.push(right);
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode("container produced no samples".into()));
    }

    let samples = resample_stereo(&samples, source_rate, target_rate);
    let buffer = DecodedBuffer::from_interleaved(samples, target_rate);
    tracing::info!(
        frames = buffer.frames(),
        source_rate,
        target_rate,
        skipped,
        "decoded audio"
    );
    Ok(buffer)
}

/// Resample interleaved stereo by linear interpolation, channels independently.
pub fn resample_stereo(samples: &[f32], src_rate: u32, target_rate: u32) -> Vec<f32> {
    if src_rate == 0 || target_rate == 0 || src_rate == target_rate {
        return samples.to_vec();
    }

    let src_frames = samples.len() / 2;
    if src_frames == 0 {
        return Vec::new();
    }

    let ratio = f64::from(target_rate) / f64::from(src_rate);
    let new_frames = ((src_frames as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(new_frames * 2);

    for i in 0..new_frames {
        let src_pos = i as f64 / ratio;
        let lower = src_pos.floor() as usize;
        let frac = (src_pos - lower as f64) as f32;

        if lower >= src_frames - 1 {
            let last = (src_frames - 1) * 2;
            output.extend_from_slice(&samples[last..last + 2]);
        } else {
            let a = lower * 2;
            let b = a + 2;
            output.push(samples[a] + (samples[b] - samples[a]) * frac);
            output.push(samples[a + 1] + (samples[b + 1] - samples[a + 1]) * frac);
        }
    }

    output
}
