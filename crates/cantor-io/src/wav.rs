//! WAV encoding for recordings and offline renders.
//!
//! Recordings are 32-bit float so the master bus is captured without
//! requantization; other bit depths write signed integer PCM.

use crate::Result;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// WAV header summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

fn spec(channels: u16, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

fn write_samples<W: Write + Seek>(writer: W, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::new(writer, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encode interleaved samples as a 32-bit float WAV file in memory.
///
/// ```rust
/// let bytes = cantor_io::encode_wav(&[0.0, 0.5, -0.5, 0.0], 2, 48000).unwrap();
/// assert_eq!(&bytes[..4], b"RIFF");
/// ```
pub fn encode_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 4));
    write_samples(&mut cursor, samples, spec(channels, sample_rate))?;
    Ok(cursor.into_inner())
}

/// Write interleaved samples to a 32-bit float WAV file.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
) -> Result<()> {
    let path = path.as_ref();
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_samples(file, samples, spec(channels, sample_rate))?;
    tracing::info!(
        path = %path.display(),
        frames = samples.len() / channels.max(1) as usize,
        "wrote wav"
    );
    Ok(())
}

/// Read a WAV header without loading samples.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate.max(1)),
    })
}
