//! Decoding WAV containers produced by the encoder, through the full
//! symphonia probe path.

use cantor_io::{Error, decode_bytes, decode_file, encode_wav, write_wav};
use tempfile::TempDir;

fn tone(frames: usize, rate: f32) -> Vec<f32> {
    (0..frames)
        .flat_map(|n| {
            let s = (2.0 * std::f32::consts::PI * 440.0 * n as f32 / rate).sin() * 0.5;
            [s, -s]
        })
        .collect()
}

#[test]
fn stereo_wav_bytes_decode_unchanged() {
    let samples = tone(4800, 48000.0);
    let bytes = encode_wav(&samples, 2, 48000).unwrap();

    let decoded = decode_bytes(bytes, Some("wav"), 48000).unwrap();
    assert_eq!(decoded.sample_rate(), 48000);
    assert_eq!(decoded.frames(), 4800);
    for (a, b) in decoded.samples().iter().zip(&samples) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn mono_file_is_duplicated_and_resampled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mono.wav");
    let mono: Vec<f32> = (0..2400).map(|n| (n as f32 * 0.01).sin() * 0.25).collect();
    write_wav(&path, &mono, 1, 24000).unwrap();

    let decoded = decode_file(&path, 48000).unwrap();
    assert_eq!(decoded.sample_rate(), 48000);
    assert_eq!(decoded.frames(), 4800);
    for i in 0..decoded.frames() {
        let (l, r) = decoded.frame(i);
        assert_eq!(l, r);
    }
    assert!((decoded.duration_secs() - 0.1).abs() < 1e-6);
}

#[test]
fn missing_file_is_io_error() {
    let err = decode_file("/nonexistent/cantor/take.wav", 48000).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn truncated_header_is_decode_error() {
    let bytes = encode_wav(&tone(100, 48000.0), 2, 48000).unwrap();
    let err = decode_bytes(bytes[..20].to_vec(), Some("wav"), 48000).unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "{err}");
}
