//! Cantor Analysis - spectral reads and measurements
//!
//! - [`Analyser`] - sliding-window FFT analyser behind the visualization tap
//!   (byte/float frequency and time-domain reads, temporal smoothing)
//! - [`FingerprintAccumulator`] / [`SpectralFingerprint`] - the
//!   `{low, mid, high, rms}` summary fed to preset generation
//! - [`spectrum`] - magnitude spectrum, peak frequency, centroid
//! - [`xcorr`] - cross-correlation for stereo image measurement
//!
//! Enable the `serde` feature to serialize fingerprints.

pub mod analyser;
pub mod fft;
pub mod fingerprint;
pub mod spectrum;
pub mod xcorr;

pub use analyser::Analyser;
pub use fft::{Fft, Window};
pub use fingerprint::{BandEdges, FingerprintAccumulator, SpectralFingerprint};
pub use spectrum::{magnitude_spectrum, peak_frequency, spectral_centroid};
pub use xcorr::{peak_lag, xcorr_direct, xcorr_normalized, zero_lag_correlation};
