//! Spectral fingerprint: a compact `{low, mid, high, rms}` summary of a
//! sequence of byte-scaled frequency reads.
//!
//! Bins are partitioned by index. With bin width `sr / (2 · bins)`:
//!
//! | Band | Bins |
//! |------|------|
//! | low | `[0, floor(300 Hz / width))` |
//! | mid | `[low_end, floor(2 kHz / width))` |
//! | high | `[mid_end, bins)` |
//!
//! Each read contributes its per-band mean and its overall mean; the
//! fingerprint is the average of those means across reads, on the same
//! 0–255 scale as the reads.

/// Upper edge of the low band in Hz.
pub const LOW_BAND_HZ: f32 = 300.0;
/// Upper edge of the mid band in Hz.
pub const MID_BAND_HZ: f32 = 2000.0;

/// Averaged band energies on the 0–255 byte scale.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectralFingerprint {
    /// Mean energy below 300 Hz
    pub low: f32,
    /// Mean energy from 300 Hz to 2 kHz
    pub mid: f32,
    /// Mean energy above 2 kHz
    pub high: f32,
    /// Mean energy over all bins
    pub rms: f32,
}

impl SpectralFingerprint {
    /// The all-zero fingerprint.
    pub const ZERO: Self = Self {
        low: 0.0,
        mid: 0.0,
        high: 0.0,
        rms: 0.0,
    };
}

/// Bin indices separating the three bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandEdges {
    /// First bin of the mid band
    pub low_end: usize,
    /// First bin of the high band
    pub mid_end: usize,
    /// Total bins
    pub bins: usize,
}

impl BandEdges {
    /// Band edges for `bins` frequency bins at `sample_rate`.
    pub fn new(sample_rate: f32, bins: usize) -> Self {
        let width = sample_rate / (2.0 * bins as f32);
        let low_end = ((LOW_BAND_HZ / width) as usize).min(bins);
        let mid_end = ((MID_BAND_HZ / width) as usize).clamp(low_end, bins);
        Self {
            low_end,
            mid_end,
            bins,
        }
    }
}

/// Running accumulator of per-read band means.
///
/// # Example
///
/// ```rust
/// use cantor_analysis::{BandEdges, FingerprintAccumulator};
///
/// let mut acc = FingerprintAccumulator::new(BandEdges::new(48000.0, 1024));
/// acc.add(&[0u8; 1024]);
/// assert_eq!(acc.finish().rms, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FingerprintAccumulator {
    edges: BandEdges,
    sums: SpectralFingerprint,
    reads: usize,
}

impl FingerprintAccumulator {
    /// Empty accumulator.
    pub fn new(edges: BandEdges) -> Self {
        Self {
            edges,
            sums: SpectralFingerprint::ZERO,
            reads: 0,
        }
    }

    /// Band edges in use.
    pub fn edges(&self) -> BandEdges {
        self.edges
    }

    /// Number of reads accumulated.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Accumulate one byte-scaled frequency read.
    pub fn add(&mut self, read: &[u8]) {
        let BandEdges {
            low_end,
            mid_end,
            bins,
        } = self.edges;
        let bins = bins.min(read.len());
        let band_mean = |range: &[u8]| {
            if range.is_empty() {
                0.0
            } else {
                range.iter().map(|&b| f32::from(b)).sum::<f32>() / range.len() as f32
            }
        };

        let read = &read[..bins];
        let low_end = low_end.min(bins);
        let mid_end = mid_end.min(bins);

        self.sums.low += band_mean(&read[..low_end]);
        self.sums.mid += band_mean(&read[low_end..mid_end]);
        self.sums.high += band_mean(&read[mid_end..]);
        self.sums.rms += band_mean(read);
        self.reads += 1;
    }

    /// Average over all reads; zero when nothing was read.
    pub fn finish(&self) -> SpectralFingerprint {
        if self.reads == 0 {
            return SpectralFingerprint::ZERO;
        }
        let n = self.reads as f32;
        SpectralFingerprint {
            low: self.sums.low / n,
            mid: self.sums.mid / n,
            high: self.sums.high / n,
            rms: self.sums.rms / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_at_48k() {
        let edges = BandEdges::new(48000.0, 1024);
        assert_eq!(edges.low_end, 12);
        assert_eq!(edges.mid_end, 85);
    }

    #[test]
    fn edges_at_44k1() {
        let edges = BandEdges::new(44100.0, 1024);
        assert_eq!(edges.low_end, 13);
        assert_eq!(edges.mid_end, 92);
    }

    #[test]
    fn band_means_averaged_across_reads() {
        let edges = BandEdges::new(48000.0, 1024);
        let mut acc = FingerprintAccumulator::new(edges);

        let mut read = vec![0u8; 1024];
        read[..12].fill(200);
        acc.add(&read);
        acc.add(&[0u8; 1024]);

        let fp = acc.finish();
        assert!((fp.low - 100.0).abs() < 1e-4);
        assert_eq!(fp.mid, 0.0);
        assert_eq!(fp.high, 0.0);
        assert!((fp.rms - 200.0 * 12.0 / 1024.0 / 2.0).abs() < 1e-4);
    }

    #[test]
    fn empty_accumulator_is_zero() {
        let acc = FingerprintAccumulator::new(BandEdges::new(48000.0, 1024));
        assert_eq!(acc.finish(), SpectralFingerprint::ZERO);
    }
}
