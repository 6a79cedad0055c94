//! The fixed vocal signal graph.
//!
//! ```text
//! vocal → gain → low-cut → pitch → tone stack → compressor ─┬─ dry ────────┐
//!                                                           ├─ reverb ─────┤
//!                                                           ├─ echo ───────┼→ × output gain → bus
//!                                                           └─ widener ────┘
//!
//! bus ─┬→ monitor delay → monitor gain ─(+ backing)→ output
//!      └─(+ backing)→ mix (recorder, visualization tap)
//! ```
//!
//! The graph is built once per engine instance and never restructured; only
//! its smoothed parameters move. Backing-track frames skip the chain and the
//! monitor path entirely.

use cantor_config::Settings;
use cantor_core::{Effect, InterpolatedDelay, SmoothedParam, StereoSend};
use cantor_effects::{
    Compressor, ConvolutionReverb, FeedbackDelay, GainStage, HaasWidener, HighPass, PitchShifter,
    ToneStack,
};

/// Capacity of the monitor delay line in seconds.
pub const MONITOR_DELAY_CAPACITY: f32 = 1.0;
/// Largest monitor delay accepted, in seconds.
pub const MAX_MONITOR_DELAY: f32 = 0.2;

/// One processed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GraphFrame {
    /// Monitor path plus backing, for the physical output
    pub output: (f32, f32),
    /// Master bus plus backing, never delayed or gated
    pub mix: (f32, f32),
}

/// Target value of every node parameter, for comparing graph states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphTargets {
    /// Input gain, linear
    pub input_gain: f32,
    /// Low-cut cutoff in Hz
    pub low_cut_hz: f32,
    /// Pitch shifter `(dry, wet, rate_hz, depth_seconds, fade_a, fade_b)`
    pub pitch: (f32, f32, f32, f32, f32, f32),
    /// Tone stack `[low, mid, high, air]` in dB
    pub tone_db: [f32; 4],
    /// Compressor `(threshold_db, ratio)`
    pub compressor: (f32, f32),
    /// Reverb send level
    pub reverb_mix: f32,
    /// Echo `(time_seconds, feedback, mix)`
    pub echo: (f32, f32, f32),
    /// Widener send level
    pub width_send: f32,
    /// Master gain
    pub output_gain: f32,
    /// Monitor delay in seconds
    pub monitor_delay: f32,
    /// Monitor gain (0 or 1)
    pub monitor_gain: f32,
}

/// Every node of one engine instance, owned by the audio thread.
pub struct VocalGraph {
    input_gain: GainStage,
    low_cut: HighPass,
    pitch: PitchShifter,
    tone: ToneStack,
    compressor: Compressor,
    reverb: ConvolutionReverb,
    echo: FeedbackDelay,
    widener: HaasWidener,
    output_gain: SmoothedParam,
    monitor_left: InterpolatedDelay,
    monitor_right: InterpolatedDelay,
    monitor_delay: SmoothedParam,
    monitor_gain: SmoothedParam,
    sample_rate: f32,
}

impl VocalGraph {
    /// A graph at default node values with monitoring off.
    ///
    /// Generates the reverb impulse, so this allocates and takes a few
    /// milliseconds; build it off the audio thread.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            input_gain: GainStage::new(sample_rate),
            low_cut: HighPass::new(sample_rate),
            pitch: PitchShifter::new(sample_rate),
            tone: ToneStack::new(sample_rate),
            compressor: Compressor::new(sample_rate),
            reverb: ConvolutionReverb::new(sample_rate),
            echo: FeedbackDelay::new(sample_rate),
            widener: HaasWidener::new(sample_rate),
            output_gain: SmoothedParam::automation(1.0, sample_rate),
            monitor_left: InterpolatedDelay::from_time(sample_rate, MONITOR_DELAY_CAPACITY),
            monitor_right: InterpolatedDelay::from_time(sample_rate, MONITOR_DELAY_CAPACITY),
            monitor_delay: SmoothedParam::automation(0.0, sample_rate),
            monitor_gain: SmoothedParam::automation(0.0, sample_rate),
            sample_rate,
        }
    }

    /// Set every node's target from `settings`.
    ///
    /// Total: every parameter is retargeted, so applying the same snapshot
    /// twice leaves the same targets as applying it once. Values are taken
    /// as given; nodes clamp only at their physical limits.
    pub fn apply(&mut self, settings: &Settings) {
        self.input_gain.set_gain_db(settings.input_gain);
        self.low_cut.set_enabled(settings.high_pass);
        self.pitch
            .set_shift(settings.pitch_shift, settings.autotune_amount);
        self.tone
            .set_gains_db(settings.low_gain, settings.mid_gain, settings.high_gain);
        self.tone.set_air(settings.air_mode);
        self.compressor
            .set_threshold_db(settings.compressor_threshold);
        self.compressor.set_ratio(settings.compressor_ratio);
        self.reverb.set_mix(settings.reverb_mix);
        self.echo.set_time(settings.delay_time);
        self.echo.set_feedback(settings.delay_feedback);
        self.echo.set_mix(settings.delay_mix);
        self.widener.set_enabled(settings.spatial_3d);
        self.output_gain.set_target(settings.output_gain);
    }

    /// Turn the monitor path on or off.
    pub fn set_monitor(&mut self, enabled: bool) {
        self.monitor_gain.set_target(if enabled { 1.0 } else { 0.0 });
    }

    /// Monitor delay in seconds, clamped to `0..=0.2`.
    pub fn set_monitor_delay(&mut self, seconds: f32) {
        self.monitor_delay
            .set_target(seconds.clamp(0.0, MAX_MONITOR_DELAY));
    }

    /// Jump every parameter to its target.
    ///
    /// Only valid while the graph is being built, before it carries audio.
    pub fn settle(&mut self) {
        self.input_gain.settle();
        self.low_cut.settle();
        self.pitch.settle();
        self.tone.settle();
        self.compressor.settle();
        self.reverb.settle();
        self.echo.settle();
        self.widener.settle();
        self.output_gain.snap_to_target();
        self.monitor_delay.snap_to_target();
        self.monitor_gain.snap_to_target();
    }

    /// Current targets of every node.
    pub fn targets(&self) -> GraphTargets {
        GraphTargets {
            input_gain: self.input_gain.gain(),
            low_cut_hz: self.low_cut.cutoff_hz(),
            pitch: self.pitch.targets(),
            tone_db: self.tone.gains_db(),
            compressor: self.compressor.targets(),
            reverb_mix: self.reverb.mix(),
            echo: self.echo.targets(),
            width_send: self.widener.send_level(),
            output_gain: self.output_gain.target(),
            monitor_delay: self.monitor_delay.target(),
            monitor_gain: self.monitor_gain.target(),
        }
    }

    /// Sample rate the graph was built for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Most recent compressor gain change in dB.
    pub fn gain_reduction_db(&self) -> f32 {
        self.compressor.gain_reduction_db()
    }

    /// Process one vocal sample and one backing frame.
    #[inline]
    pub fn process(&mut self, vocal: f32, backing: (f32, f32)) -> GraphFrame {
        let x = self.input_gain.process(vocal);
        let x = self.low_cut.process(x);
        let x = self.pitch.process(x);
        let x = self.tone.process(x);
        let dry = self.compressor.process(x);

        let (rev_l, rev_r) = self.reverb.process_send(dry);
        let (echo_l, echo_r) = self.echo.process_send(dry);
        let (wide_l, wide_r) = self.widener.process_send(dry);

        let master = self.output_gain.advance();
        let bus_l = (dry + rev_l + echo_l + wide_l) * master;
        let bus_r = (dry + rev_r + echo_r + wide_r) * master;

        let delay = self.monitor_delay.advance() * self.sample_rate;
        let gain = self.monitor_gain.advance();
        self.monitor_left.write(bus_l);
        self.monitor_right.write(bus_r);
        let mon_l = self.monitor_left.read(delay) * gain;
        let mon_r = self.monitor_right.read(delay) * gain;

        GraphFrame {
            output: (mon_l + backing.0, mon_r + backing.1),
            mix: (bus_l + backing.0, bus_r + backing.1),
        }
    }

    /// Clear all node state (delay lines, filters, reverb tail).
    pub fn reset(&mut self) {
        self.input_gain.reset();
        self.low_cut.reset();
        self.pitch.reset();
        self.tone.reset();
        self.compressor.reset();
        StereoSend::reset(&mut self.reverb);
        StereoSend::reset(&mut self.echo);
        StereoSend::reset(&mut self.widener);
        self.monitor_left.clear();
        self.monitor_right.clear();
    }
}

impl std::fmt::Debug for VocalGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocalGraph")
            .field("sample_rate", &self.sample_rate)
            .field("targets", &self.targets())
            .finish_non_exhaustive()
    }
}
