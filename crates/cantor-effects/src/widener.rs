//! Haas-effect stereo widener send.

use cantor_core::{
    Biquad, InterpolatedDelay, Interpolation, SmoothedParam, StereoSend, highpass_coefficients,
};

/// Send level when widening is on.
pub const WIDTH_SEND: f32 = 0.5;
/// Crossover below which content stays centered.
pub const WIDTH_HIGHPASS_HZ: f32 = 300.0;
/// Left channel delay.
pub const LEFT_DELAY_SECONDS: f32 = 0.010;
/// Right channel delay.
pub const RIGHT_DELAY_SECONDS: f32 = 0.020;

/// High-passed copy of the signal, delayed 10 ms on the left and 20 ms on
/// the right, added to the master bus.
///
/// ```text
/// in → × send (0 / 0.5) → HP 300 Hz ─┬→ delay 10 ms → L
///                                   └→ delay 20 ms → R
/// ```
#[derive(Debug, Clone)]
pub struct HaasWidener {
    send: SmoothedParam,
    highpass: Biquad,
    left: InterpolatedDelay,
    right: InterpolatedDelay,
    left_delay: f32,
    right_delay: f32,
}

impl HaasWidener {
    /// Disabled widener.
    pub fn new(sample_rate: f32) -> Self {
        let mut highpass = Biquad::new();
        highpass.set(highpass_coefficients(WIDTH_HIGHPASS_HZ, 0.707, sample_rate));

        let line = |seconds: f32| {
            let mut delay = InterpolatedDelay::from_time(sample_rate, seconds);
            delay.set_interpolation(Interpolation::None);
            delay
        };

        Self {
            send: SmoothedParam::automation(0.0, sample_rate),
            highpass,
            left: line(LEFT_DELAY_SECONDS),
            right: line(RIGHT_DELAY_SECONDS),
            left_delay: (LEFT_DELAY_SECONDS * sample_rate).round(),
            right_delay: (RIGHT_DELAY_SECONDS * sample_rate).round(),
        }
    }

    /// Turn widening on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.send
            .set_target(if enabled { WIDTH_SEND } else { 0.0 });
    }

    /// Target send level.
    pub fn send_level(&self) -> f32 {
        self.send.target()
    }

    /// Jump to the target. Only before the send carries signal.
    pub fn settle(&mut self) {
        self.send.snap_to_target();
    }
}

impl StereoSend for HaasWidener {
    #[inline]
    fn process_send(&mut self, input: f32) -> (f32, f32) {
        let filtered = self.highpass.process(input * self.send.advance());
        self.left.write(filtered);
        self.right.write(filtered);
        (self.left.read(self.left_delay), self.right.read(self.right_delay))
    }

    fn reset(&mut self) {
        self.highpass.clear();
        self.left.clear();
        self.right.clear();
    }
}
