//! Receiver configuration

use crate::receiver::SameReceiver;

/// Builds a SAME/EAS receiver
///
/// The builder comes with a sensible set of defaults; all you really
/// need to provide is the input sampling rate. The builder API is
/// part of this crate's stable surface, but the default *values* are
/// not—if you care strongly about a setting, configure it.
///
/// ```
/// use samewave::SameReceiverBuilder;
///
/// let rx = SameReceiverBuilder::new(22050)
///     .with_timing_max_deviation(0.01)
///     .build();
/// assert_eq!(22050, rx.input_rate());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SameReceiverBuilder {
    input_rate: u32,
    dc_blocker_len: usize,
    agc_bandwidth: f32,
    agc_gain_limits: [f32; 2],
    timing_bandwidth_unlocked: f32,
    timing_bandwidth_locked: f32,
    timing_max_deviation: f32,
    sync_max_errors: u32,
    prefix_max_errors: u32,
    frame_max_invalid: u32,
}

impl SameReceiverBuilder {
    /// New builder for the given input sampling rate (Hz)
    ///
    /// Any rate from 8 kHz to 48 kHz works; 22050 Hz is a popular
    /// choice that avoids resampling on most sound hardware.
    pub fn new(input_rate: u32) -> Self {
        Self {
            input_rate,
            dc_blocker_len: 0,
            agc_bandwidth: 0.25,
            agc_gain_limits: [1.0e-6, 1.0e6],
            timing_bandwidth_unlocked: 0.125,
            timing_bandwidth_locked: 0.05,
            timing_max_deviation: 0.01,
            sync_max_errors: 2,
            prefix_max_errors: 2,
            frame_max_invalid: 10,
        }
    }

    /// Build a receiver, ready for samples
    pub fn build(&self) -> SameReceiver {
        SameReceiver::from(self)
    }

    /// Input sampling rate (Hz)
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// DC blocker length, in input samples
    ///
    /// `0` (the default) selects one symbol's worth of samples.
    /// Use `1` to disable DC blocking entirely.
    pub fn with_dc_blocker_length(&mut self, len: usize) -> &mut Self {
        self.dc_blocker_len = len;
        self
    }

    /// DC blocker length
    pub fn dc_blocker_len(&self) -> usize {
        self.dc_blocker_len
    }

    /// AGC bandwidth (fraction of the baud rate)
    ///
    /// Controls how fast the gain may evolve. Values above 1.0 make
    /// the AGC move significantly faster than one symbol.
    pub fn with_agc_bandwidth(&mut self, bw: f32) -> &mut Self {
        self.agc_bandwidth = bw.max(0.0);
        self
    }

    /// AGC bandwidth
    pub fn agc_bandwidth(&self) -> f32 {
        self.agc_bandwidth
    }

    /// AGC gain limits, `(minimum, maximum)`
    ///
    /// In units of inverse input amplitude. When decoding `i16`
    /// samples cast to `f32`, a minimum of `1.0 / 32767.0` is a
    /// good choice.
    pub fn with_agc_gain_limits(&mut self, min: f32, max: f32) -> &mut Self {
        self.agc_gain_limits = [min, f32::max(min, max)];
        self
    }

    /// AGC gain limits
    pub fn agc_gain_limits(&self) -> [f32; 2] {
        self.agc_gain_limits
    }

    /// Timing loop bandwidth (fraction of the baud rate)
    ///
    /// The first value applies while hunting for a preamble; the
    /// second, once byte sync is acquired. The locked bandwidth is
    /// clamped to the unlocked one.
    pub fn with_timing_bandwidth(&mut self, unlocked: f32, locked: f32) -> &mut Self {
        self.timing_bandwidth_unlocked = unlocked.clamp(0.0, 1.0);
        self.timing_bandwidth_locked = locked.clamp(0.0, self.timing_bandwidth_unlocked);
        self
    }

    /// Timing loop bandwidths, `(unlocked, locked)`
    pub fn timing_bandwidth(&self) -> (f32, f32) {
        (self.timing_bandwidth_unlocked, self.timing_bandwidth_locked)
    }

    /// Maximum symbol clock deviation (fraction of a symbol)
    ///
    /// Bounds how far the tracked clock may drift from the nominal
    /// 520.83 Hz. Keep this small.
    pub fn with_timing_max_deviation(&mut self, max_dev: f32) -> &mut Self {
        self.timing_max_deviation = max_dev.clamp(0.0, 0.5);
        self
    }

    /// Maximum symbol clock deviation
    pub fn timing_max_deviation(&self) -> f32 {
        self.timing_max_deviation
    }

    /// Maximum preamble sync bit errors
    ///
    /// The receiver synchronizes on four bytes (32 bits) of the
    /// preamble. The preamble's correlation sidelobes are 8 bit
    /// errors at the nearest non-aligned shifts, so values up to
    /// about 3 are safe.
    pub fn with_sync_max_errors(&mut self, errors: u32) -> &mut Self {
        self.sync_max_errors = errors;
        self
    }

    /// Maximum preamble sync bit errors
    pub fn sync_max_errors(&self) -> u32 {
        self.sync_max_errors
    }

    /// Maximum `ZCZC`/`NNNN` prefix bit errors
    pub fn with_prefix_max_errors(&mut self, errors: u32) -> &mut Self {
        self.prefix_max_errors = errors;
        self
    }

    /// Maximum prefix bit errors
    pub fn prefix_max_errors(&self) -> u32 {
        self.prefix_max_errors
    }

    /// Invalid byte budget that ends a burst
    ///
    /// Counting non-SAME characters is, in practice, the most
    /// reliable way to detect the end of a burst. Too small a value
    /// forfeits error tolerance; too large a value bleeds one burst
    /// into the silence after it.
    pub fn with_frame_max_invalid(&mut self, count: u32) -> &mut Self {
        self.frame_max_invalid = count;
        self
    }

    /// Invalid byte budget
    pub fn frame_max_invalid(&self) -> u32 {
        self.frame_max_invalid
    }
}

impl Default for SameReceiverBuilder {
    fn default() -> Self {
        Self::new(22050)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = SameReceiverBuilder::default();
        assert_eq!(22050, builder.input_rate());
        let rx = builder.build();
        assert_eq!(22050, rx.input_rate());
    }

    #[test]
    fn test_builder_clamps() {
        let mut builder = SameReceiverBuilder::new(8000);
        builder.with_timing_bandwidth(0.1, 0.5);
        assert_eq!((0.1, 0.1), builder.timing_bandwidth());

        builder.with_timing_max_deviation(0.75);
        assert_eq!(0.5, builder.timing_max_deviation());

        builder.with_agc_gain_limits(0.5, 0.25);
        assert_eq!([0.5, 0.5], builder.agc_gain_limits());
    }
}
