//! Audio synthesis for SAME transmissions
//!
//! The [`ToneSynthesizer`] generates the three waveform ingredients of
//! a SAME message: FSK data bursts, the two-tone attention signal, and
//! silence. The synthesizer carries its oscillator phase in an explicit
//! accumulator which is advanced on every output sample. Phase is
//! *never* reset between bits or between calls, so the generated FSK
//! is continuous-phase and free of keying clicks.
//!
//! Symbol lengths are fractional at most sampling rates: at 22050 Hz
//! one SAME symbol is 42.336 samples long. The synthesizer tracks the
//! accumulated fractional symbol boundary so that long bursts hold the
//! 520.83 baud rate exactly, instead of drifting by a truncated
//! fraction of a sample per bit.

use thiserror::Error;

use crate::waveform;

/// Default peak output amplitude (−3 dBFS)
pub const DEFAULT_PEAK: f32 = 0.70794576;

/// Error generating audio
#[derive(Error, Clone, Debug, PartialEq)]
pub enum SynthError {
    /// The baud rate must be a positive, finite number
    #[error("invalid baud rate: {0} (must be positive)")]
    InvalidBaudRate(f32),

    /// The sampling rate is outside the supported range
    #[error("unsupported sampling rate: {0} Hz (accepted: 8000 – 48000)")]
    UnsupportedSampleRate(u32),
}

/// Continuous-phase tone generator
///
/// Create one `ToneSynthesizer` per output stream and reuse it for
/// every segment of the transmission. All generator methods append
/// to a fresh buffer and advance the shared phase accumulator.
///
/// ```
/// use samewave::ToneSynthesizer;
///
/// let mut synth = ToneSynthesizer::new(22050).unwrap();
/// let bits = [true, false, true, true];
/// let samples = synth.fsk(&bits, samewave::waveform::BAUD_HZ).unwrap();
/// assert_eq!(samples.len(), 169); // round(4 × 42.336)
/// ```
#[derive(Clone, Debug)]
pub struct ToneSynthesizer {
    sample_rate: u32,
    peak: f32,
    phase: f32,
    symbol_residual: f64,
}

impl ToneSynthesizer {
    /// New synthesizer for the given sampling rate
    ///
    /// Output samples are normalized to a peak amplitude of
    /// [`DEFAULT_PEAK`] (−3 dBFS). Use
    /// [`with_peak()`](Self::with_peak) to change it.
    pub fn new(sample_rate: u32) -> Result<Self, SynthError> {
        if !(8000..=48000).contains(&sample_rate) {
            return Err(SynthError::UnsupportedSampleRate(sample_rate));
        }

        Ok(Self {
            sample_rate,
            peak: DEFAULT_PEAK,
            phase: 0.0,
            symbol_residual: 0.0,
        })
    }

    /// Set the peak output amplitude
    ///
    /// `peak` is a linear amplitude and is clamped to `(0.0, 1.0]`.
    pub fn with_peak(mut self, peak: f32) -> Self {
        self.peak = peak.clamp(f32::EPSILON, 1.0);
        self
    }

    /// Output sampling rate (Hz)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Reset the oscillator to zero initial conditions
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.symbol_residual = 0.0;
    }

    /// Generate FSK samples for a bit sequence
    ///
    /// Emits the mark tone for one bits and the space tone for zero
    /// bits, at the given `baud` rate. An empty `bits` slice yields
    /// an empty buffer, which is not an error.
    pub fn fsk(&mut self, bits: &[bool], baud: f32) -> Result<Vec<f32>, SynthError> {
        if !(baud > 0.0) || !baud.is_finite() {
            return Err(SynthError::InvalidBaudRate(baud));
        }

        const TWOPI: f32 = 2.0 * std::f32::consts::PI;
        let mark_rad_per_sa = TWOPI * waveform::FSK_MARK_HZ / self.sample_rate as f32;
        let space_rad_per_sa = TWOPI * waveform::FSK_SPACE_HZ / self.sample_rate as f32;
        let samples_per_symbol = self.sample_rate as f64 / baud as f64;

        let mut out = Vec::with_capacity((bits.len() as f64 * samples_per_symbol).ceil() as usize);
        for &bit in bits {
            // fractional symbol boundary: each bit takes floor or
            // ceil of the symbol length so the long-run rate is exact
            self.symbol_residual += samples_per_symbol;
            let nsamples = self.symbol_residual.round() as u64;
            self.symbol_residual -= nsamples as f64;

            let rad_per_sa = if bit { mark_rad_per_sa } else { space_rad_per_sa };
            for _i in 0..nsamples {
                self.phase += rad_per_sa;
                if self.phase > TWOPI {
                    self.phase -= TWOPI;
                }
                out.push(self.peak * self.phase.sin());
            }
        }

        Ok(out)
    }

    /// Generate the two-tone attention signal
    ///
    /// The attention signal is the sum of 853 Hz and 960 Hz
    /// sinusoids. It must be broadcast for 8 to 25 seconds; that
    /// range is enforced by the [encoder](crate::SameEncoder), not
    /// here, so that tests may generate short snippets.
    pub fn attention_tone(&mut self, duration_secs: f32) -> Vec<f32> {
        const TWOPI: f32 = 2.0 * std::f32::consts::PI;
        let low_rad_per_sa = TWOPI * waveform::ATTN_LOW_HZ / self.sample_rate as f32;
        let high_rad_per_sa = TWOPI * waveform::ATTN_HIGH_HZ / self.sample_rate as f32;

        // each component at half scale keeps the sum within the peak
        let scale = self.peak * 0.5;

        let nsamples = self.duration_to_samples(duration_secs);
        let mut out = Vec::with_capacity(nsamples);
        let mut phase_high = 0.0f32;
        for _i in 0..nsamples {
            self.phase += low_rad_per_sa;
            if self.phase > TWOPI {
                self.phase -= TWOPI;
            }
            phase_high += high_rad_per_sa;
            if phase_high > TWOPI {
                phase_high -= TWOPI;
            }
            out.push(scale * (self.phase.sin() + phase_high.sin()));
        }
        out
    }

    /// Generate silence
    pub fn silence(&self, duration_secs: f32) -> Vec<f32> {
        vec![0.0f32; self.duration_to_samples(duration_secs)]
    }

    fn duration_to_samples(&self, duration_secs: f32) -> usize {
        (duration_secs.max(0.0) as f64 * self.sample_rate as f64).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: u32 = 22050;

    #[test]
    fn test_rejects_bad_rates() {
        assert_eq!(
            Err(SynthError::UnsupportedSampleRate(4000)),
            ToneSynthesizer::new(4000).map(|_| ())
        );

        let mut synth = ToneSynthesizer::new(FS).unwrap();
        assert_eq!(
            Err(SynthError::InvalidBaudRate(0.0)),
            synth.fsk(&[true], 0.0)
        );
        assert_eq!(
            Err(SynthError::InvalidBaudRate(-1.0)),
            synth.fsk(&[true], -1.0)
        );
    }

    #[test]
    fn test_empty_bits() {
        let mut synth = ToneSynthesizer::new(FS).unwrap();
        let out = synth.fsk(&[], waveform::BAUD_HZ).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_symbol_timing_exact() {
        // 100 symbols at 22050 Hz must span round(100 × 42.336…)
        // samples, not 100 × floor(42.336…)
        let mut synth = ToneSynthesizer::new(FS).unwrap();
        let bits = vec![true; 100];
        let out = synth.fsk(&bits, waveform::BAUD_HZ).unwrap();

        let expect = (100.0f64 * FS as f64 / waveform::BAUD_HZ as f64).round() as usize;
        assert_eq!(expect, out.len());
        assert_ne!(100 * 42, out.len());
    }

    #[test]
    fn test_phase_continuity() {
        // the largest sample-to-sample step of a continuous-phase
        // sinusoid is bounded by its angular rate; a phase reset at a
        // bit boundary would show up as a full-scale jump
        let mut synth = ToneSynthesizer::new(FS).unwrap();
        let bits: Vec<bool> = (0..64).map(|i| i % 3 == 0).collect();
        let out = synth.fsk(&bits, waveform::BAUD_HZ).unwrap();

        let max_step = 2.0 * std::f32::consts::PI * waveform::FSK_MARK_HZ / FS as f32;
        for pair in out.windows(2) {
            assert!(
                (pair[1] - pair[0]).abs() <= max_step * DEFAULT_PEAK + 1e-4,
                "discontinuity: {} -> {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_peak_level() {
        let mut synth = ToneSynthesizer::new(FS).unwrap();
        let out = synth.fsk(&vec![true; 32], waveform::BAUD_HZ).unwrap();
        let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= DEFAULT_PEAK + 1e-6);
        assert!(peak > DEFAULT_PEAK * 0.95);

        let mut synth = ToneSynthesizer::new(FS).unwrap().with_peak(0.25);
        let out = synth.attention_tone(0.25);
        let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 0.25 + 1e-6);
    }

    #[test]
    fn test_attention_and_silence_lengths() {
        let mut synth = ToneSynthesizer::new(FS).unwrap();
        assert_eq!(FS as usize * 2, synth.attention_tone(2.0).len());
        assert_eq!(FS as usize / 2, synth.silence(0.5).len());
        assert!(synth.silence(0.5).iter().all(|&s| s == 0.0));
        assert!(synth.silence(-1.0).is_empty());
    }
}
