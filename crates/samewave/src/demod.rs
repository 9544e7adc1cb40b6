//! FSK demodulation
//!
//! A mark/space tone correlator for 2FSK. Each output is a *soft
//! symbol* in `[-1.0, +1.0]`: the sign carries the bit decision and
//! the magnitude carries how decisively the mark and space energies
//! differed. The magnitude is the raw material for the per-bit
//! confidence reported further up the chain.
//!
//! An external symbol synchronizer decides *when* to correlate; see
//! [`symsync`](crate::symsync).
//!
//! The correlator uses the "matched filter" approach described in
//!
//! * Campbell, Robert F., "Analysis of Various Algorithmic approaches
//!   to Software-Based 1200 Baud Audio Frequency Shift Keying
//!   Demodulation for APRS," master's thesis, June 2016,
//!   pp. 18 – 22.
//!
//! Complex-valued filters make the detection insensitive to the
//! carrier phase of the sending station.

use num_complex::Complex;

use crate::filter::{FilterCoeff, Window};

/// One demodulated bit
///
/// The demodulation session emits one `BitEvent` per symbol period.
/// Low-confidence bits are emitted like any other: it is for the
/// downstream stages to decide what to trust.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BitEvent {
    /// Hard bit decision: `true` for mark, `false` for space
    pub value: bool,

    /// Decision confidence in `[0.0, 1.0]`
    ///
    /// The normalized difference between the mark and space tone
    /// energies over this bit period. Silence and co-channel
    /// interference both tend toward 0.0.
    pub confidence: f32,

    /// Monotonic symbol count at which this bit was decided
    pub offset: u64,
}

/// Confidence gain applied to the soft symbol magnitude
///
/// Matched-filter magnitudes dip slightly below 1.0 even on clean
/// signals. The soft magnitude is scaled by this factor and then
/// saturated at 1.0, so that an unimpaired reception reports full
/// confidence while degraded receptions still grade smoothly.
pub const CONFIDENCE_GAIN: f32 = 1.25;

/// Confidence of a soft symbol estimate
///
/// `confidence = min(1, CONFIDENCE_GAIN × |soft|)`, clamped to
/// `[0.0, 1.0]`.
#[inline]
pub fn symbol_confidence(soft: f32) -> f32 {
    (soft.abs() * CONFIDENCE_GAIN).clamp(0.0, 1.0)
}

/// Mark/space tone correlator for SAME FSK
///
/// Push samples in with [`push()`](Self::push); correlate the last
/// symbol's worth of history with [`correlate()`](Self::correlate).
/// For accurate output, `correlate()` should be invoked when the
/// history window is aligned with the sender's symbol clock; the
/// timing loop takes care of that.
#[derive(Clone, Debug)]
pub struct FskCorrelator {
    history: Window<f32>,
    mark_taps: FilterCoeff<Complex<f32>>,
    space_taps: FilterCoeff<Complex<f32>>,
}

impl FskCorrelator {
    /// Create the correlator for the SAME waveform
    ///
    /// Matched filters for the mark and space tones are generated
    /// for the input sampling rate `fs`. The correlator imposes a
    /// delay of [`ntaps()`](Self::ntaps)` / 2` samples.
    pub fn new(fs: u32) -> Self {
        let (mark, space) = crate::waveform::matched_filter(fs);
        Self::from_taps(mark.as_slice(), space.as_slice())
    }

    /// Create from explicit mark and space filter taps
    pub fn from_taps<C>(mark: C, space: C) -> Self
    where
        C: AsRef<[Complex<f32>]>,
    {
        let mark = mark.as_ref();
        Self {
            history: Window::new(mark.len()),
            mark_taps: FilterCoeff::from_slice(mark),
            space_taps: FilterCoeff::from_slice(space.as_ref()),
        }
    }

    /// Number of matched filter taps
    #[inline]
    pub fn ntaps(&self) -> usize {
        self.mark_taps.len()
    }

    /// Push samples into the history window
    #[inline]
    pub fn push<S>(&mut self, input: S)
    where
        S: AsRef<[f32]>,
    {
        self.history.push(input);
    }

    /// Correlate the current history into a soft symbol
    ///
    /// Output is `> 0` for mark and `< 0` for space. The magnitude
    /// approaches 1.0 when exactly one clean tone fills the window
    /// and 0.0 when the window holds silence or both tones equally.
    pub fn correlate(&self) -> f32 {
        let mark: Complex<f32> = self.mark_taps.filter(self.history.iter());
        let space: Complex<f32> = self.space_taps.filter(self.history.iter());

        // non-coherent energy difference, hard-limited to symbol range
        f32::clamp(mark.norm() - space.norm(), -1.0, 1.0)
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.history.reset();
    }
}

/// A complete bit-recovery session
///
/// The `BitDemodulator` is the analog front half of a receiver: DC
/// removal, AGC, matched-filter correlation, and timing recovery,
/// producing one [`BitEvent`] per symbol period. It is an explicit,
/// caller-owned object—all PLL and gain state lives here, never in
/// globals—so independent receivers are independent by construction.
///
/// ```
/// use samewave::{BitDemodulator, SameReceiverBuilder};
///
/// let mut demod = BitDemodulator::new(&SameReceiverBuilder::new(22050));
/// let chunk = vec![0.0f32; 4096];
/// for bit in demod.process(&chunk) {
///     // low-confidence bits are emitted like any other
///     assert!(bit.confidence <= 1.0);
/// }
/// ```
///
/// Most users want the full [`SameReceiver`](crate::SameReceiver),
/// which drives one of these and frames its output.
#[derive(Clone, Debug)]
pub struct BitDemodulator {
    dcblock: crate::dcblock::DcBlocker,
    agc: crate::agc::Agc,
    correlator: FskCorrelator,
    symsync: crate::symsync::TimingLoop,

    timing_bandwidth_unlocked: f32,
    timing_bandwidth_locked: f32,

    input_sample_counter: u64,
    symbol_counter: u64,
    ted_sample_clock: u32,
    samples_until_next_ted: f32,
}

impl BitDemodulator {
    /// New session with the configuration of `cfg`
    pub fn new(cfg: &crate::builder::SameReceiverBuilder) -> Self {
        let input_rate = cfg.input_rate();
        let sps = crate::waveform::samples_per_symbol(input_rate);
        let (timing_bandwidth_unlocked, timing_bandwidth_locked) = cfg.timing_bandwidth();

        let dc_len = match cfg.dc_blocker_len() {
            0 => sps as usize,
            n => n,
        };
        let symsync =
            crate::symsync::TimingLoop::new(sps, timing_bandwidth_unlocked, cfg.timing_max_deviation());
        let samples_until_next_ted = symsync.samples_per_ted();

        Self {
            dcblock: crate::dcblock::DcBlocker::new(dc_len),
            agc: crate::agc::Agc::new(
                cfg.agc_bandwidth() * sps / input_rate as f32,
                cfg.agc_gain_limits()[0],
                cfg.agc_gain_limits()[1],
            ),
            correlator: FskCorrelator::new(input_rate),
            symsync,
            timing_bandwidth_unlocked,
            timing_bandwidth_locked,
            input_sample_counter: 0,
            symbol_counter: 0,
            ted_sample_clock: 0,
            samples_until_next_ted,
        }
    }

    /// Demodulate a chunk of samples, lazily
    ///
    /// Yields roughly one bit per 1.92 ms of input. The session
    /// carries its timing and gain state across chunks; feed chunks
    /// back-to-back exactly as captured.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn process<'d>(&'d mut self, chunk: &'d [f32]) -> impl Iterator<Item = BitEvent> + 'd {
        chunk.iter().filter_map(move |&sa| self.process_sample(sa))
    }

    /// Process a single input sample
    ///
    /// Returns a [`BitEvent`] when a symbol period completes.
    pub fn process_sample(&mut self, input: f32) -> Option<BitEvent> {
        let sa = self.agc.process(self.dcblock.process(input));
        self.correlator.push([sa]);
        self.ted_sample_clock += 1;
        self.input_sample_counter = self.input_sample_counter.wrapping_add(1);

        // time until the commanded TED sample: positive → early
        let clock_remaining_sa = self.samples_until_next_ted - self.ted_sample_clock as f32;
        if !(clock_remaining_sa <= 0.0f32 || clock_remaining_sa.abs() < 0.5f32) {
            return None;
        }
        self.ted_sample_clock = 0;

        let soft = self.correlator.correlate();
        let (next_ted, estimate) = self.symsync.input(soft, clock_remaining_sa);
        self.samples_until_next_ted = next_ted;

        let estimate = estimate?;
        self.symbol_counter += 1;
        let soft_bit = estimate.sym();
        Some(BitEvent {
            value: soft_bit >= 0.0,
            confidence: symbol_confidence(soft_bit),
            offset: self.symbol_counter,
        })
    }

    /// Hold or release the gain and timing loops
    ///
    /// The framer locks the front end once byte sync is acquired, so
    /// that the data region cannot disturb the gain or drag the
    /// clock; it releases it when the burst ends.
    pub fn set_locked(&mut self, locked: bool) {
        self.agc.freeze(locked);
        self.symsync.set_loop_bandwidth(if locked {
            self.timing_bandwidth_locked
        } else {
            self.timing_bandwidth_unlocked
        });
        if !locked {
            self.symsync.reset();
        }
    }

    /// Lifetime count of processed input samples
    pub fn input_sample_counter(&self) -> u64 {
        self.input_sample_counter
    }

    /// Lifetime count of recovered symbols
    ///
    /// Advances at the SAME baud rate and serves as the monotonic
    /// clock for consolidation deadlines.
    pub fn symbol_counter(&self) -> u64 {
        self.symbol_counter
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.dcblock.reset();
        self.agc.reset();
        self.correlator.reset();
        self.symsync.reset();
        self.symsync
            .set_loop_bandwidth(self.timing_bandwidth_unlocked);
        self.input_sample_counter = 0;
        self.symbol_counter = 0;
        self.ted_sample_clock = 0;
        self.samples_until_next_ted = self.symsync.samples_per_ted();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::synth::ToneSynthesizer;
    use crate::waveform;

    const FS: u32 = 11025;

    // modulate bits at full scale for the correlator tests
    fn modulate(bits: &[bool]) -> Vec<f32> {
        let mut synth = ToneSynthesizer::new(FS).unwrap().with_peak(1.0);
        synth.fsk(bits, waveform::BAUD_HZ).unwrap()
    }

    #[test]
    fn test_correlate_clean_tones() {
        const TEST_BITS: &[bool] = &[true, false, true, false, false];

        let mut modulated = modulate(TEST_BITS);
        let symlen = waveform::samples_per_symbol(FS) as usize;
        // pad so the last symbol clears the filter delay
        modulated.extend(std::iter::repeat(0.0f32).take(symlen / 2));

        let mut demod = FskCorrelator::new(FS);
        assert_eq!(symlen, demod.ntaps());

        // feed one symbol at a time and correlate at each center
        let mut decisions = Vec::new();
        for chunk in modulated.chunks(symlen) {
            demod.push(chunk);
            decisions.push(demod.correlate());
        }

        for (bit, soft) in TEST_BITS.iter().zip(decisions.iter()) {
            match bit {
                true => assert!(*soft > 0.8, "weak mark: {}", soft),
                false => assert!(*soft < -0.8, "weak space: {}", soft),
            }
        }
    }

    #[test]
    fn test_silence_is_indecisive() {
        let mut demod = FskCorrelator::new(FS);
        demod.push(vec![0.0f32; demod.ntaps()]);
        assert_eq!(0.0f32, demod.correlate());
    }

    #[test]
    fn test_reset() {
        let mut demod = FskCorrelator::new(FS);
        demod.push(modulate(&[true, true]));
        assert!(demod.correlate().abs() > 0.0);
        demod.reset();
        assert_eq!(0.0f32, demod.correlate());
    }

    #[test]
    fn test_session_decodes_steady_mark() {
        use crate::builder::SameReceiverBuilder;

        let mut synth = ToneSynthesizer::new(22050).unwrap();
        let audio = synth
            .fsk(&vec![true; 512], waveform::BAUD_HZ)
            .unwrap();

        let mut session = BitDemodulator::new(&SameReceiverBuilder::new(22050));
        let bits: Vec<BitEvent> = session.process(&audio).collect();

        // roughly one bit per symbol, minus front-end latency
        assert!(bits.len() > 500, "got {} bits", bits.len());
        assert_eq!(bits.len() as u64, session.symbol_counter());

        // after the loops settle, a steady mark tone is a steady
        // stream of confident ones
        for bit in &bits[bits.len() - 100..] {
            assert!(bit.value);
            assert!(bit.confidence > 0.9, "confidence {}", bit.confidence);
        }

        // silence produces bits too, just with no confidence (skip
        // the first few, which still see the tone in the filter)
        let silence = vec![0.0f32; 22050];
        let quiet: Vec<BitEvent> = session.process(&silence).collect();
        assert!(quiet.len() > 100);
        assert!(quiet[10..].iter().all(|b| b.confidence < 0.5));
    }
}
