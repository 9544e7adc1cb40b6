//! Symbol timing recovery
//!
//! The [`TimingLoop`] decides *when* to sample the demodulator so
//! that each decision lands in the middle of a bit. Its timing error
//! detector (TED) uses the zero-crossing method: from the available
//! stream of soft symbols, two samples are taken per symbol, chosen
//! so that the "half sample" between any two symbol transitions sits
//! approximately at *zero*:
//!
//! ```txt
//! Matched filter output x[n]
//!  /\
//!   |     1Ts
//! M |.....x
//! A |      .
//! R |       .
//! K |        .
//!   |         .
//! --|----------x----------> time (Ts)
//!   |           .       .
//! S |            .     .
//! P |             .   .
//! A |              . .
//! C |               x
//! E |               2Ts
//! ```
//!
//! Error estimates feed a proportional-integrate (PI) filter that
//! tracks both the average and the instantaneous sample clock
//! period, tolerating sender clock drift. The approach follows GNU
//! Radio's `symbol_sync_ff` block, but is designed for heavily
//! oversampled input: with dozens of input samples per SAME symbol
//! there is no need to interpolate.
//!
//! The loop requests samples with a floating-point clock. Because
//! requests can only be honored at integer sample times, the
//! residual error is reported back into [`TimingLoop::input()`] and
//! folded into the next cycle.
//!
//! Inputs should be normalized to `±1.0` for best performance; the
//! [AGC](crate::agc) sees to that.

use arraydeque::ArrayDeque;

/// A bit-time sample pair with a timing error estimate
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolEstimate {
    /// Data samples: `data[0]` is the inter-symbol "zero" and
    /// `data[1]` is the soft symbol estimate
    pub data: [f32; 2],

    /// Timing error, as a fraction of the symbol period
    ///
    /// - `err < 0` → sampling late
    /// - `err > 0` → sampling early
    ///
    /// `±1.0` means the clock is a half-sample off, the worst case.
    pub err: f32,
}

impl SymbolEstimate {
    /// New estimate from zero sample, symbol sample, and error
    pub fn new(zero: f32, sym: f32, err: f32) -> Self {
        Self {
            data: [zero, sym],
            err,
        }
    }

    /// Soft symbol estimate
    pub fn sym(&self) -> f32 {
        self.data[1]
    }
}

/// Symbol clock tracking loop
///
/// A PI filter tracking the average and instantaneous period
/// between timing error detector inputs.
#[derive(Clone, Debug)]
pub struct TimingLoop {
    // average input samples per TED input
    samples_per_ted: f32,

    // clamp on period_avg: slowest and fastest permitted clocks
    period_min: f32,
    period_max: f32,

    // proportional gain: instantaneous period updates
    loop_alpha: f32,

    // integral gain: average period updates
    loop_beta: f32,

    period_avg: f32,
    period_inst: f32,

    ted: ZeroCrossingTed,
}

impl TimingLoop {
    /// New timing loop
    ///
    /// Expects `samples_per_symbol` *input* samples per symbol on
    /// average, with at most `max_deviation` symbol periods of clock
    /// error. `loop_bandwidth` smooths the PI filter and is a
    /// fraction of the TED input rate.
    pub fn new(samples_per_symbol: f32, loop_bandwidth: f32, max_deviation: f32) -> Self {
        const NEED_SPS: f32 = ZeroCrossingTed::SAMPLES_PER_SYMBOL as f32;

        let (loop_alpha, loop_beta) = compute_loop_alphabeta(loop_bandwidth);
        let samples_per_ted = samples_per_symbol / NEED_SPS;
        let period_deviation = samples_per_symbol * f32::clamp(max_deviation, 0.0, 0.5);

        Self {
            samples_per_ted,
            period_min: samples_per_ted - period_deviation,
            period_max: samples_per_ted + period_deviation,
            loop_alpha,
            loop_beta,
            period_avg: samples_per_ted,
            period_inst: samples_per_ted,
            ted: ZeroCrossingTed::default(),
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.ted.reset();
        self.period_avg = self.samples_per_ted;
        self.period_inst = self.samples_per_ted;
    }

    /// Set the loop bandwidth
    ///
    /// The receiver runs the loop wide open while hunting for a
    /// preamble and narrows it once byte sync is acquired.
    pub fn set_loop_bandwidth(&mut self, loop_bandwidth: f32) {
        let (loop_alpha, loop_beta) = compute_loop_alphabeta(loop_bandwidth);
        self.loop_alpha = loop_alpha;
        self.loop_beta = loop_beta;
    }

    /// Process one commanded sample
    ///
    /// `sample` is the demodulated soft symbol at the commanded
    /// time. `offset` is the error between the commanded (possibly
    /// fractional) time and the integer sample time actually used,
    /// `-0.5 < offset < +0.5`, positive if `sample` came early.
    ///
    /// Returns the number of input samples until the next call, and
    /// a [`SymbolEstimate`] when a full symbol has been taken.
    pub fn input(&mut self, sample: f32, offset: f32) -> (f32, Option<SymbolEstimate>) {
        let sym = self.ted.input(sample);
        (self.advance_loop(offset, &sym), sym)
    }

    /// Average number of input samples between TED inputs
    pub fn samples_per_ted(&self) -> f32 {
        self.samples_per_ted
    }

    // Advance the PI filter; returns samples until the next TED input
    fn advance_loop(&mut self, offset: f32, sym: &Option<SymbolEstimate>) -> f32 {
        let offset = offset.clamp(-0.5f32, 0.5f32);

        match sym {
            Some(sym) => {
                // correct the error estimate for the reported sample time
                let err = f32::clamp(sym.err - offset / self.samples_per_ted, -1.0f32, 1.0f32);

                // integral arm
                self.period_avg += self.loop_beta * err;
                self.period_avg = self.period_avg.clamp(self.period_min, self.period_max);

                // proportional arm: we can't go back in time, so a
                // negative request falls back to the average period
                self.period_inst = self.period_avg + self.loop_alpha * err + offset;
                if self.period_inst < 0.0f32 {
                    self.period_inst = self.period_avg;
                }
            }
            None => {
                self.period_inst += offset;
            }
        }

        self.period_inst
    }
}

/// Zero-crossing timing error detector
#[derive(Clone, Debug)]
pub struct ZeroCrossingTed {
    history: ArrayDeque<f32, 3, arraydeque::Wrapping>,
    sample_counter: u32,
}

impl ZeroCrossingTed {
    /// Input samples per symbol required by this TED
    pub const SAMPLES_PER_SYMBOL: u32 = 2;

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.history.clear();
        for _i in 0..self.history.capacity() {
            self.history.push_back(0.0f32);
        }
        self.sample_counter = 0;
    }

    /// Accept a sample at twice the symbol rate
    ///
    /// Produces one estimate for every two samples provided.
    pub fn input(&mut self, sample: f32) -> Option<SymbolEstimate> {
        self.history.push_back(sample);
        self.sample_counter = (self.sample_counter + 1) % ZeroCrossingTed::SAMPLES_PER_SYMBOL;
        if self.sample_counter == 1 {
            let err = zero_crossing_metric(&self.history);
            Some(SymbolEstimate::new(self.history[1], self.history[2], err))
        } else {
            None
        }
    }
}

impl Default for ZeroCrossingTed {
    fn default() -> Self {
        let mut out = ZeroCrossingTed {
            history: ArrayDeque::default(),
            sample_counter: 0,
        };
        out.reset();
        out
    }
}

// Zero-crossing metric for a signal at twice the symbol rate
//
// v[0] is the previous symbol, v[1] the inter-sample zero, v[2] the
// most recent symbol. This is a modified Gardner metric with hard
// decision slicing.
#[inline]
fn zero_crossing_metric<A>(v: &A) -> f32
where
    A: std::ops::Index<usize, Output = f32> + ?Sized,
{
    v[1] * (fsk_decision(v[0]) - fsk_decision(v[2]))
}

// Hard decision slicer for 2FSK
#[inline]
fn fsk_decision(sym: f32) -> f32 {
    sym.signum()
}

// Compute PI (alpha, beta) for a critically-damped loop with the
// given bandwidth, expressed as a fraction of the symbol rate
fn compute_loop_alphabeta(loop_bandwidth: f32) -> (f32, f32) {
    let omega_n_norm = 2.0f32 * std::f32::consts::PI * loop_bandwidth;
    let k0 = 2.0f32;
    let k1 = f32::exp(-omega_n_norm);
    let sinh_zeta_omega_n_t = f32::sinh(omega_n_norm);
    let alpha = k0 * k1 * sinh_zeta_omega_n_t;
    let beta = k0 * (1.0f32 - k1 * (sinh_zeta_omega_n_t + 1.0f32));
    (alpha, beta)
}
