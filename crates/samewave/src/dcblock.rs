//! DC blocker

use crate::filter::Window;

/// DC-blocking filter
///
/// Removes slowly-varying offsets from the input while preserving
/// the FSK tones. Sound cards and discriminator taps both introduce
/// DC, and the [AGC](crate::agc::Agc) assumes a zero-mean input.
///
/// This is the dual moving-average implementation from
/// R. Yates, "DC Blocker Algorithms," IEEE Sig. Proc. Mag.,
/// March 2008: pp 132-134. It has linear phase and a delay of
/// `len - 1` samples. A length of 1 is a no-op.
#[derive(Clone, Debug)]
pub struct DcBlocker {
    ff: MovingAverage,
    fb: MovingAverage,
}

impl DcBlocker {
    /// Create a DC blocker with `len > 0` taps per stage
    pub fn new(len: usize) -> Self {
        DcBlocker {
            ff: MovingAverage::new(len),
            fb: MovingAverage::new(len),
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.ff.reset();
        self.fb.reset();
    }

    /// Remove DC from one input sample
    ///
    /// Returns a delayed copy of `input` with the offset estimate
    /// subtracted.
    pub fn process(&mut self, input: f32) -> f32 {
        let (ma0, sig) = self.ff.filter(input);
        let (ma1, _) = self.fb.filter(ma0);
        sig - ((self.ff.len() > 1) as u8 as f32) * ma1
    }
}

// Moving average comb filter
//
// Equivalent to an FIR of `1/len` taps but with one add and one
// subtract per sample. Delay is `len - 1`.
#[derive(Clone, Debug)]
struct MovingAverage {
    window: Window<f32>,
    inv_len: f32,
    moving_sum: f32,
}

impl MovingAverage {
    fn new(len: usize) -> Self {
        assert!(len > 0);
        Self {
            window: Window::new(len),
            inv_len: 1.0f32 / (len as f32),
            moving_sum: 0.0f32,
        }
    }

    fn reset(&mut self) {
        self.window.reset();
        self.moving_sum = 0.0f32;
    }

    #[inline]
    fn len(&self) -> usize {
        self.window.len()
    }

    // Returns (moving average, input delayed by the window)
    #[inline]
    fn filter(&mut self, input: f32) -> (f32, f32) {
        let aged = self.window.push_scalar(input);
        self.moving_sum += input - aged;
        (self.moving_sum * self.inv_len, self.window.front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_moving_average() {
        // expect equivalent behavior to the FIR filter [1 1 1 1]/4
        const INPUT: &[f32] = &[1.0, 2.0, -1.0, 3.0, 8.0];
        const EXPECT: &[f32] = &[0.25000, 0.75000, 0.50000, 1.25000, 3.00000];

        let mut last = 0.0;
        let mut mavg = MovingAverage::new(4);
        for (expect, inp) in EXPECT.iter().zip(INPUT.iter()) {
            let (ma, dly) = mavg.filter(*inp);
            last = dly;
            assert_approx_eq!(ma, *expect);
        }
        assert_eq!(last, 2.0f32);
    }

    #[test]
    fn test_dc_block_trivial() {
        // a length-1 DC blocker does nothing
        let mut uut = DcBlocker::new(1);
        assert_eq!(uut.process(100.0f32), 100.0f32);
        assert_eq!(uut.process(-200.0f32), -200.0f32);
    }

    #[test]
    fn test_dc_block_removes_offset() {
        // ±1 square wave riding on +100 of DC
        let mut uut = DcBlocker::new(31);
        let mut clk = 1.0f32;
        let mut last = [0.0f32; 2];
        for _i in 0..256 {
            last[0] = last[1];
            last[1] = uut.process(100.0f32 + clk);
            clk = -clk;
        }
        assert_approx_eq!(last[0], 1.0f32, 1.0e-2);
        assert_approx_eq!(last[1], -1.0f32, 1.0e-2);
    }
}
