//! SAME waveform parameters and matched filters

use nalgebra::DVector;
use num_complex::Complex;

/// Mark frequency (Hz)
pub const FSK_MARK_HZ: f32 = 2083.3;

/// Space frequency (Hz)
pub const FSK_SPACE_HZ: f32 = 1562.5;

/// Baud rate (Hz)
pub const BAUD_HZ: f32 = 520.83;

/// Attention tone, lower component (Hz)
pub const ATTN_LOW_HZ: f32 = 853.0;

/// Attention tone, upper component (Hz)
pub const ATTN_HIGH_HZ: f32 = 960.0;

/// Preamble byte
///
/// The preamble byte is repeated sixteen times before every
/// SAME burst. It contains many bit transitions to ensure
/// that bit and byte synchronization is acquired quickly.
pub const PREAMBLE: u8 = 0xab;

/// Number of preamble bytes sent before each burst
pub const PREAMBLE_LENGTH: usize = 16;

/// SAME preamble sync sequence
///
/// Four trailing occurrences of the preamble byte, used by the
/// receiver to acquire bit and byte synchronization.
pub const PREAMBLE_SYNC_WORD: u32 = u32::from_be_bytes([PREAMBLE, PREAMBLE, PREAMBLE, PREAMBLE]);

/// Nominal silence between bursts, in seconds
pub const INTERBURST_GAP_SECS: f32 = 1.0;

/// Number of times the header and EOM bursts repeat
pub const BURST_REPEATS: usize = 3;

/// SAME baud rate at the given sampling frequency, in fractional samples
pub fn samples_per_symbol(fs: u32) -> f32 {
    fs as f32 / BAUD_HZ
}

/// Generate mark and space matched filter taps for SAME
///
/// Generates a tuple of (`mark_taps`,`space_taps`), which are
/// the matched filter for the mark tone and the space tone,
/// respectively. The filter is generated for the given input
/// sampling rate `fs`.
pub fn matched_filter(fs: u32) -> (DVector<Complex<f32>>, DVector<Complex<f32>>) {
    let ntaps = f32::floor(samples_per_symbol(fs)) as usize;
    let mark = cisoid_matched_filter(ntaps, FSK_MARK_HZ / fs as f32);
    let space = cisoid_matched_filter(ntaps, FSK_SPACE_HZ / fs as f32);
    (mark, space)
}

// Generate matched filter taps
//
// These FIR filter taps are a matched filter for a complex
// exponential cisoid at a fixed frequency, `freq_fs`. Specify
// frequency as a fraction of the sampling rate.
//
// The output taps are a time-reversed, complex-conjugated
// cisoid.
fn cisoid_matched_filter(points: usize, freq_fs: f32) -> DVector<Complex<f32>> {
    let mut out = DVector::from_element(points, Complex::new(0.0, 0.0));
    for (iter, o) in out.iter_mut().enumerate() {
        *o = Complex::new(
            0.0,
            2.0 * std::f32::consts::PI * freq_fs * ((points - 1 - iter) as f32),
        );
        *o = 2.0f32 * o.exp().conj() / points as f32;
    }
    out
}

/// Convert bytes to bits in SAME transmission order
///
/// SAME bytes are sent least significant bit first. The output
/// contains eight `bool` entries per input byte, in the order
/// they go over the air.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    let mut v = Vec::with_capacity(bytes.len() * 8);
    for byte in bytes {
        let mut word = *byte;
        for _i in 0..8 {
            v.push(word & 0x01 == 1);
            word >>= 1;
        }
    }
    v
}

/// Is the given byte an allowed SAME character?
///
/// Allowed characters are the ASCII letters, numbers, and the
/// handful of punctuation marks which appear in SAME headers.
/// The preamble byte `0xAB` is not an allowed character; its
/// appearance inside a burst indicates a framing problem.
#[inline]
pub fn is_allowed_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'-' | b'+' | b'/' | b'?' | b'(' | b')' | b'[' | b']' | b'.' | b'_' | b',' | b' '
        )
}
