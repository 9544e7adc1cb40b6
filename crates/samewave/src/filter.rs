//! FIR filtering primitives
//!
//! Two small building blocks shared by the demodulator and the DC
//! blocker:
//!
//! - [`FilterCoeff`] holds an impulse response and performs the
//!   multiply-accumulate of an FIR filter against a caller-supplied
//!   sample history.
//! - [`Window`] is a fixed-length sliding lookback over the most
//!   recent input samples.
//!
//! The window *should* be the same length as the coefficients. A
//! shorter history is treated as zero-padded; a longer one has its
//! oldest samples ignored.

use std::collections::VecDeque;
use std::convert::AsRef;

use nalgebra::base::Scalar;
use nalgebra::DVector;
use num_traits::Zero;

/// FIR filter coefficients
///
/// Coefficients use the same representation as GNU Octave's
/// `filter()` function: `h[0]` multiplies the most recent sample.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoeff<T>(DVector<T>)
where
    T: Copy + Scalar + Zero;

impl<T> FilterCoeff<T>
where
    T: Copy + Scalar + Zero,
{
    /// Create from an impulse response slice
    pub fn from_slice<S>(h: S) -> Self
    where
        S: AsRef<[T]>,
    {
        let inp = h.as_ref();
        FilterCoeff(DVector::from_iterator(inp.len(), inp.iter().copied()))
    }

    /// Number of filter taps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Multiply-accumulate against a sample history
    ///
    /// `history` must order samples oldest-first: `history[N-1]` is
    /// the most recent sample. This matches how a [`Window`] stores
    /// them.
    pub fn filter<W, In, Out>(&self, history: W) -> Out
    where
        W: IntoIterator<Item = In>,
        W::IntoIter: DoubleEndedIterator,
        In: Copy + Scalar + std::ops::Mul<T, Output = Out>,
        Out: Copy + Scalar + Zero + std::ops::AddAssign,
    {
        let mut out = Out::zero();
        for (sa, tap) in history.into_iter().rev().zip(self.0.iter()) {
            out += sa * *tap;
        }
        out
    }
}

impl<T> AsRef<[T]> for FilterCoeff<T>
where
    T: Copy + Scalar + Zero,
{
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.0.as_slice()
    }
}

/// Fixed-length sliding sample window
///
/// New samples enter on the right; the oldest sample ages off the
/// left. The window length never changes after construction.
#[derive(Clone, Debug)]
pub struct Window<T>(VecDeque<T>)
where
    T: Copy + Scalar + Zero;

impl<T> Window<T>
where
    T: Copy + Scalar + Zero,
{
    /// Create a window of `len` zeros
    pub fn new(len: usize) -> Self {
        let mut q = VecDeque::with_capacity(len);
        q.resize(len, T::zero());
        Self(q)
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        for s in &mut self.0 {
            *s = T::zero()
        }
    }

    /// Window length
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append a slice of samples
    ///
    /// The last sample of `input` becomes the most recent sample of
    /// the window. If `input` is longer than the window, only its
    /// tail is retained.
    pub fn push<S>(&mut self, input: S)
    where
        S: AsRef<[T]>,
    {
        let input = input.as_ref();
        let input = if input.len() > self.0.len() {
            &input[input.len() - self.0.len()..]
        } else {
            input
        };

        std::mem::drop(self.0.drain(0..input.len()));
        self.0.extend(input);
    }

    /// Append one sample, returning the sample that aged off
    #[inline]
    pub fn push_scalar(&mut self, input: T) -> T {
        let out = self.0.pop_front().unwrap_or_else(T::zero);
        self.0.push_back(input);
        out
    }

    /// Iterator over window contents, oldest sample first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + '_ {
        self.0.iter().copied()
    }

    /// Oldest sample in the window
    #[inline]
    pub fn front(&self) -> T {
        *self.0.front().expect("windows are never empty")
    }

    /// Most recent sample in the window
    #[inline]
    pub fn back(&self) -> T {
        *self.0.back().expect("windows are never empty")
    }
}
