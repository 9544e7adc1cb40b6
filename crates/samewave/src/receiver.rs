//! Full receiver chain
//!
//! The [`SameReceiver`] is a complete decoding session. It takes
//! `f32` audio samples and performs, in order:
//!
//! 1. DC removal and automatic gain control
//! 2. Matched-filter FSK demodulation, sampled at two points per
//!    symbol under control of a zero-crossing timing recovery loop
//! 3. Preamble correlation, byte synchronization, and burst framing
//!    with per-bit confidence
//! 4. Burst consolidation: similarity grouping, majority voting, and
//!    confidence-scored alert emission
//!
//! All state is owned by the receiver instance. Independent
//! receivers—one per radio, say—share nothing and never mix their
//! consolidation state; the only shared data in this crate is the
//! read-only code registry.
//!
//! Decoding never fails and never stops: noise, interference, and
//! unrelated audio simply produce no alerts.

#[cfg(not(test))]
use log::{debug, info};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;

use std::collections::VecDeque;

use crate::assembler::{Assembler, ConsolidatedAlert, TransportEvent};
use crate::builder::SameReceiverBuilder;
use crate::demod::BitDemodulator;
use crate::framing::{FrameEvent, Framer, HeaderCandidate};

/// Receiver output event
///
/// Events come from two layers. *Link* events report the state of
/// the demodulator and framer: carrier-like activity, burst reads,
/// and completed burst candidates. *Transport* events report decoded
/// messages: consolidated alerts and end-of-message markers.
///
/// Most clients only care about [`Alert`](DecodeEvent::Alert) and
/// perhaps [`EndOfMessage`](DecodeEvent::EndOfMessage); the
/// [`alerts()`](SameReceiver::alerts) adapter filters for the
/// former.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeEvent {
    /// No signal-like activity
    NoCarrier,

    /// Byte sync acquired; searching for a burst prefix
    Searching,

    /// Reading a burst
    Reading,

    /// A single burst was read (link layer)
    ///
    /// Bursts are reported for observability. Do **not** treat one
    /// as a message: wait for the consolidated
    /// [`Alert`](DecodeEvent::Alert).
    Burst(HeaderCandidate),

    /// An end-of-message marker was received
    EndOfMessage {
        /// Confidence of the EOM burst
        confidence: f32,
    },

    /// A validated, confidence-scored alert
    Alert(ConsolidatedAlert),
}

// Link-layer states for change detection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkState {
    NoCarrier,
    Searching,
    Reading,
}

/// A complete SAME/EAS receiver session
///
/// Create one via [`SameReceiverBuilder`](crate::SameReceiverBuilder)
/// and bind it to a sample source:
///
/// ```
/// use samewave::{DecodeEvent, SameReceiverBuilder};
///
/// # let some_audio_source = std::iter::repeat(0.0f32).take(4096);
/// let mut rx = SameReceiverBuilder::new(22050).build();
/// for event in rx.iter(some_audio_source) {
///     if let DecodeEvent::Alert(alert) = event {
///         println!("alert: {}", alert);
///     }
/// }
/// ```
///
/// The input must be mono PCM at the configured
/// [`input_rate()`](Self::input_rate). `i16` samples should be cast
/// to `f32`; no scaling is needed, the AGC takes care of level.
#[derive(Clone, Debug)]
pub struct SameReceiver {
    demod: BitDemodulator,
    framer: Framer,
    assembler: Assembler,

    input_rate: u32,
    link_state: LinkState,
    pending: VecDeque<DecodeEvent>,
}

impl SameReceiver {
    /// Bind an iterator of audio samples
    ///
    /// The returned iterator consumes as many samples as needed to
    /// produce each [`DecodeEvent`] and returns `None` when the
    /// source is exhausted.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<'rx, I, T>(&'rx mut self, input: I) -> SourceIter<'rx, T>
    where
        I: IntoIterator<Item = f32, IntoIter = T>,
        T: Iterator<Item = f32>,
    {
        SourceIter {
            source: input.into_iter(),
            receiver: self,
        }
    }

    /// Bind an iterator of audio samples, yielding only alerts
    ///
    /// The consolidated-alert view of [`iter()`](Self::iter):
    /// link-layer chatter and EOMs are dropped.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn alerts<'rx, I, T>(
        &'rx mut self,
        input: I,
    ) -> impl Iterator<Item = ConsolidatedAlert> + 'rx
    where
        I: IntoIterator<Item = f32, IntoIter = T>,
        T: Iterator<Item = f32> + 'rx,
    {
        self.iter(input).filter_map(|evt| match evt {
            DecodeEvent::Alert(alert) => Some(alert),
            _ => None,
        })
    }

    /// Input sampling rate (Hz)
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Lifetime count of processed input samples
    pub fn input_sample_counter(&self) -> u64 {
        self.demod.input_sample_counter()
    }

    /// Lifetime count of recovered symbols
    ///
    /// This is the monotonic clock used for consolidation deadlines.
    pub fn symbol_counter(&self) -> u64 {
        self.demod.symbol_counter()
    }

    /// Clear all DSP and consolidation state
    pub fn reset(&mut self) {
        self.demod.reset();
        self.framer.reset();
        self.assembler.reset();
        self.link_state = LinkState::NoCarrier;
        self.pending.clear();
    }

    /// Flush buffered samples and finalize pending groups
    ///
    /// The DSP chain imposes delay, and consolidation holds groups
    /// open waiting for repetitions. When processing a recording
    /// that is cut close to the last burst, call `flush()` to push
    /// the stragglers out. Returns any alerts that emerge.
    ///
    /// You probably want to [`reset()`](Self::reset) afterwards.
    pub fn flush(&mut self) -> Vec<ConsolidatedAlert> {
        let two_seconds = (self.input_rate * 2) as usize;
        let mut out: Vec<ConsolidatedAlert> = self
            .iter(std::iter::repeat(0.0f32).take(two_seconds))
            .filter_map(|evt| match evt {
                DecodeEvent::Alert(alert) => Some(alert),
                _ => None,
            })
            .collect();

        out.extend(self.assembler.flush());
        out
    }

    // Process one high-rate sample; returns the next queued event
    fn process_sample(&mut self, input: f32) -> Option<DecodeEvent> {
        if let Some(bit) = self.demod.process_sample(input) {
            let frame_out = self.framer.input(bit);
            self.handle_frame_event(frame_out);

            // consolidation deadlines run on the symbol clock
            for alert in self.assembler.tick(self.demod.symbol_counter()) {
                self.pending.push_back(DecodeEvent::Alert(alert));
            }
        }

        self.pending.pop_front()
    }

    // React to the framer: lock/unlock the front end, consolidate
    // completed bursts, queue output events
    fn handle_frame_event(&mut self, frame_out: FrameEvent) {
        match frame_out {
            FrameEvent::Acquired => {
                // byte sync: hold the gain and narrow the clock loop
                // so the data region cannot disturb either
                self.demod.set_locked(true);
                self.set_link_state(LinkState::Searching);
            }
            FrameEvent::Searching => self.set_link_state(LinkState::Searching),
            FrameEvent::Reading => self.set_link_state(LinkState::Reading),
            FrameEvent::NoCarrier => {
                if self.link_state != LinkState::NoCarrier {
                    self.demod.set_locked(false);
                    self.set_link_state(LinkState::NoCarrier);
                }
            }
            FrameEvent::Candidate(candidate) => {
                self.demod.set_locked(false);
                self.set_link_state(LinkState::NoCarrier);
                info!(
                    "receiver [{:<14}]: burst: \"{}\"",
                    self.demod.input_sample_counter(),
                    candidate.text()
                );
                self.pending.push_back(DecodeEvent::Burst(candidate.clone()));
                match self.assembler.accept(candidate) {
                    TransportEvent::EndOfMessage { confidence } => {
                        self.pending
                            .push_back(DecodeEvent::EndOfMessage { confidence });
                    }
                    TransportEvent::Alert(alert) => {
                        self.pending.push_back(DecodeEvent::Alert(alert));
                    }
                    TransportEvent::Idle | TransportEvent::Assembling => {}
                }
            }
        }
    }

    fn set_link_state(&mut self, state: LinkState) {
        if self.link_state == state {
            return;
        }
        debug!(
            "receiver [{:<14}]: {:?} -> {:?}",
            self.demod.input_sample_counter(),
            self.link_state,
            state
        );
        self.link_state = state;
        self.pending.push_back(match state {
            LinkState::NoCarrier => DecodeEvent::NoCarrier,
            LinkState::Searching => DecodeEvent::Searching,
            LinkState::Reading => DecodeEvent::Reading,
        });
    }
}

impl From<&SameReceiverBuilder> for SameReceiver {
    /// Create the receiver from its builder
    fn from(cfg: &SameReceiverBuilder) -> Self {
        Self {
            demod: BitDemodulator::new(cfg),
            framer: Framer::new(
                cfg.sync_max_errors(),
                cfg.prefix_max_errors(),
                cfg.frame_max_invalid(),
            ),
            assembler: Assembler::new(),
            input_rate: cfg.input_rate(),
            link_state: LinkState::NoCarrier,
            pending: VecDeque::new(),
        }
    }
}

/// Sample source iterator
///
/// Bound to a source of mono `f32` PCM samples. `next()` returns the
/// next [`DecodeEvent`], or `None` once the source is exhausted and
/// no events remain.
#[derive(Debug)]
pub struct SourceIter<'rx, I>
where
    I: Iterator<Item = f32>,
{
    source: I,
    receiver: &'rx mut SameReceiver,
}

impl<'rx, I> Iterator for SourceIter<'rx, I>
where
    I: Iterator<Item = f32>,
{
    type Item = DecodeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(evt) = self.receiver.pending.pop_front() {
            return Some(evt);
        }

        for sa in &mut self.source {
            if let Some(evt) = self.receiver.process_sample(sa) {
                return Some(evt);
            }
        }

        None
    }
}

/// Decode a stream of audio chunks into alerts
///
/// Part of the crate's top-level API surface: binds the receiver to
/// an iterator of PCM chunks (as delivered by a capture callback or
/// a file reader) and yields [`ConsolidatedAlert`]s as they emerge.
/// Call [`SameReceiver::flush()`] afterwards if the stream ends
/// abruptly.
pub fn decode_stream<'rx, C>(
    receiver: &'rx mut SameReceiver,
    chunks: C,
) -> impl Iterator<Item = ConsolidatedAlert> + 'rx
where
    C: IntoIterator<Item = Vec<f32>>,
    C::IntoIter: 'rx,
{
    receiver.alerts(chunks.into_iter().flatten())
}
