//! Burst framing
//!
//! The [`Framer`] turns a confidence-weighted bit stream into
//! [`HeaderCandidate`]s: byte-aligned strings that plausibly hold a
//! SAME header or EOM. It performs three jobs:
//!
//! 1. **Byte synchronization.** Bit alignment is unknown a priori,
//!    so a 32-bit correlator slides over the incoming bits hunting
//!    for the trailing four bytes of the `0xAB` preamble, tolerating
//!    a configurable number of bit errors.
//! 2. **Prefix search.** Once byte-aligned, the next few bytes must
//!    contain `ZCZC` or `NNNN` (again with bit-error tolerance), or
//!    the acquisition is abandoned.
//! 3. **Burst accumulation.** Data bytes are collected until too
//!    many non-SAME characters arrive—the practical end-of-carrier
//!    indication—or the buffer fills.
//!
//! Each output byte carries a confidence: the minimum of the
//! confidences of its eight bits. Malformed candidates are discarded
//! with a debug log, never an error, and scanning resumes with the
//! very next bit: the decoder must keep running through any amount
//! of garbage.

use arrayvec::ArrayVec;

#[cfg(not(test))]
use log::{debug, info};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;

use crate::demod::BitEvent;
use crate::waveform::{self, is_allowed_byte};

/// Maximum burst length accepted by the framer, in bytes
///
/// A maximum-length SAME header is 252 bytes; the margin tolerates
/// line noise read before the burst-end detection trips.
pub const MAX_BURST_LENGTH: usize = 268;

// Once byte sync is found, search this many bytes for a ZCZC/NNNN
// prefix: 16 bytes of preamble + 4 bytes of prefix + 1 byte margin
const PREFIX_SEARCH_LEN: u32 = 21;

/// Framer output, reported for every input bit
#[derive(Clone, Debug, PartialEq)]
pub enum FrameEvent {
    /// Hunting for the preamble; no burst in progress
    NoCarrier,

    /// Byte synchronization newly acquired or adjusted
    Acquired,

    /// Byte-synchronized and searching for a `ZCZC`/`NNNN` prefix
    Searching,

    /// Reading burst data
    Reading,

    /// A burst has been completely read
    ///
    /// Candidates are structurally plausible but unvalidated; see
    /// [`HeaderCandidate`].
    Candidate(HeaderCandidate),
}

impl FrameEvent {
    /// True if a burst is being acquired or read
    pub fn is_active(&self) -> bool {
        !matches!(self, FrameEvent::NoCarrier)
    }
}

/// One demodulated burst: bytes plus confidence
///
/// This is the raw reception of a single SAME burst, aligned to the
/// byte boundary after the preamble. If reception was error-free the
/// bytes begin with `ZCZC` or `NNNN`, but nothing is guaranteed:
/// clients must not report a lone candidate as a message. The
/// [consolidator](crate::assembler) votes candidates together and
/// validates the result.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderCandidate {
    bytes: Vec<u8>,
    byte_confidence: Vec<f32>,
    confidence: f32,
    first_symbol: u64,
    last_symbol: u64,
}

impl HeaderCandidate {
    /// Assemble a candidate from raw parts
    ///
    /// Useful for feeding the [consolidator](crate::assembler) from
    /// a front-end other than the built-in demodulator. Confidences
    /// are clamped to `[0.0, 1.0]`; `byte_confidence` is truncated
    /// or padded with zeros to the byte count.
    pub fn new(
        bytes: Vec<u8>,
        mut byte_confidence: Vec<f32>,
        confidence: f32,
        first_symbol: u64,
        last_symbol: u64,
    ) -> Self {
        byte_confidence.resize(bytes.len(), 0.0);
        for c in &mut byte_confidence {
            *c = c.clamp(0.0, 1.0);
        }
        Self {
            bytes,
            byte_confidence,
            confidence: confidence.clamp(0.0, 1.0),
            first_symbol,
            last_symbol,
        }
    }

    /// Burst bytes, aligned to the post-preamble byte boundary
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Burst bytes as text, with any non-UTF-8 bytes replaced
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Per-byte confidence, each the minimum of its 8 bit confidences
    pub fn byte_confidence(&self) -> &[f32] {
        &self.byte_confidence
    }

    /// Mean confidence over the burst's bytes
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Symbol count when the prefix was detected
    pub fn first_symbol(&self) -> u64 {
        self.first_symbol
    }

    /// Symbol count when the burst ended
    pub fn last_symbol(&self) -> u64 {
        self.last_symbol
    }

    /// True if this burst begins like an end-of-message marker
    ///
    /// Only two leading `N`s are required, so that a heavily-damaged
    /// EOM still ends the message.
    pub fn is_eom(&self) -> bool {
        self.bytes.len() >= 2 && &self.bytes[0..2] == b"NN"
    }
}

// Framer state
#[derive(Clone, Debug)]
enum State {
    // Correlate for byte sync
    Hunting,

    // Byte-aligned; search for the ZCZC/NNNN prefix
    PrefixSearch {
        // last four received bytes, packed big-endian
        word: u32,
        // confidence of the last four bytes, as a ring
        word_conf: [f32; 4],
        bytes_seen: u32,
    },

    // Accumulate burst data
    Reading {
        burst: Box<Burst>,
        invalid_bytes: u32,
    },
}

type Burst = (
    ArrayVec<u8, MAX_BURST_LENGTH>,
    ArrayVec<f32, MAX_BURST_LENGTH>,
);

/// SAME burst framer
///
/// Feed [`BitEvent`]s in one at a time; the returned [`FrameEvent`]
/// reports the link state and completed candidates. The framer never
/// fails and never stops: any abandoned acquisition simply returns
/// it to the hunt.
#[derive(Clone, Debug)]
pub struct Framer {
    state: State,

    // sync word correlator: bits shift in from the left
    sync_register: u32,

    // byte assembly (LSb first, as transmitted)
    bit_clock: u8,
    byte_accum: u8,
    byte_conf: f32,

    // symbol count at prefix detection
    burst_start: u64,

    max_sync_errors: u32,
    max_prefix_bit_errors: u32,
    max_invalid_bytes: u32,
}

impl Framer {
    /// New framer
    ///
    /// `max_sync_errors` bounds the bit errors tolerated in the
    /// 32-bit preamble correlation; keep it small, mindful of the
    /// preamble's correlation sidelobes. `max_prefix_bit_errors`
    /// bounds the errors tolerated in the `ZCZC`/`NNNN` prefix.
    /// `max_invalid_bytes` is the count of non-SAME characters that
    /// ends a burst.
    pub fn new(max_sync_errors: u32, max_prefix_bit_errors: u32, max_invalid_bytes: u32) -> Self {
        Self {
            state: State::Hunting,
            sync_register: 0,
            bit_clock: 0,
            byte_accum: 0,
            byte_conf: 1.0,
            burst_start: 0,
            max_sync_errors,
            max_prefix_bit_errors,
            max_invalid_bytes,
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.state = State::Hunting;
        self.sync_register = 0;
        self.clear_byte_clock();
        self.burst_start = 0;
    }

    /// Is a burst being acquired or read?
    pub fn is_active(&self) -> bool {
        !matches!(self.state, State::Hunting)
    }

    /// Process one bit
    pub fn input(&mut self, bit: BitEvent) -> FrameEvent {
        // the correlator runs whenever we are not inside burst data;
        // data may contain sync-like patterns and must not resync
        if !matches!(self.state, State::Reading { .. }) {
            self.correlate(&bit);
        }

        match self.state {
            State::Hunting => {
                if self.sync_errors() <= self.max_sync_errors {
                    self.acquire(bit.offset);
                    FrameEvent::Acquired
                } else {
                    FrameEvent::NoCarrier
                }
            }
            State::PrefixSearch { .. } => self.prefix_input(bit),
            State::Reading { .. } => self.reading_input(bit),
        }
    }

    // Handle one bit while searching for the burst prefix
    fn prefix_input(&mut self, bit: BitEvent) -> FrameEvent {
        let (byte, conf) = match self.clock_bit(&bit) {
            Some(b) => b,
            None => {
                // a sync hit that lands mid-byte means our alignment
                // was wrong: take the new one. Aligned re-affirmations
                // complete a byte and never reach this branch.
                if self.sync_errors() <= self.max_sync_errors {
                    debug!("framer: adjusted byte sync by {} bits", self.bit_clock);
                    self.acquire(bit.offset);
                    return FrameEvent::Acquired;
                }
                return FrameEvent::Searching;
            }
        };

        let max_prefix_bit_errors = self.max_prefix_bit_errors;
        let mut prefix = None;
        let mut give_up = false;
        if let State::PrefixSearch {
            word,
            word_conf,
            bytes_seen,
        } = &mut self.state
        {
            *word = (*word << 8) | byte as u32;
            word_conf[(*bytes_seen % 4) as usize] = conf;
            *bytes_seen += 1;

            if message_prefix_errors(*word) <= max_prefix_bit_errors {
                // raw received bytes are kept, oldest first
                let first = (*bytes_seen % 4) as usize;
                let mut confs = [0.0f32; 4];
                for (i, c) in confs.iter_mut().enumerate() {
                    *c = word_conf[(first + i) % 4];
                }
                prefix = Some((word.to_be_bytes(), confs, *bytes_seen));
            } else if *bytes_seen > PREFIX_SEARCH_LEN {
                give_up = true;
            }
        }

        match (prefix, give_up) {
            (Some((bytes, confs, seen)), _) => {
                info!("framer: burst started after {} bytes", seen);

                let mut burst = Box::<Burst>::default();
                for (b, c) in bytes.into_iter().zip(confs) {
                    burst.0.push(b);
                    burst.1.push(c);
                }
                self.state = State::Reading {
                    burst,
                    invalid_bytes: 0,
                };
                FrameEvent::Reading
            }
            (None, true) => {
                info!(
                    "framer: no burst prefix within {} bytes; abandoned",
                    PREFIX_SEARCH_LEN
                );
                self.state = State::Hunting;
                FrameEvent::NoCarrier
            }
            (None, false) => FrameEvent::Searching,
        }
    }

    // Handle one bit while reading burst data
    fn reading_input(&mut self, bit: BitEvent) -> FrameEvent {
        let (byte, conf) = match self.clock_bit(&bit) {
            Some(b) => b,
            None => return FrameEvent::Reading,
        };

        let max_invalid_bytes = self.max_invalid_bytes;
        let mut done = false;
        if let State::Reading {
            burst,
            invalid_bytes,
        } = &mut self.state
        {
            // SAME bytes never have the MSb set; record it as
            // suspicion but keep the masked byte
            let masked = byte & 0x7f;
            *invalid_bytes += !is_allowed_byte(masked) as u32;

            if burst.0.try_push(masked).is_ok() {
                burst.1.push(conf);
            } else {
                done = true;
            }
            done |= *invalid_bytes > max_invalid_bytes;
        }

        if done {
            self.end(bit.offset)
        } else {
            FrameEvent::Reading
        }
    }

    /// End the burst in progress, if any
    ///
    /// The burst end is normally detected automatically from invalid
    /// bytes; the receiver also calls this on loss of signal.
    pub fn end(&mut self, symbol_count: u64) -> FrameEvent {
        let state = std::mem::replace(&mut self.state, State::Hunting);
        self.clear_byte_clock();

        let State::Reading { mut burst, .. } = state else {
            return FrameEvent::NoCarrier;
        };

        // trim trailing non-SAME bytes: they are line noise read
        // before the end detection tripped
        let keep = burst
            .0
            .iter()
            .rposition(|&b| is_allowed_byte(b))
            .map(|p| p + 1)
            .unwrap_or(0);
        burst.0.truncate(keep);
        burst.1.truncate(keep);

        if burst.0.len() < 4 {
            debug!("framer: burst too short after trimming; discarded");
            return FrameEvent::NoCarrier;
        }

        info!(
            "framer: burst ended: \"{}\"",
            String::from_utf8_lossy(&burst.0)
        );

        // candidate confidence covers only the kept bytes; the
        // silence read before the end detection tripped is not the
        // burst's fault
        let confidence = burst.1.iter().sum::<f32>() / burst.1.len() as f32;

        FrameEvent::Candidate(HeaderCandidate {
            bytes: burst.0.to_vec(),
            byte_confidence: burst.1.to_vec(),
            confidence,
            first_symbol: self.burst_start,
            last_symbol: symbol_count,
        })
    }

    // Shift a hard decision into the sync correlator
    fn correlate(&mut self, bit: &BitEvent) {
        self.sync_register >>= 1;
        self.sync_register |= (bit.value as u32) << 31;
    }

    // Bit errors between the sync register and the preamble word
    fn sync_errors(&self) -> u32 {
        (self.sync_register ^ waveform::PREAMBLE_SYNC_WORD).count_ones()
    }

    // Enter PrefixSearch, byte-aligned as of the last bit
    fn acquire(&mut self, position: u64) {
        debug!("framer: acquired byte sync");
        self.clear_byte_clock();
        self.burst_start = position;
        self.state = State::PrefixSearch {
            word: 0,
            word_conf: [0.0; 4],
            bytes_seen: 0,
        };
    }

    // Accumulate a bit; returns a completed (byte, min confidence)
    fn clock_bit(&mut self, bit: &BitEvent) -> Option<(u8, f32)> {
        self.byte_accum |= (bit.value as u8) << self.bit_clock;
        self.byte_conf = self.byte_conf.min(bit.confidence);
        self.bit_clock += 1;

        if self.bit_clock == 8 {
            let out = (self.byte_accum, self.byte_conf);
            self.clear_byte_clock();
            Some(out)
        } else {
            None
        }
    }

    fn clear_byte_clock(&mut self) {
        self.bit_clock = 0;
        self.byte_accum = 0;
        self.byte_conf = 1.0;
    }
}

// Bit errors between the last four bytes and the nearer of the
// message prefixes "ZCZC" and "NNNN"
fn message_prefix_errors(inp: u32) -> u32 {
    const PREFIX_START: u32 = u32::from_be_bytes([b'Z', b'C', b'Z', b'C']);
    const PREFIX_END: u32 = u32::from_be_bytes([b'N', b'N', b'N', b'N']);

    u32::min(
        (inp ^ PREFIX_START).count_ones(),
        (inp ^ PREFIX_END).count_ones(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::waveform::{bytes_to_bits, PREAMBLE, PREAMBLE_LENGTH};

    const TEST_MESSAGE: &str = "ZCZC-ORG-EEE-012345+0000-0001122-NOCALL00-";

    fn feed_bytes(framer: &mut Framer, bytes: &[u8], confidence: f32) -> Vec<FrameEvent> {
        let mut out = Vec::new();
        for (i, bit) in bytes_to_bits(bytes).into_iter().enumerate() {
            out.push(framer.input(BitEvent {
                value: bit,
                confidence,
                offset: i as u64,
            }));
        }
        out
    }

    fn preamble_plus(message: &[u8]) -> Vec<u8> {
        let mut out = vec![PREAMBLE; PREAMBLE_LENGTH];
        out.extend_from_slice(message);
        out
    }

    fn candidate_from(events: Vec<FrameEvent>) -> Option<HeaderCandidate> {
        events.into_iter().find_map(|e| match e {
            FrameEvent::Candidate(c) => Some(c),
            _ => None,
        })
    }

    #[test]
    fn test_clean_burst() {
        let mut framer = Framer::new(0, 2, 10);

        let mut data = preamble_plus(TEST_MESSAGE.as_bytes());
        // enough junk after the message to trip the end detection
        data.extend_from_slice(&[0u8; 16]);

        let events = feed_bytes(&mut framer, &data, 1.0);
        assert!(events.contains(&FrameEvent::Acquired));

        let cand = candidate_from(events).expect("expected candidate");
        assert_eq!(TEST_MESSAGE.as_bytes(), cand.bytes());
        assert!(!cand.is_eom());
        assert!(cand.byte_confidence().iter().all(|&c| c == 1.0));
        assert!(cand.confidence() > 0.99);
        assert!(!framer.is_active());
    }

    #[test]
    fn test_eom_burst() {
        let mut framer = Framer::new(0, 2, 10);

        let mut data = preamble_plus(b"NNNN");
        data.extend_from_slice(&[0u8; 16]);

        let cand = candidate_from(feed_bytes(&mut framer, &data, 0.9)).expect("candidate");
        assert_eq!(b"NNNN", cand.bytes());
        assert!(cand.is_eom());
    }

    #[test]
    fn test_prefix_bit_errors_tolerated() {
        let mut framer = Framer::new(0, 2, 10);

        // "ZCZE" is two bit errors away from "ZCZC"
        let mut data = preamble_plus(b"ZCZE-ORG");
        data.extend_from_slice(&[0u8; 16]);

        let cand = candidate_from(feed_bytes(&mut framer, &data, 1.0)).expect("candidate");
        // raw received bytes are kept; the vote fixes them later
        assert_eq!(b"ZCZE-ORG", cand.bytes());
    }

    #[test]
    fn test_sync_bit_error_tolerated() {
        let mut corrupt = vec![PREAMBLE; PREAMBLE_LENGTH];
        corrupt[7] = 0xaa; // one bit error in the sync region
        corrupt.extend_from_slice(TEST_MESSAGE.as_bytes());
        corrupt.extend_from_slice(&[0u8; 16]);

        let mut framer = Framer::new(2, 2, 10);
        let cand = candidate_from(feed_bytes(&mut framer, &corrupt, 1.0)).expect("candidate");
        assert_eq!(TEST_MESSAGE.as_bytes(), cand.bytes());
    }

    #[test]
    fn test_gives_up_without_prefix() {
        let mut framer = Framer::new(0, 2, 10);

        // preamble forever: sync acquires but no prefix ever comes
        let events = feed_bytes(&mut framer, &[PREAMBLE; 64], 1.0);
        assert!(events.contains(&FrameEvent::Acquired));
        assert!(events
            .iter()
            .skip_while(|e| **e != FrameEvent::Acquired)
            .any(|e| *e == FrameEvent::NoCarrier));
        assert!(candidate_from(events).is_none());
    }

    #[test]
    fn test_byte_confidence_is_min_of_bits() {
        let mut framer = Framer::new(0, 2, 10);

        let mut data = preamble_plus(TEST_MESSAGE.as_bytes());
        data.extend_from_slice(&[0u8; 16]);
        let bits = bytes_to_bits(&data);

        // weaken a single bit inside the first data byte ('Z')
        let weak_index = (PREAMBLE_LENGTH + 1) * 8 - 3;
        let mut cand = None;
        for (i, bit) in bits.into_iter().enumerate() {
            let confidence = if i == weak_index { 0.25 } else { 1.0 };
            if let FrameEvent::Candidate(c) = framer.input(BitEvent {
                value: bit,
                confidence,
                offset: i as u64,
            }) {
                cand = Some(c);
            }
        }

        let cand = cand.expect("candidate");
        assert_eq!(0.25, cand.byte_confidence()[0]);
        assert!(cand.byte_confidence()[1..].iter().all(|&c| c == 1.0));
    }

    #[test]
    fn test_garbage_never_panics_never_frames() {
        let mut framer = Framer::new(0, 2, 10);

        // a fixed pseudo-random pattern with no preamble run
        let mut lfsr: u32 = 0xace1;
        for i in 0..20_000u64 {
            lfsr = lfsr.wrapping_mul(1103515245).wrapping_add(12345);
            let out = framer.input(BitEvent {
                value: (lfsr >> 16) & 1 == 1,
                confidence: 0.3,
                offset: i,
            });
            assert!(!matches!(out, FrameEvent::Candidate(_)));
        }
    }

    #[test]
    fn test_overlong_burst_truncates() {
        let mut framer = Framer::new(0, 2, 10);

        // a "burst" that never ends: all allowed characters
        let mut data = preamble_plus(b"ZCZC-");
        data.extend_from_slice(&[b'A'; MAX_BURST_LENGTH + 32]);

        let cand = candidate_from(feed_bytes(&mut framer, &data, 1.0)).expect("candidate");
        assert_eq!(MAX_BURST_LENGTH, cand.bytes().len());
    }

    #[test]
    fn test_forced_end() {
        let mut framer = Framer::new(0, 2, 10);
        let data = preamble_plus(b"NNNN");
        let events = feed_bytes(&mut framer, &data, 1.0);
        assert!(candidate_from(events).is_none());
        assert!(framer.is_active());

        // signal loss forces the partial burst out
        match framer.end(1234) {
            FrameEvent::Candidate(c) => {
                assert_eq!(b"NNNN", c.bytes());
                assert_eq!(1234, c.last_symbol());
            }
            other => panic!("expected candidate, got {:?}", other),
        }
        assert!(!framer.is_active());
    }
}
