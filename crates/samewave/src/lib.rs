//! # samewave: SAME/EAS Encoding and Decoding
//!
//! This crate encodes and decodes the digital headers of
//! [Specific Area Message Encoding](https://en.wikipedia.org/wiki/Specific_Area_Message_Encoding)
//! (SAME), the protocol that frames emergency alerts in the United
//! States' [Emergency Alert System](https://en.wikipedia.org/wiki/Emergency_Alert_System)
//! under FCC Part 11. It covers both directions of the wire:
//!
//! * **encode**: a structured [`SameHeader`] becomes a complete,
//!   compliant audio transmission—three redundant FSK header bursts,
//!   the two-tone attention signal, the message slot, and three
//!   `NNNN` end-of-message bursts; and
//! * **decode**: captured audio becomes validated, confidence-scored
//!   [`ConsolidatedAlert`]s, through matched-filter demodulation,
//!   timing recovery, preamble framing, and a three-burst majority
//!   vote.
//!
//! ## Disclaimer
//!
//! This crate has not been certified as a weather radio receiver,
//! as EAS encoding equipment, or for any other purpose. The author
//! **strongly discourages** its use in any safety-critical
//! application. Always have at least two methods available for
//! receiving emergency alerts.
//!
//! ## Decoding
//!
//! You will need *baseband audio* from a radio, scanner, or
//! software-defined radio—the signal you would normally listen to.
//! Obtaining it is beyond the scope of this crate; to sample a
//! soundcard, try [cpal](https://crates.io/crates/cpal). Mix stereo
//! signals to mono first.
//!
//! ```
//! use samewave::{DecodeEvent, SameReceiverBuilder};
//!
//! # let some_audio_source_iterator = || std::iter::once(0.0f32);
//! // create a receiver with your audio sampling rate
//! let mut rx = SameReceiverBuilder::new(22050)
//!     .with_timing_max_deviation(0.01)   // clock tolerance, fraction of a symbol
//!     .with_sync_max_errors(2)           // preamble correlation error budget
//!     .build();
//!
//! // let audiosrc be an iterator of f32 PCM mono samples at the
//! // sampling rate, e.g. a BufReader over stdin or a file
//! let audiosrc = some_audio_source_iterator();
//! for evt in rx.iter(audiosrc) {
//!     match evt {
//!         DecodeEvent::Alert(alert) => {
//!             println!("alert ({:.0}% confident): {}", 100.0 * alert.confidence(), alert.raw());
//!         }
//!         DecodeEvent::EndOfMessage { .. } => println!("end of message"),
//!         _ => {}
//!     }
//! }
//! ```
//!
//! Each receiver is an independent session: its demodulator state,
//! timing loop, and burst consolidation are private to the instance.
//! Feeding several radios means building several receivers; their
//! alerts never mix. Decoding never fails—noise, interference, and
//! unrelated audio simply produce no output—and the caller decides
//! what confidence to act on.
//!
//! ## Encoding
//!
//! ```
//! use samewave::{
//!     EncodeOptions, IssueTime, Originator, SameEncoder, SameHeader, ValidDuration,
//! };
//!
//! let header = SameHeader::new(
//!     Originator::WeatherService,
//!     "TOR",                                    // Tornado Warning
//!     &["039173"],                              // Wood County, OH
//!     ValidDuration::from_minutes(45).unwrap(),
//!     Some(IssueTime::new(12, 14, 15).unwrap()), // day 012, 14:15 UTC
//!     "KEAS",
//! ).unwrap();
//!
//! assert_eq!(
//!     "ZCZC-WXR-TOR-039173+0045-0121415-KEAS    -",
//!     &header.to_string()
//! );
//!
//! let audio = SameEncoder::new(EncodeOptions::default())
//!     .encode(&header, None)
//!     .unwrap();
//! let samples: Vec<f32> = audio.into_samples();
//! # assert!(!samples.is_empty());
//! ```
//!
//! Headers are validated—field structure *and* registry
//! membership—before the first sample is synthesized; an invalid
//! header yields a [`ValidationError`] and no audio, never a partial
//! transmission.
//!
//! ## Background
//!
//! SAME messages are transmitted in place of a station's normal
//! programming. The digital header summarizing the alert is sent
//! in-band, modulated as two-level frequency-shift keying at
//! 520.83 baud, and repeated three times for redundancy; the actual
//! "message" is the audio that follows it. This crate reconciles
//! the three repetitions by per-character majority vote and scores
//! the result, so that a single corrupted burst neither drops an
//! alert nor corrupts it silently.
//!
//! ## Crate features
//!
//! * `chrono` *(default)*: issue-time stamping from the wall clock
//!   at encode time, and true-UTC issuance/expiry math on decoded
//!   headers. If enabled, `chrono` becomes part of the public API.

#![deny(unsafe_code)]

pub mod agc;
pub mod assembler;
pub mod builder;
pub mod combiner;
pub mod dcblock;
pub mod demod;
pub mod encoder;
pub mod filter;
pub mod framing;
pub mod message;
pub mod samecodes;
pub mod synth;
pub mod waveform;

mod receiver;
mod symsync;

pub use assembler::{confidence_ceiling, Assembler, ConsolidatedAlert, TransportEvent};
pub use builder::SameReceiverBuilder;
pub use combiner::{vote, VoteOutcome, VoteResult};
pub use demod::{BitDemodulator, BitEvent};
pub use encoder::{
    encode, AudioSegment, EncodeError, EncodeOptions, EncodedMessage, SameEncoder, SegmentKind,
};
pub use framing::{FrameEvent, Framer, HeaderCandidate};
pub use message::{
    validate_header, InvalidDateErr, IssueTime, LocationCode, MessageDecodeErr, SameHeader,
    ValidDuration, ValidationError,
};
pub use receiver::{decode_stream, DecodeEvent, SameReceiver, SourceIter};
pub use samecodes::{
    require_event, EventCode, Originator, Phenomenon, SignificanceLevel, UnrecognizedEventCode,
};
pub use synth::{SynthError, ToneSynthesizer};
