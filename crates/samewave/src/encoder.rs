//! SAME message assembly
//!
//! The [`SameEncoder`] turns a [`SameHeader`](crate::SameHeader) into
//! a complete, compliant transmission:
//!
//! 1. preamble + header burst, three times, with ≈1.0 s of silence
//!    between bursts
//! 2. the two-tone attention signal (8–25 s)
//! 3. the audio message slot (caller audio, or a silence placeholder)
//! 4. preamble + `NNNN` end-of-message burst, three times
//!
//! All validation happens before the first sample is generated. An
//! invalid header produces an error and *no* audio; there is no such
//! thing as a partially-encoded SAME message.

use thiserror::Error;

use crate::message::{SameHeader, ValidationError, PREFIX_EOM};
use crate::synth::{SynthError, ToneSynthesizer, DEFAULT_PEAK};
use crate::waveform;

/// Encoder configuration
///
/// The defaults produce a minimum-length attention tone at 22050 Hz.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeOptions {
    /// Output sampling rate, 8000–48000 Hz
    pub sample_rate: u32,

    /// Attention tone duration; FCC Part 11 requires 8 to 25 seconds
    pub attention_secs: f32,

    /// Peak output amplitude, linear; default −3 dBFS
    pub peak: f32,

    /// Length of the silence placeholder emitted when no message
    /// audio is supplied
    pub message_placeholder_secs: f32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            attention_secs: ATTENTION_SECS_RANGE.0,
            peak: DEFAULT_PEAK,
            message_placeholder_secs: 1.0,
        }
    }
}

/// Permitted attention-tone durations, in seconds
pub const ATTENTION_SECS_RANGE: (f32, f32) = (8.0, 25.0);

/// Error assembling a transmission
#[derive(Error, Clone, Debug, PartialEq)]
pub enum EncodeError {
    /// The header failed validation; no audio was generated
    #[error(transparent)]
    Header(#[from] ValidationError),

    /// The attention tone duration is outside 8–25 seconds
    #[error("attention tone must last 8 to 25 seconds, not {0}")]
    AttentionDuration(f32),

    /// The synthesizer rejected the audio parameters
    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// Which part of the transmission a segment holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// One of the three header bursts (0–2)
    HeaderBurst(u8),

    /// Inter-segment silence
    Gap,

    /// The 853 + 960 Hz attention signal
    AttentionTone,

    /// The audio message slot
    Message,

    /// One of the three end-of-message bursts (0–2)
    EomBurst(u8),
}

/// A labeled run of PCM samples
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    /// What this segment holds
    pub kind: SegmentKind,

    /// Mono PCM samples
    pub samples: Vec<f32>,
}

/// A fully-assembled SAME transmission
///
/// Segments appear in broadcast order. The encoder owns the buffers
/// until the `EncodedMessage` is returned; after that they belong to
/// the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedMessage {
    sample_rate: u32,
    segments: Vec<AudioSegment>,
}

impl EncodedMessage {
    /// Sampling rate of every segment (Hz)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Labeled segments, in broadcast order
    pub fn segments(&self) -> &[AudioSegment] {
        &self.segments
    }

    /// Total number of samples across all segments
    pub fn num_samples(&self) -> usize {
        self.segments.iter().map(|s| s.samples.len()).sum()
    }

    /// Total broadcast duration, in seconds
    pub fn duration_secs(&self) -> f32 {
        self.num_samples() as f32 / self.sample_rate as f32
    }

    /// Iterator over all samples, in broadcast order
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.segments.iter().flat_map(|s| s.samples.iter().copied())
    }

    /// Concatenate all segments into one buffer
    pub fn into_samples(self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_samples());
        for seg in self.segments {
            out.extend(seg.samples);
        }
        out
    }

    /// All samples as signed 16-bit PCM
    ///
    /// Sound interfaces commonly take `i16`; this is the encoder's
    /// contract with [`samecast`](https://crates.io/crates/samecast)
    /// decode, too.
    pub fn to_i16_samples(&self) -> Vec<i16> {
        self.samples()
            .map(|sa| (sa.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect()
    }
}

/// Assembles SAME transmissions
///
/// ```
/// use samewave::{EncodeOptions, IssueTime, Originator, SameEncoder,
///                SameHeader, ValidDuration};
///
/// let header = SameHeader::new(
///     Originator::WeatherService,
///     "RWT",
///     &["039173"],
///     ValidDuration::from_minutes(15).unwrap(),
///     Some(IssueTime::new(321, 11, 15).unwrap()),
///     "KLOX/NWS",
/// ).unwrap();
///
/// let encoder = SameEncoder::new(EncodeOptions::default());
/// let msg = encoder.encode(&header, None).unwrap();
/// assert!(msg.duration_secs() > 8.0);
/// ```
///
/// The encoder holds no mutable state: it may be shared freely and
/// called concurrently from multiple threads.
#[derive(Clone, Debug, Default)]
pub struct SameEncoder {
    options: EncodeOptions,
}

impl SameEncoder {
    /// New encoder with the given options
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    /// Encoder options
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Assemble a complete transmission
    ///
    /// If `header` has no issue time, it is stamped from the wall
    /// clock. `message_audio` fills the voice message slot; pass
    /// `None` for a silence placeholder.
    ///
    /// The header is fully validated—structure *and* registry—before
    /// any audio is synthesized.
    pub fn encode(
        &self,
        header: &SameHeader,
        message_audio: Option<&[f32]>,
    ) -> Result<EncodedMessage, EncodeError> {
        // every check comes before the first generated sample
        let header = self.resolve_issue_time(header)?;
        header.validate()?;

        if !(ATTENTION_SECS_RANGE.0..=ATTENTION_SECS_RANGE.1).contains(&self.options.attention_secs)
        {
            return Err(EncodeError::AttentionDuration(self.options.attention_secs));
        }

        let mut synth =
            ToneSynthesizer::new(self.options.sample_rate)?.with_peak(self.options.peak);

        // the three header bursts must be bit-identical: render once
        let header_burst = self.render_burst(&mut synth, header.to_string().as_bytes())?;
        let eom_burst = self.render_burst(&mut synth, PREFIX_EOM.as_bytes())?;
        let gap = AudioSegment {
            kind: SegmentKind::Gap,
            samples: synth.silence(waveform::INTERBURST_GAP_SECS),
        };

        let mut segments = Vec::with_capacity(2 * waveform::BURST_REPEATS * 2 + 2);
        for burst in 0..waveform::BURST_REPEATS {
            segments.push(AudioSegment {
                kind: SegmentKind::HeaderBurst(burst as u8),
                samples: header_burst.clone(),
            });
            segments.push(gap.clone());
        }

        segments.push(AudioSegment {
            kind: SegmentKind::AttentionTone,
            samples: synth.attention_tone(self.options.attention_secs),
        });

        segments.push(AudioSegment {
            kind: SegmentKind::Message,
            samples: match message_audio {
                Some(audio) => audio.to_vec(),
                None => synth.silence(self.options.message_placeholder_secs),
            },
        });
        segments.push(gap.clone());

        for burst in 0..waveform::BURST_REPEATS {
            segments.push(AudioSegment {
                kind: SegmentKind::EomBurst(burst as u8),
                samples: eom_burst.clone(),
            });
            if burst + 1 < waveform::BURST_REPEATS {
                segments.push(gap.clone());
            }
        }

        Ok(EncodedMessage {
            sample_rate: self.options.sample_rate,
            segments,
        })
    }

    // Modulate one burst: 16 preamble bytes, then the data
    fn render_burst(
        &self,
        synth: &mut ToneSynthesizer,
        data: &[u8],
    ) -> Result<Vec<f32>, EncodeError> {
        let mut bytes = Vec::with_capacity(waveform::PREAMBLE_LENGTH + data.len());
        bytes.resize(waveform::PREAMBLE_LENGTH, waveform::PREAMBLE);
        bytes.extend_from_slice(data);

        // each burst starts from a quiet oscillator
        synth.reset();
        Ok(synth.fsk(&waveform::bytes_to_bits(&bytes), waveform::BAUD_HZ)?)
    }

    // Stamp the header with the wall clock if it has no issue time
    #[cfg(feature = "chrono")]
    fn resolve_issue_time(&self, header: &SameHeader) -> Result<SameHeader, EncodeError> {
        match header.issue_time() {
            Some(_) => Ok(header.clone()),
            None => Ok(header.with_issue_time(crate::message::IssueTime::from_datetime(
                &chrono::Utc::now(),
            ))),
        }
    }

    #[cfg(not(feature = "chrono"))]
    fn resolve_issue_time(&self, header: &SameHeader) -> Result<SameHeader, EncodeError> {
        match header.issue_time() {
            Some(_) => Ok(header.clone()),
            None => Err(EncodeError::Header(ValidationError::MissingIssueTime)),
        }
    }
}

/// Encode a header with the given options
///
/// Convenience for [`SameEncoder::encode()`] with no message audio;
/// part of the crate's top-level API surface.
pub fn encode(header: &SameHeader, options: &EncodeOptions) -> Result<EncodedMessage, EncodeError> {
    SameEncoder::new(*options).encode(header, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::message::{IssueTime, ValidDuration};
    use crate::samecodes::Originator;

    const FS: u32 = 22050;

    fn test_header() -> SameHeader {
        SameHeader::new(
            Originator::WeatherService,
            "TOR",
            &["039173"],
            ValidDuration::from_minutes(45).unwrap(),
            Some(IssueTime::new(12, 14, 15).unwrap()),
            "KEAS",
        )
        .unwrap()
    }

    fn test_options() -> EncodeOptions {
        EncodeOptions {
            sample_rate: FS,
            attention_secs: 8.0,
            ..EncodeOptions::default()
        }
    }

    #[test]
    fn test_segment_order() {
        let msg = SameEncoder::new(test_options())
            .encode(&test_header(), None)
            .expect("encode");

        let kinds: Vec<SegmentKind> = msg.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            &[
                SegmentKind::HeaderBurst(0),
                SegmentKind::Gap,
                SegmentKind::HeaderBurst(1),
                SegmentKind::Gap,
                SegmentKind::HeaderBurst(2),
                SegmentKind::Gap,
                SegmentKind::AttentionTone,
                SegmentKind::Message,
                SegmentKind::Gap,
                SegmentKind::EomBurst(0),
                SegmentKind::Gap,
                SegmentKind::EomBurst(1),
                SegmentKind::Gap,
                SegmentKind::EomBurst(2),
            ],
            kinds.as_slice()
        );
    }

    #[test]
    fn test_bursts_bit_identical() {
        let msg = SameEncoder::new(test_options())
            .encode(&test_header(), None)
            .expect("encode");

        let bursts: Vec<&AudioSegment> = msg
            .segments()
            .iter()
            .filter(|s| matches!(s.kind, SegmentKind::HeaderBurst(_)))
            .collect();
        assert_eq!(3, bursts.len());
        assert_eq!(bursts[0].samples, bursts[1].samples);
        assert_eq!(bursts[1].samples, bursts[2].samples);

        // (16 preamble + 42 header) bytes at 8 bits each
        let expect_len =
            ((16 + 42) as f64 * 8.0 * FS as f64 / waveform::BAUD_HZ as f64).round() as usize;
        assert!((bursts[0].samples.len() as i64 - expect_len as i64).abs() <= 1);
    }

    #[test]
    fn test_gap_and_attention_lengths() {
        let msg = SameEncoder::new(test_options())
            .encode(&test_header(), None)
            .expect("encode");

        for seg in msg.segments() {
            match seg.kind {
                SegmentKind::Gap => assert_eq!(FS as usize, seg.samples.len()),
                SegmentKind::AttentionTone => assert_eq!(FS as usize * 8, seg.samples.len()),
                _ => {}
            }
        }
    }

    #[test]
    fn test_attention_range_enforced() {
        for bad in [7.9f32, 25.1, 0.0, -3.0] {
            let opts = EncodeOptions {
                attention_secs: bad,
                ..test_options()
            };
            assert_eq!(
                Err(EncodeError::AttentionDuration(bad)),
                SameEncoder::new(opts).encode(&test_header(), None)
            );
        }

        for good in [8.0f32, 25.0, 12.5] {
            let opts = EncodeOptions {
                attention_secs: good,
                ..test_options()
            };
            assert!(SameEncoder::new(opts).encode(&test_header(), None).is_ok());
        }
    }

    #[test]
    fn test_invalid_header_produces_no_audio() {
        // structurally fine, but the event code is unregistered
        let bad = SameHeader::new(
            Originator::CivilAuthority,
            "QQQ",
            &["039173"],
            ValidDuration::from_minutes(15).unwrap(),
            Some(IssueTime::new(1, 0, 0).unwrap()),
            "NOCALL00",
        )
        .unwrap();

        match SameEncoder::new(test_options()).encode(&bad, None) {
            Err(EncodeError::Header(e)) => assert_eq!("event_code", e.field()),
            other => panic!("expected header error, got {:?}", other),
        }
    }

    #[test]
    fn test_deterministic() {
        let encoder = SameEncoder::new(test_options());
        let a = encoder.encode(&test_header(), None).expect("encode");
        let b = encoder.encode(&test_header(), None).expect("encode");
        assert_eq!(a, b);

        let va: Vec<f32> = a.into_samples();
        let vb: Vec<f32> = b.into_samples();
        assert_eq!(va, vb);
    }

    #[test]
    fn test_message_audio_slot() {
        let voice = vec![0.25f32; 1234];
        let msg = SameEncoder::new(test_options())
            .encode(&test_header(), Some(&voice))
            .expect("encode");

        let slot = msg
            .segments()
            .iter()
            .find(|s| s.kind == SegmentKind::Message)
            .expect("message slot");
        assert_eq!(voice, slot.samples);
    }
}
