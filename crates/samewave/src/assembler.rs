//! Burst consolidation
//!
//! The [`Assembler`] collects [`HeaderCandidate`]s into groups of
//! (up to) three repetitions of the same logical alert, votes each
//! group into a single estimate, and emits a validated, confidence-
//! scored [`ConsolidatedAlert`].
//!
//! Grouping is by similarity, not arrival order: candidates join a
//! group whose event code and location set match, or whose text is
//! within a small edit distance. Bursts of two *different* alerts
//! interleaved in time therefore open two groups and emit two
//! alerts, instead of being conflated.
//!
//! A group finalizes when its third burst arrives, or when a
//! timeout—long enough for three real repetitions at one-second
//! spacing—expires. A group holding a single burst at timeout still
//! finalizes: missing a real alert is worse than flagging one with
//! lowered confidence. Its score is capped well below what a full
//! three-burst consensus can reach.
//!
//! Time is a monotonic *symbol count* threaded explicitly through
//! every call. The assembler never reads a clock: tests drive it
//! with whatever timeline they please, and shutdown can flush
//! pending groups deterministically.

use std::fmt;

use arrayvec::ArrayVec;

#[cfg(not(test))]
use log::{debug, info, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

use crate::combiner::{vote, BurstData, VoteOutcome, VoteResult};
use crate::framing::HeaderCandidate;
use crate::message::SameHeader;
use crate::waveform;

/// Consolidation timeout, in SAME symbols
///
/// Three repetitions of a maximal header at one-second spacing fit
/// comfortably inside six seconds of symbol time, counted from the
/// end of the first burst.
pub const GROUP_TIMEOUT_SYMBOLS: u64 = (6.0 * waveform::BAUD_HZ) as u64;

// Suppress re-emission of an identical alert for this long after it
// finalizes; stray fourth bursts would otherwise emit a duplicate
const DUPLICATE_SUPPRESS_SYMBOLS: u64 = 2 * GROUP_TIMEOUT_SYMBOLS;

// Candidates whose text is within this fraction of its length in
// edit distance are considered repetitions of the same transmission
const SIMILARITY_DENOM: usize = 8;

/// Confidence ceiling for a consolidation of `burst_count` bursts
///
/// A pure function of the consensus shape: a single reception can
/// never outrank a full three-burst consensus, no matter how clean
/// it was.
pub fn confidence_ceiling(burst_count: u8) -> f32 {
    match burst_count {
        0..=1 => 0.75,
        2 => 0.90,
        _ => 1.0,
    }
}

/// A validated, confidence-scored alert
///
/// Emitted once per received SAME transmission. Immutable: ownership
/// passes to the caller and the assembler retains nothing but a
/// short-lived duplicate-suppression record.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidatedAlert {
    header: SameHeader,
    raw: String,
    confidence: f32,
    burst_count: u8,
    outcome: VoteOutcome,
    first_seen: u64,
    last_seen: u64,
}

impl ConsolidatedAlert {
    /// The decoded header
    pub fn header(&self) -> &SameHeader {
        &self.header
    }

    /// The consensus header string, as voted from the bursts
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Overall confidence, `0.0` – `1.0`
    ///
    /// `agreement_ratio × mean bit confidence`, capped by
    /// [`confidence_ceiling()`]. Callers decide what to act on; a
    /// threshold of 0.8 is a reasonable gate for automated actions.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// How many bursts contributed (1–3)
    pub fn burst_count(&self) -> u8 {
        self.burst_count
    }

    /// How the burst consensus was reached
    pub fn outcome(&self) -> VoteOutcome {
        self.outcome
    }

    /// Symbol count when the first contributing burst was detected
    pub fn first_seen(&self) -> u64 {
        self.first_seen
    }

    /// Symbol count when the last contributing burst ended
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }
}

impl fmt::Display for ConsolidatedAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" ({} burst{}, confidence {:.2})",
            self.raw,
            self.burst_count,
            if self.burst_count == 1 { "" } else { "s" },
            self.confidence
        )
    }
}

/// Transport-layer event
///
/// What the assembler has to report after accepting a candidate or
/// advancing its clock.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// Nothing of consequence happened
    Idle,

    /// One or more groups are waiting on more bursts
    Assembling,

    /// An end-of-message burst was received
    ///
    /// EOMs report immediately, once per burst; there is nothing to
    /// vote on and the message they terminate may matter right now.
    EndOfMessage {
        /// Confidence of the EOM burst
        confidence: f32,
    },

    /// A consolidated alert is ready
    Alert(ConsolidatedAlert),
}

// One in-progress consolidation group
#[derive(Clone, Debug)]
struct Group {
    bursts: ArrayVec<ParsedBurst, 3>,
    first_seen: u64,
    deadline: u64,
}

// A candidate that parsed as a header, with its vote inputs
#[derive(Clone, Debug)]
struct ParsedBurst {
    bytes: Vec<u8>,
    byte_confidence: Vec<f32>,
    confidence: f32,
    header: SameHeader,
    last_symbol: u64,
}

/// Collects header candidates into consolidated alerts
///
/// One `Assembler` per receiver. All state is private to the
/// pipeline instance; running several receivers means several
/// assemblers, and their groups never mix.
#[derive(Clone, Debug, Default)]
pub struct Assembler {
    groups: Vec<Group>,
    // (alert text, suppression deadline) of the last emission
    recent: Option<(String, u64)>,
}

impl Assembler {
    /// New assembler with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.groups.clear();
        self.recent = None;
    }

    /// Are any groups waiting on more bursts?
    pub fn is_assembling(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Accept one burst candidate
    ///
    /// EOM bursts report immediately. Header bursts join a matching
    /// group (or open a new one); a group that reaches three bursts
    /// finalizes on the spot. Candidates that fail structural
    /// validation are logged and dropped—never an error, because the
    /// air is full of things that are not SAME headers.
    pub fn accept(&mut self, candidate: HeaderCandidate) -> TransportEvent {
        if candidate.is_eom() {
            info!("assembler: end of message");
            return TransportEvent::EndOfMessage {
                confidence: candidate.confidence(),
            };
        }

        let text = match std::str::from_utf8(candidate.bytes()) {
            Ok(t) => t,
            Err(_) => {
                debug!("assembler: discarded non-ASCII candidate");
                return self.idle_state();
            }
        };
        let header = match SameHeader::parse(text) {
            Ok(h) => h,
            Err(err) => {
                debug!("assembler: discarded candidate ({}): \"{}\"", err, text);
                return self.idle_state();
            }
        };

        let parsed = ParsedBurst {
            bytes: candidate.bytes().to_vec(),
            byte_confidence: candidate.byte_confidence().to_vec(),
            confidence: candidate.confidence(),
            header,
            last_symbol: candidate.last_symbol(),
        };

        match self.find_group(&parsed) {
            Some(slot) => {
                let group = &mut self.groups[slot];
                group.bursts.push(parsed);
                debug!(
                    "assembler: burst {} of group {}",
                    group.bursts.len(),
                    slot
                );
                if group.bursts.is_full() {
                    let group = self.groups.swap_remove(slot);
                    return match self.finalize(group) {
                        Some(alert) => TransportEvent::Alert(alert),
                        None => self.idle_state(),
                    };
                }
            }
            None => {
                debug!("assembler: new group: \"{}\"", text);
                let mut bursts = ArrayVec::new();
                bursts.push(parsed);
                self.groups.push(Group {
                    bursts,
                    first_seen: candidate.first_symbol(),
                    deadline: candidate.last_symbol() + GROUP_TIMEOUT_SYMBOLS,
                });
            }
        }

        TransportEvent::Assembling
    }

    /// Advance the consolidation clock
    ///
    /// `symbol_count` is the injected monotonic clock. Groups whose
    /// deadline has passed finalize and are returned, oldest first.
    /// Call this regularly—once per symbol is typical and cheap.
    pub fn tick(&mut self, symbol_count: u64) -> Vec<ConsolidatedAlert> {
        if let Some((_, deadline)) = &self.recent {
            if *deadline <= symbol_count {
                self.recent = None;
            }
        }

        let mut out = Vec::new();
        while let Some(slot) = self
            .groups
            .iter()
            .position(|g| g.deadline <= symbol_count)
        {
            let group = self.groups.remove(slot);
            info!(
                "assembler: group timed out with {} burst(s)",
                group.bursts.len()
            );
            if let Some(alert) = self.finalize(group) {
                out.push(alert);
            }
        }
        out
    }

    /// Finalize every pending group immediately
    ///
    /// For shutdown: pending groups are voted and emitted as if
    /// their timeouts had elapsed.
    pub fn flush(&mut self) -> Vec<ConsolidatedAlert> {
        let groups = std::mem::take(&mut self.groups);
        groups
            .into_iter()
            .filter_map(|g| self.finalize(g))
            .collect()
    }

    fn idle_state(&self) -> TransportEvent {
        if self.groups.is_empty() {
            TransportEvent::Idle
        } else {
            TransportEvent::Assembling
        }
    }

    // Index of the group this burst belongs to, if any
    fn find_group(&self, parsed: &ParsedBurst) -> Option<usize> {
        self.groups.iter().position(|group| {
            let leader = &group.bursts[0];
            same_alert(&leader.header, &parsed.header)
                || edit_distance(&leader.bytes, &parsed.bytes)
                    <= usize::max(2, leader.bytes.len() / SIMILARITY_DENOM)
        })
    }

    // Vote a group down to a single alert
    fn finalize(&mut self, group: Group) -> Option<ConsolidatedAlert> {
        let inputs: Vec<BurstData<'_>> = group
            .bursts
            .iter()
            .map(|b| (b.bytes.as_slice(), b.byte_confidence.as_slice()))
            .collect();
        let result: VoteResult = vote(&inputs);

        // the voted bytes came from individually-parseable bursts,
        // but the vote can in principle splice an unparseable string;
        // fall back to the most confident member if so
        let (raw, header) = match std::str::from_utf8(&result.bytes)
            .ok()
            .and_then(|t| SameHeader::parse(t).ok().map(|h| (t.to_owned(), h)))
        {
            Some(pair) => pair,
            None => {
                warn!("assembler: voted bytes failed to parse; using best burst");
                let best = group
                    .bursts
                    .iter()
                    .max_by(|a, b| {
                        a.confidence
                            .partial_cmp(&b.confidence)
                            .expect("confidences are finite")
                    })
                    .expect("groups are never empty");
                (
                    String::from_utf8_lossy(&best.bytes).into_owned(),
                    best.header.clone(),
                )
            }
        };

        // ignore a stray repetition of something already reported
        if let Some((recent, _)) = &self.recent {
            if *recent == raw {
                debug!("assembler: suppressed duplicate alert \"{}\"", raw);
                return None;
            }
        }

        let burst_count = group.bursts.len() as u8;
        let mean_burst = group
            .bursts
            .iter()
            .map(|b| b.confidence)
            .sum::<f32>()
            / group.bursts.len() as f32;
        let confidence =
            (result.agreement_ratio * mean_burst).min(confidence_ceiling(burst_count));

        let last_seen = group
            .bursts
            .iter()
            .map(|b| b.last_symbol)
            .max()
            .expect("groups are never empty");

        self.recent = Some((raw.clone(), last_seen + DUPLICATE_SUPPRESS_SYMBOLS));

        let alert = ConsolidatedAlert {
            header,
            raw,
            confidence,
            burst_count,
            outcome: result.outcome,
            first_seen: group.first_seen,
            last_seen,
        };
        info!("assembler: alert ready: {}", alert);
        Some(alert)
    }
}

// Same logical alert: same event code and same set of locations
fn same_alert(a: &SameHeader, b: &SameHeader) -> bool {
    if a.event_str() != b.event_str() || a.locations().len() != b.locations().len() {
        return false;
    }
    let mut la: Vec<&str> = a.locations().iter().map(|l| l.as_str()).collect();
    let mut lb: Vec<&str> = b.locations().iter().map(|l| l.as_str()).collect();
    la.sort_unstable();
    lb.sort_unstable();
    la == lb
}

// Two-row Levenshtein distance
fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len());
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let subst = prev[j] + (ca != cb) as usize;
            cur[j + 1] = subst.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    const HEADER: &str = "ZCZC-WXR-TOR-039173+0045-0121415-KEAS    -";
    const OTHER: &str = "ZCZC-CIV-CEM-011001+0100-0351700-NOCALL00-";

    fn candidate(text: &str, at: u64) -> HeaderCandidate {
        HeaderCandidate::new(
            text.as_bytes().to_vec(),
            vec![1.0; text.len()],
            1.0,
            at,
            at + 350,
        )
    }

    #[test]
    fn test_three_bursts_finalize_immediately() {
        let mut asm = Assembler::new();

        assert_eq!(
            TransportEvent::Assembling,
            asm.accept(candidate(HEADER, 0))
        );
        assert_eq!(
            TransportEvent::Assembling,
            asm.accept(candidate(HEADER, 900))
        );

        match asm.accept(candidate(HEADER, 1800)) {
            TransportEvent::Alert(alert) => {
                assert_eq!(HEADER, alert.raw());
                assert_eq!(3, alert.burst_count());
                assert_eq!(VoteOutcome::Unanimous, alert.outcome());
                assert_approx_eq!(1.0f32, alert.confidence());
                assert_eq!(0, alert.first_seen());
                assert_eq!(2150, alert.last_seen());
                assert_eq!("TOR", alert.header().event_str());
            }
            other => panic!("expected alert, got {:?}", other),
        }
        assert!(!asm.is_assembling());
    }

    #[test]
    fn test_single_burst_times_out() {
        let mut asm = Assembler::new();
        asm.accept(candidate(HEADER, 0));

        // not yet
        assert!(asm.tick(350 + GROUP_TIMEOUT_SYMBOLS - 1).is_empty());
        assert!(asm.is_assembling());

        let alerts = asm.tick(350 + GROUP_TIMEOUT_SYMBOLS);
        assert_eq!(1, alerts.len());
        let alert = &alerts[0];
        assert_eq!(1, alert.burst_count());
        assert_eq!(VoteOutcome::SingleBurstOnly, alert.outcome());
        assert!(alert.confidence() <= confidence_ceiling(1));
        assert!(alert.confidence() < 1.0);
        assert_eq!(HEADER, alert.raw());
    }

    #[test]
    fn test_majority_vote_fixes_corrupt_burst() {
        // burst 2 has one corrupted location digit
        let corrupt = HEADER.replace("039173", "039172");

        let mut asm = Assembler::new();
        asm.accept(candidate(HEADER, 0));
        asm.accept(candidate(&corrupt, 900));
        match asm.accept(candidate(HEADER, 1800)) {
            TransportEvent::Alert(alert) => {
                assert_eq!(HEADER, alert.raw());
                assert_eq!(3, alert.burst_count());
                assert_eq!(VoteOutcome::Majority { dissenting: 1 }, alert.outcome());
                assert!(alert.confidence() < 1.0);
            }
            other => panic!("expected alert, got {:?}", other),
        }
    }

    #[test]
    fn test_interleaved_alerts_stay_separate() {
        let mut asm = Assembler::new();
        asm.accept(candidate(HEADER, 0));
        asm.accept(candidate(OTHER, 400));
        asm.accept(candidate(HEADER, 900));
        asm.accept(candidate(OTHER, 1300));

        let mut alerts = asm.tick(u64::MAX);
        assert_eq!(2, alerts.len());
        alerts.sort_by(|a, b| a.raw().cmp(b.raw()));
        assert_eq!(OTHER, alerts[0].raw());
        assert_eq!(HEADER, alerts[1].raw());
        assert_eq!(2, alerts[0].burst_count());
        assert_eq!(2, alerts[1].burst_count());
    }

    #[test]
    fn test_eom_reports_immediately() {
        let mut asm = Assembler::new();
        let eom = HeaderCandidate::new(b"NNNN".to_vec(), vec![0.9; 4], 0.9, 0, 32);
        match asm.accept(eom) {
            TransportEvent::EndOfMessage { confidence } => assert_approx_eq!(0.9f32, confidence),
            other => panic!("expected EOM, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_candidates_discarded() {
        let mut asm = Assembler::new();
        assert_eq!(
            TransportEvent::Idle,
            asm.accept(candidate("ZCZC-garbage-here", 0))
        );
        assert_eq!(
            TransportEvent::Idle,
            asm.accept(HeaderCandidate::new(
                vec![b'Z', b'C', 0xab, 0xff, 0x80],
                vec![0.5; 5],
                0.5,
                0,
                0
            ))
        );
        assert!(!asm.is_assembling());
    }

    #[test]
    fn test_duplicate_suppression() {
        let mut asm = Assembler::new();
        asm.accept(candidate(HEADER, 0));
        asm.accept(candidate(HEADER, 900));
        let alert = asm.accept(candidate(HEADER, 1800));
        assert!(matches!(alert, TransportEvent::Alert(_)));

        // a stray fourth burst opens a new group, but its timeout
        // emission is suppressed as a duplicate
        asm.accept(candidate(HEADER, 2700));
        assert!(asm.tick(2700 + 350 + GROUP_TIMEOUT_SYMBOLS).is_empty());

        // much later, the same alert may be reported again
        asm.accept(candidate(HEADER, 100_000));
        let alerts = asm.tick(200_000);
        assert_eq!(1, alerts.len());
    }

    #[test]
    fn test_flush() {
        let mut asm = Assembler::new();
        asm.accept(candidate(HEADER, 0));
        let alerts = asm.flush();
        assert_eq!(1, alerts.len());
        assert_eq!(1, alerts[0].burst_count());
        assert!(!asm.is_assembling());
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(0, edit_distance(b"ZCZC", b"ZCZC"));
        assert_eq!(1, edit_distance(b"ZCZC", b"ZCZE"));
        assert_eq!(4, edit_distance(b"", b"ZCZC"));
        assert_eq!(3, edit_distance(b"kitten", b"sitting"));
    }

    #[test]
    fn test_similar_but_not_equal_headers_group() {
        // one corrupted digit still joins by edit distance even
        // though the location set differs
        let corrupt = HEADER.replace("039173", "039172");
        let mut asm = Assembler::new();
        asm.accept(candidate(HEADER, 0));
        assert_eq!(
            TransportEvent::Assembling,
            asm.accept(candidate(&corrupt, 900))
        );
        let alerts = asm.tick(u64::MAX);
        assert_eq!(1, alerts.len());
        assert_eq!(2, alerts[0].burst_count());
    }
}
