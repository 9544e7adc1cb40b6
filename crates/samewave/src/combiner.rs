//! Burst consensus voting
//!
//! SAME headers are transmitted three times for redundancy. The
//! [`vote()`] function reconciles up to three received bursts into a
//! single byte-string estimate, one character at a time:
//!
//! - positions where every available burst agrees pass through;
//! - three-way disagreements resolve by simple majority;
//! - two-way disagreements resolve by the higher per-byte
//!   confidence.
//!
//! The outcome is summarized as a [`VoteOutcome`], and confidence
//! scoring downstream is a pure function of that summary—there are
//! no hidden booleans to consult.

use crate::waveform::is_allowed_byte;

/// How the consensus was reached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteOutcome {
    /// Every available burst agreed at every voted position
    Unanimous,

    /// At least one position was disputed and resolved
    ///
    /// `dissenting` is the index of the burst that lost the most
    /// votes.
    Majority {
        /// Index of the most-outvoted burst
        dissenting: usize,
    },

    /// Only one burst was available; nothing to vote against
    SingleBurstOnly,
}

/// The reconciled byte string and its vote statistics
#[derive(Clone, Debug, PartialEq)]
pub struct VoteResult {
    /// Winning bytes
    pub bytes: Vec<u8>,

    /// Confidence of each winning byte
    ///
    /// The mean of the agreeing bursts' confidences at that
    /// position.
    pub byte_confidence: Vec<f32>,

    /// How the consensus was reached
    pub outcome: VoteOutcome,

    /// Fraction of voted positions where all available bursts agreed
    pub agreement_ratio: f32,
}

impl VoteResult {
    /// Mean confidence over the winning bytes
    pub fn mean_confidence(&self) -> f32 {
        if self.byte_confidence.is_empty() {
            return 0.0;
        }
        self.byte_confidence.iter().sum::<f32>() / self.byte_confidence.len() as f32
    }
}

/// One burst's contribution to the vote
pub type BurstData<'a> = (&'a [u8], &'a [f32]);

/// Reconcile up to three bursts into one byte string
///
/// `bursts` holds one entry per received burst: its bytes and its
/// per-byte confidences (which must be the same length). Extra
/// bursts beyond three are ignored. Voting halts at the first
/// position where fewer than two bursts still have data (when more
/// than one burst is available) or where the winning byte is not a
/// SAME character.
pub fn vote(bursts: &[BurstData<'_>]) -> VoteResult {
    let bursts = &bursts[..bursts.len().min(3)];
    let mut out = VoteResult {
        bytes: Vec::new(),
        byte_confidence: Vec::new(),
        outcome: VoteOutcome::SingleBurstOnly,
        agreement_ratio: 1.0,
    };
    if bursts.is_empty() {
        return out;
    }

    // positions each burst lost; indexes into `bursts`
    let mut dissents = [0usize; 3];
    let mut agreed = 0usize;
    let mut voted = 0usize;

    // the vote needs a quorum: two bursts when we have several, or
    // the single burst we received
    let quorum = usize::min(2, bursts.len());

    for pos in 0.. {
        let mut avail: Vec<(usize, u8, f32)> = Vec::with_capacity(3);
        for (index, (bytes, confs)) in bursts.iter().enumerate() {
            if let (Some(&b), Some(&c)) = (bytes.get(pos), confs.get(pos)) {
                avail.push((index, b, c));
            }
        }
        if avail.len() < quorum {
            break;
        }

        let (winner, winner_conf, losers) = vote_position(&avail);
        if !is_allowed_byte(winner) {
            break;
        }

        voted += 1;
        if losers.is_empty() {
            agreed += 1;
        }
        for l in losers {
            dissents[l] += 1;
        }

        out.bytes.push(winner);
        out.byte_confidence.push(winner_conf);
    }

    out.agreement_ratio = if voted > 0 {
        agreed as f32 / voted as f32
    } else {
        0.0
    };
    out.outcome = if bursts.len() < 2 {
        VoteOutcome::SingleBurstOnly
    } else if agreed == voted {
        VoteOutcome::Unanimous
    } else {
        let dissenting = (0..bursts.len())
            .max_by_key(|&i| dissents[i])
            .expect("at least two bursts");
        VoteOutcome::Majority { dissenting }
    };
    out
}

// Vote one position
//
// `avail` holds (burst index, byte, confidence) for every burst
// that reached this position. Returns the winning byte, its
// confidence, and the burst indexes that lost.
fn vote_position(avail: &[(usize, u8, f32)]) -> (u8, f32, Vec<usize>) {
    debug_assert!(!avail.is_empty());

    // group the candidates by byte value
    let mut groups: Vec<(u8, Vec<(usize, f32)>)> = Vec::with_capacity(3);
    for &(index, byte, conf) in avail {
        match groups.iter_mut().find(|(b, _)| *b == byte) {
            Some((_, members)) => members.push((index, conf)),
            None => groups.push((byte, vec![(index, conf)])),
        }
    }

    // majority first; per-byte confidence breaks ties (which also
    // covers the two-burst disagreement case). A full tie keeps the
    // earliest burst's byte.
    let mut best = &groups[0];
    for group in &groups[1..] {
        if (group.1.len(), group_confidence(&group.1))
            > (best.1.len(), group_confidence(&best.1))
        {
            best = group;
        }
    }

    let losers = avail
        .iter()
        .filter(|(_, byte, _)| *byte != best.0)
        .map(|(index, _, _)| *index)
        .collect();

    (best.0, group_confidence(&best.1), losers)
}

// Mean confidence of one byte-value group
fn group_confidence(members: &[(usize, f32)]) -> f32 {
    members.iter().map(|(_, c)| *c).sum::<f32>() / members.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    const HEADER: &[u8] = b"ZCZC-EAS-DMO-999000+0015-0011122-NOCALL00-";

    fn full_conf(bytes: &[u8]) -> Vec<f32> {
        vec![1.0; bytes.len()]
    }

    #[test]
    fn test_unanimous() {
        let conf = full_conf(HEADER);
        let result = vote(&[(HEADER, &conf), (HEADER, &conf), (HEADER, &conf)]);

        assert_eq!(HEADER, result.bytes.as_slice());
        assert_eq!(VoteOutcome::Unanimous, result.outcome);
        assert_approx_eq!(1.0f32, result.agreement_ratio);
        assert_approx_eq!(1.0f32, result.mean_confidence());
    }

    #[test]
    fn test_majority_corrects_corrupt_byte() {
        // burst #1 has one corrupted byte; bursts #0 and #2 outvote it
        let mut corrupt = HEADER.to_vec();
        corrupt[6] = b'X';

        let conf = full_conf(HEADER);
        let cconf = full_conf(&corrupt);
        let result = vote(&[(HEADER, &conf), (&corrupt, &cconf), (HEADER, &conf)]);

        assert_eq!(HEADER, result.bytes.as_slice());
        assert_eq!(VoteOutcome::Majority { dissenting: 1 }, result.outcome);
        assert!(result.agreement_ratio < 1.0);
        assert_approx_eq!(
            (HEADER.len() - 1) as f32 / HEADER.len() as f32,
            result.agreement_ratio
        );
    }

    #[test]
    fn test_two_bursts_resolve_by_confidence() {
        let mut corrupt = HEADER.to_vec();
        corrupt[6] = b'X';

        // the corrupted burst is less sure of the disputed byte
        let good_conf = full_conf(HEADER);
        let mut bad_conf = full_conf(&corrupt);
        bad_conf[6] = 0.40;

        let result = vote(&[(&corrupt, &bad_conf), (HEADER, &good_conf)]);
        assert_eq!(HEADER, result.bytes.as_slice());
        assert_eq!(VoteOutcome::Majority { dissenting: 0 }, result.outcome);

        // and the other way around
        let result = vote(&[(HEADER, &good_conf), (&corrupt, &bad_conf)]);
        assert_eq!(HEADER, result.bytes.as_slice());
        assert_eq!(VoteOutcome::Majority { dissenting: 1 }, result.outcome);
    }

    #[test]
    fn test_single_burst_passthrough() {
        let conf = full_conf(HEADER);
        let result = vote(&[(HEADER, &conf)]);

        assert_eq!(HEADER, result.bytes.as_slice());
        assert_eq!(VoteOutcome::SingleBurstOnly, result.outcome);
        assert_approx_eq!(1.0f32, result.agreement_ratio);
    }

    #[test]
    fn test_three_way_split_takes_highest_confidence() {
        let result = vote(&[
            (b"A", [0.5f32].as_slice()),
            (b"B", [0.9f32].as_slice()),
            (b"C", [0.2f32].as_slice()),
        ]);
        assert_eq!(b"B", result.bytes.as_slice());
        assert_approx_eq!(0.0f32, result.agreement_ratio);
    }

    #[test]
    fn test_short_burst_truncates_vote() {
        // the vote stops where the quorum of two runs out
        let conf_full = full_conf(HEADER);
        let short = &HEADER[0..16];
        let conf_short = full_conf(short);

        let result = vote(&[(HEADER, &conf_full), (short, &conf_short)]);
        assert_eq!(&HEADER[0..16], result.bytes.as_slice());
        assert_eq!(VoteOutcome::Unanimous, result.outcome);
    }

    #[test]
    fn test_invalid_winner_halts() {
        const NOISY: &[u8] = b"ZCZC\x01garbage";
        let conf = full_conf(NOISY);
        let result = vote(&[(NOISY, &conf)]);
        assert_eq!(b"ZCZC", result.bytes.as_slice());
    }

    #[test]
    fn test_empty() {
        let result = vote(&[]);
        assert!(result.bytes.is_empty());
        assert_eq!(VoteOutcome::SingleBurstOnly, result.outcome);
    }
}
