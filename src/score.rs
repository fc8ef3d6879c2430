use std::collections::BTreeSet;

use fnv::FnvHashSet;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::overlap::OverlapRecord;
use crate::read::ReadId;

const ERATE_BITS: u32 = 16;
const ERATE_MASK: u64 = (1 << ERATE_BITS) - 1;
const ERATE_SCALE: f64 = 10_000.0;

/// Quality of an overlap. The aligned length sits in the high bits
/// and the inverted, encoded error rate in the low 16 bits, so longer
/// overlaps always win and equal lengths are ordered by error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Score(u64);

impl Score {
    /// The lowest score; no accepted overlap scores this.
    pub const ZERO: Score = Score(0);

    pub fn new(length: u32, erate: f64) -> Self {
        let encoded = (erate.max(0.0) * ERATE_SCALE).round();
        let encoded = if encoded >= ERATE_MASK as f64 {
            ERATE_MASK
        } else {
            encoded as u64
        };
        Score(((length as u64) << ERATE_BITS) | (ERATE_MASK - encoded))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn overlap_length(&self) -> u32 {
        (self.0 >> ERATE_BITS) as u32
    }

    /// Error rate as encoded, at a resolution of 0.01%.
    #[inline]
    pub fn erate(&self) -> f64 {
        (ERATE_MASK - (self.0 & ERATE_MASK)) as f64 / ERATE_SCALE
    }

    /// Length plus a fractional quality term in `[0, 1)`. Orders
    /// exactly like the packed value; weak-edge thresholds are
    /// compared against this.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.overlap_length() as f64
            + (self.0 & ERATE_MASK) as f64 / (ERATE_MASK + 1) as f64
    }
}

impl From<u64> for Score {
    #[inline]
    fn from(raw: u64) -> Self {
        Score(raw)
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why an overlap was left out. These are expected outcomes, counted
/// but never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Unknown read id, self overlap or empty alignment
    Malformed,
    /// Over the error rate cutoff or the mismatch ceiling
    TooManyErrors,
    /// Not both reads are in the restriction set
    Restricted,
    /// The container is the only read of its unitig
    SingletonContainer,
}

/// Maps overlaps to scores under a fixed set of thresholds.
#[derive(Debug, Clone)]
pub struct Scorer<'a> {
    num_reads: u32,
    erate: f64,
    elimit: f64,
    restrict: Option<&'a BTreeSet<ReadId>>,
    excluded_containers: Option<&'a FnvHashSet<ReadId>>,
}

impl<'a> Scorer<'a> {
    pub fn new(num_reads: u32, erate: f64, elimit: f64) -> Self {
        Scorer {
            num_reads,
            erate,
            elimit,
            restrict: None,
            excluded_containers: None,
        }
    }

    pub fn with_restriction(mut self, restrict: Option<&'a BTreeSet<ReadId>>) -> Self {
        self.restrict = restrict;
        self
    }

    /// Containments into any of these reads are rejected.
    pub fn excluding_containers(mut self, excluded: &'a FnvHashSet<ReadId>) -> Self {
        self.excluded_containers = Some(excluded);
        self
    }

    pub fn score(&self, olap: &OverlapRecord) -> Result<Score, Rejection> {
        if self.is_malformed(olap) {
            return Err(Rejection::Malformed);
        }
        if self.is_overlap_bad_quality(olap) {
            return Err(Rejection::TooManyErrors);
        }
        if self.is_overlap_restricted(olap) {
            return Err(Rejection::Restricted);
        }
        if let (Some(excluded), Some(container)) =
            (self.excluded_containers, olap.container())
        {
            if excluded.contains(&container) {
                return Err(Rejection::SingletonContainer);
            }
        }
        Ok(Score::new(olap.length, olap.erate))
    }

    fn is_malformed(&self, olap: &OverlapRecord) -> bool {
        let known = |r: ReadId| !r.is_none() && r.0 <= self.num_reads;
        !known(olap.a.read)
            || !known(olap.b.read)
            || olap.a.read == olap.b.read
            || olap.length == 0
    }

    /// Accepted only when both the error rate and the implied
    /// mismatch count are within bounds. NaN fails both.
    fn is_overlap_bad_quality(&self, olap: &OverlapRecord) -> bool {
        let within = olap.erate <= self.erate && olap.mismatches() <= self.elimit;
        !within
    }

    fn is_overlap_restricted(&self, olap: &OverlapRecord) -> bool {
        match self.restrict {
            None => false,
            Some(set) => !(set.contains(&olap.a.read) && set.contains(&olap.b.read)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::ReadEnd;

    fn dovetail(a: u32, b: u32, length: u32, erate: f64) -> OverlapRecord {
        OverlapRecord::dovetail(
            ReadEnd::three_prime(a),
            ReadEnd::five_prime(b),
            length,
            erate,
        )
    }

    #[test]
    fn longer_and_cleaner_wins() {
        let long = Score::new(101, 0.05);
        let short = Score::new(100, 0.0);
        let noisy = Score::new(100, 0.02);
        assert!(long > short);
        assert!(short > noisy);
        assert_eq!(Score::new(100, 0.02), noisy);

        assert_eq!(100, noisy.overlap_length());
        assert!((noisy.erate() - 0.02).abs() < 1e-9);
        assert!(Score::new(1, 0.0) > Score::ZERO);
    }

    #[test]
    fn float_view_orders_like_packed() {
        let a = Score::new(100, 0.0);
        let b = Score::new(100, 1.0);
        let c = Score::new(99, 0.0);
        assert!(a.as_f64() > b.as_f64());
        assert!(b.as_f64() >= 100.0);
        assert!(c.as_f64() < 100.0);
    }

    #[test]
    fn huge_error_rates_saturate() {
        let s = Score::new(10, 100.0);
        assert_eq!(10, s.overlap_length());
        assert_eq!(10 << 16, s.get());
    }

    #[test]
    fn rate_cutoff() {
        let scorer = Scorer::new(3, 0.02, f64::INFINITY);
        assert!(scorer.score(&dovetail(1, 2, 100, 0.01)).is_ok());
        assert_eq!(
            Err(Rejection::TooManyErrors),
            scorer.score(&dovetail(1, 3, 100, 0.05))
        );
        assert_eq!(
            Err(Rejection::TooManyErrors),
            scorer.score(&dovetail(1, 3, 100, f64::NAN))
        );
    }

    #[test]
    fn absolute_mismatch_ceiling() {
        let scorer = Scorer::new(3, 0.02, 5.0);
        // 0.01 * 400 = 4 mismatches
        assert!(scorer.score(&dovetail(1, 2, 400, 0.01)).is_ok());
        // 0.01 * 1000 = 10 mismatches, within the rate but over the ceiling
        assert_eq!(
            Err(Rejection::TooManyErrors),
            scorer.score(&dovetail(1, 2, 1000, 0.01))
        );
    }

    #[test]
    fn malformed_records() {
        let scorer = Scorer::new(3, 0.02, f64::INFINITY);
        assert_eq!(
            Err(Rejection::Malformed),
            scorer.score(&dovetail(1, 4, 100, 0.0))
        );
        assert_eq!(
            Err(Rejection::Malformed),
            scorer.score(&dovetail(0, 2, 100, 0.0))
        );
        assert_eq!(
            Err(Rejection::Malformed),
            scorer.score(&dovetail(2, 2, 100, 0.0))
        );
        assert_eq!(
            Err(Rejection::Malformed),
            scorer.score(&dovetail(1, 2, 0, 0.0))
        );
    }

    #[test]
    fn restriction_needs_both_reads() {
        let restrict: BTreeSet<ReadId> =
            vec![ReadId(1), ReadId(2)].into_iter().collect();
        let scorer =
            Scorer::new(3, 0.02, f64::INFINITY).with_restriction(Some(&restrict));
        assert!(scorer.score(&dovetail(1, 2, 100, 0.0)).is_ok());
        assert_eq!(
            Err(Rejection::Restricted),
            scorer.score(&dovetail(1, 3, 100, 0.0))
        );
    }

    #[test]
    fn excluded_containers() {
        let excluded: FnvHashSet<ReadId> = vec![ReadId(2)].into_iter().collect();
        let scorer =
            Scorer::new(3, 0.02, f64::INFINITY).excluding_containers(&excluded);
        assert_eq!(
            Err(Rejection::SingletonContainer),
            scorer.score(&OverlapRecord::containment(2, 1, 50, 0.0))
        );
        assert!(scorer
            .score(&OverlapRecord::containment(3, 1, 50, 0.0))
            .is_ok());
        // dovetails touching an excluded read are unaffected
        assert!(scorer.score(&dovetail(2, 3, 50, 0.0)).is_ok());
    }
}
