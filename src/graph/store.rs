use std::collections::BTreeSet;

use fnv::FnvHashMap;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::read::{End, ReadEnd, ReadId};
use crate::score::Score;

/// Runner-ups kept per read end when no larger top-N is configured.
pub const DEFAULT_RUNNER_UPS: usize = 4;

/// A scored dovetail edge out of a read end. The default value, with
/// a sentinel neighbor and a zero score, means "no edge".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct EdgeCandidate {
    pub score: Score,
    pub neighbor: ReadEnd,
}

impl EdgeCandidate {
    #[inline]
    pub fn new(score: Score, neighbor: ReadEnd) -> Self {
        EdgeCandidate { score, neighbor }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.neighbor.is_none()
    }
}

/// The best container of a read, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ContainmentCandidate {
    pub score: Score,
    pub container: ReadId,
    pub is_contained: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BestOverlaps {
    pub best5: EdgeCandidate,
    pub best3: EdgeCandidate,
    pub best_c: ContainmentCandidate,
}

impl BestOverlaps {
    #[inline]
    pub fn edge(&self, end: End) -> &EdgeCandidate {
        match end {
            End::FivePrime => &self.best5,
            End::ThreePrime => &self.best3,
        }
    }

    #[inline]
    pub fn edge_mut(&mut self, end: End) -> &mut EdgeCandidate {
        match end {
            End::FivePrime => &mut self.best5,
            End::ThreePrime => &mut self.best3,
        }
    }
}

/// Score bookkeeping kept beside `BestOverlaps`: the score to beat on
/// each end and for containment, and the ranked runner-up edges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BestScores {
    pub best5: Score,
    pub best3: Score,
    pub best_c: Score,
    pub runner_ups5: Vec<EdgeCandidate>,
    pub runner_ups3: Vec<EdgeCandidate>,
}

impl BestScores {
    #[inline]
    pub fn score(&self, end: End) -> Score {
        match end {
            End::FivePrime => self.best5,
            End::ThreePrime => self.best3,
        }
    }

    #[inline]
    pub fn score_mut(&mut self, end: End) -> &mut Score {
        match end {
            End::FivePrime => &mut self.best5,
            End::ThreePrime => &mut self.best3,
        }
    }

    #[inline]
    pub fn runner_ups(&self, end: End) -> &[EdgeCandidate] {
        match end {
            End::FivePrime => &self.runner_ups5,
            End::ThreePrime => &self.runner_ups3,
        }
    }

    #[inline]
    pub fn runner_ups_mut(&mut self, end: End) -> &mut Vec<EdgeCandidate> {
        match end {
            End::FivePrime => &mut self.runner_ups5,
            End::ThreePrime => &mut self.runner_ups3,
        }
    }
}

/// Insert `cand` into a score-descending list, after any candidates
/// with an equal score, keeping at most `capacity` entries. A neighbor
/// appears at most once, with the higher of its scores.
pub(crate) fn insert_runner_up(
    list: &mut Vec<EdgeCandidate>,
    cand: EdgeCandidate,
    capacity: usize,
) {
    if let Some(held) = list.iter().position(|c| c.neighbor == cand.neighbor) {
        if list[held].score >= cand.score {
            return;
        }
        list.remove(held);
    }
    let pos = list
        .iter()
        .position(|c| c.score < cand.score)
        .unwrap_or_else(|| list.len());
    if pos < capacity {
        list.insert(pos, cand);
        list.truncate(capacity);
    }
}

/// Per-read state, either as dense arrays over the whole population
/// or as maps over a restricted subset. Chosen once at construction.
#[derive(Debug, Clone)]
pub(crate) enum Storage {
    Dense {
        best: Vec<BestOverlaps>,
        scores: Vec<BestScores>,
    },
    Restricted {
        members: BTreeSet<ReadId>,
        best: FnvHashMap<ReadId, BestOverlaps>,
        scores: FnvHashMap<ReadId, BestScores>,
    },
}

impl Storage {
    /// Index 0 is allocated but never handed out.
    pub(crate) fn dense(num_reads: u32) -> Self {
        let len = num_reads as usize + 1;
        Storage::Dense {
            best: vec![BestOverlaps::default(); len],
            scores: vec![BestScores::default(); len],
        }
    }

    /// Entries are created lazily on first update.
    pub(crate) fn restricted(members: BTreeSet<ReadId>) -> Self {
        Storage::Restricted {
            members,
            best: FnvHashMap::default(),
            scores: FnvHashMap::default(),
        }
    }

    pub(crate) fn is_restricted(&self) -> bool {
        matches!(self, Storage::Restricted { .. })
    }

    pub(crate) fn contains(&self, id: ReadId) -> bool {
        match self {
            Storage::Dense { best, .. } => !id.is_none() && id.index() < best.len(),
            Storage::Restricted { members, .. } => members.contains(&id),
        }
    }

    /// The active population in ascending order.
    pub(crate) fn read_ids(&self) -> Vec<ReadId> {
        match self {
            Storage::Dense { best, .. } => {
                (1..best.len() as u32).map(ReadId).collect()
            }
            Storage::Restricted { members, .. } => members.iter().copied().collect(),
        }
    }

    pub(crate) fn best(&self, id: ReadId) -> Option<&BestOverlaps> {
        if id.is_none() {
            return None;
        }
        match self {
            Storage::Dense { best, .. } => best.get(id.index()),
            Storage::Restricted { best, .. } => best.get(&id),
        }
    }

    pub(crate) fn scores(&self, id: ReadId) -> Option<&BestScores> {
        if id.is_none() {
            return None;
        }
        match self {
            Storage::Dense { scores, .. } => scores.get(id.index()),
            Storage::Restricted { scores, .. } => scores.get(&id),
        }
    }

    /// Mutable access to both halves of a read's state. `None` for the
    /// sentinel and for reads outside the active population.
    pub(crate) fn slot_mut(
        &mut self,
        id: ReadId,
    ) -> Option<(&mut BestOverlaps, &mut BestScores)> {
        if id.is_none() {
            return None;
        }
        match self {
            Storage::Dense { best, scores } => {
                let b = best.get_mut(id.index())?;
                let s = scores.get_mut(id.index())?;
                Some((b, s))
            }
            Storage::Restricted {
                members,
                best,
                scores,
            } => {
                if !members.contains(&id) {
                    return None;
                }
                let b = best.entry(id).or_default();
                let s = scores.entry(id).or_default();
                Some((b, s))
            }
        }
    }

    /// Replace the best edge out of `end` and keep its shadow score in
    /// step.
    pub(crate) fn set_edge(&mut self, end: ReadEnd, edge: EdgeCandidate) {
        if let Some((best, scores)) = self.slot_mut(end.read) {
            *best.edge_mut(end.end) = edge;
            *scores.score_mut(end.end) = edge.score;
        }
    }

    pub(crate) fn clear_edge(&mut self, end: ReadEnd) {
        self.set_edge(end, EdgeCandidate::default());
    }

    pub(crate) fn set_containment(&mut self, read: ReadId, cont: ContainmentCandidate) {
        if let Some((best, scores)) = self.slot_mut(read) {
            best.best_c = cont;
            scores.best_c = cont.score;
        }
    }

    /// Make the runner-up at `index` the best edge of `end`. The old
    /// best is dropped.
    pub(crate) fn promote_runner_up(&mut self, end: ReadEnd, index: usize) -> Option<EdgeCandidate> {
        let (best, scores) = self.slot_mut(end.read)?;
        let ups = scores.runner_ups_mut(end.end);
        if index >= ups.len() {
            return None;
        }
        let cand = ups.remove(index);
        *best.edge_mut(end.end) = cand;
        *scores.score_mut(end.end) = cand.score;
        Some(cand)
    }

    pub(crate) fn for_each_scores_mut<F>(&mut self, f: F)
    where
        F: FnMut(&mut BestScores),
    {
        match self {
            Storage::Dense { scores, .. } => scores.iter_mut().for_each(f),
            Storage::Restricted { scores, .. } => scores.values_mut().for_each(f),
        }
    }

    /// Forget every containment, leaving edges alone.
    pub(crate) fn reset_containments(&mut self) {
        match self {
            Storage::Dense { best, scores } => {
                best.iter_mut().for_each(|b| b.best_c = Default::default());
                scores.iter_mut().for_each(|s| s.best_c = Score::ZERO);
            }
            Storage::Restricted { best, scores, .. } => {
                best.values_mut().for_each(|b| b.best_c = Default::default());
                scores.values_mut().for_each(|s| s.best_c = Score::ZERO);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(score: u64, read: u32) -> EdgeCandidate {
        EdgeCandidate::new(Score::from(score), ReadEnd::five_prime(read))
    }

    #[test]
    fn runner_up_ordering() {
        let mut list = Vec::new();
        insert_runner_up(&mut list, cand(10, 1), 3);
        insert_runner_up(&mut list, cand(30, 2), 3);
        insert_runner_up(&mut list, cand(10, 3), 3);
        insert_runner_up(&mut list, cand(20, 4), 3);

        let reads: Vec<u32> = list.iter().map(|c| c.neighbor.read.0).collect();
        // equal scores keep arrival order; the list is capped
        assert_eq!(vec![2, 4, 1], reads);

        insert_runner_up(&mut list, cand(5, 5), 3);
        assert_eq!(3, list.len());
        assert!(list.iter().all(|c| c.neighbor.read != ReadId(5)));
    }

    #[test]
    fn runner_ups_hold_a_neighbor_once() {
        let mut list = Vec::new();
        insert_runner_up(&mut list, cand(20, 1), 4);
        insert_runner_up(&mut list, cand(10, 2), 4);
        insert_runner_up(&mut list, cand(20, 1), 4);
        insert_runner_up(&mut list, cand(5, 2), 4);
        assert_eq!(vec![cand(20, 1), cand(10, 2)], list);

        // a better score for a held neighbor moves it up
        insert_runner_up(&mut list, cand(30, 2), 4);
        assert_eq!(vec![cand(30, 2), cand(20, 1)], list);
    }

    #[test]
    fn dense_storage() {
        let mut store = Storage::dense(3);
        assert!(!store.is_restricted());
        assert_eq!(vec![ReadId(1), ReadId(2), ReadId(3)], store.read_ids());
        assert!(store.contains(ReadId(3)));
        assert!(!store.contains(ReadId(0)));
        assert!(!store.contains(ReadId(4)));
        assert!(store.slot_mut(ReadId(0)).is_none());

        let edge = cand(42, 2);
        store.set_edge(ReadEnd::three_prime(1), edge);
        assert_eq!(&edge, store.best(ReadId(1)).unwrap().edge(End::ThreePrime));
        assert_eq!(
            Score::from(42),
            store.scores(ReadId(1)).unwrap().score(End::ThreePrime)
        );

        store.clear_edge(ReadEnd::three_prime(1));
        assert!(store.best(ReadId(1)).unwrap().best3.is_none());
        assert!(store.scores(ReadId(1)).unwrap().best3.is_zero());
    }

    #[test]
    fn restricted_storage_is_lazy() {
        let members: BTreeSet<ReadId> = vec![ReadId(2), ReadId(5)].into_iter().collect();
        let mut store = Storage::restricted(members);
        assert!(store.is_restricted());
        assert_eq!(vec![ReadId(2), ReadId(5)], store.read_ids());
        assert!(store.best(ReadId(2)).is_none());
        assert!(store.slot_mut(ReadId(3)).is_none());

        store.set_containment(
            ReadId(5),
            ContainmentCandidate {
                score: Score::from(7),
                container: ReadId(2),
                is_contained: true,
            },
        );
        assert!(store.best(ReadId(5)).unwrap().best_c.is_contained);
        assert_eq!(Score::from(7), store.scores(ReadId(5)).unwrap().best_c);

        store.reset_containments();
        assert!(!store.best(ReadId(5)).unwrap().best_c.is_contained);
        assert!(store.scores(ReadId(5)).unwrap().best_c.is_zero());
    }

    #[test]
    fn promoting_a_runner_up() {
        let mut store = Storage::dense(4);
        let end = ReadEnd::three_prime(1);
        store.set_edge(end, cand(30, 2));
        if let Some((_, scores)) = store.slot_mut(ReadId(1)) {
            scores.runner_ups3 = vec![cand(20, 3), cand(10, 4)];
        }

        assert_eq!(Some(cand(10, 4)), store.promote_runner_up(end, 1));
        assert_eq!(&cand(10, 4), store.best(ReadId(1)).unwrap().edge(End::ThreePrime));
        assert_eq!(Score::from(10), store.scores(ReadId(1)).unwrap().best3);
        assert_eq!(vec![cand(20, 3)], store.scores(ReadId(1)).unwrap().runner_ups3);
        assert_eq!(None, store.promote_runner_up(end, 5));
    }
}
