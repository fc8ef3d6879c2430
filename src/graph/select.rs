use log::debug;

use super::store::{insert_runner_up, ContainmentCandidate, EdgeCandidate, Storage};
use crate::overlap::OverlapRecord;
use crate::read::ReadEnd;
use crate::score::{Rejection, Score, Scorer};

/// Counts from one pass over an overlap stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub dovetails: u64,
    pub containments: u64,
    pub rejected_malformed: u64,
    pub rejected_errors: u64,
    pub rejected_restricted: u64,
    pub rejected_singleton: u64,
}

impl SelectionStats {
    pub fn accepted(&self) -> u64 {
        self.dovetails + self.containments
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_malformed
            + self.rejected_errors
            + self.rejected_restricted
            + self.rejected_singleton
    }

    fn reject(&mut self, why: Rejection) {
        match why {
            Rejection::Malformed => self.rejected_malformed += 1,
            Rejection::TooManyErrors => self.rejected_errors += 1,
            Rejection::Restricted => self.rejected_restricted += 1,
            Rejection::SingletonContainer => self.rejected_singleton += 1,
        }
    }
}

/// Streaming top-1 reduction of scored overlaps into a `Storage`.
/// Only a strictly higher score replaces a held best, so the first of
/// several equal candidates wins. A neighbor is held at most once per
/// end, so a mirrored copy of a record changes nothing.
pub(crate) struct Selector<'s> {
    store: &'s mut Storage,
    capacity: usize,
    stats: SelectionStats,
}

impl<'s> Selector<'s> {
    pub(crate) fn new(store: &'s mut Storage, capacity: usize) -> Self {
        Selector {
            store,
            capacity,
            stats: Default::default(),
        }
    }

    pub(crate) fn finish(self) -> SelectionStats {
        self.stats
    }

    /// Score every record and fold the accepted ones in. With
    /// `containments_only`, dovetails are skipped without counting.
    pub(crate) fn consume<I>(&mut self, scorer: &Scorer<'_>, overlaps: I, containments_only: bool)
    where
        I: IntoIterator<Item = OverlapRecord>,
    {
        for olap in overlaps {
            if containments_only && !olap.is_containment() {
                continue;
            }
            match scorer.score(&olap) {
                Ok(score) if olap.is_containment() => self.score_containment(&olap, score),
                Ok(score) => self.score_edge(&olap, score),
                Err(why) => self.stats.reject(why),
            }
        }
    }

    fn score_containment(&mut self, olap: &OverlapRecord, score: Score) {
        let (container, containee) = match (olap.container(), olap.containee()) {
            (Some(container), Some(containee)) => (container, containee),
            _ => return,
        };
        self.stats.containments += 1;

        if let Some((best, scores)) = self.store.slot_mut(containee) {
            if score > scores.best_c {
                best.best_c = ContainmentCandidate {
                    score,
                    container,
                    is_contained: true,
                };
                scores.best_c = score;
            }
        }
    }

    fn score_edge(&mut self, olap: &OverlapRecord, score: Score) {
        self.stats.dovetails += 1;
        self.offer(olap.a, EdgeCandidate::new(score, olap.b));
        self.offer(olap.b, EdgeCandidate::new(score, olap.a));
    }

    fn offer(&mut self, end: ReadEnd, cand: EdgeCandidate) {
        let capacity = self.capacity;
        let (best, scores) = match self.store.slot_mut(end.read) {
            Some(slot) => slot,
            None => return,
        };

        let current = *best.edge(end.end);
        if !current.is_none() && current.neighbor == cand.neighbor {
            // the same overlap again, typically its mirrored record
            if cand.score > current.score {
                *best.edge_mut(end.end) = cand;
                *scores.score_mut(end.end) = cand.score;
            }
            return;
        }

        if cand.score > scores.score(end.end) {
            let displaced = current;
            scores.runner_ups_mut(end.end).retain(|c| c.neighbor != cand.neighbor);
            if !displaced.is_none() {
                // outranks, or arrived before, every held runner-up
                let ups = scores.runner_ups_mut(end.end);
                ups.insert(0, displaced);
                ups.truncate(capacity);
            }
            debug!("{} best edge now {} (score {})", end, cand.neighbor, cand.score);
            *best.edge_mut(end.end) = cand;
            *scores.score_mut(end.end) = cand.score;
        } else {
            insert_runner_up(scores.runner_ups_mut(end.end), cand, capacity);
        }
    }
}
