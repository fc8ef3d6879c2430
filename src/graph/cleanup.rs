//! Heuristic passes run over the graph after construction, in this
//! order: suspicious reads, top-N, spurs, false best edges, weak edges.
//! Each pass decides against the graph as it stood when the pass
//! began and applies its changes afterwards, so visiting order plays
//! no part. Renumbering the reads yields the same graph, renumbered,
//! except where `remove_false_best` must break an exact score tie:
//! between ends claiming the same weaker end, and between the
//! strongest offers of a cycle of retarget offers. The lower read end
//! wins both.
//!
//! The passes see only the graph, so they inherit construction's
//! first-seen rule for equal scores. An overlap given as one record or
//! as two mirrored records builds the same graph.

use std::cmp::Reverse;

use fnv::{FnvHashMap, FnvHashSet};
use log::{debug, info};

use super::store::EdgeCandidate;
use super::BestOverlapGraph;
use crate::read::{End, ReadEnd, ReadId};

/// Longest chain of reads still treated as a spur.
pub const MAX_SPUR_READS: usize = 3;

/// An edge nobody wants back is suspicious below this fraction of the
/// length its target would otherwise settle for.
const SUSPICIOUS_FRACTION: f64 = 0.5;

/// What the cleanup passes changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub suspicious: usize,
    pub top_n_replaced: usize,
    pub top_n_cleared: usize,
    pub spurs: usize,
    pub spur_edges_demoted: usize,
    pub spur_edges_cleared: usize,
    pub false_best_promoted: usize,
    pub false_best_retargeted: usize,
    pub false_best_cleared: usize,
    pub weak_cleared: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fix {
    Keep,
    Retarget(usize),
    Clear,
}

impl BestOverlapGraph {
    pub(crate) fn run_cleanup(&mut self) {
        if self.config.remove_suspicious {
            self.remove_suspicious();
        }
        if let Some(n) = self.config.top_n {
            self.examine_only_top_n(n);
        }
        if self.config.remove_spurs {
            self.remove_spurs();
        }
        if self.config.remove_false_best {
            self.remove_false_best();
        }
        if let Some(threshold) = self.config.remove_weak_threshold {
            self.remove_weak(threshold);
        }
    }

    /// Flag reads whose best edges look unreliable. Edges are left as
    /// they are.
    pub(crate) fn remove_suspicious(&mut self) {
        let flagged: Vec<ReadId> = self
            .store
            .read_ids()
            .into_iter()
            .filter(|&id| {
                let b5 = self.best_edge_overlap(id, End::FivePrime);
                let b3 = self.best_edge_overlap(id, End::ThreePrime);
                let same_neighbor = !b5.is_none() && b5.neighbor.read == b3.neighbor.read;
                same_neighbor
                    || End::BOTH
                        .iter()
                        .any(|&end| self.is_outlier_edge(ReadEnd::new(id, end)))
            })
            .collect();

        for id in flagged {
            if self.suspicious.insert(id) {
                debug!("read {} flagged suspicious", id);
                self.cleanup.suspicious += 1;
            }
        }

        info!("removeSuspicious: {} reads flagged", self.cleanup.suspicious);
        self.check_consistency();
    }

    /// The edge out of `from` is unrequited and far shorter than what
    /// its target has on offer from its second choice.
    fn is_outlier_edge(&self, from: ReadEnd) -> bool {
        let edge = self.edge_of(from);
        if edge.is_none() {
            return false;
        }
        let back = self.target_edge(from, &edge);
        if back.neighbor == from {
            return false;
        }
        let target = edge.neighbor;
        let reference = self
            .runner_ups(target.read, target.end)
            .first()
            .map(|c| c.score)
            .unwrap_or(back.score);

        (edge.score.overlap_length() as f64)
            < SUSPICIOUS_FRACTION * reference.overlap_length() as f64
    }

    /// Keep only the `n` best candidates per end, and only best edges
    /// that their target ranks within its own top `n`.
    pub(crate) fn examine_only_top_n(&mut self, n: usize) {
        let keep = n.saturating_sub(1);

        let mut fixes = Vec::new();
        for from in self.ends() {
            let edge = self.edge_of(from);
            if edge.is_none() || self.rank_at_target(from, &edge) < n {
                continue;
            }
            let pick = self
                .runner_ups(from.read, from.end)
                .iter()
                .take(keep)
                .position(|c| self.rank_at_target(from, c) < n);
            fixes.push((from, pick));
        }

        self.store.for_each_scores_mut(|s| {
            s.runner_ups5.truncate(keep);
            s.runner_ups3.truncate(keep);
        });

        for (from, pick) in fixes {
            match pick.and_then(|i| self.store.promote_runner_up(from, i)) {
                Some(cand) => {
                    debug!("top-{}: {} now points to {}", n, from, cand.neighbor);
                    self.cleanup.top_n_replaced += 1;
                }
                None => {
                    debug!("top-{}: {} cleared", n, from);
                    self.store.clear_edge(from);
                    self.cleanup.top_n_cleared += 1;
                }
            }
        }

        info!(
            "examineOnlyTopN({}): {} edges replaced, {} cleared",
            n, self.cleanup.top_n_replaced, self.cleanup.top_n_cleared
        );
        self.check_consistency();
    }

    /// 0 when the target's best edge points back at `from`, `i + 1`
    /// when `from` is its i-th runner-up, `usize::MAX` when the target
    /// no longer holds it at all.
    fn rank_at_target(&self, from: ReadEnd, cand: &EdgeCandidate) -> usize {
        if self.target_edge(from, cand).neighbor == from {
            return 0;
        }
        let target = cand.neighbor;
        self.runner_ups(target.read, target.end)
            .iter()
            .position(|c| c.neighbor == from)
            .map(|i| i + 1)
            .unwrap_or(usize::MAX)
    }

    /// Detach short dead-end chains that hang off another path, and
    /// steer edges that lead into them elsewhere.
    pub(crate) fn remove_spurs(&mut self) {
        let mut spur_reads: FnvHashSet<ReadId> = FnvHashSet::default();
        let mut attachments = Vec::new();

        for id in self.store.read_ids() {
            if let Some((chain, attach)) = self.find_spur(id) {
                debug!("spur of {} reads from read {} attaches at {}", chain.len(), id, attach);
                spur_reads.extend(chain);
                attachments.push(attach);
            }
        }

        let mut redirects = Vec::new();
        for from in self.ends() {
            if spur_reads.contains(&from.read) {
                continue;
            }
            let edge = self.edge_of(from);
            if edge.is_none() || !spur_reads.contains(&edge.neighbor.read) {
                continue;
            }
            let pick = self
                .runner_ups(from.read, from.end)
                .iter()
                .position(|c| !spur_reads.contains(&c.neighbor.read));
            redirects.push((from, pick));
        }

        self.cleanup.spurs += attachments.len();
        for attach in attachments {
            self.store.clear_edge(attach);
        }
        for (from, pick) in redirects {
            match pick.and_then(|i| self.store.promote_runner_up(from, i)) {
                Some(_) => self.cleanup.spur_edges_demoted += 1,
                None => {
                    self.store.clear_edge(from);
                    self.cleanup.spur_edges_cleared += 1;
                }
            }
        }

        info!(
            "removeSpurs: {} spurs detached, {} edges into spurs demoted, {} cleared",
            self.cleanup.spurs, self.cleanup.spur_edges_demoted, self.cleanup.spur_edges_cleared
        );
        self.check_consistency();
    }

    /// Starting at a tip read (an uncontained read with an edge on
    /// exactly one end), walk along mutual best edges. Returns the
    /// reads walked and the end whose edge is not returned, if that
    /// happens within `MAX_SPUR_READS` reads.
    fn find_spur(&self, tip: ReadId) -> Option<(Vec<ReadId>, ReadEnd)> {
        if self.is_contained(tip) {
            return None;
        }
        let b5 = self.best_edge_overlap(tip, End::FivePrime);
        let b3 = self.best_edge_overlap(tip, End::ThreePrime);
        let live = match (b5.is_none(), b3.is_none()) {
            (true, false) => End::ThreePrime,
            (false, true) => End::FivePrime,
            _ => return None,
        };

        let mut chain = vec![tip];
        let mut current = ReadEnd::new(tip, live);
        loop {
            let edge = self.edge_of(current);
            if edge.is_none() {
                // dead ends on both sides, a short path of its own
                return None;
            }
            if self.target_edge(current, &edge).neighbor != current {
                return Some((chain, current));
            }
            let next = edge.neighbor.read;
            if chain.contains(&next) || chain.len() >= MAX_SPUR_READS {
                return None;
            }
            chain.push(next);
            current = self.follow_overlap(current);
        }
    }

    /// Restore mutual best edges. First an end whose best is weaker
    /// than an edge pointing at it adopts the strongest such edge.
    /// Then every end still not pointed back at moves to its first
    /// runner-up that does point back, or loses its edge. A runner-up
    /// taken this way keeps its own best edge, which is now returned,
    /// even if it was itself not pointed back at before.
    pub(crate) fn remove_false_best(&mut self) {
        let capacity = self.runner_up_capacity();
        let ends = self.ends();

        let mut claims: FnvHashMap<ReadEnd, EdgeCandidate> = FnvHashMap::default();
        for &from in ends.iter() {
            let edge = self.edge_of(from);
            if edge.is_none() {
                continue;
            }
            let back = self.target_edge(from, &edge);
            if back.neighbor == from || edge.score <= back.score {
                continue;
            }
            let claim = EdgeCandidate::new(edge.score, from);
            claims
                .entry(edge.neighbor)
                .and_modify(|c| {
                    if claim.score > c.score {
                        *c = claim;
                    }
                })
                .or_insert(claim);
        }

        // claimants that are themselves claimed keep their own edge
        let adoptions: Vec<(ReadEnd, EdgeCandidate)> = ends
            .iter()
            .filter_map(|target| claims.get(target).map(|c| (*target, *c)))
            .filter(|(_, claim)| !claims.contains_key(&claim.neighbor))
            .collect();

        for (target, claim) in adoptions {
            let old = self.edge_of(target);
            if let Some((_, scores)) = self.store.slot_mut(target.read) {
                let ups = scores.runner_ups_mut(target.end);
                ups.retain(|c| c.neighbor != claim.neighbor);
                if !old.is_none() {
                    ups.insert(0, old);
                    ups.truncate(capacity);
                }
            }
            debug!("{} adopts {}", target, claim.neighbor);
            self.store.set_edge(target, claim);
            self.cleanup.false_best_promoted += 1;
        }

        let unrequited: Vec<ReadEnd> = ends
            .iter()
            .copied()
            .filter(|&from| {
                let edge = self.edge_of(from);
                !edge.is_none() && self.target_edge(from, &edge).neighbor != from
            })
            .collect();

        // An unrequited end offers itself to its first runner-up that
        // points back at it. That runner-up's best is the offering end,
        // so it receives at most one offer, and the offers form
        // disjoint chains and cycles.
        let mut offers: FnvHashMap<ReadEnd, (usize, EdgeCandidate)> = FnvHashMap::default();
        for &from in unrequited.iter() {
            let pick = self
                .runner_ups(from.read, from.end)
                .iter()
                .enumerate()
                .find(|(_, c)| self.target_edge(from, c).neighbor == from)
                .map(|(i, c)| (i, *c));
            if let Some(pick) = pick {
                offers.insert(from, pick);
            }
        }
        let offered: FnvHashSet<ReadEnd> = offers.values().map(|(_, c)| c.neighbor).collect();

        let mut fixes: FnvHashMap<ReadEnd, Fix> = FnvHashMap::default();
        for &from in unrequited.iter() {
            if offers.contains_key(&from) && !offered.contains(&from) {
                accept_offers(from, &offers, &mut fixes);
            }
        }
        // what is left are cycles; each starts at its strongest offer
        for &from in unrequited.iter() {
            if fixes.contains_key(&from) || !offers.contains_key(&from) {
                continue;
            }
            let mut cycle = vec![from];
            let mut next = offers.get(&from).map(|(_, c)| c.neighbor);
            while let Some(end) = next.filter(|e| !cycle.contains(e)) {
                cycle.push(end);
                next = offers.get(&end).map(|(_, c)| c.neighbor);
            }
            let start = cycle
                .iter()
                .filter_map(|&end| offers.get(&end).map(|(_, c)| (c.score, Reverse(end))))
                .max()
                .map_or(from, |(_, Reverse(end))| end);
            accept_offers(start, &offers, &mut fixes);
        }

        for from in unrequited {
            match fixes.get(&from).copied().unwrap_or(Fix::Clear) {
                Fix::Keep => (),
                Fix::Retarget(i) => {
                    if let Some(cand) = self.store.promote_runner_up(from, i) {
                        debug!("{} retargeted to {}", from, cand.neighbor);
                        self.cleanup.false_best_retargeted += 1;
                    }
                }
                Fix::Clear => {
                    debug!("{} cleared", from);
                    self.store.clear_edge(from);
                    self.cleanup.false_best_cleared += 1;
                }
            }
        }

        info!(
            "removeFalseBest: {} adopted, {} retargeted, {} cleared",
            self.cleanup.false_best_promoted,
            self.cleanup.false_best_retargeted,
            self.cleanup.false_best_cleared
        );
        self.check_consistency();
    }

    /// Clear best edges, and drop runner-ups, scoring below
    /// `threshold` (see `Score::as_f64`). Returns the number of best
    /// edges cleared.
    pub fn remove_weak(&mut self, threshold: f64) -> usize {
        let weak: Vec<ReadEnd> = self
            .ends()
            .into_iter()
            .filter(|&from| {
                let edge = self.edge_of(from);
                !edge.is_none() && edge.score.as_f64() < threshold
            })
            .collect();

        for &from in weak.iter() {
            self.store.clear_edge(from);
        }
        self.store.for_each_scores_mut(|s| {
            s.runner_ups5.retain(|c| c.score.as_f64() >= threshold);
            s.runner_ups3.retain(|c| c.score.as_f64() >= threshold);
        });

        self.cleanup.weak_cleared += weak.len();
        info!("removeWeak({}): {} edges cleared", threshold, weak.len());
        self.check_consistency();
        weak.len()
    }
}

/// Walk a chain of offers from `start`, pairing each accepted offer's
/// two ends. The receiving end keeps its best edge, so its own offer is
/// dropped and the walk resumes at the end it had offered to.
fn accept_offers(
    start: ReadEnd,
    offers: &FnvHashMap<ReadEnd, (usize, EdgeCandidate)>,
    fixes: &mut FnvHashMap<ReadEnd, Fix>,
) {
    let mut current = Some(start);
    while let Some(from) = current {
        let (index, partner) = match offers.get(&from) {
            Some(&(i, c)) => (i, c.neighbor),
            None => break,
        };
        if fixes.contains_key(&from) || fixes.contains_key(&partner) {
            break;
        }
        fixes.insert(from, Fix::Retarget(index));
        fixes.insert(partner, Fix::Keep);
        current = offers.get(&partner).map(|(_, c)| c.neighbor);
    }
}
