pub mod cleanup;
pub mod rebuild;
pub mod select;
pub mod store;

pub use self::cleanup::{CleanupStats, MAX_SPUR_READS};
pub use self::rebuild::{RebuildSummary, Unitig};
pub use self::select::SelectionStats;
pub use self::store::{
    BestOverlaps, ContainmentCandidate, EdgeCandidate, DEFAULT_RUNNER_UPS,
};

use std::collections::BTreeSet;

use fnv::FnvHashSet;
use log::info;

use self::select::Selector;
use self::store::Storage;
use crate::config::BogConfig;
use crate::error::BogResult;
use crate::overlap::OverlapRecord;
use crate::read::{End, ReadEnd, ReadId};
use crate::score::{Score, Scorer};

/// For every read end, the single best dovetail overlap, and for
/// every read, its best container. Built in one streaming pass over
/// the overlaps, then cleaned up by the heuristic passes enabled in
/// the config.
#[derive(Debug, Clone)]
pub struct BestOverlapGraph {
    store: Storage,
    suspicious: BTreeSet<ReadId>,
    config: BogConfig,
    selection: SelectionStats,
    cleanup: CleanupStats,
}

impl BestOverlapGraph {
    /// Validate `config`, consume `overlaps` once and run the cleanup
    /// pipeline.
    pub fn new<I>(config: BogConfig, overlaps: I) -> BogResult<Self>
    where
        I: IntoIterator<Item = OverlapRecord>,
    {
        config.validate()?;

        let store = match &config.restrict {
            Some(restrict) => Storage::restricted(restrict.clone()),
            None => Storage::dense(config.num_reads),
        };

        let mut graph = BestOverlapGraph {
            store,
            suspicious: BTreeSet::new(),
            config,
            selection: Default::default(),
            cleanup: Default::default(),
        };

        graph.build(overlaps);
        graph.check_consistency();
        graph.run_cleanup();

        Ok(graph)
    }

    fn build<I>(&mut self, overlaps: I)
    where
        I: IntoIterator<Item = OverlapRecord>,
    {
        let capacity = self.runner_up_capacity();
        let scorer = Scorer::new(self.config.num_reads, self.config.erate, self.config.elimit)
            .with_restriction(self.config.restrict.as_ref());

        let mut selector = Selector::new(&mut self.store, capacity);
        selector.consume(&scorer, overlaps, false);
        self.selection = selector.finish();

        info!(
            "best edges: {} dovetails and {} containments accepted, {} rejected ({} over error limits, {} restricted, {} malformed)",
            self.selection.dovetails,
            self.selection.containments,
            self.selection.rejected(),
            self.selection.rejected_errors,
            self.selection.rejected_restricted,
            self.selection.rejected_malformed,
        );
    }

    pub(crate) fn runner_up_capacity(&self) -> usize {
        DEFAULT_RUNNER_UPS.max(self.config.top_n.unwrap_or(0))
    }

    pub fn config(&self) -> &BogConfig {
        &self.config
    }

    pub fn num_reads(&self) -> u32 {
        self.config.num_reads
    }

    /// True when the graph only covers a restriction set.
    pub fn is_restricted(&self) -> bool {
        self.store.is_restricted()
    }

    /// The reads that take part in the graph, in ascending order.
    pub fn read_ids(&self) -> Vec<ReadId> {
        self.store.read_ids()
    }

    pub fn selection_stats(&self) -> SelectionStats {
        self.selection
    }

    pub fn cleanup_stats(&self) -> CleanupStats {
        self.cleanup
    }

    /// The best edge out of one end of `read`; the default (empty)
    /// candidate when there is none.
    pub fn best_edge_overlap(&self, read: ReadId, end: End) -> EdgeCandidate {
        self.store
            .best(read)
            .map(|b| *b.edge(end))
            .unwrap_or_default()
    }

    pub fn best_score(&self, read: ReadId, end: End) -> Score {
        self.store
            .scores(read)
            .map(|s| s.score(end))
            .unwrap_or_default()
    }

    /// The next-best candidates of a read end, best first.
    pub fn runner_ups(&self, read: ReadId, end: End) -> &[EdgeCandidate] {
        self.store
            .scores(read)
            .map(|s| s.runner_ups(end))
            .unwrap_or(&[])
    }

    pub fn is_contained(&self, read: ReadId) -> bool {
        self.best_container(read).is_contained
    }

    pub fn best_container(&self, read: ReadId) -> ContainmentCandidate {
        self.store
            .best(read)
            .map(|b| b.best_c)
            .unwrap_or_default()
    }

    pub fn best_containment_score(&self, read: ReadId) -> Score {
        self.store
            .scores(read)
            .map(|s| s.best_c)
            .unwrap_or_default()
    }

    pub fn is_suspicious(&self, read: ReadId) -> bool {
        self.suspicious.contains(&read)
    }

    pub fn suspicious_reads(&self) -> impl Iterator<Item = ReadId> + '_ {
        self.suspicious.iter().copied()
    }

    /// Cross the best edge out of `end` and return the end the walk
    /// continues from, which is the far end of the neighbor. The
    /// sentinel maps to itself, as does an end without an edge.
    pub fn follow_overlap(&self, end: ReadEnd) -> ReadEnd {
        if end.is_none() {
            return ReadEnd::none();
        }
        let edge = self.best_edge_overlap(end.read, end.end);
        if edge.is_none() {
            return ReadEnd::none();
        }
        edge.neighbor.flipped()
    }

    /// Repeatedly follow best edges from `start`. Stops at the
    /// sentinel or before entering a read a second time.
    pub fn walk(&self, start: ReadEnd) -> Walk<'_> {
        Walk {
            graph: self,
            next: start,
            seen: FnvHashSet::default(),
        }
    }

    /// Every `(from, to)` best edge whose target does not point back.
    pub fn asymmetric_edges(&self) -> Vec<(ReadEnd, ReadEnd)> {
        self.ends()
            .into_iter()
            .filter_map(|from| {
                let edge = self.edge_of(from);
                if edge.is_none() {
                    return None;
                }
                let back = self.target_edge(from, &edge);
                if back.neighbor == from {
                    None
                } else {
                    Some((from, edge.neighbor))
                }
            })
            .collect()
    }

    pub(crate) fn ends(&self) -> Vec<ReadEnd> {
        self.store
            .read_ids()
            .into_iter()
            .flat_map(|id| End::BOTH.iter().map(move |&end| ReadEnd::new(id, end)))
            .collect()
    }

    #[inline]
    pub(crate) fn edge_of(&self, end: ReadEnd) -> EdgeCandidate {
        self.best_edge_overlap(end.read, end.end)
    }

    /// The best edge of the end `edge` points at. Panics if that read
    /// isn't part of the graph.
    pub(crate) fn target_edge(&self, from: ReadEnd, edge: &EdgeCandidate) -> EdgeCandidate {
        assert!(
            self.store.contains(edge.neighbor.read),
            "best edge of {} points to read {} outside the graph",
            from,
            edge.neighbor.read
        );
        self.edge_of(edge.neighbor)
    }

    /// Panics if any edge or containment points outside the graph, or
    /// if a shadow score disagrees with its edge.
    pub(crate) fn check_consistency(&self) {
        for id in self.store.read_ids() {
            let (best, scores) = match (self.store.best(id), self.store.scores(id)) {
                (Some(best), Some(scores)) => (best, scores),
                _ => continue,
            };

            for &end in End::BOTH.iter() {
                let from = ReadEnd::new(id, end);
                let edge = best.edge(end);
                assert_eq!(
                    edge.score,
                    scores.score(end),
                    "score of the best edge of {} is out of step",
                    from
                );
                if edge.is_none() {
                    assert!(edge.score.is_zero(), "{} has a score but no edge", from);
                    continue;
                }
                assert!(
                    self.store.contains(edge.neighbor.read),
                    "best edge of {} points to read {} outside the graph",
                    from,
                    edge.neighbor.read
                );
                assert_ne!(edge.neighbor.read, id, "{} has an edge to itself", from);
            }

            let cont = &best.best_c;
            assert_eq!(
                cont.score, scores.best_c,
                "containment score of read {} is out of step",
                id
            );
            if cont.is_contained {
                assert!(
                    self.store.contains(cont.container),
                    "read {} is contained in read {} outside the graph",
                    id,
                    cont.container
                );
            }
        }
    }
}

/// Iterator returned by `BestOverlapGraph::walk`.
pub struct Walk<'g> {
    graph: &'g BestOverlapGraph,
    next: ReadEnd,
    seen: FnvHashSet<ReadId>,
}

impl<'g> Iterator for Walk<'g> {
    type Item = ReadEnd;

    fn next(&mut self) -> Option<ReadEnd> {
        let current = self.next;
        if current.is_none() || !self.seen.insert(current.read) {
            return None;
        }
        self.next = self.graph.follow_overlap(current);
        Some(current)
    }
}
