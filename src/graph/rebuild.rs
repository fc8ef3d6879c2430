use std::fs::File;
use std::io::{BufWriter, Write};

use fnv::{FnvHashMap, FnvHashSet};
use log::info;

use super::select::{SelectionStats, Selector};
use super::BestOverlapGraph;
use crate::config::validate_thresholds;
use crate::error::BogResult;
use crate::overlap::OverlapRecord;
use crate::read::ReadId;
use crate::report::write_best_contains;
use crate::score::Scorer;

/// A linear chain of reads built by an external unitig pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unitig {
    reads: Vec<ReadId>,
}

impl Unitig {
    pub fn new(reads: Vec<ReadId>) -> Self {
        Unitig { reads }
    }

    pub fn reads(&self) -> &[ReadId] {
        &self.reads
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.reads.len() == 1
    }
}

impl From<Vec<ReadId>> for Unitig {
    fn from(reads: Vec<ReadId>) -> Self {
        Unitig::new(reads)
    }
}

/// What a containment rebuild changed, compared to the containments
/// held before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub singletons: usize,
    pub kept: usize,
    pub reassigned: usize,
    pub cleared: usize,
    pub newly_contained: usize,
    pub selection: SelectionStats,
}

impl BestOverlapGraph {
    /// Recompute every best containment from `overlaps`, refusing
    /// containers that ended up alone in their unitig. Dovetail edges
    /// are not touched. With a `prefix`, the new containments are also
    /// written to `<prefix>.best.contains.rebuilt`.
    pub fn rebuild_best_contains_without_singletons<I>(
        &mut self,
        unitigs: &[Unitig],
        overlaps: I,
        erate: f64,
        elimit: f64,
        prefix: Option<&str>,
    ) -> BogResult<RebuildSummary>
    where
        I: IntoIterator<Item = OverlapRecord>,
    {
        validate_thresholds(erate, elimit)?;

        let singletons: FnvHashSet<ReadId> = unitigs
            .iter()
            .filter(|u| u.is_singleton())
            .flat_map(|u| u.reads().iter().copied())
            .collect();

        let before: FnvHashMap<ReadId, ReadId> = self
            .store
            .read_ids()
            .into_iter()
            .filter_map(|id| {
                let cont = self.best_container(id);
                if cont.is_contained {
                    Some((id, cont.container))
                } else {
                    None
                }
            })
            .collect();

        self.store.reset_containments();

        let capacity = self.runner_up_capacity();
        let scorer = Scorer::new(self.config.num_reads, erate, elimit)
            .with_restriction(self.config.restrict.as_ref())
            .excluding_containers(&singletons);

        let mut selector = Selector::new(&mut self.store, capacity);
        selector.consume(&scorer, overlaps, true);

        let mut summary = RebuildSummary {
            singletons: singletons.len(),
            selection: selector.finish(),
            ..Default::default()
        };

        for id in self.store.read_ids() {
            let after = self.best_container(id);
            match (before.get(&id), after.is_contained) {
                (Some(&old), true) if old == after.container => summary.kept += 1,
                (Some(_), true) => summary.reassigned += 1,
                (Some(_), false) => summary.cleared += 1,
                (None, true) => summary.newly_contained += 1,
                (None, false) => (),
            }
        }

        info!(
            "rebuildBestContainsWithoutSingletons: {} singleton unitigs, {} containments kept, {} reassigned, {} cleared, {} new",
            summary.singletons,
            summary.kept,
            summary.reassigned,
            summary.cleared,
            summary.newly_contained
        );

        self.check_consistency();

        if let Some(prefix) = prefix {
            let path = format!("{}.best.contains.rebuilt", prefix);
            let mut out = BufWriter::new(File::create(&path)?);
            write_best_contains(self, &mut out)?;
            out.flush()?;
            info!("wrote {}", path);
        }

        Ok(summary)
    }
}
