use std::collections::BTreeSet;

use crate::error::{BogError, BogResult};
use crate::read::ReadId;

/// Construction-time settings for a `BestOverlapGraph`. Nothing here
/// can change once the graph is built.
#[derive(Debug, Clone, PartialEq)]
pub struct BogConfig {
    /// Size of the read population; valid ids are `1..=num_reads`.
    pub num_reads: u32,
    /// Maximum error rate of an accepted overlap, as a fraction.
    pub erate: f64,
    /// Maximum expected mismatch count of an accepted overlap.
    /// `f64::INFINITY` disables the absolute ceiling.
    pub elimit: f64,
    pub remove_weak_threshold: Option<f64>,
    pub remove_suspicious: bool,
    pub remove_spurs: bool,
    pub remove_false_best: bool,
    /// Only the N best candidates of a read end are considered.
    pub top_n: Option<usize>,
    /// When set, only overlaps between two members are used and the
    /// graph switches to sparse storage.
    pub restrict: Option<BTreeSet<ReadId>>,
    /// Output file prefix for the textual reports.
    pub prefix: Option<String>,
}

impl BogConfig {
    pub fn new(num_reads: u32, erate: f64, elimit: f64) -> Self {
        BogConfig {
            num_reads,
            erate,
            elimit,
            remove_weak_threshold: None,
            remove_suspicious: true,
            remove_spurs: true,
            remove_false_best: true,
            top_n: None,
            restrict: None,
            prefix: None,
        }
    }

    /// A config that only builds best edges among `restrict` and runs
    /// none of the cleanup passes.
    pub fn restricted(
        num_reads: u32,
        erate: f64,
        elimit: f64,
        restrict: BTreeSet<ReadId>,
    ) -> Self {
        Self::new(num_reads, erate, elimit)
            .with_restriction(restrict)
            .without_cleanup()
    }

    pub fn with_remove_weak(mut self, threshold: f64) -> Self {
        self.remove_weak_threshold = Some(threshold);
        self
    }

    pub fn with_remove_suspicious(mut self, enabled: bool) -> Self {
        self.remove_suspicious = enabled;
        self
    }

    pub fn with_remove_spurs(mut self, enabled: bool) -> Self {
        self.remove_spurs = enabled;
        self
    }

    pub fn with_remove_false_best(mut self, enabled: bool) -> Self {
        self.remove_false_best = enabled;
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn with_restriction(mut self, restrict: BTreeSet<ReadId>) -> Self {
        self.restrict = Some(restrict);
        self
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Turn off every optional cleanup pass.
    pub fn without_cleanup(mut self) -> Self {
        self.remove_weak_threshold = None;
        self.remove_suspicious = false;
        self.remove_spurs = false;
        self.remove_false_best = false;
        self.top_n = None;
        self
    }

    pub fn validate(&self) -> BogResult<()> {
        validate_thresholds(self.erate, self.elimit)?;

        if let Some(t) = self.remove_weak_threshold {
            if !(t >= 0.0) || !t.is_finite() {
                return Err(BogError::invalid_parameter(
                    "remove_weak_threshold",
                    format!("{} is not a finite value >= 0", t),
                ));
            }
        }

        if self.top_n == Some(0) {
            return Err(BogError::invalid_parameter(
                "top_n",
                "must keep at least one candidate",
            ));
        }

        if let Some(restrict) = &self.restrict {
            let unknown = restrict
                .iter()
                .find(|r| r.is_none() || r.0 > self.num_reads);
            if let Some(&read) = unknown {
                return Err(BogError::UnknownRestrictedRead {
                    read,
                    num_reads: self.num_reads,
                });
            }
        }

        Ok(())
    }
}

/// Shared by construction and the containment rebuild.
pub(crate) fn validate_thresholds(erate: f64, elimit: f64) -> BogResult<()> {
    if !(erate >= 0.0) || !erate.is_finite() {
        return Err(BogError::invalid_parameter(
            "erate",
            format!("{} is not a finite fraction >= 0", erate),
        ));
    }
    if !(elimit >= 0.0) {
        return Err(BogError::invalid_parameter(
            "elimit",
            format!("{} is not >= 0", elimit),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let conf = BogConfig::new(100, 0.015, f64::INFINITY);
        assert!(conf.validate().is_ok());
        assert!(conf.remove_spurs);
        assert!(conf.remove_false_best);
        assert_eq!(None, conf.top_n);
    }

    #[test]
    fn negative_thresholds_are_fatal() {
        let conf = BogConfig::new(10, -0.1, 2.0);
        assert!(matches!(
            conf.validate(),
            Err(BogError::InvalidParameter { parameter: "erate", .. })
        ));

        let conf = BogConfig::new(10, 0.1, -2.0);
        assert!(matches!(
            conf.validate(),
            Err(BogError::InvalidParameter { parameter: "elimit", .. })
        ));

        let conf = BogConfig::new(10, f64::NAN, 2.0);
        assert!(conf.validate().is_err());

        let conf = BogConfig::new(10, 0.1, 2.0).with_remove_weak(-1.0);
        assert!(conf.validate().is_err());

        let conf = BogConfig::new(10, 0.1, 2.0).with_top_n(0);
        assert!(conf.validate().is_err());
    }

    #[test]
    fn restriction_must_name_known_reads() {
        let restrict: BTreeSet<ReadId> =
            vec![ReadId(1), ReadId(11)].into_iter().collect();
        let conf = BogConfig::restricted(10, 0.02, 2.0, restrict);
        match conf.validate() {
            Err(BogError::UnknownRestrictedRead { read, num_reads }) => {
                assert_eq!(ReadId(11), read);
                assert_eq!(10, num_reads);
            }
            other => panic!("expected unknown read error, got {:?}", other),
        }

        let restrict: BTreeSet<ReadId> = vec![ReadId(0)].into_iter().collect();
        let conf = BogConfig::restricted(10, 0.02, 2.0, restrict);
        assert!(conf.validate().is_err());
    }

    #[test]
    fn restricted_config_skips_cleanup() {
        let conf = BogConfig::restricted(10, 0.02, 2.0, BTreeSet::new());
        assert!(!conf.remove_suspicious);
        assert!(!conf.remove_spurs);
        assert!(!conf.remove_false_best);
        assert!(conf.restrict.is_some());
    }
}
