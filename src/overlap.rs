#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::read::{End, ReadEnd, ReadId};

/// How the two reads of an overlap relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum OverlapKind {
    /// The reads extend past each other; `a.end` and `b.end` are the
    /// touching ends.
    Dovetail,
    AContainsB,
    BContainsA,
}

/// One pairwise alignment between two reads, already normalized by
/// whatever loader produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct OverlapRecord {
    pub a: ReadEnd,
    pub b: ReadEnd,
    /// Fraction of mismatching columns in the alignment
    pub erate: f64,
    pub length: u32,
    pub kind: OverlapKind,
}

impl OverlapRecord {
    pub fn dovetail(a: ReadEnd, b: ReadEnd, length: u32, erate: f64) -> Self {
        OverlapRecord {
            a,
            b,
            erate,
            length,
            kind: OverlapKind::Dovetail,
        }
    }

    /// `container` fully contains `containee`. `length` is the aligned
    /// length, usually the containee's length.
    pub fn containment<R: Into<ReadId>>(
        container: R,
        containee: R,
        length: u32,
        erate: f64,
    ) -> Self {
        OverlapRecord {
            a: ReadEnd::five_prime(container),
            b: ReadEnd::five_prime(containee),
            erate,
            length,
            kind: OverlapKind::AContainsB,
        }
    }

    /// Build a record from an overlap given as hangs, the way overlap
    /// stores keep them: `a_hang` is the offset of B's start past A's
    /// start, `b_hang` the offset of B's end past A's end, and
    /// `flipped` says B aligns reverse-complemented. Read lengths are
    /// needed to derive the aligned length.
    ///
    /// ```
    /// use bog::overlap::{OverlapKind, OverlapRecord};
    /// use bog::read::ReadEnd;
    ///
    /// //  A  ---------->
    /// //  B       ---------->
    /// let olap = OverlapRecord::from_hangs(1, 2, 50, 60, false, 0.01, 200, 210);
    /// assert_eq!(OverlapKind::Dovetail, olap.kind);
    /// assert_eq!(ReadEnd::three_prime(1), olap.a);
    /// assert_eq!(ReadEnd::five_prime(2), olap.b);
    /// assert_eq!(150, olap.length);
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn from_hangs<R: Into<ReadId>>(
        a_id: R,
        b_id: R,
        a_hang: i32,
        b_hang: i32,
        flipped: bool,
        erate: f64,
        a_len: u32,
        b_len: u32,
    ) -> Self {
        let a_id = a_id.into();
        let b_id = b_id.into();
        let length = hang_overlap_length(a_hang, b_hang, a_len, b_len);

        let kind = if a_hang >= 0 && b_hang <= 0 {
            OverlapKind::AContainsB
        } else if a_hang <= 0 && b_hang >= 0 {
            OverlapKind::BContainsA
        } else {
            OverlapKind::Dovetail
        };

        let a_end = if a_hang > 0 && b_hang > 0 {
            End::ThreePrime
        } else {
            End::FivePrime
        };
        let b_end = if flipped { a_end } else { a_end.flip() };

        OverlapRecord {
            a: ReadEnd::new(a_id, a_end),
            b: ReadEnd::new(b_id, b_end),
            erate,
            length,
            kind,
        }
    }

    #[inline]
    pub fn is_containment(&self) -> bool {
        self.kind != OverlapKind::Dovetail
    }

    pub fn container(&self) -> Option<ReadId> {
        match self.kind {
            OverlapKind::Dovetail => None,
            OverlapKind::AContainsB => Some(self.a.read),
            OverlapKind::BContainsA => Some(self.b.read),
        }
    }

    pub fn containee(&self) -> Option<ReadId> {
        match self.kind {
            OverlapKind::Dovetail => None,
            OverlapKind::AContainsB => Some(self.b.read),
            OverlapKind::BContainsA => Some(self.a.read),
        }
    }

    /// Expected number of mismatching columns
    #[inline]
    pub fn mismatches(&self) -> f64 {
        self.erate * self.length as f64
    }
}

/// Mean of the spans covered on A and on B. Inconsistent hangs
/// (longer than the reads) produce 0, which the scorer rejects.
fn hang_overlap_length(a_hang: i32, b_hang: i32, a_len: u32, b_len: u32) -> u32 {
    let (a_len, b_len) = (a_len as i64, b_len as i64);
    let (a_hang, b_hang) = (a_hang as i64, b_hang as i64);

    let (a_ovl, b_ovl) = if a_hang < 0 {
        //  A     ------       or     ------
        //  B  ---------              ----------
        let a_ovl = if b_hang < 0 { a_len + b_hang } else { a_len };
        let b_ovl = if b_hang < 0 {
            b_len + a_hang
        } else {
            b_len + a_hang - b_hang
        };
        (a_ovl, b_ovl)
    } else {
        //  A  ----------      or  ---------
        //  B     ----                ---------
        let a_ovl = if b_hang < 0 {
            a_len - a_hang + b_hang
        } else {
            a_len - a_hang
        };
        let b_ovl = if b_hang < 0 { b_len } else { b_len - b_hang };
        (a_ovl, b_ovl)
    };

    if a_ovl <= 0 || b_ovl <= 0 {
        return 0;
    }
    ((a_ovl + b_ovl) / 2).min(u32::MAX as i64) as u32
}
