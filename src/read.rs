#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Identifier of a read in the read store. Ids are 1-based and dense;
/// `ReadId(0)` is reserved to mean "no read".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ReadId(pub u32);

impl ReadId {
    pub const NONE: ReadId = ReadId(0);

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ReadId {
    #[inline]
    fn from(id: u32) -> Self {
        ReadId(id)
    }
}

impl std::fmt::Display for ReadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two extremities of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum End {
    FivePrime,
    ThreePrime,
}

impl End {
    /// Both ends, 5' first. Passes iterate in this order.
    pub const BOTH: [End; 2] = [End::FivePrime, End::ThreePrime];

    #[inline]
    pub fn flip(self) -> Self {
        match self {
            End::FivePrime => End::ThreePrime,
            End::ThreePrime => End::FivePrime,
        }
    }

    #[inline]
    pub fn is_three_prime(&self) -> bool {
        bool::from(*self)
    }

    /// Parse an end from "5", "5'", "3" or "3'"
    #[inline]
    pub fn from_bytes<T: AsRef<[u8]>>(bs: T) -> Option<Self> {
        match bs.as_ref() {
            b"5" | b"5'" => Some(End::FivePrime),
            b"3" | b"3'" => Some(End::ThreePrime),
            _ => None,
        }
    }
}

/// Default end is 5'
impl Default for End {
    #[inline]
    fn default() -> End {
        End::FivePrime
    }
}

/// 3' is true, 5' is false
impl From<End> for bool {
    #[inline]
    fn from(e: End) -> bool {
        match e {
            End::FivePrime => false,
            End::ThreePrime => true,
        }
    }
}

impl std::str::FromStr for End {
    type Err = &'static str;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        End::from_bytes(s.as_bytes())
            .ok_or("Could not parse read end (was not 5 or 3)")
    }
}

/// Display writes `5'` and `3'`; the alternate flag, `{:#}`, drops
/// the prime.
impl std::fmt::Display for End {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digit = match self {
            End::FivePrime => '5',
            End::ThreePrime => '3',
        };
        if f.alternate() {
            write!(f, "{}", digit)
        } else {
            write!(f, "{}'", digit)
        }
    }
}

/// An oriented read extremity, the node unit of the best overlap
/// graph. The sentinel value (read 0) terminates traversals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ReadEnd {
    pub read: ReadId,
    pub end: End,
}

impl ReadEnd {
    #[inline]
    pub fn new<R: Into<ReadId>>(read: R, end: End) -> Self {
        ReadEnd {
            read: read.into(),
            end,
        }
    }

    #[inline]
    pub fn five_prime<R: Into<ReadId>>(read: R) -> Self {
        Self::new(read, End::FivePrime)
    }

    #[inline]
    pub fn three_prime<R: Into<ReadId>>(read: R) -> Self {
        Self::new(read, End::ThreePrime)
    }

    #[inline]
    pub fn none() -> Self {
        Default::default()
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.read.is_none()
    }

    /// The other end of the same read
    #[inline]
    pub fn flipped(&self) -> Self {
        ReadEnd {
            read: self.read,
            end: self.end.flip(),
        }
    }
}

/// Written as `<read>:<end>`, e.g. `12:3'`
impl std::fmt::Display for ReadEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.read, self.end)
    }
}
