pub mod config;
pub mod error;
pub mod graph;
pub mod mmap;
pub mod overlap;
pub mod ovl;
pub mod read;
pub mod report;
pub mod score;

pub use config::BogConfig;
pub use error::{BogError, BogResult};
pub use graph::{BestOverlapGraph, Unitig};
pub use overlap::{OverlapKind, OverlapRecord};
pub use read::{End, ReadEnd, ReadId};
pub use score::Score;
