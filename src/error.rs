use thiserror::Error;

use crate::read::ReadId;

pub type BogResult<T> = Result<T, BogError>;

/// Errors raised by the graph builder and its input readers. Rejected
/// overlaps are not errors; see `score::Rejection`.
#[derive(Error, Debug)]
pub enum BogError {
    /// A configuration value is out of range. Fatal at construction.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    /// The restriction set names a read outside `1..=num_reads`.
    #[error("Restriction set references unknown read {read} (population has {num_reads} reads)")]
    UnknownRestrictedRead { read: ReadId, num_reads: u32 },

    /// A line of an overlap dump or read-length table couldn't be
    /// parsed. Includes the problem line.
    #[error("Failed to parse line '{line}': {reason}")]
    InvalidLine { line: String, reason: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BogError {
    #[inline]
    pub(crate) fn invalid_parameter<S: Into<String>>(
        parameter: &'static str,
        reason: S,
    ) -> Self {
        BogError::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    #[inline]
    pub(crate) fn invalid_line(line: &[u8], reason: &'static str) -> Self {
        BogError::InvalidLine {
            line: String::from_utf8_lossy(line).into_owned(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = BogError::invalid_parameter("erate", "must be >= 0");
        let msg = err.to_string();
        assert!(msg.contains("Invalid parameter 'erate'"));
        assert!(msg.contains("must be >= 0"));

        let err = BogError::UnknownRestrictedRead {
            read: ReadId(12),
            num_reads: 10,
        };
        assert!(err.to_string().contains("unknown read 12"));

        let err = BogError::invalid_line(b"1 2 x", "bad hang");
        assert_eq!("Failed to parse line '1 2 x': bad hang", err.to_string());
    }
}
