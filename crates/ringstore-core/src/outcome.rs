//! Client-visible operation outcomes.

use std::fmt;

/// Result classification of a replicated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every target acknowledged.
    Success,
    /// Some, but not all, targets acknowledged.
    PartialSuccess,
    /// No target acknowledged.
    Failure,
    /// The peer did not answer in time.
    Timeout,
    /// The operation failed locally.
    Error,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// True for full or partial success.
    pub fn is_acknowledged(self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "SUCCESS",
            Self::PartialSuccess => "PARTIAL_SUCCESS",
            Self::Failure => "FAILURE",
            Self::Timeout => "TIMEOUT",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}
