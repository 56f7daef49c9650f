//! Consistency levels and replica counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How many replicas a store or load must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConsistencyLevel {
    /// Any single node.
    Zero = 0,
    /// Primary plus one replica.
    One = 1,
    /// Primary plus two replicas.
    Two = 2,
    /// Primary plus three replicas.
    Three = 3,
    /// A majority: `n / 2 + 1` copies.
    Quorum = 0x7F,
    /// Every node.
    All = 0xFF,
}

impl ConsistencyLevel {
    /// Byte code of this level.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            0x7F => Some(Self::Quorum),
            0xFF => Some(Self::All),
            _ => None,
        }
    }

    /// Number of copies this level asks for in a cluster of `cluster_size`.
    pub fn copies(self, cluster_size: usize) -> usize {
        match self {
            Self::Zero => 1,
            Self::One => 2,
            Self::Two => 3,
            Self::Three => 4,
            Self::Quorum => cluster_size / 2 + 1,
            Self::All => cluster_size,
        }
    }

    /// The level a cluster of `cluster_size` can actually satisfy.
    ///
    /// Quorum and All scale with the cluster and are returned unchanged.
    /// Fixed levels are lowered to the highest one the cluster supports.
    pub fn adjusted(self, cluster_size: usize) -> Self {
        if matches!(self, Self::Quorum | Self::All) {
            return self;
        }

        let highest = match cluster_size {
            0 | 1 => Self::Zero,
            2 => Self::One,
            3 => Self::Two,
            4 => Self::Three,
            _ => return self,
        };

        self.min(highest)
    }
}

impl Default for ConsistencyLevel {
    fn default() -> Self {
        Self::One
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Three => "three",
            Self::Quorum => "quorum",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown consistency level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for ConsistencyLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(Self::Zero),
            "one" | "1" => Ok(Self::One),
            "two" | "2" => Ok(Self::Two),
            "three" | "3" => Ok(Self::Three),
            "quorum" => Ok(Self::Quorum),
            "all" => Ok(Self::All),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_fixed_levels() {
        assert_eq!(ConsistencyLevel::Zero.copies(10), 1);
        assert_eq!(ConsistencyLevel::One.copies(10), 2);
        assert_eq!(ConsistencyLevel::Two.copies(10), 3);
        assert_eq!(ConsistencyLevel::Three.copies(10), 4);
    }

    #[test]
    fn test_copies_scaling_levels() {
        assert_eq!(ConsistencyLevel::Quorum.copies(4), 3);
        assert_eq!(ConsistencyLevel::Quorum.copies(5), 3);
        assert_eq!(ConsistencyLevel::Quorum.copies(1), 1);
        assert_eq!(ConsistencyLevel::All.copies(7), 7);
    }

    #[test]
    fn test_adjusted_downgrades_small_clusters() {
        assert_eq!(ConsistencyLevel::Two.adjusted(2), ConsistencyLevel::One);
        assert_eq!(ConsistencyLevel::Three.adjusted(1), ConsistencyLevel::Zero);
        assert_eq!(ConsistencyLevel::Three.adjusted(3), ConsistencyLevel::Two);
        assert_eq!(ConsistencyLevel::Three.adjusted(4), ConsistencyLevel::Three);
    }

    #[test]
    fn test_adjusted_keeps_satisfiable_levels() {
        assert_eq!(ConsistencyLevel::Two.adjusted(5), ConsistencyLevel::Two);
        assert_eq!(ConsistencyLevel::Zero.adjusted(3), ConsistencyLevel::Zero);
        assert_eq!(ConsistencyLevel::One.adjusted(3), ConsistencyLevel::One);
    }

    #[test]
    fn test_adjusted_never_touches_quorum_or_all() {
        assert_eq!(ConsistencyLevel::Quorum.adjusted(4), ConsistencyLevel::Quorum);
        assert_eq!(ConsistencyLevel::All.adjusted(1), ConsistencyLevel::All);
    }

    #[test]
    fn test_byte_codes() {
        for level in [
            ConsistencyLevel::Zero,
            ConsistencyLevel::One,
            ConsistencyLevel::Two,
            ConsistencyLevel::Three,
            ConsistencyLevel::Quorum,
            ConsistencyLevel::All,
        ] {
            assert_eq!(ConsistencyLevel::from_u8(level.to_u8()), Some(level));
        }
        assert_eq!(ConsistencyLevel::Quorum.to_u8(), 0x7F);
        assert_eq!(ConsistencyLevel::from_u8(9), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("QUORUM".parse::<ConsistencyLevel>(), Ok(ConsistencyLevel::Quorum));
        assert_eq!("two".parse::<ConsistencyLevel>(), Ok(ConsistencyLevel::Two));
        assert!("most".parse::<ConsistencyLevel>().is_err());
    }
}
