//! Query flag bitset.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Bitset of optional query behaviours.
///
/// Each flag occupies its own bit so flags can be freely combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFlags(u64);

impl QueryFlags {
    /// No flags set.
    pub const NONE: QueryFlags = QueryFlags(0);

    /// Search the term verbatim, without stemming expansion.
    pub const VERBATIM: QueryFlags = QueryFlags(0x1);

    /// Return ids and scores only, without document properties.
    pub const NO_CONTENT: QueryFlags = QueryFlags(0x2);

    /// Treat the term as a prefix.
    pub const PREFIX: QueryFlags = QueryFlags(0x4);

    /// Treat the term as a wildcard pattern.
    pub const WILDCARD: QueryFlags = QueryFlags(0x8);

    /// Build flags from raw bits.
    pub const fn from_bits(bits: u64) -> Self {
        QueryFlags(bits)
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Check whether every bit of `other` is set.
    pub const fn contains(self, other: QueryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for QueryFlags {
    type Output = QueryFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        QueryFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for QueryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (QueryFlags::VERBATIM, "VERBATIM"),
            (QueryFlags::NO_CONTENT, "NOCONTENT"),
            (QueryFlags::PREFIX, "PREFIX"),
            (QueryFlags::WILDCARD, "WILDCARD"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", set.join("|"))
    }
}
