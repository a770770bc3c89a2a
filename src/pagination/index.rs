//! Positions within a paged collection

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Index into a [`PagedCollection`](super::PagedCollection).
///
/// An indefinite index means "at least this many items, maybe more". Only
/// the end index of a collection that still has pages to load is
/// indefinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PagedIndex {
    pub actual_index: usize,
    pub is_indefinite_end: bool,
}

impl PagedIndex {
    pub const fn new(actual_index: usize) -> Self {
        Self {
            actual_index,
            is_indefinite_end: false,
        }
    }

    pub const fn indefinite(actual_index: usize) -> Self {
        Self {
            actual_index,
            is_indefinite_end: true,
        }
    }

    /// The index after this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.actual_index + 1)
    }
}

impl From<usize> for PagedIndex {
    fn from(actual_index: usize) -> Self {
        Self::new(actual_index)
    }
}

impl Ord for PagedIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.actual_index
            .cmp(&other.actual_index)
            .then(self.is_indefinite_end.cmp(&other.is_indefinite_end))
    }
}

impl PartialOrd for PagedIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PagedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_indefinite_end {
            write!(f, "{}+", self.actual_index)
        } else {
            write!(f, "{}", self.actual_index)
        }
    }
}
