// Keytran Unicode Set
// Character-class membership tests for reorder elements

use std::cmp::Ordering;
use std::ops::RangeInclusive;

/// An immutable set of Unicode scalar values.
///
/// Stored as a sorted, coalesced list of inclusive ranges; membership is a
/// binary search. Rule elements own one of these when they match a class of
/// characters instead of a single scalar, and the engine never asks the set
/// for anything but `contains`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnicodeSet {
    ranges: Vec<(u32, u32)>,
}

impl UnicodeSet {
    /// Create a set from raw scalar ranges (inclusive bounds).
    ///
    /// Ranges may arrive unsorted, overlapping, or adjacent; they are
    /// normalized so `contains` can binary-search.
    pub fn new(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.retain(|(lo, hi)| lo <= hi);
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                // Coalesce overlapping and directly adjacent ranges
                Some((_, prev_hi)) if lo <= prev_hi.saturating_add(1) => {
                    if hi > *prev_hi {
                        *prev_hi = hi;
                    }
                }
                _ => merged.push((lo, hi)),
            }
        }

        Self { ranges: merged }
    }

    /// Create a set holding a single character.
    pub fn single(ch: char) -> Self {
        Self {
            ranges: vec![(ch as u32, ch as u32)],
        }
    }

    /// Create a set from character ranges.
    pub fn from_ranges(ranges: impl IntoIterator<Item = RangeInclusive<char>>) -> Self {
        Self::new(
            ranges
                .into_iter()
                .map(|r| (*r.start() as u32, *r.end() as u32))
                .collect(),
        )
    }

    /// True if `ch` is a member of this set.
    pub fn contains(&self, ch: char) -> bool {
        let cp = ch as u32;
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < cp {
                    Ordering::Less
                } else if lo > cp {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// True if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of coalesced ranges in the set.
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }
}
