// Keytran Rule Engine
// Declaration-ordered rule groups and the top-level apply paths

use crate::rules::reorder::ReorderGroup;
use crate::rules::transform::TransformGroup;

/// One rule group in its declaration-order slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyGroup {
    Transform(TransformGroup),
    Reorder(ReorderGroup),
}

/// Result of the suffix-match apply path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Chars consumed, counted from the end of the input.
    pub consumed: usize,
    /// Replacement text for the consumed tail.
    pub output: String,
}

/// A loaded rule table: every transform and reorder group of one keyboard,
/// in source order.
///
/// Built once at keyboard-load time through the `add_*_group` methods and
/// logically immutable afterwards; it owns plain data with no interior
/// mutability, so a loaded table can be shared read-only across threads.
/// Every apply call is a pure function of the rule table and the buffer the
/// caller passes in; no state persists between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transforms {
    groups: Vec<AnyGroup>,
}

impl Transforms {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Append a transform group in source order.
    pub fn add_transform_group(&mut self, group: TransformGroup) {
        self.groups.push(AnyGroup::Transform(group));
    }

    /// Append a reorder group in source order.
    pub fn add_reorder_group(&mut self, group: ReorderGroup) {
        self.groups.push(AnyGroup::Reorder(group));
    }

    pub fn groups(&self) -> &[AnyGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Suffix-match path: attempt a replacement for the tail of `input`.
    ///
    /// Walks transform-kind groups only, in declaration order; the first
    /// group with a matching entry produces the result. None means no rule
    /// matched and the caller's buffer needs no change.
    pub fn apply(&self, input: &str) -> Option<Applied> {
        for (i, group) in self.groups.iter().enumerate() {
            if let AnyGroup::Transform(group) = group {
                if let Some((entry, consumed)) = group.find_match(input) {
                    log::trace!(
                        "group {} matched {:?} consuming {} chars",
                        i,
                        entry.from_text(),
                        consumed
                    );
                    return Some(Applied {
                        consumed,
                        output: entry.to_text().to_string(),
                    });
                }
            }
        }
        None
    }

    /// Bulk path: run every group, in declaration order, over the whole
    /// buffer. Transform groups substitute on the current tail; reorder
    /// groups re-sort matched spans in place. Returns true iff the text
    /// changed. Used for post-commit context correction and test harnesses.
    pub fn apply_in_place(&self, text: &mut String) -> bool {
        let mut changed = false;
        for group in &self.groups {
            match group {
                AnyGroup::Transform(group) => {
                    if let Some((entry, consumed)) = group.find_match(text) {
                        let out = entry.apply(text, consumed);
                        if out != *text {
                            *text = out;
                            changed = true;
                        }
                    }
                }
                AnyGroup::Reorder(group) => {
                    let mut buffer: Vec<char> = text.chars().collect();
                    if group.apply(&mut buffer) {
                        *text = buffer.into_iter().collect();
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}
