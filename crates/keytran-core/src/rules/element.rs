// Keytran Reorder Elements
// Match units, element lists, and sort keys for reorder rules

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::uset::UnicodeSet;

/// What an element matches: one scalar or a set membership test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Char(char),
    Set(UnicodeSet),
}

/// One unit of a reorder pattern: a literal character or a character-class
/// test, plus the ordering metadata the sort-key computation reads.
///
/// Immutable after construction; owned by the [`ElementList`] that contains
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    order: i8,
    tertiary: i8,
    prebase: bool,
    tertiary_base: bool,
}

impl Element {
    /// Create an element matching a single character, with default weights.
    pub fn from_char(ch: char) -> Self {
        Self {
            kind: ElementKind::Char(ch),
            order: 0,
            tertiary: 0,
            prebase: false,
            tertiary_base: false,
        }
    }

    /// Create an element matching any member of `set`, with default weights.
    pub fn from_set(set: UnicodeSet) -> Self {
        Self {
            kind: ElementKind::Set(set),
            order: 0,
            tertiary: 0,
            prebase: false,
            tertiary_base: false,
        }
    }

    /// Set the primary order weight.
    pub fn with_order(mut self, order: i8) -> Self {
        self.order = order;
        self
    }

    /// Set the tertiary weight.
    pub fn with_tertiary(mut self, tertiary: i8) -> Self {
        self.tertiary = tertiary;
        self
    }

    /// Mark this element as anchoring a preceding context.
    pub fn with_prebase(mut self, prebase: bool) -> Self {
        self.prebase = prebase;
        self
    }

    /// Mark this element as the anchor for tertiary-weight assignment.
    pub fn with_tertiary_base(mut self, tertiary_base: bool) -> Self {
        self.tertiary_base = tertiary_base;
        self
    }

    /// True if this element is a set test rather than a literal character.
    pub fn is_set(&self) -> bool {
        matches!(self.kind, ElementKind::Set(_))
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn is_prebase(&self) -> bool {
        self.prebase
    }

    pub fn is_tertiary_base(&self) -> bool {
        self.tertiary_base
    }

    /// Primary order weight (default 0).
    pub fn order(&self) -> i8 {
        self.order
    }

    /// Tertiary weight (default 0).
    pub fn tertiary(&self) -> i8 {
        self.tertiary
    }

    /// True if `ch` matches this element.
    pub fn matches(&self, ch: char) -> bool {
        match &self.kind {
            ElementKind::Char(c) => *c == ch,
            ElementKind::Set(set) => set.contains(ch),
        }
    }
}

/// Per-character weight tuple used to stably permute a matched span.
///
/// Ordering compares `(primary, secondary, tertiary, quaternary)`
/// lexicographically; `ch` is payload, not a weight. `secondary` and
/// `quaternary` start out as the character's buffer position, which is what
/// keeps the sort stable with respect to the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub ch: char,
    pub primary: i8,
    pub secondary: usize,
    pub tertiary: i8,
    pub quaternary: usize,
}

/// Sort keys for a whole buffer. Reorder spans are short, so the backing
/// storage stays on the stack for typical context lengths.
pub type SortKeys = SmallVec<[SortKey; 8]>;

impl SortKey {
    /// Baseline keys for a buffer: zero weights, position indices.
    pub fn baseline(buffer: &[char]) -> SortKeys {
        buffer
            .iter()
            .enumerate()
            .map(|(i, &ch)| SortKey {
                ch,
                primary: 0,
                secondary: i,
                tertiary: 0,
                quaternary: i,
            })
            .collect()
    }

    /// Weight-only comparison; `ch` does not participate.
    pub fn compare(&self, other: &Self) -> Ordering {
        (self.primary, self.secondary, self.tertiary, self.quaternary).cmp(&(
            other.primary,
            other.secondary,
            other.tertiary,
            other.quaternary,
        ))
    }
}

/// An ordered sequence of elements, authored front-to-back and matched
/// back-to-front against the tail of a buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementList {
    elements: Vec<Element>,
}

impl ElementList {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Match this list against the end of `buffer`.
    ///
    /// The last element is compared with the last character, walking
    /// backward; every element must match its aligned character, with no
    /// alternate-alignment search. Returns the count of trailing characters
    /// consumed (the list length), or 0 on no match. Buffers shorter than
    /// the list always fail.
    pub fn match_end(&self, buffer: &[char]) -> usize {
        if self.elements.is_empty() || self.elements.len() > buffer.len() {
            return 0;
        }
        for (element, &ch) in self.elements.iter().rev().zip(buffer.iter().rev()) {
            if !element.matches(ch) {
                return 0;
            }
        }
        self.elements.len()
    }

    /// Sort keys for `buffer` with the trailing span keyed by this list.
    ///
    /// The list must already match the end of `buffer` (see [`match_end`]);
    /// positions before the span keep their baseline keys.
    ///
    /// [`match_end`]: ElementList::match_end
    pub fn get_sort_key(&self, buffer: &[char]) -> SortKeys {
        let mut keys = SortKey::baseline(buffer);
        if self.elements.len() <= buffer.len() {
            let offset = buffer.len() - self.elements.len();
            self.update_sort_key(offset, buffer, &mut keys);
        }
        keys
    }

    /// Re-key the span of `keys` covered by this list, starting at `offset`.
    ///
    /// Each character takes its matching element's order as the primary
    /// weight and its own position as secondary and quaternary. An element
    /// flagged as tertiary base opens a cluster: subsequent elements with a
    /// nonzero tertiary weight key their characters to the base (primary
    /// and secondary from the base's key, their own tertiary weight, and
    /// quaternary rewritten to the base's position), so the cluster travels
    /// through primary reordering as one unit, internally ordered by
    /// tertiary weight and then by the stable sort.
    pub fn update_sort_key(&self, offset: usize, buffer: &[char], keys: &mut SortKeys) {
        // Position and primary weight of the open tertiary cluster, if any
        let mut base: Option<(usize, i8)> = None;
        for (i, element) in self.elements.iter().enumerate() {
            let pos = offset + i;
            debug_assert!(element.matches(buffer[pos]));
            let key = &mut keys[pos];
            key.secondary = pos;
            key.quaternary = pos;
            if element.is_tertiary_base() {
                base = Some((pos, element.order()));
                key.primary = element.order();
                key.tertiary = 0;
            } else if element.tertiary() != 0 {
                if let Some((base_pos, base_primary)) = base {
                    key.primary = base_primary;
                    key.secondary = base_pos;
                    key.tertiary = element.tertiary();
                    key.quaternary = base_pos;
                } else {
                    // Tertiary weight with no base in range acts alone
                    key.primary = element.order();
                    key.tertiary = element.tertiary();
                }
            } else {
                key.primary = element.order();
                key.tertiary = 0;
            }
        }
    }
}
