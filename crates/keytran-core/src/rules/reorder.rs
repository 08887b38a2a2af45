// Keytran Reorder Rules
// Span matching and stable sort-key reordering of combining marks

use crate::rules::element::{ElementList, SortKey};

/// One reorder rule: a pattern of elements to re-sort, optionally gated by a
/// preceding context that must match but is never itself reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderEntry {
    elements: ElementList,
    before: Option<ElementList>,
}

impl ReorderEntry {
    pub fn new(elements: ElementList) -> Self {
        Self {
            elements,
            before: None,
        }
    }

    pub fn with_before(elements: ElementList, before: ElementList) -> Self {
        // An empty context list constrains nothing
        let before = if before.is_empty() { None } else { Some(before) };
        Self { elements, before }
    }

    pub fn elements(&self) -> &ElementList {
        &self.elements
    }

    pub fn before(&self) -> Option<&ElementList> {
        self.before.as_ref()
    }

    /// Match this entry with its pattern aligned at `offset`.
    ///
    /// The `before` context, if present, must match ending exactly at
    /// `offset`; only then is the pattern tried against the characters at
    /// `[offset, offset + len)`. Returns the matched length of the pattern
    /// portion only, or 0. An absent `before` gates nothing.
    pub fn match_end(&self, buffer: &[char], offset: usize) -> usize {
        let len = self.elements.len();
        if len == 0 || offset + len > buffer.len() {
            return 0;
        }
        if let Some(before) = &self.before {
            if before.match_end(&buffer[..offset]) == 0 {
                return 0;
            }
        }
        self.elements.match_end(&buffer[..offset + len])
    }

    /// Reorder the rightmost span this entry matches.
    ///
    /// Computes sort keys for the span and stable-sorts its characters by
    /// key ascending, so equal keys keep their input order. Returns true if
    /// any character moved. The span is permuted in place: no characters are
    /// added, removed, or duplicated.
    pub fn apply(&self, buffer: &mut Vec<char>) -> bool {
        let len = self.elements.len();
        if len == 0 || len > buffer.len() {
            return false;
        }

        let mut matched = None;
        for offset in (0..=buffer.len() - len).rev() {
            if self.match_end(buffer, offset) > 0 {
                matched = Some(offset);
                break;
            }
        }
        let offset = match matched {
            Some(offset) => offset,
            None => return false,
        };

        let mut keys = SortKey::baseline(buffer);
        self.elements.update_sort_key(offset, buffer, &mut keys);

        let span = &mut keys[offset..offset + len];
        span.sort_by(|a, b| a.compare(b));

        let mut changed = false;
        for (i, key) in span.iter().enumerate() {
            if buffer[offset + i] != key.ch {
                buffer[offset + i] = key.ch;
                changed = true;
            }
        }
        changed
    }
}

/// An ordered group of reorder entries, applied to a fixed point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderGroup {
    entries: Vec<ReorderEntry>,
}

impl ReorderGroup {
    pub fn new(entries: Vec<ReorderEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: ReorderEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ReorderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the group's entries until the buffer stops changing.
    ///
    /// Entries are tried in declaration order; the first that reorders
    /// anything restarts the scan from the top, since a reorder can expose
    /// new adjacent matches. A full pass with no change ends the loop.
    /// Returns true iff at least one reordering occurred.
    ///
    /// A rule set whose entries keep undoing each other would never settle;
    /// that is an authoring defect, and the pass count is capped in
    /// proportion to buffer length and entry count so it cannot hang the
    /// caller.
    pub fn apply(&self, buffer: &mut Vec<char>) -> bool {
        if self.entries.is_empty() || buffer.is_empty() {
            return false;
        }

        let max_passes = buffer.len() * self.entries.len() + 1;
        let mut passes = 0usize;
        let mut any = false;
        'rescan: loop {
            if passes >= max_passes {
                log::warn!(
                    "reorder group did not settle after {} passes over {} chars; stopping",
                    passes,
                    buffer.len()
                );
                break;
            }
            passes += 1;
            for (i, entry) in self.entries.iter().enumerate() {
                if entry.apply(buffer) {
                    log::trace!("reorder entry {} changed the buffer", i);
                    any = true;
                    continue 'rescan;
                }
            }
            break;
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::element::Element;
    use crate::uset::UnicodeSet;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn text(buffer: &[char]) -> String {
        buffer.iter().collect()
    }

    fn ordered_pair() -> ElementList {
        // Matches "BA" and sorts it to "AB"
        ElementList::new(vec![
            Element::from_char('B').with_order(2),
            Element::from_char('A').with_order(1),
        ])
    }

    #[test]
    fn test_entry_match_end_at_offset() {
        let entry = ReorderEntry::new(ordered_pair());
        let buffer = chars("xBA");
        assert_eq!(entry.match_end(&buffer, 1), 2);
        assert_eq!(entry.match_end(&buffer, 0), 0);
        assert_eq!(entry.match_end(&buffer, 2), 0);
    }

    #[test]
    fn test_entry_before_context_gates() {
        let before = ElementList::new(vec![Element::from_char('x')]);
        let entry = ReorderEntry::with_before(ordered_pair(), before);
        assert_eq!(entry.match_end(&chars("xBA"), 1), 2);
        assert_eq!(entry.match_end(&chars("yBA"), 1), 0);
        // Context cannot match before the start of the buffer
        assert_eq!(entry.match_end(&chars("BA"), 0), 0);
    }

    #[test]
    fn test_entry_apply_sorts_by_primary() {
        let entry = ReorderEntry::new(ordered_pair());
        let mut buffer = chars("kBA");
        assert!(entry.apply(&mut buffer));
        assert_eq!(text(&buffer), "kAB");
    }

    #[test]
    fn test_entry_apply_already_sorted_reports_no_change() {
        let list = ElementList::new(vec![
            Element::from_char('A').with_order(1),
            Element::from_char('B').with_order(2),
        ]);
        let entry = ReorderEntry::new(list);
        let mut buffer = chars("AB");
        assert!(!entry.apply(&mut buffer));
        assert_eq!(text(&buffer), "AB");
    }

    #[test]
    fn test_entry_apply_rightmost_match() {
        let entry = ReorderEntry::new(ordered_pair());
        let mut buffer = chars("BAxBA");
        assert!(entry.apply(&mut buffer));
        // Only the rightmost occurrence is reordered per application
        assert_eq!(text(&buffer), "BAxAB");
    }

    #[test]
    fn test_entry_apply_is_permutation() {
        let marks = UnicodeSet::from_ranges(vec!['\u{0300}'..='\u{036F}']);
        let list = ElementList::new(vec![
            Element::from_set(marks.clone()).with_order(2),
            Element::from_set(marks).with_order(1),
        ]);
        let entry = ReorderEntry::new(list);
        let mut buffer = chars("e\u{0301}\u{0300}");
        let mut before_sorted = buffer.clone();
        before_sorted.sort_unstable();
        entry.apply(&mut buffer);
        let mut after_sorted = buffer.clone();
        after_sorted.sort_unstable();
        assert_eq!(before_sorted, after_sorted);
    }

    #[test]
    fn test_group_first_entry_wins() {
        let swap_ba = ReorderEntry::new(ordered_pair());
        let swap_cb = ReorderEntry::new(ElementList::new(vec![
            Element::from_char('C').with_order(2),
            Element::from_char('B').with_order(1),
        ]));
        // Both entries match "CBA"; declaration order decides which span is
        // reordered first, and after that neither matches again.
        let group = ReorderGroup::new(vec![swap_ba, swap_cb]);
        let mut buffer = chars("CBA");
        assert!(group.apply(&mut buffer));
        assert_eq!(text(&buffer), "CAB");
    }

    #[test]
    fn test_group_cyclic_rules_terminate() {
        // Two entries that undo each other would oscillate forever; the
        // pass cap stops the loop and the buffer stays a permutation.
        let swap_ba = ReorderEntry::new(ordered_pair());
        let swap_ab = ReorderEntry::new(ElementList::new(vec![
            Element::from_char('A').with_order(2),
            Element::from_char('B').with_order(1),
        ]));
        let group = ReorderGroup::new(vec![swap_ba, swap_ab]);
        let mut buffer = chars("BA");
        assert!(group.apply(&mut buffer));
        let mut sorted = buffer.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!['A', 'B']);
    }

    #[test]
    fn test_group_fixed_point() {
        let group = ReorderGroup::new(vec![ReorderEntry::new(ordered_pair())]);
        let mut buffer = chars("BA");
        assert!(group.apply(&mut buffer));
        assert_eq!(text(&buffer), "AB");
        // The output of a full pass is a fixed point of the rule set
        assert!(!group.apply(&mut buffer));
        assert_eq!(text(&buffer), "AB");
    }

    #[test]
    fn test_group_cascading_matches() {
        // Sorting the rightmost pair can expose a new match to the left;
        // the rescan picks it up until the whole run is ascending.
        let mut entries = Vec::new();
        for (hi, lo) in [('2', '1'), ('3', '1'), ('3', '2')] {
            entries.push(ReorderEntry::new(ElementList::new(vec![
                Element::from_char(hi).with_order(2),
                Element::from_char(lo).with_order(1),
            ])));
        }
        let group = ReorderGroup::new(entries);
        let mut buffer = chars("321");
        assert!(group.apply(&mut buffer));
        assert_eq!(text(&buffer), "123");
    }

    #[test]
    fn test_group_empty_inputs() {
        let group = ReorderGroup::default();
        let mut buffer = chars("abc");
        assert!(!group.apply(&mut buffer));

        let group = ReorderGroup::new(vec![ReorderEntry::new(ordered_pair())]);
        let mut empty: Vec<char> = Vec::new();
        assert!(!group.apply(&mut empty));
    }

    #[test]
    fn test_tertiary_cluster_travels_with_base() {
        // Pattern: low-order consonant, then a base with two marks keyed to
        // it. After sorting, the consonant moves in front and the cluster
        // stays contiguous in original mark order.
        let list = ElementList::new(vec![
            Element::from_char('k').with_order(2).with_tertiary_base(true),
            Element::from_char('\u{0301}').with_tertiary(1),
            Element::from_char('\u{0300}').with_tertiary(1),
            Element::from_char('m').with_order(1),
        ]);
        let entry = ReorderEntry::new(list);
        let mut buffer = chars("k\u{0301}\u{0300}m");
        assert!(entry.apply(&mut buffer));
        assert_eq!(text(&buffer), "mk\u{0301}\u{0300}");
    }
}
