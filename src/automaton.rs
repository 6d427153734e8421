//! An Aho-Corasick automaton over the 256-byte alphabet (spec.md §4.1, "C1").
//!
//! States live in a contiguous arena and are referenced by 32-bit id rather
//! than by owning pointer, which makes the whole structure trivially
//! shareable (`Send + Sync`) across concurrently scanning threads (spec.md
//! §5, §9).

pub mod builder;
pub mod iter;
pub mod state;

use state::{PatternId, State, StateId};

pub use iter::OverlappingMatches;

/// A single reported occurrence: which pattern, and its half-open byte range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub pattern_id: PatternId,
    pub start: usize,
    pub end: usize,
}

/// A frozen, immutable-after-construction Aho-Corasick automaton.
#[derive(Debug)]
pub struct Automaton {
    states: Vec<State>,
    has_match: Vec<bool>,
}

impl Automaton {
    /// Build an automaton from an ordered, possibly empty, possibly
    /// duplicated list of byte patterns. Duplicates get independent pattern
    /// ids.
    pub fn build<P: AsRef<[u8]>>(patterns: impl IntoIterator<Item = P>) -> Automaton {
        builder::build(patterns)
    }

    #[inline]
    pub fn start(&self) -> StateId {
        StateId::START
    }

    #[inline]
    pub fn is_match_state(&self, id: StateId) -> bool {
        self.has_match[id.index()]
    }

    #[inline]
    pub fn matches_at(&self, id: StateId) -> &[state::MatchItem] {
        &self.states[id.index()].matches
    }

    /// Chase failure links from `state` until a non-failed transition on
    /// `byte` is found.
    #[inline]
    pub fn next_state_no_fail(&self, state: StateId, byte: u8) -> StateId {
        builder::next_state_no_fail(&self.states, state, byte)
    }

    /// Iterate every overlapping match over the full haystack, in position
    /// order, starting from the automaton's start state.
    pub fn overlapping_matches<'a>(&'a self, haystack: &'a [u8]) -> OverlappingMatches<'a> {
        OverlappingMatches::new(self, haystack)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_of(automaton: &Automaton, haystack: &[u8]) -> Vec<(usize, usize, usize)> {
        automaton
            .overlapping_matches(haystack)
            .map(|m| (m.pattern_id, m.start, m.end))
            .collect()
    }

    #[test]
    fn empty_patterns_yield_no_matches() {
        let automaton = Automaton::build(Vec::<&[u8]>::new());
        assert!(matches_of(&automaton, b"anything").is_empty());
    }

    #[test]
    fn empty_haystack_yields_no_matches() {
        let automaton = Automaton::build(vec![b"foo".as_slice()]);
        assert!(matches_of(&automaton, b"").is_empty());
    }

    #[test]
    fn single_pattern_matches_once() {
        let automaton = Automaton::build(vec![b"abc".as_slice()]);
        assert_eq!(matches_of(&automaton, b"xxabcxx"), vec![(0, 2, 5)]);
    }

    #[test]
    fn overlapping_occurrences_all_reported() {
        // "aa" inside "aaa" occurs at [0,2) and [1,3).
        let automaton = Automaton::build(vec![b"aa".as_slice()]);
        assert_eq!(matches_of(&automaton, b"aaa"), vec![(0, 0, 2), (0, 1, 3)]);
    }

    #[test]
    fn multiple_patterns_with_shared_suffix_via_failure_links() {
        // classic AC textbook example.
        let automaton = Automaton::build(vec![
            b"he".as_slice(),
            b"she".as_slice(),
            b"his".as_slice(),
            b"hers".as_slice(),
        ]);

        let found = matches_of(&automaton, b"ushers");
        // "she" at [1,4), "he" at [2,4), "hers" at [2,6)
        assert!(found.contains(&(1, 1, 4)));
        assert!(found.contains(&(0, 2, 4)));
        assert!(found.contains(&(3, 2, 6)));
    }

    #[test]
    fn duplicate_patterns_get_independent_ids() {
        let automaton = Automaton::build(vec![b"foo".as_slice(), b"foo".as_slice()]);
        let found = matches_of(&automaton, b"foo");
        assert_eq!(found.len(), 2);
        assert_ne!(found[0].0, found[1].0);
    }

    #[test]
    fn pattern_equal_to_entire_buffer() {
        let automaton = Automaton::build(vec![b"exact".as_slice()]);
        assert_eq!(matches_of(&automaton, b"exact"), vec![(0, 0, 5)]);
    }

    #[test]
    fn adjacent_repeated_patterns_all_reported() {
        let automaton = Automaton::build(vec![b"ab".as_slice()]);
        assert_eq!(
            matches_of(&automaton, b"abab"),
            vec![(0, 0, 2), (0, 2, 4)]
        );
    }

    #[test]
    fn completeness_over_dense_sparse_boundary() {
        // Force some states past the dense-depth threshold to exercise the
        // sparse transition table and its failure-link chasing.
        let patterns: Vec<&[u8]> = vec![
            b"aaaaaaaaaa",
            b"aaaaabbbbb",
            b"aaaaaccccc",
        ];
        let automaton = Automaton::build(patterns.clone());

        for (i, p) in patterns.iter().enumerate() {
            let found = matches_of(&automaton, p);
            assert!(found.contains(&(i, 0, p.len())), "pattern {i} not found in its own bytes");
        }
    }
}
