//! State and transition representations for the [`Automaton`](super::Automaton).
//!

/// An opaque reference to a state in an [`Automaton`](super::Automaton).
///
/// States are never referenced through owning pointers — only by their
/// 32-bit arena index — so the whole automaton is trivially `Send + Sync`
/// and shareable across threads.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StateId(pub u32);

impl StateId {
    /// Sentinel meaning "no such transition" inside a transition table. Never
    /// itself a reachable state.
    pub const FAILED: StateId = StateId(0);

    /// Terminal state, self-loops on every byte. Used by anchored automata
    /// once a match can no longer be extended.
    pub const DEAD: StateId = StateId(1);

    /// The automaton's single entry point.
    pub const START: StateId = StateId(2);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The identifier of a pattern supplied to [`Automaton::build`](super::Automaton::build).
///
/// Duplicated input patterns are assigned independent identifiers so callers
/// can distinguish which occurrence fired.
pub type PatternId = usize;

/// A match recorded in a state's match list: which pattern terminates here,
/// and how long it is (its start is derived at report time from the current
/// end offset).
#[derive(Clone, Copy, Debug)]
pub struct MatchItem {
    pub pattern_id: PatternId,
    pub length: usize,
}

/// Depth below which a state's transition table is stored densely.
///
/// Below this depth the branching factor near the root is high (most of the
/// alphabet is live), so a flat 256-entry table pays for itself; beyond it,
/// most states have only a handful of real transitions and a sorted sparse
/// list is both smaller and just as fast via binary search.
pub const DENSE_DEPTH_THRESHOLD: u32 = 3;

/// A state's outgoing transition table.
#[derive(Debug)]
pub enum Transitions {
    Dense(Box<[StateId; 256]>),
    Sparse(Vec<(u8, StateId)>),
}

impl Transitions {
    pub fn dense() -> Self {
        Transitions::Dense(Box::new([StateId::FAILED; 256]))
    }

    pub fn sparse() -> Self {
        Transitions::Sparse(Vec::new())
    }

    #[inline]
    pub fn get(&self, byte: u8) -> StateId {
        match self {
            Transitions::Dense(table) => table[byte as usize],
            Transitions::Sparse(entries) => entries
                .binary_search_by_key(&byte, |&(b, _)| b)
                .map(|idx| entries[idx].1)
                .unwrap_or(StateId::FAILED),
        }
    }

    pub fn set(&mut self, byte: u8, target: StateId) {
        match self {
            Transitions::Dense(table) => table[byte as usize] = target,
            Transitions::Sparse(entries) => match entries.binary_search_by_key(&byte, |&(b, _)| b) {
                Ok(idx) => entries[idx].1 = target,
                Err(idx) => entries.insert(idx, (byte, target)),
            },
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (u8, StateId)> + '_> {
        match self {
            Transitions::Dense(table) => Box::new(
                table
                    .iter()
                    .enumerate()
                    .filter(|(_, &s)| s != StateId::FAILED)
                    .map(|(b, &s)| (b as u8, s)),
            ),
            Transitions::Sparse(entries) => Box::new(entries.iter().copied()),
        }
    }
}

/// A single automaton state: its transitions, its failure link, and the
/// matches that fire upon entering it (own matches plus those inherited
/// through the failure chain, pre-copied at construction time).
#[derive(Debug)]
pub struct State {
    pub transitions: Transitions,
    pub fail: StateId,
    pub matches: Vec<MatchItem>,
    pub depth: u32,
}

impl State {
    pub fn new(depth: u32) -> Self {
        let transitions = if depth < DENSE_DEPTH_THRESHOLD {
            Transitions::dense()
        } else {
            Transitions::sparse()
        };

        State {
            transitions,
            fail: StateId::FAILED,
            matches: Vec::new(),
            depth,
        }
    }
}
