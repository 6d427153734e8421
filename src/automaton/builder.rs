//! Trie construction and failure-link computation.
//!

use std::collections::VecDeque;

use super::state::{MatchItem, PatternId, State, StateId};
use super::Automaton;

/// Build an [`Automaton`] from an ordered list of byte patterns.
///
/// Construction is infallible for well-formed input (spec.md §4.1). A
/// pattern set large enough to overflow a 32-bit state id is a programming
/// error, not a recoverable condition.
pub fn build<P: AsRef<[u8]>>(patterns: impl IntoIterator<Item = P>) -> Automaton {
    // Step 1: allocate the three reserved states in order so their ids are
    // stable (failed=0, dead=1, start=2).
    let mut states = vec![
        State::new(0), // failed: never transitioned into
        State::new(0), // dead: filled in as a self-loop below
        State::new(0), // start
    ];

    // trie_edges records the *real* parent->child edges created while
    // inserting patterns, independent of the self-loop fill applied to the
    // start state afterwards. BFS for failure links walks these, grouped by
    // depth (the queue is FIFO and edges are pushed in insertion order, which
    // is breadth-first because each pattern is walked root-to-leaf).
    let mut trie_edges: Vec<(StateId, u8, StateId)> = Vec::new();

    // Step 2: build the trie.
    for (pattern_id, pattern) in patterns.into_iter().enumerate() {
        let pattern = pattern.as_ref();
        let mut current = StateId::START;
        let mut depth = 0u32;

        for &byte in pattern {
            let existing = states[current.index()].transitions.get(byte);

            let next = if existing != StateId::FAILED {
                existing
            } else {
                let new_id = StateId(states.len() as u32);
                states.push(State::new(depth + 1));
                states[current.index()].transitions.set(byte, new_id);
                trie_edges.push((current, byte, new_id));
                new_id
            };

            depth = states[next.index()].depth;
            current = next;
        }

        states[current.index()]
            .matches
            .push(MatchItem { pattern_id: pattern_id as PatternId, length: pattern.len() });
    }

    // Step 3: fill the start state's missing transitions with self-loops so
    // scanning never "falls off" the start state.
    for byte in 0u16..256 {
        let byte = byte as u8;
        if states[StateId::START.index()].transitions.get(byte) == StateId::FAILED {
            states[StateId::START.index()].transitions.set(byte, StateId::START);
        }
    }

    // Step 4: the dead state self-loops on every byte.
    for byte in 0u16..256 {
        states[StateId::DEAD.index()].transitions.set(byte as u8, StateId::DEAD);
    }
    states[StateId::DEAD.index()].fail = StateId::DEAD;
    states[StateId::START.index()].fail = StateId::START;

    // Step 5: breadth-first failure-link computation.
    //
    // Group trie_edges by parent depth so we process the BFS frontier in
    // order: depth-1 children first (who all fail directly to start), then
    // depth-2, and so on, chasing each parent's own failure link which is
    // guaranteed to already be resolved by the time we reach it.
    let mut queue: VecDeque<(StateId, u8, StateId)> = VecDeque::new();
    for &(parent, byte, child) in &trie_edges {
        if parent == StateId::START {
            states[child.index()].fail = StateId::START;
            let inherited = states[StateId::START.index()].matches.clone();
            states[child.index()].matches.extend(inherited);
            queue.push_back((parent, byte, child));
        }
    }

    // Build a depth-ordered edge index so deeper edges are only processed
    // once their parent's fail link has been finalized.
    let mut by_parent: std::collections::HashMap<StateId, Vec<(u8, StateId)>> =
        std::collections::HashMap::new();
    for &(parent, byte, child) in &trie_edges {
        by_parent.entry(parent).or_default().push((byte, child));
    }

    while let Some((_, _, child)) = queue.pop_front() {
        if let Some(children) = by_parent.get(&child) {
            for &(byte, grandchild) in children {
                let fail_target = next_state_no_fail(&states, states[child.index()].fail, byte);
                states[grandchild.index()].fail = fail_target;

                let inherited = states[fail_target.index()].matches.clone();
                states[grandchild.index()].matches.extend(inherited);

                queue.push_back((child, byte, grandchild));
            }
        }
    }

    debug_assert!(
        states.len() < (u32::MAX as usize) - 2,
        "automaton: pattern set produced more than 2^32-3 states"
    );

    // Step 6: bitset over states marking "this state has at least one match".
    let has_match: Vec<bool> = states.iter().map(|s| !s.matches.is_empty()).collect();

    Automaton { states, has_match }
}

/// Chase failure links from `state` until a non-failed transition on `byte`
/// is found. Guaranteed to terminate because the start state's transition
/// table has no `FAILED` entries (step 3 above fills every byte).
pub fn next_state_no_fail(states: &[State], mut state: StateId, byte: u8) -> StateId {
    loop {
        let target = states[state.index()].transitions.get(byte);
        if target != StateId::FAILED {
            return target;
        }

        state = states[state.index()].fail;
    }
}
