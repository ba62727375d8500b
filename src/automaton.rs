//! Suffix automaton: the minimal deterministic acceptor of every substring
//! of one indexed token sequence, built online in amortized linear time.
//!
//! States live in a contiguous arena and refer to each other through `u32`
//! handles, so suffix links and edge redirections during cloning are plain
//! index writes rather than shared pointers.

use std::collections::HashMap;

use crate::errors::GaspraError;
use crate::tokenizer::Token;

pub(crate) type StateId = u32;

const ROOT: StateId = 0;
const NO_LINK: StateId = StateId::MAX;

/// Longest sequence the automaton can index. Construction creates at most
/// `2n - 1` states and one handle value is reserved as the missing-link
/// sentinel.
pub const MAX_SEQUENCE_LENGTH: usize = (StateId::MAX as usize - 1) / 2;

#[derive(Debug, Clone, PartialEq, Eq)]
struct State<T>
where
    T: Token,
{
    /// Length of the longest sequence that ends at this state.
    length: usize,
    /// Suffix link, or `NO_LINK` for the initial state.
    link: StateId,
    /// End index of the first completed occurrence of any sequence ending
    /// at this state.
    first_endpos: usize,
    edges: HashMap<T, StateId>,
}

/// Location of the longest fragment shared by the indexed sequence and a
/// query, as reported by [`SuffixAutomaton::longest_match_in`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchLocation {
    pub start_in_indexed: usize,
    pub start_in_query: usize,
    pub length: usize,
}

/// A suffix automaton over one token sequence. Immutable once built, so it
/// can be queried freely, including from several threads at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixAutomaton<T>
where
    T: Token,
{
    states: Vec<State<T>>,
    last: StateId,
    indexed_len: usize,
}

impl<T> SuffixAutomaton<T>
where
    T: Token,
{
    /// Builds the automaton by appending the sequence token by token.
    ///
    /// Fails with [`GaspraError::SequenceTooLong`] when the sequence would
    /// need more states than the handle type can address.
    pub fn build(sequence: &[T]) -> Result<Self, GaspraError> {
        if sequence.len() > MAX_SEQUENCE_LENGTH {
            return Err(GaspraError::SequenceTooLong {
                length: sequence.len(),
                max: MAX_SEQUENCE_LENGTH,
            });
        }

        let mut automaton = Self {
            states: Vec::with_capacity(2 * sequence.len() + 1),
            last: ROOT,
            indexed_len: sequence.len(),
        };
        automaton.states.push(State {
            length: 0,
            link: NO_LINK,
            first_endpos: 0,
            edges: HashMap::new(),
        });

        for token in sequence {
            automaton.extend(token.clone());
        }
        Ok(automaton)
    }

    /// Number of tokens in the indexed sequence.
    pub fn len(&self) -> usize {
        self.indexed_len
    }

    pub fn is_empty(&self) -> bool {
        self.indexed_len == 0
    }

    /// Number of automaton states, bounded by `2n - 1` for `n >= 2`.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Whether `pattern` occurs anywhere in the indexed sequence.
    pub fn contains(&self, pattern: &[T]) -> bool {
        self.walk(pattern).is_some()
    }

    /// Start index of the first occurrence of `pattern` in the indexed
    /// sequence, or `None` when it does not occur.
    pub fn find_first_start(&self, pattern: &[T]) -> Option<usize> {
        self.walk(pattern)
            .map(|state| self.states[state as usize].first_endpos - pattern.len())
    }

    /// Start indices of every occurrence of `pattern` in the indexed
    /// sequence, sorted ascending. Collected by walking the reverse
    /// suffix-link tree under the matched state.
    pub fn find_all_starts(&self, pattern: &[T]) -> Vec<usize> {
        let Some(matched) = self.walk(pattern) else {
            return Vec::new();
        };

        let mut children: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
        for (id, state) in self.states.iter().enumerate() {
            if state.link != NO_LINK {
                children[state.link as usize].push(id as StateId);
            }
        }

        let mut starts = Vec::new();
        let mut to_visit = vec![matched];
        while let Some(state) = to_visit.pop() {
            starts.push(self.states[state as usize].first_endpos - pattern.len());
            to_visit.extend(children[state as usize].iter().copied());
        }
        starts.sort_unstable();
        starts.dedup();
        starts
    }

    /// Finds the longest substring of `query` that also occurs in the
    /// indexed sequence.
    ///
    /// The automaton is traversed with a running match length; on a missing
    /// edge the walker falls back along suffix links, shrinking the match
    /// to the fallback state's length. Ties go to the earliest end in the
    /// query because only strict improvements are recorded. The zero
    /// location is returned when the sequences share no token.
    pub fn longest_match_in(&self, query: &[T]) -> MatchLocation {
        let mut best = MatchLocation::default();
        let mut current = ROOT;
        let mut length = 0usize;

        for (position, token) in query.iter().enumerate() {
            loop {
                if let Some(&next) = self.states[current as usize].edges.get(token) {
                    current = next;
                    length += 1;
                    break;
                }
                match self.link_of(current) {
                    Some(link) => {
                        current = link;
                        length = self.states[current as usize].length;
                    }
                    // The initial state has no edge for this token either;
                    // the match restarts empty.
                    None => break,
                }
            }

            if length > best.length {
                best = MatchLocation {
                    start_in_indexed: self.states[current as usize].first_endpos - length,
                    start_in_query: position + 1 - length,
                    length,
                };
            }
        }
        best
    }

    /// For every state, the longest match landing on it while scanning
    /// `query`, propagated down the suffix-link tree so each state holds
    /// the supremum over its descendants, capped at its own length.
    pub(crate) fn match_lengths(&self, query: &[T]) -> Vec<usize> {
        let mut best = vec![0usize; self.states.len()];
        let mut current = ROOT;
        let mut length = 0usize;

        for token in query {
            loop {
                if let Some(&next) = self.states[current as usize].edges.get(token) {
                    current = next;
                    length += 1;
                    break;
                }
                match self.link_of(current) {
                    Some(link) => {
                        current = link;
                        length = self.states[current as usize].length;
                    }
                    None => break,
                }
            }
            if length > best[current as usize] {
                best[current as usize] = length;
            }
        }

        for state in self.states_by_length_desc() {
            if let Some(link) = self.link_of(state) {
                let inherited = best[state as usize].min(self.states[link as usize].length);
                if inherited > best[link as usize] {
                    best[link as usize] = inherited;
                }
            }
        }
        best
    }

    pub(crate) fn state_length(&self, state: usize) -> usize {
        self.states[state].length
    }

    pub(crate) fn state_first_endpos(&self, state: usize) -> usize {
        self.states[state].first_endpos
    }

    fn extend(&mut self, token: T) {
        let new_length = self.states[self.last as usize].length + 1;
        let current = self.push_state(State {
            length: new_length,
            link: NO_LINK,
            first_endpos: new_length,
            edges: HashMap::new(),
        });

        let mut walker = Some(self.last);
        while let Some(state) = walker {
            if self.states[state as usize].edges.contains_key(&token) {
                break;
            }
            self.states[state as usize].edges.insert(token.clone(), current);
            walker = self.link_of(state);
        }

        match walker {
            None => self.states[current as usize].link = ROOT,
            Some(parent) => {
                let existing = self.states[parent as usize].edges[&token];
                if self.states[existing as usize].length
                    == self.states[parent as usize].length + 1
                {
                    self.states[current as usize].link = existing;
                } else {
                    let clone = self.insert_clone(parent, existing, &token);
                    self.states[current as usize].link = clone;
                }
            }
        }

        self.last = current;
    }

    /// Splits `target`'s equivalence class: a clone takes over the strings
    /// of length up to `parent.length + 1`, inheriting `target`'s edges,
    /// link and first end position, and every `token`-edge on the
    /// suffix-link chain that pointed at `target` is redirected to it.
    fn insert_clone(&mut self, parent: StateId, target: StateId, token: &T) -> StateId {
        let cloned = State {
            length: self.states[parent as usize].length + 1,
            link: self.states[target as usize].link,
            first_endpos: self.states[target as usize].first_endpos,
            edges: self.states[target as usize].edges.clone(),
        };
        let clone = self.push_state(cloned);
        self.states[target as usize].link = clone;

        let mut walker = Some(parent);
        while let Some(state) = walker {
            match self.states[state as usize].edges.get_mut(token) {
                Some(edge) if *edge == target => *edge = clone,
                _ => break,
            }
            walker = self.link_of(state);
        }
        clone
    }

    fn walk(&self, pattern: &[T]) -> Option<StateId> {
        let mut current = ROOT;
        for token in pattern {
            current = *self.states[current as usize].edges.get(token)?;
        }
        Some(current)
    }

    fn link_of(&self, state: StateId) -> Option<StateId> {
        match self.states[state as usize].link {
            NO_LINK => None,
            link => Some(link),
        }
    }

    fn push_state(&mut self, state: State<T>) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(state);
        id
    }

    fn states_by_length_desc(&self) -> Vec<StateId> {
        let mut order: Vec<StateId> = (0..self.states.len() as StateId).collect();
        order.sort_unstable_by(|a, b| {
            self.states[*b as usize]
                .length
                .cmp(&self.states[*a as usize].length)
        });
        order
    }
}
