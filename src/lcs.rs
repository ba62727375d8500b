//! Longest-common-substring queries over two or more sequences.

use crate::automaton::SuffixAutomaton;
use crate::errors::GaspraError;
use crate::tokenizer::Token;

/// Location of the longest substring shared by two sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommonSubstring {
    pub start_in_first: usize,
    pub start_in_second: usize,
    pub length: usize,
}

/// Finds the longest common substring of two sequences.
///
/// The automaton is built over the shorter sequence (the second one when
/// they tie) and queried with the other, which keeps its size down and
/// makes ties resolve to the earliest start in the scanned sequence.
/// Length 0 with zero offsets means the sequences share no token.
pub fn find_lcs<T>(first: &[T], second: &[T]) -> Result<CommonSubstring, GaspraError>
where
    T: Token,
{
    if second.len() <= first.len() {
        let automaton = SuffixAutomaton::build(second)?;
        let found = automaton.longest_match_in(first);
        Ok(CommonSubstring {
            start_in_first: found.start_in_query,
            start_in_second: found.start_in_indexed,
            length: found.length,
        })
    } else {
        let automaton = SuffixAutomaton::build(first)?;
        let found = automaton.longest_match_in(second);
        Ok(CommonSubstring {
            start_in_first: found.start_in_indexed,
            start_in_second: found.start_in_query,
            length: found.length,
        })
    }
}

/// Finds the longest token run present in every sequence of the family.
///
/// Returns the start of its first occurrence in each sequence plus its
/// length. The shortest member serves as the reference: each other
/// sequence is scanned once against the reference automaton, the per-state
/// match maxima are pushed down the suffix-link tree, and the minimum over
/// all sequences is maximised. An empty family yields `([], 0)`; a family
/// with no shared token yields all-zero starts and length 0.
pub fn find_lcs_multiple<T, S>(sequences: &[S]) -> Result<(Vec<usize>, usize), GaspraError>
where
    T: Token,
    S: AsRef<[T]>,
{
    if sequences.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let mut reference_index = 0;
    for (index, sequence) in sequences.iter().enumerate() {
        if sequence.as_ref().len() < sequences[reference_index].as_ref().len() {
            reference_index = index;
        }
    }
    let reference = sequences[reference_index].as_ref();
    let automaton = SuffixAutomaton::build(reference)?;

    // Per state: the longest run ending there that occurs in *every*
    // sequence, starting from the state's own length as the upper bound.
    let mut common: Vec<usize> = (0..automaton.state_count())
        .map(|state| automaton.state_length(state))
        .collect();
    for (index, sequence) in sequences.iter().enumerate() {
        if index == reference_index {
            continue;
        }
        let lengths = automaton.match_lengths(sequence.as_ref());
        for (slot, length) in common.iter_mut().zip(lengths) {
            *slot = (*slot).min(length);
        }
    }

    let mut best_length = 0;
    let mut best_start = 0;
    for state in 0..automaton.state_count() {
        let length = common[state];
        if length == 0 {
            continue;
        }
        let start = automaton.state_first_endpos(state) - length;
        if length > best_length || (length == best_length && start < best_start) {
            best_length = length;
            best_start = start;
        }
    }

    if best_length == 0 {
        return Ok((vec![0; sequences.len()], 0));
    }

    let pattern = &reference[best_start..best_start + best_length];
    let mut starts = Vec::with_capacity(sequences.len());
    for (index, sequence) in sequences.iter().enumerate() {
        let start = if index == reference_index {
            automaton.find_first_start(pattern)
        } else {
            SuffixAutomaton::build(sequence.as_ref())?.find_first_start(pattern)
        };
        // The run is common to the whole family, so every lookup hits.
        starts.push(start.unwrap_or(0));
    }
    Ok((starts, best_length))
}
