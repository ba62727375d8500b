//! Change streams and the recursive diff engine.
//!
//! A diff is an ordered mix of unchanged runs and (insert, delete) changes;
//! three-way merging adds a conflict variant carrying the two competing
//! alternatives. One sum type covers all three so consumers dispatch with a
//! single match.

use std::ops::Range;

use crate::errors::GaspraError;
use crate::lcs::find_lcs;
use crate::tokenizer::Token;

/// Which of the two edited sequences an operation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Left,
    Right,
}

/// One element of a change stream.
///
/// `diff` produces only runs and changes; `merge` may additionally produce
/// conflicts, whose two alternatives are ordered (left input, right input).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Segment<T> {
    /// Tokens carried over unchanged.
    Run(Vec<T>),
    /// Tokens inserted and deleted at one point; at least one side is
    /// non-empty.
    Change { insert: Vec<T>, delete: Vec<T> },
    /// Two irreconcilable alternatives for the same stretch of the
    /// ancestor.
    Conflict { left: Vec<T>, right: Vec<T> },
}

impl<T> Segment<T> {
    pub fn is_empty(&self) -> bool {
        match self {
            Segment::Run(tokens) => tokens.is_empty(),
            Segment::Change { insert, delete } => insert.is_empty() && delete.is_empty(),
            Segment::Conflict { left, right } => left.is_empty() && right.is_empty(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Segment::Conflict { .. })
    }

    /// Rebuilds the segment's token vectors through `f`, keeping its shape.
    /// Used to turn interned line ids back into text.
    pub fn map<U>(self, f: impl Fn(Vec<T>) -> Vec<U>) -> Segment<U> {
        match self {
            Segment::Run(tokens) => Segment::Run(f(tokens)),
            Segment::Change { insert, delete } => Segment::Change {
                insert: f(insert),
                delete: f(delete),
            },
            Segment::Conflict { left, right } => Segment::Conflict {
                left: f(left),
                right: f(right),
            },
        }
    }
}

/// True when any element of the stream is a conflict.
pub fn has_conflict<T>(stream: &[Segment<T>]) -> bool {
    stream.iter().any(Segment::is_conflict)
}

/// Rebuilds the modified sequence from a diff stream: runs plus insert
/// sides. Conflicts contribute their left alternative.
pub fn apply_forward<T: Token>(stream: &[Segment<T>]) -> Vec<T> {
    resolved(stream, Side::Left)
}

/// Rebuilds the original sequence from a diff stream: runs plus delete
/// sides. Conflicts contribute their right alternative.
pub fn apply_reverse<T: Token>(stream: &[Segment<T>]) -> Vec<T> {
    let mut output = Vec::new();
    for segment in stream {
        match segment {
            Segment::Run(tokens) => output.extend_from_slice(tokens),
            Segment::Change { delete, .. } => output.extend_from_slice(delete),
            Segment::Conflict { right, .. } => output.extend_from_slice(right),
        }
    }
    output
}

/// Flattens a merged stream into one sequence, taking the chosen side's
/// alternative wherever a conflict remains.
pub fn resolved<T: Token>(stream: &[Segment<T>], side: Side) -> Vec<T> {
    let mut output = Vec::new();
    for segment in stream {
        match segment {
            Segment::Run(tokens) => output.extend_from_slice(tokens),
            Segment::Change { insert, .. } => output.extend_from_slice(insert),
            Segment::Conflict { left, right } => match side {
                Side::Left => output.extend_from_slice(left),
                Side::Right => output.extend_from_slice(right),
            },
        }
    }
    output
}

/// Appends a segment, merging it into the previous one when both have the
/// same kind and dropping it when empty. Keeps streams free of adjacent
/// same-kind elements.
pub(crate) fn push_coalesced<T: Token>(output: &mut Vec<Segment<T>>, segment: Segment<T>) {
    if segment.is_empty() {
        return;
    }
    match (output.last_mut(), segment) {
        (Some(Segment::Run(tail)), Segment::Run(tokens)) => tail.extend(tokens),
        (
            Some(Segment::Change { insert, delete }),
            Segment::Change {
                insert: next_insert,
                delete: next_delete,
            },
        ) => {
            insert.extend(next_insert);
            delete.extend(next_delete);
        }
        (
            Some(Segment::Conflict { left, right }),
            Segment::Conflict {
                left: next_left,
                right: next_right,
            },
        ) => {
            left.extend(next_left);
            right.extend(next_right);
        }
        (_, segment) => output.push(segment),
    }
}

enum Task {
    Split {
        original: Range<usize>,
        modified: Range<usize>,
    },
    EmitRun(Range<usize>),
}

/// Computes the change stream turning `original` into `modified`.
///
/// The two sequences are split around their longest common substring and
/// the halves handled the same way; slices with nothing in common become a
/// single change. An explicit work stack replaces the recursion so deeply
/// nested splits cannot exhaust the call stack, with an emission slot
/// keeping the output ordered left to right over `original`.
pub fn diff<T>(original: &[T], modified: &[T]) -> Result<Vec<Segment<T>>, GaspraError>
where
    T: Token,
{
    let mut output = Vec::new();
    let mut tasks = vec![Task::Split {
        original: 0..original.len(),
        modified: 0..modified.len(),
    }];

    while let Some(task) = tasks.pop() {
        match task {
            Task::EmitRun(range) => {
                push_coalesced(&mut output, Segment::Run(original[range].to_vec()));
            }
            Task::Split {
                original: original_range,
                modified: modified_range,
            } => {
                if original_range.is_empty() && modified_range.is_empty() {
                    continue;
                }
                let common = find_lcs(
                    &original[original_range.clone()],
                    &modified[modified_range.clone()],
                )?;
                if common.length == 0 {
                    push_coalesced(
                        &mut output,
                        Segment::Change {
                            insert: modified[modified_range].to_vec(),
                            delete: original[original_range].to_vec(),
                        },
                    );
                    continue;
                }

                let run_start = original_range.start + common.start_in_first;
                let matched_start = modified_range.start + common.start_in_second;
                tasks.push(Task::Split {
                    original: run_start + common.length..original_range.end,
                    modified: matched_start + common.length..modified_range.end,
                });
                tasks.push(Task::EmitRun(run_start..run_start + common.length));
                tasks.push(Task::Split {
                    original: original_range.start..run_start,
                    modified: modified_range.start..matched_start,
                });
            }
        }
    }
    Ok(output)
}
