//! Three-way merge of two change streams sharing a common ancestor.
//!
//! Both edited versions are diffed against the ancestor; the two streams
//! are then consumed left to right in lockstep, each fragment split at the
//! other side's boundaries. Edits that touch disjoint stretches of the
//! ancestor, or make the same change, merge silently; overlapping
//! disagreements become conflict segments carrying both alternatives.

use crate::changeset::{diff, push_coalesced, Segment, Side};
use crate::errors::GaspraError;
use crate::tokenizer::Token;

/// Fragment consumed by the merge walker: a run over the ancestor or a
/// change against it. Conflicts exist only on the output side, so the
/// walker cannot receive one by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment<T> {
    Copy(Vec<T>),
    Change { insert: Vec<T>, delete: Vec<T> },
}

impl<T: Token> Fragment<T> {
    /// Width of the ancestor range this fragment occupies.
    fn ancestor_len(&self) -> usize {
        match self {
            Fragment::Copy(tokens) => tokens.len(),
            Fragment::Change { delete, .. } => delete.len(),
        }
    }

    /// The tokens this fragment contributes to the merged result.
    fn into_insert_side(self) -> Vec<T> {
        match self {
            Fragment::Copy(tokens) => tokens,
            Fragment::Change { insert, .. } => insert,
        }
    }

    fn into_segment(self) -> Segment<T> {
        match self {
            Fragment::Copy(tokens) => Segment::Run(tokens),
            Fragment::Change { insert, delete } => Segment::Change { insert, delete },
        }
    }
}

/// One walker step: at most one emitted segment plus the unconsumed tails
/// of the two input fragments.
struct Step<T> {
    output: Option<Segment<T>>,
    left_tail: Option<Fragment<T>>,
    right_tail: Option<Fragment<T>>,
    within_conflict: bool,
}

/// Merges two descendants of `ancestor` into a single change stream.
///
/// The stream's runs and changes describe the merged result against the
/// ancestor; conflict segments carry the left and right alternative for
/// the stretches where the two edits genuinely disagree. Every input
/// produces some stream, so the only failure is an oversized input.
pub fn merge<T>(
    ancestor: &[T],
    left: &[T],
    right: &[T],
) -> Result<Vec<Segment<T>>, GaspraError>
where
    T: Token,
{
    let mut left_fragments = fragment_stack(diff(ancestor, left)?);
    let mut right_fragments = fragment_stack(diff(ancestor, right)?);

    let mut raw = Vec::new();
    let mut within_conflict = false;

    loop {
        if left_fragments.is_empty() || right_fragments.is_empty() {
            break;
        }
        let (Some(left_fragment), Some(right_fragment)) =
            (left_fragments.pop(), right_fragments.pop())
        else {
            break;
        };

        let step = process_fragments(left_fragment, right_fragment, within_conflict);
        within_conflict = step.within_conflict;
        if let Some(segment) = step.output {
            raw.push(segment);
        }
        if let Some(tail) = step.left_tail {
            left_fragments.push(tail);
        }
        if let Some(tail) = step.right_tail {
            right_fragments.push(tail);
        }
    }

    // One side ran out; flush the other. Inside a conflict the leftovers
    // extend that side's alternative, otherwise they pass through whole.
    let (leftover, side) = if left_fragments.is_empty() {
        (right_fragments, Side::Right)
    } else {
        (left_fragments, Side::Left)
    };
    for fragment in leftover.into_iter().rev() {
        if within_conflict {
            let alternative = fragment.into_insert_side();
            raw.push(match side {
                Side::Left => Segment::Conflict {
                    left: alternative,
                    right: Vec::new(),
                },
                Side::Right => Segment::Conflict {
                    left: Vec::new(),
                    right: alternative,
                },
            });
        } else {
            raw.push(fragment.into_segment());
        }
    }

    consolidate(raw)
}

/// Reverses a diff stream into a stack whose top is the first fragment.
fn fragment_stack<T: Token>(stream: Vec<Segment<T>>) -> Vec<Fragment<T>> {
    stream
        .into_iter()
        .rev()
        .map(|segment| match segment {
            Segment::Run(tokens) => Fragment::Copy(tokens),
            Segment::Change { insert, delete } => Fragment::Change { insert, delete },
            Segment::Conflict { .. } => unreachable!("diff streams never contain conflicts"),
        })
        .collect()
}

fn process_fragments<T: Token>(
    left: Fragment<T>,
    right: Fragment<T>,
    within_conflict: bool,
) -> Step<T> {
    match (left, right) {
        (Fragment::Copy(left_run), Fragment::Copy(right_run)) => copy_copy(left_run, right_run),
        (left, right) if within_conflict => pending_conflict(left, right),
        (
            Fragment::Change {
                insert: left_insert,
                delete: left_delete,
            },
            Fragment::Change {
                insert: right_insert,
                delete: right_delete,
            },
        ) => change_change(left_insert, left_delete, right_insert, right_delete),
        (Fragment::Copy(run), Fragment::Change { insert, delete }) => {
            copy_change(run, insert, delete, Side::Right)
        }
        (Fragment::Change { insert, delete }, Fragment::Copy(run)) => {
            copy_change(run, insert, delete, Side::Left)
        }
    }
}

/// Both sides keep ancestor text; emit the shorter stretch and requeue the
/// remainder of the longer one. Always ends any pending conflict.
fn copy_copy<T: Token>(left_run: Vec<T>, right_run: Vec<T>) -> Step<T> {
    let width = left_run.len().min(right_run.len());
    let (left_tail, right_tail) = if left_run.len() > width {
        (Some(Fragment::Copy(left_run[width..].to_vec())), None)
    } else if right_run.len() > width {
        (None, Some(Fragment::Copy(right_run[width..].to_vec())))
    } else {
        (None, None)
    };
    Step {
        output: Some(Segment::Run(left_run[..width].to_vec())),
        left_tail,
        right_tail,
        within_conflict: false,
    }
}

/// Extends an open conflict by the smaller of the two fragments' ancestor
/// widths, each side contributing what it would have produced there.
fn pending_conflict<T: Token>(left: Fragment<T>, right: Fragment<T>) -> Step<T> {
    let width = left.ancestor_len().min(right.ancestor_len());
    let (left_head, left_tail) = split_fragment(left, width);
    let (right_head, right_tail) = split_fragment(right, width);
    Step {
        output: Some(Segment::Conflict {
            left: left_head.map(Fragment::into_insert_side).unwrap_or_default(),
            right: right_head
                .map(Fragment::into_insert_side)
                .unwrap_or_default(),
        }),
        left_tail,
        right_tail,
        within_conflict: true,
    }
}

/// One side kept ancestor text that the other side changed.
///
/// A change fitting inside the kept stretch wins outright. A change whose
/// deletion runs past the kept stretch pits its insertion against the kept
/// text, which is a conflict; the unmatched rest of the deletion is
/// requeued.
fn copy_change<T: Token>(
    run: Vec<T>,
    insert: Vec<T>,
    delete: Vec<T>,
    change_side: Side,
) -> Step<T> {
    let width = run.len().min(delete.len());
    if delete.len() == width {
        let copy_tail = (run.len() > width).then(|| Fragment::Copy(run[width..].to_vec()));
        let (left_tail, right_tail) = match change_side {
            Side::Left => (None, copy_tail),
            Side::Right => (copy_tail, None),
        };
        return Step {
            output: Some(Segment::Change { insert, delete }),
            left_tail,
            right_tail,
            within_conflict: false,
        };
    }

    let change_tail = Some(Fragment::Change {
        insert: Vec::new(),
        delete: delete[width..].to_vec(),
    });
    let output = (width > 0 || !insert.is_empty()).then(|| match change_side {
        Side::Left => Segment::Conflict {
            left: insert,
            right: run,
        },
        Side::Right => Segment::Conflict {
            left: run,
            right: insert,
        },
    });
    let (left_tail, right_tail) = match change_side {
        Side::Left => (change_tail, None),
        Side::Right => (None, change_tail),
    };
    Step {
        output,
        left_tail,
        right_tail,
        within_conflict: false,
    }
}

/// Both sides changed the same spot.
fn change_change<T: Token>(
    left_insert: Vec<T>,
    left_delete: Vec<T>,
    right_insert: Vec<T>,
    right_delete: Vec<T>,
) -> Step<T> {
    // A pure insertion meeting a pure deletion composes into one
    // conflict-free change, requeued so the other side sees it whole: the
    // inserted tokens land where the deleted ones were.
    if left_delete.is_empty() && right_insert.is_empty() {
        return Step {
            output: None,
            left_tail: None,
            right_tail: Some(Fragment::Change {
                insert: left_insert,
                delete: right_delete,
            }),
            within_conflict: false,
        };
    }
    if left_insert.is_empty() && right_delete.is_empty() {
        return Step {
            output: None,
            left_tail: Some(Fragment::Change {
                insert: right_insert,
                delete: left_delete,
            }),
            right_tail: None,
            within_conflict: false,
        };
    }

    // The identical edit on both sides is emitted once.
    if left_insert == right_insert && left_delete == right_delete {
        return Step {
            output: Some(Segment::Change {
                insert: left_insert,
                delete: left_delete,
            }),
            left_tail: None,
            right_tail: None,
            within_conflict: false,
        };
    }

    // Anything else disagrees: both insertions go into a conflict covering
    // the narrower deletion, and the wider deletion's rest is requeued.
    let width = left_delete.len().min(right_delete.len());
    let left_tail = (width < left_delete.len()).then(|| Fragment::Change {
        insert: Vec::new(),
        delete: left_delete[width..].to_vec(),
    });
    let right_tail = (width < right_delete.len()).then(|| Fragment::Change {
        insert: Vec::new(),
        delete: right_delete[width..].to_vec(),
    });
    Step {
        output: Some(Segment::Conflict {
            left: left_insert,
            right: right_insert,
        }),
        left_tail,
        right_tail,
        within_conflict: true,
    }
}

fn split_fragment<T: Token>(
    fragment: Fragment<T>,
    width: usize,
) -> (Option<Fragment<T>>, Option<Fragment<T>>) {
    match fragment {
        Fragment::Copy(tokens) => {
            let head = (width > 0).then(|| Fragment::Copy(tokens[..width].to_vec()));
            let tail = (width < tokens.len()).then(|| Fragment::Copy(tokens[width..].to_vec()));
            (head, tail)
        }
        // The whole insertion travels with the head; the tail keeps only
        // the deletion past the split point.
        Fragment::Change { insert, delete } => {
            let head = (width > 0 || !insert.is_empty()).then(|| Fragment::Change {
                insert: insert.clone(),
                delete: delete[..width].to_vec(),
            });
            let tail = (width < delete.len()).then(|| Fragment::Change {
                insert: Vec::new(),
                delete: delete[width..].to_vec(),
            });
            (head, tail)
        }
    }
}

/// Post-processes the walker's output in two passes: adjacent conflicts are
/// joined and re-diffed so text both alternatives share becomes ordinary
/// runs again, then same-kind neighbours are coalesced (the re-diff puts
/// fresh runs next to pre-existing ones).
fn consolidate<T: Token>(raw: Vec<Segment<T>>) -> Result<Vec<Segment<T>>, GaspraError> {
    let mut staged = Vec::new();
    let mut group_left: Vec<T> = Vec::new();
    let mut group_right: Vec<T> = Vec::new();

    for segment in raw {
        match segment {
            Segment::Conflict { left, right } => {
                group_left.extend(left);
                group_right.extend(right);
            }
            other => {
                flush_conflict_group(&mut staged, &mut group_left, &mut group_right)?;
                staged.push(other);
            }
        }
    }
    flush_conflict_group(&mut staged, &mut group_left, &mut group_right)?;

    let mut output = Vec::new();
    for segment in staged {
        push_coalesced(&mut output, segment);
    }
    Ok(output)
}

fn flush_conflict_group<T: Token>(
    staged: &mut Vec<Segment<T>>,
    group_left: &mut Vec<T>,
    group_right: &mut Vec<T>,
) -> Result<(), GaspraError> {
    if group_left.is_empty() && group_right.is_empty() {
        return Ok(());
    }
    let left = std::mem::take(group_left);
    let right = std::mem::take(group_right);
    for segment in diff(&right, &left)? {
        match segment {
            Segment::Run(tokens) => staged.push(Segment::Run(tokens)),
            Segment::Change { insert, delete } => staged.push(Segment::Conflict {
                left: insert,
                right: delete,
            }),
            Segment::Conflict { .. } => unreachable!("diff streams never contain conflicts"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::changeset::{has_conflict, resolved};
    use crate::tokenizer::characters;

    fn run(text: &str) -> Segment<char> {
        Segment::Run(characters(text))
    }

    fn change(insert: &str, delete: &str) -> Segment<char> {
        Segment::Change {
            insert: characters(insert),
            delete: characters(delete),
        }
    }

    fn conflict(left: &str, right: &str) -> Segment<char> {
        Segment::Conflict {
            left: characters(left),
            right: characters(right),
        }
    }

    fn merge_str(ancestor: &str, left: &str, right: &str) -> Vec<Segment<char>> {
        merge(&characters(ancestor), &characters(left), &characters(right)).unwrap()
    }

    fn text(tokens: Vec<char>) -> String {
        tokens.into_iter().collect()
    }

    #[test_case("", "", "", "" ; "all empty")]
    #[test_case("a", "a", "a", "a" ; "no edits")]
    #[test_case("", "a", "a", "a" ; "same insertion from empty")]
    #[test_case("a", "", "", "" ; "same deletion to empty")]
    #[test_case("a", "", "a", "" ; "deletion on one side")]
    #[test_case("", "a", "", "a" ; "insertion on one side")]
    #[test_case("a", "ax", "a", "ax" ; "append on one side")]
    #[test_case("ax", "a", "ax", "a" ; "truncate on one side")]
    #[test_case("a", "xa", "ay", "xay" ; "inserts at opposite ends")]
    #[test_case("abc", "bc", "ab", "b" ; "deletes at opposite ends")]
    #[test_case("ab", "xab", "a", "xa" ; "prepend and truncate")]
    #[test_case("ab", "b", "a", "" ; "adjacent deletions")]
    #[test_case("a", "xa", "", "x" ; "insert before a deleted token")]
    #[test_case(".a", ".xa", ".", ".x" ; "insert after kept punctuation")]
    #[test_case("a", "ab", "x", "xb" ; "append beside a replacement")]
    #[test_case("ab", "b", "xab", "xb" ; "delete beside a prepend")]
    #[test_case("abcdefg", "abcxyz", "abcxyz", "abcxyz" ; "identical rewrites")]
    #[test_case("abcdefghij", "abxyzefghij", "abcdefgpqrij", "abxyzefgpqrij" ; "disjoint rewrites")]
    #[test_case("abc", "Xbc", "abY", "XbY" ; "edits at both ends")]
    fn merges_without_conflict(ancestor: &str, left: &str, right: &str, expected: &str) {
        let merged = merge_str(ancestor, left, right);
        assert!(!has_conflict(&merged), "unexpected conflict in {merged:?}");
        assert_eq!(text(resolved(&merged, Side::Left)), expected);
        // A conflict-free merge reads the same from either side.
        assert_eq!(text(resolved(&merged, Side::Right)), expected);
    }

    #[test]
    fn competing_insertions_conflict() {
        assert_eq!(merge_str("", "a", "b"), vec![conflict("a", "b")]);
    }

    #[test]
    fn deletion_against_replacement_conflicts() {
        assert_eq!(merge_str("a", "", "b"), vec![conflict("", "b")]);
    }

    #[test]
    fn competing_replacements_conflict() {
        assert_eq!(
            merge_str("ab", "xb", "yb"),
            vec![conflict("x", "y"), run("b")]
        );
    }

    #[test]
    fn deletion_against_prepend_conflicts() {
        assert_eq!(
            merge_str("ab", "b", "xb"),
            vec![conflict("", "x"), run("b")]
        );
    }

    #[test]
    fn interior_disagreement_is_isolated() {
        let merged = merge_str("abcdefg", "axdpefg", "abcdqey");
        assert_eq!(
            merged,
            vec![
                run("a"),
                change("x", "bc"),
                run("d"),
                conflict("p", "q"),
                run("e"),
                change("y", "fg"),
            ]
        );
        assert_eq!(text(resolved(&merged, Side::Left)), "axdpey");
        assert_eq!(text(resolved(&merged, Side::Right)), "axdqey");
    }

    #[test]
    fn shared_prefix_of_conflicting_inserts_is_factored_out() {
        let merged = merge_str("spqe", "sxyqe", "sxze");
        assert_eq!(
            merged,
            vec![run("sx"), conflict("yq", "z"), run("e")]
        );
        assert_eq!(text(resolved(&merged, Side::Left)), "sxyqe");
        assert_eq!(text(resolved(&merged, Side::Right)), "sxze");
    }

    #[test]
    fn swapping_the_branches_swaps_conflict_alternatives() {
        let forward = merge_str("ab", "xb", "yb");
        let backward = merge_str("ab", "yb", "xb");
        assert_eq!(forward, vec![conflict("x", "y"), run("b")]);
        assert_eq!(backward, vec![conflict("y", "x"), run("b")]);
    }

    #[test]
    fn merging_against_an_unchanged_side_is_a_diff() {
        let ancestor = characters("abcabcabc");
        let edited = characters("abxybcabcx");
        assert_eq!(
            merge(&ancestor, &ancestor, &edited).unwrap(),
            diff(&ancestor, &edited).unwrap()
        );
        assert_eq!(
            merge(&ancestor, &edited, &ancestor).unwrap(),
            diff(&ancestor, &edited).unwrap()
        );
    }

    #[test]
    fn merging_identical_edits_reconstructs_them() {
        let ancestor = "The quick brown fox jumps over the lazy dog near the riverbank.";
        let edited = "The quick brown fox leaps over the lazy dogs near the river";
        let merged = merge_str(ancestor, edited, edited);
        assert!(!has_conflict(&merged));
        assert_eq!(text(resolved(&merged, Side::Left)), edited);
    }

    #[test]
    fn disjoint_ancestor_ranges_never_conflict() {
        // Left touches only the head, right only the tail.
        let merged = merge_str("one two three", "ONE two three", "one two THREE");
        assert!(!has_conflict(&merged));
        assert_eq!(text(resolved(&merged, Side::Left)), "ONE two THREE");
    }

    #[test]
    fn merges_two_editors_of_one_sentence() {
        let original = "The quick brown fox jumps over the lazy dog near the riverbank.";
        let editor_one = "The quick brown fox leaps over the lazy dogs near the river.";
        let editor_two = "The quick, clever fox jumps across the lazy dogs by the riverbank.";
        let merged = merge_str(original, editor_one, editor_two);
        assert!(!has_conflict(&merged), "unexpected conflict in {merged:?}");
        assert_eq!(
            text(resolved(&merged, Side::Left)),
            "The quick, clever fox leaps across the lazy dogs by the river."
        );
    }

    #[test]
    fn flags_only_the_true_disagreement() {
        let original = "The quick brown fox jumps over the lazy dog near the riverbank.";
        let editor_one = "The quick brown fox leaps over the lazy dogs near the river.";
        let conflicting = "The swift, agile fox leaps over the sleepy dog near the riverside.";
        let merged = merge_str(original, editor_one, conflicting);

        let conflicts: Vec<_> = merged.iter().filter(|s| s.is_conflict()).collect();
        assert_eq!(conflicts, vec![&conflict("", "side")]);
        assert_eq!(
            text(resolved(&merged, Side::Left)),
            "The swift, agile fox leaps over the sleepy dogs near the river."
        );
        assert_eq!(
            text(resolved(&merged, Side::Right)),
            "The swift, agile fox leaps over the sleepy dogs near the riverside."
        );
    }

    #[test]
    fn merges_line_tokenized_documents() {
        use crate::tokenizer::LineInterner;

        let mut interner = LineInterner::new();
        let ancestor = interner.tokenize("alpha\nbeta\ngamma\n");
        let left = interner.tokenize("alpha\nbeta patched\ngamma\n");
        let right = interner.tokenize("alpha\nbeta\ngamma\ndelta\n");

        let merged = merge(&ancestor, &left, &right).unwrap();
        assert!(!has_conflict(&merged));
        assert_eq!(
            interner.restore(&resolved(&merged, Side::Left)),
            "alpha\nbeta patched\ngamma\ndelta\n"
        );
    }
}
