//! End-to-end scenarios exercised through the public API only.

use gaspra::{
    apply_forward, apply_reverse, characters, diff, find_lcs, find_lcs_multiple, has_conflict,
    merge, resolved, CommonSubstring, LineInterner, Segment, Side,
};
use pretty_assertions::assert_eq;

fn run(text: &str) -> Segment<char> {
    Segment::Run(characters(text))
}

fn change(insert: &str, delete: &str) -> Segment<char> {
    Segment::Change {
        insert: characters(insert),
        delete: characters(delete),
    }
}

fn text(tokens: Vec<char>) -> String {
    tokens.into_iter().collect()
}

const ORIGINAL: &str = "The quick brown fox jumps over the lazy dog near the riverbank.";

#[test]
fn diff_from_empty_is_one_insertion() {
    assert_eq!(
        diff(&characters(""), &characters("abc")).unwrap(),
        vec![change("abc", "")]
    );
}

#[test]
fn diff_to_empty_is_one_deletion() {
    assert_eq!(
        diff(&characters("abc"), &characters("")).unwrap(),
        vec![change("", "abc")]
    );
}

#[test]
fn lcs_of_two_sentences() {
    assert_eq!(
        find_lcs(
            &characters("The quick brown fox"),
            &characters("A quick red fox")
        )
        .unwrap(),
        CommonSubstring {
            start_in_first: 3,
            start_in_second: 1,
            length: 7,
        }
    );
}

#[test]
fn lcs_of_three_sentences() {
    let family = vec![
        characters("The quick brown fox"),
        characters("A quick red fox"),
        characters("My quick fox"),
    ];
    assert_eq!(find_lcs_multiple(&family).unwrap(), (vec![3, 1, 2], 7));
}

#[test]
fn diff_of_two_sentences() {
    let modified = "The quick brown fox leaps over the lazy dogs near the river";
    let stream = diff(&characters(ORIGINAL), &characters(modified)).unwrap();
    assert_eq!(
        stream,
        vec![
            run("The quick brown fox "),
            change("lea", "jum"),
            run("ps over the lazy dog"),
            change("s", ""),
            run(" near the river"),
            change("", "bank."),
        ]
    );
    assert_eq!(text(apply_forward(&stream)), modified);
    assert_eq!(text(apply_reverse(&stream)), ORIGINAL);
}

#[test]
fn merge_of_two_editors_is_conflict_free() {
    let editor_one = "The quick brown fox leaps over the lazy dogs near the river.";
    let editor_two = "The quick, clever fox jumps across the lazy dogs by the riverbank.";
    let merged = merge(
        &characters(ORIGINAL),
        &characters(editor_one),
        &characters(editor_two),
    )
    .unwrap();
    assert!(!has_conflict(&merged));
    assert_eq!(
        text(resolved(&merged, Side::Left)),
        "The quick, clever fox leaps across the lazy dogs by the river."
    );
}

#[test]
fn merge_flags_only_the_irreconcilable_suffix() {
    let editor_one = "The quick brown fox leaps over the lazy dogs near the river.";
    let conflicting = "The swift, agile fox leaps over the sleepy dog near the riverside.";
    let merged = merge(
        &characters(ORIGINAL),
        &characters(editor_one),
        &characters(conflicting),
    )
    .unwrap();

    let conflicts: Vec<_> = merged
        .iter()
        .filter_map(|segment| match segment {
            Segment::Conflict { left, right } => {
                Some((text(left.clone()), text(right.clone())))
            }
            _ => None,
        })
        .collect();
    assert_eq!(conflicts, vec![(String::new(), "side".to_owned())]);
    assert_eq!(
        text(resolved(&merged, Side::Left)),
        "The swift, agile fox leaps over the sleepy dogs near the river."
    );
}

#[test]
fn line_oriented_diff_round_trips() {
    let original = "fn main() {\n    println!(\"hi\");\n}\n";
    let modified = "fn main() {\n    println!(\"hello\");\n}\n";

    let mut interner = LineInterner::new();
    let original_tokens = interner.tokenize(original);
    let modified_tokens = interner.tokenize(modified);

    let stream = diff(&original_tokens, &modified_tokens).unwrap();
    assert_eq!(interner.restore(&apply_forward(&stream)), modified);
    assert_eq!(interner.restore(&apply_reverse(&stream)), original);

    // Only the middle line differs.
    assert_eq!(
        stream,
        vec![
            Segment::Run(vec![0]),
            Segment::Change {
                insert: vec![3],
                delete: vec![1],
            },
            Segment::Run(vec![2]),
        ]
    );
}

#[test]
fn line_oriented_merge_takes_both_edits() {
    let ancestor = "one\ntwo\nthree\n";
    let left = "one\ntwo point five\nthree\n";
    let right = "zero\none\ntwo\nthree\n";

    let mut interner = LineInterner::new();
    let ancestor_tokens = interner.tokenize(ancestor);
    let left_tokens = interner.tokenize(left);
    let right_tokens = interner.tokenize(right);

    let merged = merge(&ancestor_tokens, &left_tokens, &right_tokens).unwrap();
    assert!(!has_conflict(&merged));
    assert_eq!(
        interner.restore(&resolved(&merged, Side::Left)),
        "zero\none\ntwo point five\nthree\n"
    );
}

#[test]
fn merging_the_same_edit_twice_is_idempotent() {
    let edited = "The quick brown fox leaps over the lazy dogs near the river";
    let merged = merge(
        &characters(ORIGINAL),
        &characters(edited),
        &characters(edited),
    )
    .unwrap();
    assert!(!has_conflict(&merged));
    assert_eq!(text(resolved(&merged, Side::Left)), edited);
}
