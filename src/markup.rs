//! Rendering of change streams as text, for the command-line front-ends.

use crate::changeset::Segment;

/// Inline decorations wrapped around the two sides of a change.
#[derive(Debug, Clone, Copy)]
pub struct MarkupStyle {
    pub insert_open: &'static str,
    pub insert_close: &'static str,
    pub delete_open: &'static str,
    pub delete_close: &'static str,
}

/// Bracket marks for output that has to survive without a terminal.
pub const PLAIN: MarkupStyle = MarkupStyle {
    insert_open: "{+",
    insert_close: "+}",
    delete_open: "[-",
    delete_close: "-]",
};

/// Bright green/red ANSI escapes for terminal output.
pub const COLOR: MarkupStyle = MarkupStyle {
    insert_open: "\u{1b}[92m",
    insert_close: "\u{1b}[0m",
    delete_open: "\u{1b}[91m",
    delete_close: "\u{1b}[0m",
};

/// Renders a diff stream with both sides of every change marked inline.
pub fn format_diff(stream: &[Segment<char>], style: &MarkupStyle) -> String {
    let mut output = String::new();
    for segment in stream {
        match segment {
            Segment::Run(tokens) => output.extend(tokens),
            Segment::Change { insert, delete } | Segment::Conflict {
                left: insert,
                right: delete,
            } => {
                if !insert.is_empty() {
                    output.push_str(style.insert_open);
                    output.extend(insert);
                    output.push_str(style.insert_close);
                }
                if !delete.is_empty() {
                    output.push_str(style.delete_open);
                    output.extend(delete);
                    output.push_str(style.delete_close);
                }
            }
        }
    }
    output
}

/// Renders a merged stream as the merged document, wrapping every conflict
/// in git-style markers labelled with the two input names.
pub fn format_merge_marked(
    stream: &[Segment<char>],
    left_label: &str,
    right_label: &str,
) -> String {
    let mut output = String::new();
    for segment in stream {
        match segment {
            Segment::Run(tokens) => output.extend(tokens),
            Segment::Change { insert, .. } => output.extend(insert),
            Segment::Conflict { left, right } => {
                output.push_str(&format!("<<<<<<< {left_label}\n"));
                output.extend(left);
                output.push_str("\n=======\n");
                output.extend(right);
                output.push_str(&format!("\n>>>>>>> {right_label}\n"));
            }
        }
    }
    output
}

/// Renders a merged stream for the screen: conflict alternatives appear
/// inline, the left one marked as an insertion and the right one as a
/// deletion.
pub fn format_merge_inline(stream: &[Segment<char>], style: &MarkupStyle) -> String {
    let mut output = String::new();
    for segment in stream {
        match segment {
            Segment::Run(tokens) => output.extend(tokens),
            Segment::Change { insert, .. } => output.extend(insert),
            Segment::Conflict { left, right } => {
                output.push_str(style.insert_open);
                output.extend(left);
                output.push_str(style.insert_close);
                output.push_str(style.delete_open);
                output.extend(right);
                output.push_str(style.delete_close);
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
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

    #[test]
    fn diff_marks_both_sides() {
        let stream = vec![run("keep "), change("new", "old"), run(" tail")];
        assert_eq!(
            format_diff(&stream, &PLAIN),
            "keep {+new+}[-old-] tail"
        );
    }

    #[test]
    fn diff_skips_empty_sides() {
        let stream = vec![run("a"), change("x", ""), run("b"), change("", "y")];
        assert_eq!(format_diff(&stream, &PLAIN), "a{+x+}b[-y-]");
    }

    #[test]
    fn merge_wraps_conflicts_in_markers() {
        let stream = vec![run("shared "), conflict("ours", "theirs"), run(" end")];
        assert_eq!(
            format_merge_marked(&stream, "a.txt", "b.txt"),
            "shared <<<<<<< a.txt\nours\n=======\ntheirs\n>>>>>>> b.txt\n end"
        );
    }

    #[test]
    fn merge_inline_styles_the_alternatives() {
        let stream = vec![run("x"), conflict("l", "r")];
        assert_eq!(format_merge_inline(&stream, &PLAIN), "x{+l+}[-r-]");
    }

    #[test]
    fn merge_takes_insert_sides_of_changes() {
        let stream = vec![run("a"), change("new", "old"), run("z")];
        assert_eq!(format_merge_marked(&stream, "l", "r"), "anewz");
    }
}
