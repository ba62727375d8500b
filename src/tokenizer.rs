use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Anything the engines can diff and merge: equality, hashing and cheap
/// cloning are all they ever ask of a token. Character mode uses `char`
/// directly; line mode uses interned `u32` line ids.
pub trait Token: Eq + Hash + Clone + Debug {}

impl<T> Token for T where T: Eq + Hash + Clone + Debug {}

/// Splits text into its Unicode scalar values.
pub fn characters(text: &str) -> Vec<char> {
    text.chars().collect()
}

/// Maps each distinct line of input to a dense `u32` id so that
/// line-oriented comparisons run over small integers instead of strings.
///
/// Line terminators stay attached to their lines, so restoring a token
/// sequence reproduces the input byte for byte. All inputs that take part
/// in one comparison must be tokenized through the same interner.
#[derive(Debug, Clone, Default)]
pub struct LineInterner {
    lines: Vec<String>,
    ids: HashMap<String, u32>,
}

impl LineInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns every line of `text` and returns the id sequence.
    pub fn tokenize(&mut self, text: &str) -> Vec<u32> {
        split_inclusive_lines(text)
            .map(|line| self.intern(line))
            .collect()
    }

    fn intern(&mut self, line: &str) -> u32 {
        if let Some(&id) = self.ids.get(line) {
            return id;
        }
        let id = self.lines.len() as u32;
        self.lines.push(line.to_owned());
        self.ids.insert(line.to_owned(), id);
        id
    }

    /// Returns the line an id was interned from. The id must have been
    /// produced by this interner.
    pub fn resolve(&self, id: u32) -> &str {
        &self.lines[id as usize]
    }

    /// Concatenates the lines behind a token sequence back into text.
    pub fn restore(&self, tokens: &[u32]) -> String {
        tokens.iter().map(|&id| self.resolve(id)).collect()
    }
}

fn split_inclusive_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}
