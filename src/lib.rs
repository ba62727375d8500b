//! gaspra — text differencing and three-way merging on a suffix automaton.
//!
//! The automaton indexes every substring of one sequence in linear time,
//! which makes longest-common-substring queries cheap; the diff engine
//! splits two sequences around their longest shared fragment and recurses,
//! and the merge engine replays two diffs against a common ancestor,
//! flagging only genuine disagreements as conflicts.
//!
//! Everything is generic over the token type: feed `char` sequences for
//! character-level work or interned line ids for line-level work.
//!
//! ```
//! use gaspra::{characters, diff, Segment};
//!
//! # fn main() -> Result<(), gaspra::GaspraError> {
//! let original = characters("abc");
//! let modified = characters("abd");
//! let stream = diff(&original, &modified)?;
//! assert_eq!(
//!     stream,
//!     vec![
//!         Segment::Run(vec!['a', 'b']),
//!         Segment::Change { insert: vec!['d'], delete: vec!['c'] },
//!     ]
//! );
//! # Ok(())
//! # }
//! ```

mod automaton;
mod changeset;
mod errors;
mod lcs;
pub mod markup;
mod merge;
mod tokenizer;

pub use automaton::{MatchLocation, SuffixAutomaton, MAX_SEQUENCE_LENGTH};
pub use changeset::{apply_forward, apply_reverse, diff, has_conflict, resolved, Segment, Side};
pub use errors::GaspraError;
pub use lcs::{find_lcs, find_lcs_multiple, CommonSubstring};
pub use merge::merge;
pub use tokenizer::{characters, LineInterner, Token};
