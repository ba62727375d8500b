use thiserror::Error;

/// Errors produced by the gaspra core.
///
/// The engines are total on well-formed input; the only failure is a
/// sequence too long for the automaton's state handles, detected up front
/// when the automaton is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GaspraError {
    #[error("sequence of {length} tokens exceeds the supported maximum of {max}")]
    SequenceTooLong { length: usize, max: usize },
}
