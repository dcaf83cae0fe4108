//! Errors raised by the quiz engine itself.
//!
//! Catalogue loading and persistence have their own error types next to the
//! code that produces them (`catalog::CatalogError`, `store::StoreError`).

use thiserror::Error;

use crate::session::Phase;

/// Engine operation that can be rejected by the session state machine
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    SelectAnswer,
    Advance,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    /// The catalogue cannot supply the requested questions or distractors.
    /// Fatal to session creation.
    #[error("catalogue too small: {required} units required, {available} available")]
    InsufficientCatalog { required: usize, available: usize },

    /// An operation was invoked in a state that forbids it. This is a defect
    /// in the caller and is never retried.
    #[error("cannot {operation} while session is {phase}")]
    InvalidTransition { operation: Operation, phase: Phase },

    #[error("a session needs at least one question")]
    EmptySession,
}
