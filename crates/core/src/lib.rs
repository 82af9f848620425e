//! mathtiles core data models.
//!
//! Sequences and their evaluation, the difficulty profile, player identities
//! and the events exchanged between gameplay and its collaborators. Nothing
//! in this crate performs I/O.

#![warn(missing_docs)]

mod error;
mod id;

mod difficulty;
mod expression;

mod event;
mod sink;

// Re-exports
pub use error::{CoreError, Result};
pub use id::{PlayerIdentity, SessionNumber};

pub use difficulty::{DifficultyProfile, FailurePolicy, MIN_LEVEL, MIN_SEQUENCE_LENGTH};
pub use expression::{ExpressionEngine, Operator, Sequence};

pub use event::GameEvent;
pub use sink::{NoopSink, ProgressSink};
