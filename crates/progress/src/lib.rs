//! Progress Ledger
//!
//! Numbered play sessions and the cumulative account level, kept in a remote
//! document store through field-masked patches.

#![warn(missing_docs)]

pub mod schema;
pub mod ledger;
pub mod recorder;

pub use schema::LedgerSchema;
pub use ledger::{LedgerError, ProgressLedger, Result, SessionHandle};
pub use recorder::LedgerSink;
