//! Remote document store access for mathtiles.
//!
//! This crate provides a trait-based store interface with a Firestore REST
//! implementation, an in-memory implementation, and the reply parser both
//! rely on.

#![warn(missing_docs)]

pub mod trait_;
pub mod document;
pub mod parser;
pub mod firestore;
pub mod memory;

pub use trait_::{DocumentStore, EqualityQuery, Result, StorageError};
pub use document::{fields_to_json, Document, FieldValue, Fields};
pub use parser::ResponseParser;
pub use firestore::{FirestoreConfig, FirestoreRestStore, DEFAULT_BASE_URL};
pub use memory::{fields, InMemoryStore};
