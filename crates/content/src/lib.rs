//! # shelf-content
//!
//! Named, schema-validated content collections.
//!
//! An application declares its collections with [`define_collection`],
//! gathers them in a [`CollectionRegistry`], and loads them once with
//! [`ContentStore::load`]. Every entry is validated against its collection's
//! JSON Schema during the load; afterwards the store is read-only and is
//! shared behind an `Arc`.
//!
//! The [`ContentModule`] core module serves collection summaries, raw
//! entries, and schemas under `/api/content`.

pub mod collection;
pub mod entry;
pub mod error;
pub mod module;
pub mod schema;
pub mod store;

pub use collection::{define_collection, Collection, CollectionDefinition, CollectionRegistry};
pub use entry::{Entry, TypedEntry};
pub use error::ContentError;
pub use module::ContentModule;
pub use schema::{EntrySchema, Issue, Issues};
pub use store::{CollectionSummary, ContentStore, LoadOptions};
