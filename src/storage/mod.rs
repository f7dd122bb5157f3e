//! Storage layer for mdcatalog
//!
//! Handles reading/writing markdown documents with YAML frontmatter, and the
//! `DocumentStore` seam the catalog core is written against.

pub mod collection;
pub mod document;
pub mod frontmatter;
pub mod store;

pub use store::{DocumentPatch, DocumentStore};
