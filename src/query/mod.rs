//! Query engine for mdcatalog
//!
//! Filters, ordering and page windows evaluated over collection documents.

mod executor;
pub mod filter;

pub use executor::{execute, OrderBy, OrderDirection, Query};
pub use filter::{Filter, Pattern};
