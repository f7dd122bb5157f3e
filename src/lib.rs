//! mdcatalog - Markdown-Backed Product Catalog
//!
//! A product catalog whose documents are markdown files with YAML frontmatter,
//! versioned in git. On top of the document store sit the two pieces of real
//! catalog logic: resolving a product's three category names into a category
//! hierarchy, and compiling loosely-typed search parameters into a paginated
//! product query.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Catalog Façade                          │
//! │  create / create_multiple / find / update / delete / search     │
//! ├───────────────────────────────┬─────────────────────────────────┤
//! │      Taxonomy Resolver        │      Product Search             │
//! │  find-or-create level 1→2→3   │  params → filter/sort/window    │
//! │                               │  count → fetch → populate       │
//! └───────────────┬───────────────┴────────────────┬────────────────┘
//!                 │          DocumentStore          │
//!                 ▼                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Database: collections/{categories,products}/*.md + git commits │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod git;
pub mod query;
pub mod storage;
pub mod validation;

pub use catalog::{Catalog, Category, CategoryNode, NewProduct, Page, Product, ProductDetail, SearchParams, Size};
pub use config::CatalogConfig;
pub use error::{Error, Result};
pub use query::{Filter, OrderDirection, Query};
pub use storage::collection::Collection;
pub use storage::document::{Document, Fields, Value};
pub use storage::{DocumentPatch, DocumentStore};

use std::path::PathBuf;
use tokio::sync::Mutex;

/// The markdown document store
pub struct Database {
    /// Root path of the store
    pub root: PathBuf,
    /// Effective configuration
    pub config: CatalogConfig,
    /// Writer lock; holds the git repository when writes are committed.
    /// Every write goes through it, which makes find-or-insert atomic.
    pub(crate) writer: Mutex<Option<git::Repository>>,
}

impl Database {
    /// Open or create a store at the given path using its config file
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        let config = CatalogConfig::load(&root)?;
        Self::open_with(root, config).await
    }

    /// Open or create a store with an explicit configuration
    pub async fn open_with(path: impl Into<PathBuf>, config: CatalogConfig) -> Result<Self> {
        let root = path.into();
        tokio::fs::create_dir_all(&root).await?;

        let repo = if config.commit_writes {
            Some(git::Repository::open_or_init(
                &root,
                &config.author_name,
                &config.author_email,
            )?)
        } else {
            None
        };

        Ok(Self {
            root,
            config,
            writer: Mutex::new(repo),
        })
    }

    /// True when files under the root differ from the last commit.
    /// Always false when commits are disabled.
    pub async fn has_uncommitted_changes(&self) -> Result<bool> {
        match self.writer.lock().await.as_ref() {
            Some(repo) => repo.has_changes(),
            None => Ok(false),
        }
    }

    /// Number of commits in the store's history, if it is versioned
    pub async fn commit_count(&self) -> Result<Option<usize>> {
        match self.writer.lock().await.as_ref() {
            Some(repo) => repo.commit_count().map(Some),
            None => Ok(None),
        }
    }
}
