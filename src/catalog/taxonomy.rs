//! Category path resolution
//!
//! A product names its category as three labels (top, second, third level).
//! Resolving the path finds each node under its parent, creating the ones
//! that do not exist yet, and yields the id of the level-3 leaf.
//!
//! Level-1 categories share one global namespace: "Men" is the same top-level
//! node whichever second and third levels are asked for beneath it. Levels 2
//! and 3 are scoped by their parent.

use crate::query::Filter;
use crate::storage::document::Document;
use crate::storage::DocumentStore;

use super::models::Category;

/// Collection holding categories
pub const CATEGORIES: &str = "categories";

pub struct TaxonomyResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> TaxonomyResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve `top / second / third` to the leaf category id.
    ///
    /// Each level needs the id of the one above it, so the three steps run in
    /// order.
    pub async fn resolve_path(&self, top: &str, second: &str, third: &str) -> crate::Result<String> {
        let top = self.find_or_create(top, None, 1).await?;
        let second = self.find_or_create(second, Some(&top.id), 2).await?;
        let third = self.find_or_create(third, Some(&second.id), 3).await?;
        Ok(third.id)
    }

    async fn find_or_create(&self, name: &str, parent: Option<&str>, level: u8) -> crate::Result<Category> {
        let key = category_key(name, parent, level);

        let mut doc = Document::draft();
        doc.set("name", name).set("level", i64::from(level));
        if let Some(parent) = parent {
            doc.set("parentCategory", parent);
        }

        let doc = self.store.find_or_insert(CATEGORIES, &key, doc).await?;
        Category::from_document(CATEGORIES, &doc)
    }
}

/// The identity of a category node: its name and level, plus its parent
/// below level 1.
pub fn category_key(name: &str, parent: Option<&str>, level: u8) -> Filter {
    let mut parts = vec![Filter::eq("name", name), Filter::eq("level", i64::from(level))];
    if let Some(parent) = parent {
        parts.push(Filter::eq("parentCategory", parent));
    }
    Filter::and(parts)
}
