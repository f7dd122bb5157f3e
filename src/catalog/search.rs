//! Product search execution
//!
//! Runs a [`SearchQuery`] against the product collection: resolve the category
//! name, count the matches, fetch the requested page, then join each product's
//! category in a second read.

use std::collections::HashMap;

use crate::query::{Filter, Query};
use crate::storage::DocumentStore;

use super::models::{Category, Page, Product, ProductDetail};
use super::params::SearchQuery;
use super::taxonomy::CATEGORIES;

/// Collection holding products
pub const PRODUCTS: &str = "products";

pub struct ProductSearch<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> ProductSearch<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn run(&self, query: &SearchQuery) -> crate::Result<Page<ProductDetail>> {
        let category_id = match &query.category {
            Some(name) => match self.find_category(name).await? {
                Some(category) => Some(category.id),
                None => {
                    tracing::debug!(category = %name, "search category not found");
                    return Ok(Page::empty(query.page_number));
                }
            },
            None => None,
        };

        let filter = query.filter(category_id.as_deref());
        tracing::debug!(?filter, sort = ?query.sort, "compiled product search");

        let total = self.store.count(PRODUCTS, &filter).await?;

        let (offset, limit) = query.window();
        let mut find = Query::new(filter)
            .order_by("discountedPrice", query.sort.direction())
            .offset(offset);
        find.limit = limit;

        let products = self
            .store
            .find(PRODUCTS, &find)
            .await?
            .iter()
            .map(|doc| Product::from_document(PRODUCTS, doc))
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Page {
            content: self.populate_categories(products).await?,
            current_page: query.page_number,
            total_pages: query.total_pages(total),
        })
    }

    /// First category of any level whose name equals `name`, ignoring case.
    ///
    /// "First" is in id order. Ids are random, so when several categories
    /// share a name (the same leaf under two parents) which one is picked is
    /// stable for a given store but unrelated to creation order.
    pub async fn find_category(&self, name: &str) -> crate::Result<Option<Category>> {
        let filter = Filter::matches_ignore_case("name", name)?;
        match self.store.find_one(CATEGORIES, &filter).await? {
            Some(doc) => Category::from_document(CATEGORIES, &doc).map(Some),
            None => Ok(None),
        }
    }

    /// Attach each product's category, read in one query
    pub async fn populate_categories(&self, products: Vec<Product>) -> crate::Result<Vec<ProductDetail>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<&str> = products.iter().map(|p| p.category.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut categories = HashMap::new();
        for doc in self
            .store
            .find(CATEGORIES, &Query::new(Filter::is_in("id", ids)))
            .await?
        {
            let category = Category::from_document(CATEGORIES, &doc)?;
            categories.insert(category.id.clone(), category);
        }

        Ok(products
            .into_iter()
            .map(|product| ProductDetail {
                category: categories.get(&product.category).cloned(),
                product,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::taxonomy::TaxonomyResolver;
    use crate::config::CatalogConfig;
    use crate::Database;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database) {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_with(tmp.path(), CatalogConfig::default().without_commits())
            .await
            .unwrap();
        (tmp, db)
    }

    async fn add(db: &Database, category: &str, price: f64) -> Product {
        let product = Product {
            title: format!("Item {}", price),
            discounted_price: price,
            category: category.to_string(),
            ..Product::default()
        };
        let doc = db.insert(PRODUCTS, product.to_document().unwrap()).await.unwrap();
        Product::from_document(PRODUCTS, &doc).unwrap()
    }

    #[tokio::test]
    async fn test_find_category_ignores_case_at_any_level() {
        let (_tmp, db) = setup().await;
        let leaf = TaxonomyResolver::new(&db)
            .resolve_path("Men", "Clothing", "Shirts")
            .await
            .unwrap();

        let search = ProductSearch::new(&db);
        assert_eq!(search.find_category("shirts").await.unwrap().unwrap().id, leaf);
        assert_eq!(search.find_category("MEN").await.unwrap().unwrap().level, 1);
        assert!(search.find_category("Shirt").await.unwrap().is_none());
        assert!(search.find_category("Sh.rts").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shared_name_picks_lowest_id() {
        let (_tmp, db) = setup().await;
        let resolver = TaxonomyResolver::new(&db);
        let men = resolver.resolve_path("Men", "Clothing", "Shirts").await.unwrap();
        let women = resolver.resolve_path("Women", "Clothing", "Shirts").await.unwrap();

        let search = ProductSearch::new(&db);
        let picked = search.find_category("shirts").await.unwrap().unwrap();
        assert_eq!(picked.id, men.min(women));

        // repeated lookups agree
        for _ in 0..3 {
            assert_eq!(search.find_category("SHIRTS").await.unwrap().unwrap(), picked);
        }
    }

    #[tokio::test]
    async fn test_populate_joins_categories() {
        let (_tmp, db) = setup().await;
        let leaf = TaxonomyResolver::new(&db)
            .resolve_path("Men", "Clothing", "Shirts")
            .await
            .unwrap();

        let first = add(&db, &leaf, 10.0).await;
        let orphan = add(&db, "deleted-category", 20.0).await;

        let details = ProductSearch::new(&db)
            .populate_categories(vec![first, orphan])
            .await
            .unwrap();

        assert_eq!(details[0].category.as_ref().map(|c| c.name.as_str()), Some("Shirts"));
        assert!(details[1].category.is_none());
    }

    #[tokio::test]
    async fn test_run_filters_sorts_and_pages() {
        let (_tmp, db) = setup().await;
        let leaf = TaxonomyResolver::new(&db)
            .resolve_path("Men", "Clothing", "Shirts")
            .await
            .unwrap();
        for price in [300.0, 50.0, 150.0, 120.0] {
            add(&db, &leaf, price).await;
        }
        add(&db, "elsewhere", 130.0).await;

        let query = SearchQuery {
            category: Some("shirts".into()),
            min_price: 100.0,
            max_price: 200.0,
            page_size: 1,
            page_number: 2,
            ..SearchQuery::default()
        };
        let page = ProductSearch::new(&db).run(&query).await.unwrap();

        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].product.discounted_price, 150.0);
        assert_eq!(page.content[0].category.as_ref().map(|c| c.id.as_str()), Some(leaf.as_str()));
    }
}
