//! The product catalog
//!
//! [`Catalog`] is the entry point: product creation resolves the category
//! path before inserting, search compiles loose parameters into a paged query,
//! and the remaining operations pass straight through to the store.

pub mod models;
pub mod params;
pub mod search;
pub mod taxonomy;

pub use models::{Category, CategoryNode, NewProduct, Page, Product, ProductDetail, Size};
pub use params::{SearchParams, SearchQuery, SortOrder, StockFilter};
pub use search::{ProductSearch, PRODUCTS};
pub use taxonomy::{TaxonomyResolver, CATEGORIES};

use std::collections::HashMap;

use crate::error::Error;
use crate::query::{Filter, OrderDirection, Query};
use crate::storage::DocumentStore;
use crate::Database;

/// Catalog operations over a document store
pub struct Catalog<S = Database> {
    store: S,
}

impl<S: DocumentStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve `top / second / third` to the leaf category id, creating
    /// missing nodes on the way
    pub async fn resolve_category_path(&self, top: &str, second: &str, third: &str) -> crate::Result<String> {
        TaxonomyResolver::new(&self.store)
            .resolve_path(top, second, third)
            .await
    }

    /// Create a product under the category its three names resolve to
    pub async fn create_product(&self, request: NewProduct) -> crate::Result<Product> {
        let leaf = self
            .resolve_category_path(
                &request.top_level_category,
                &request.second_level_category,
                &request.third_level_category,
            )
            .await?;

        let product = request.into_product(leaf);
        let doc = self.store.insert(PRODUCTS, product.to_document()?).await?;
        let product = Product::from_document(PRODUCTS, &doc)?;

        tracing::info!(id = %product.id, category = %product.category, "created product");
        Ok(product)
    }

    /// Create products one after another. Stops at the first failure;
    /// products created before it stay.
    pub async fn create_multiple_products(&self, requests: Vec<NewProduct>) -> crate::Result<Vec<Product>> {
        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            created.push(self.create_product(request).await?);
        }
        Ok(created)
    }

    pub async fn find_product_by_id(&self, id: &str) -> crate::Result<ProductDetail> {
        let doc = self
            .store
            .find_by_id(PRODUCTS, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let product = Product::from_document(PRODUCTS, &doc)?;

        let mut details = ProductSearch::new(&self.store)
            .populate_categories(vec![product])
            .await?;
        details.pop().ok_or_else(|| not_found(id))
    }

    /// Overwrite the given fields of a product and return the result.
    /// Fields not named in `fields` keep their values.
    ///
    /// A patch that would leave an unreadable product (`{"price": "cheap"}`)
    /// fails with `MalformedDocument` and nothing is written.
    pub async fn update_product(
        &self,
        id: &str,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> crate::Result<Product> {
        let patch = models::product_patch(fields)?;

        let mut preview = self
            .store
            .find_by_id(PRODUCTS, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        patch.clone().apply(&mut preview);
        Product::from_document(PRODUCTS, &preview)?;

        let doc = self
            .store
            .update_by_id(PRODUCTS, id, patch)
            .await?
            .ok_or_else(|| not_found(id))?;
        Product::from_document(PRODUCTS, &doc)
    }

    pub async fn delete_product(&self, id: &str) -> crate::Result<()> {
        if !self.store.delete_by_id(PRODUCTS, id).await? {
            return Err(not_found(id));
        }
        tracing::info!(id, "deleted product");
        Ok(())
    }

    /// One page of products matching `params`
    pub async fn search(&self, params: SearchParams) -> crate::Result<Page<ProductDetail>> {
        ProductSearch::new(&self.store).run(&params.into()).await
    }

    /// First category of any level named `name`, ignoring case
    pub async fn find_category(&self, name: &str) -> crate::Result<Option<Category>> {
        ProductSearch::new(&self.store).find_category(name).await
    }

    /// All level-1 categories with their descendants, siblings ordered by name
    pub async fn category_tree(&self) -> crate::Result<Vec<CategoryNode>> {
        let docs = self
            .store
            .find(
                CATEGORIES,
                &Query::new(Filter::All).order_by("name", OrderDirection::Asc),
            )
            .await?;

        let mut roots = Vec::new();
        let mut children: HashMap<String, Vec<Category>> = HashMap::new();
        for doc in &docs {
            let category = Category::from_document(CATEGORIES, doc)?;
            match category.parent_category.clone() {
                Some(parent) => children.entry(parent).or_default().push(category),
                None => roots.push(category),
            }
        }

        Ok(roots
            .into_iter()
            .map(|root| build_node(root, &mut children))
            .collect())
    }
}

fn build_node(category: Category, children: &mut HashMap<String, Vec<Category>>) -> CategoryNode {
    let kids = children.remove(&category.id).unwrap_or_default();
    CategoryNode {
        children: kids.into_iter().map(|kid| build_node(kid, children)).collect(),
        category,
    }
}

fn not_found(id: &str) -> Error {
    Error::ProductNotFound { id: id.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Catalog) {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_with(tmp.path(), CatalogConfig::default().without_commits())
            .await
            .unwrap();
        (tmp, Catalog::new(db))
    }

    fn request(top: &str, second: &str, third: &str) -> NewProduct {
        NewProduct {
            top_level_category: top.into(),
            second_level_category: second.into(),
            third_level_category: third.into(),
            title: format!("{} {}", third, second),
            price: 100.0,
            discounted_price: 80.0,
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_find_product() {
        let (_tmp, catalog) = setup().await;

        let created = catalog.create_product(request("Men", "Clothing", "Shirts")).await.unwrap();
        let found = catalog.find_product_by_id(&created.id).await.unwrap();

        assert_eq!(found.product, created);
        let category = found.category.unwrap();
        assert_eq!((category.name.as_str(), category.level), ("Shirts", 3));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let (_tmp, catalog) = setup().await;

        assert!(catalog.find_product_by_id("nope").await.unwrap_err().is_not_found());
        assert!(catalog.delete_product("nope").await.unwrap_err().is_not_found());
        assert!(catalog
            .update_product("nope", serde_json::Map::new())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_unreadable_patch_is_not_written() {
        let (_tmp, catalog) = setup().await;
        let created = catalog.create_product(request("Men", "Clothing", "Shirts")).await.unwrap();

        let patch = serde_json::json!({ "price": "cheap", "quantity": 0 });
        let err = catalog
            .update_product(&created.id, patch.as_object().cloned().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));

        let found = catalog.find_product_by_id(&created.id).await.unwrap();
        assert_eq!(found.product, created);
    }

    #[tokio::test]
    async fn test_delete_keeps_categories() {
        let (_tmp, catalog) = setup().await;
        let created = catalog.create_product(request("Men", "Clothing", "Shirts")).await.unwrap();

        catalog.delete_product(&created.id).await.unwrap();

        assert!(catalog.find_product_by_id(&created.id).await.is_err());
        assert_eq!(catalog.store().count(CATEGORIES, &Filter::All).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_category_tree() {
        let (_tmp, catalog) = setup().await;
        for (top, second, third) in [
            ("Women", "Shoes", "Boots"),
            ("Men", "Clothing", "Shirts"),
            ("Men", "Clothing", "Jackets"),
            ("Men", "Accessories", "Belts"),
        ] {
            catalog.resolve_category_path(top, second, third).await.unwrap();
        }

        let tree = catalog.category_tree().await.unwrap();
        let names = |nodes: &[CategoryNode]| nodes.iter().map(|n| n.category.name.clone()).collect::<Vec<_>>();

        assert_eq!(names(&tree), vec!["Men", "Women"]);
        assert_eq!(names(&tree[0].children), vec!["Accessories", "Clothing"]);
        assert_eq!(names(&tree[0].children[1].children), vec!["Jackets", "Shirts"]);
        assert_eq!(names(&tree[1].children[0].children), vec!["Boots"]);
    }
}
