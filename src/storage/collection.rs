//! Collection - a group of documents stored in a directory
//!
//! Each collection is a directory of markdown files, one per document:
//! ```text
//! /collections/
//!   /categories/
//!     0b1c...e9.md
//!   /products/
//!     5f2a...41.md
//! ```

use super::document::Document;
use crate::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// A collection of documents
#[derive(Debug)]
pub struct Collection {
    /// Name of the collection (directory name)
    pub name: String,
    /// Path to the collection directory
    pub path: PathBuf,
}

impl Collection {
    /// Open a collection at the given path
    pub fn open(name: impl Into<String>, base_path: &Path) -> Self {
        let name = name.into();
        let path = base_path.join("collections").join(&name);
        Self { name, path }
    }

    /// Create the collection directory if it doesn't exist
    pub async fn ensure_exists(&self) -> crate::Result<()> {
        fs::create_dir_all(&self.path)
            .await
            .map_err(|source| Error::CollectionCreateFailed {
                name: self.name.clone(),
                source,
            })
    }

    /// Check if the collection exists
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// List all documents in the collection, ordered by id.
    ///
    /// Files that cannot be parsed are skipped.
    pub async fn list(&self) -> crate::Result<Vec<Document>> {
        let mut documents = Vec::new();

        if !self.path.exists() {
            return Ok(documents);
        }

        for entry in WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().map(|e| e == "md").unwrap_or(false) {
                match self.read_document(path).await {
                    Ok(doc) => documents.push(doc),
                    Err(e) => {
                        tracing::warn!(collection = %self.name, path = ?path, "skipping unreadable document: {}", e);
                    }
                }
            }
        }

        Ok(documents)
    }

    /// Read a single document by ID
    pub async fn get(&self, id: &str) -> crate::Result<Option<Document>> {
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        self.read_document(&path).await.map(Some)
    }

    /// Insert a new document
    pub async fn insert(&self, doc: &Document) -> crate::Result<()> {
        self.ensure_exists().await?;
        let path = self.document_path(&doc.id);

        if path.exists() {
            return Err(Error::DocumentAlreadyExists {
                collection: self.name.clone(),
                id: doc.id.clone(),
            });
        }

        self.write(&path, doc).await
    }

    /// Overwrite an existing document
    pub async fn update(&self, doc: &Document) -> crate::Result<()> {
        let path = self.document_path(&doc.id);

        if !path.exists() {
            return Err(Error::DocumentNotFound {
                collection: self.name.clone(),
                id: doc.id.clone(),
            });
        }

        self.write(&path, doc).await
    }

    /// Delete a document by ID
    pub async fn delete(&self, id: &str) -> crate::Result<bool> {
        let path = self.document_path(id);
        if path.exists() {
            fs::remove_file(&path).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.path.join(format!("{}.md", id))
    }

    async fn write(&self, path: &Path, doc: &Document) -> crate::Result<()> {
        let content = doc.render()?;
        fs::write(path, content)
            .await
            .map_err(|source| Error::FileWriteError {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn read_document(&self, path: &Path) -> crate::Result<Document> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Other(format!("invalid document path {:?}", path)))?;

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| Error::FileReadError {
                path: path.to_path_buf(),
                source,
            })?;
        Document::parse(id, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_collection_crud() {
        let tmp = TempDir::new().unwrap();
        let collection = Collection::open("products", tmp.path());

        let mut doc = Document::new("shirt-1");
        doc.set("title", "Linen Shirt");
        doc.set("quantity", 3i64);
        doc.body = "Breathable linen.".into();

        collection.insert(&doc).await.unwrap();
        assert!(collection.insert(&doc).await.is_err());

        let fetched = collection.get("shirt-1").await.unwrap().unwrap();
        assert_eq!(fetched.get("title").unwrap().as_str(), Some("Linen Shirt"));

        let mut updated = fetched;
        updated.set("quantity", 0i64);
        collection.update(&updated).await.unwrap();

        let refetched = collection.get("shirt-1").await.unwrap().unwrap();
        assert_eq!(refetched.get("quantity").unwrap().as_i64(), Some(0));

        assert_eq!(collection.list().await.unwrap().len(), 1);

        assert!(collection.delete("shirt-1").await.unwrap());
        assert!(!collection.delete("shirt-1").await.unwrap());
        assert!(collection.get("shirt-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_skips_broken_files() {
        let tmp = TempDir::new().unwrap();
        let collection = Collection::open("products", tmp.path());

        for id in ["c", "a", "b"] {
            let mut doc = Document::new(id);
            doc.set("title", id);
            collection.insert(&doc).await.unwrap();
        }
        std::fs::write(collection.path.join("broken.md"), "---\ntitle: [unclosed\n").unwrap();

        let ids: Vec<_> = collection.list().await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_missing_collection_lists_empty() {
        let tmp = TempDir::new().unwrap();
        let collection = Collection::open("products", tmp.path());
        assert!(!collection.exists());
        assert!(collection.list().await.unwrap().is_empty());
    }
}
