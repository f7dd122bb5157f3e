//! The document store seam
//!
//! The catalog core only talks to storage through [`DocumentStore`]. The
//! markdown-backed [`Database`] is the implementation this crate ships.

use async_trait::async_trait;

use super::collection::Collection;
use super::document::{Document, Fields};
use crate::query::{self, Filter, Query};
use crate::git::Repository;
use crate::validation::{validate_collection_name, validate_document_id};
use crate::Database;

/// A partial overwrite of a document: listed fields replace existing ones,
/// other fields are left alone. `body` replaces the body when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub fields: Fields,
    pub body: Option<String>,
}

impl DocumentPatch {
    /// Overwrite `doc` with the patched fields and body
    pub fn apply(self, doc: &mut Document) {
        doc.fields.extend(self.fields);
        if let Some(body) = self.body {
            doc.body = body;
        }
    }
}

/// Document CRUD plus filtered reads, the operations the catalog needs from
/// its persistence engine.
///
/// A write that cannot be recorded (a failed git commit in [`Database`]) is
/// undone before the error is returned, so retrying it is safe.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// First document (in id order) matching the filter
    async fn find_one(&self, collection: &str, filter: &Filter) -> crate::Result<Option<Document>>;

    /// Insert a document, assigning an id when it has none
    async fn insert(&self, collection: &str, doc: Document) -> crate::Result<Document>;

    /// Return the document matching `key`, inserting `doc` if none does.
    /// The read and the insert happen as one step with respect to other writers.
    async fn find_or_insert(&self, collection: &str, key: &Filter, doc: Document) -> crate::Result<Document>;

    async fn find_by_id(&self, collection: &str, id: &str) -> crate::Result<Option<Document>>;

    async fn find(&self, collection: &str, query: &Query) -> crate::Result<Vec<Document>>;

    async fn count(&self, collection: &str, filter: &Filter) -> crate::Result<usize>;

    /// Apply a patch; `None` when the id does not resolve
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: DocumentPatch,
    ) -> crate::Result<Option<Document>>;

    /// `false` when the id does not resolve
    async fn delete_by_id(&self, collection: &str, id: &str) -> crate::Result<bool>;
}

impl Database {
    fn collection(&self, name: &str) -> crate::Result<Collection> {
        validate_collection_name(name)?;
        Ok(Collection::open(name, &self.root))
    }

    /// Insert without taking the writer lock; callers must hold it and
    /// record the write once this returns.
    async fn insert_unlocked(&self, collection: &Collection, mut doc: Document) -> crate::Result<Document> {
        if doc.id.is_empty() {
            doc.id = uuid::Uuid::new_v4().to_string();
        }
        validate_document_id(&doc.id)?;

        collection.insert(&doc).await?;
        Ok(doc)
    }
}

fn record(writer: &Option<Repository>, message: &str) -> crate::Result<()> {
    if let Some(repo) = writer {
        repo.commit(message)?;
    }
    Ok(())
}

/// A file change to take back when its commit fails
enum Undo<'a> {
    Insert(&'a Document),
    Update { previous: &'a Document },
    Delete { previous: &'a Document },
}

/// Put the collection back the way it was before an uncommitted write, so the
/// files on disk never run ahead of the history.
async fn undo(collection: &Collection, change: Undo<'_>) {
    let (id, result) = match change {
        Undo::Insert(doc) => (&doc.id, collection.delete(&doc.id).await.map(|_| ())),
        Undo::Update { previous } => (&previous.id, collection.update(previous).await),
        Undo::Delete { previous } => (&previous.id, collection.insert(previous).await),
    };
    match result {
        Ok(()) => tracing::warn!(collection = %collection.name, %id, "commit failed, write undone"),
        Err(e) => tracing::warn!(collection = %collection.name, %id, "commit failed and undo failed: {}", e),
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn find_one(&self, collection: &str, filter: &Filter) -> crate::Result<Option<Document>> {
        let docs = self.collection(collection)?.list().await?;
        Ok(docs.into_iter().find(|doc| filter.matches(doc)))
    }

    async fn insert(&self, collection: &str, doc: Document) -> crate::Result<Document> {
        let collection = self.collection(collection)?;
        let writer = self.writer.lock().await;
        let doc = self.insert_unlocked(&collection, doc).await?;

        let committed = record(&writer, &format!("INSERT into {}: {}", collection.name, doc.id));
        if let Err(e) = committed {
            undo(&collection, Undo::Insert(&doc)).await;
            return Err(e);
        }
        Ok(doc)
    }

    async fn find_or_insert(&self, collection: &str, key: &Filter, doc: Document) -> crate::Result<Document> {
        let handle = self.collection(collection)?;
        let writer = self.writer.lock().await;

        if let Some(existing) = self.find_one(collection, key).await? {
            tracing::debug!(collection, id = %existing.id, "find_or_insert matched existing document");
            return Ok(existing);
        }

        let doc = self.insert_unlocked(&handle, doc).await?;

        let committed = record(&writer, &format!("INSERT into {}: {}", collection, doc.id));
        if let Err(e) = committed {
            undo(&handle, Undo::Insert(&doc)).await;
            return Err(e);
        }
        tracing::info!(collection, id = %doc.id, "find_or_insert created document");
        Ok(doc)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> crate::Result<Option<Document>> {
        // an id that could not have been assigned names no document
        if validate_document_id(id).is_err() {
            tracing::debug!(collection, id, "lookup with invalid document id");
            return Ok(None);
        }
        self.collection(collection)?.get(id).await
    }

    async fn find(&self, collection: &str, query: &Query) -> crate::Result<Vec<Document>> {
        let docs = self.collection(collection)?.list().await?;
        Ok(query::execute(docs, query))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> crate::Result<usize> {
        let docs = self.collection(collection)?.list().await?;
        Ok(docs.iter().filter(|doc| filter.matches(doc)).count())
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: DocumentPatch,
    ) -> crate::Result<Option<Document>> {
        if validate_document_id(id).is_err() {
            return Ok(None);
        }
        let handle = self.collection(collection)?;
        let writer = self.writer.lock().await;

        let Some(previous) = handle.get(id).await? else {
            return Ok(None);
        };

        let mut doc = previous.clone();
        patch.apply(&mut doc);
        handle.update(&doc).await?;

        let committed = record(&writer, &format!("UPDATE {}: {}", collection, id));
        if let Err(e) = committed {
            undo(&handle, Undo::Update { previous: &previous }).await;
            return Err(e);
        }
        Ok(Some(doc))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> crate::Result<bool> {
        if validate_document_id(id).is_err() {
            return Ok(false);
        }
        let handle = self.collection(collection)?;
        let writer = self.writer.lock().await;

        // an unreadable file can still be deleted, it just cannot be restored
        let previous = handle.get(id).await.unwrap_or_else(|e| {
            tracing::warn!(collection, id, "deleting unreadable document: {}", e);
            None
        });
        if !handle.delete(id).await? {
            return Ok(false);
        }

        let committed = record(&writer, &format!("DELETE from {}: {}", collection, id));
        if let Err(e) = committed {
            if let Some(previous) = &previous {
                undo(&handle, Undo::Delete { previous }).await;
            }
            return Err(e);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database) {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_with(tmp.path(), CatalogConfig::default().without_commits())
            .await
            .unwrap();
        (tmp, db)
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let (_tmp, db) = setup().await;

        let mut doc = Document::draft();
        doc.set("name", "Men");
        let saved = db.insert("categories", doc).await.unwrap();

        assert!(!saved.id.is_empty());
        let fetched = db.find_by_id("categories", &saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.get("name").and_then(|v| v.as_str()), Some("Men"));
    }

    #[tokio::test]
    async fn test_invalid_ids_read_as_absent() {
        let (_tmp, db) = setup().await;
        assert!(db.find_by_id("products", "../../etc/passwd").await.unwrap().is_none());
        assert!(!db.delete_by_id("products", "../x").await.unwrap());
        assert!(db
            .update_by_id("products", "", DocumentPatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let (_tmp, db) = setup().await;

        let mut doc = Document::draft();
        doc.set("title", "Shirt").set("quantity", 5i64);
        let saved = db.insert("products", doc.with_body("Soft.")).await.unwrap();

        let mut patch = DocumentPatch::default();
        patch.fields.insert("quantity".into(), 0i64.into());
        let updated = db.update_by_id("products", &saved.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.get("title").and_then(|v| v.as_str()), Some("Shirt"));
        assert_eq!(updated.get("quantity").and_then(|v| v.as_i64()), Some(0));
        assert_eq!(updated.body, "Soft.");
    }

    #[tokio::test]
    async fn test_concurrent_find_or_insert_creates_once() {
        let (_tmp, db) = setup().await;
        let db = Arc::new(db);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                let key = Filter::and([Filter::eq("name", "Men"), Filter::eq("level", 1i64)]);
                let mut doc = Document::draft();
                doc.set("name", "Men").set("level", 1i64);
                db.find_or_insert("categories", &key, doc).await.unwrap().id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(db.count("categories", &Filter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_writes_are_committed() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).await.unwrap();

        let saved = db.insert("products", Document::draft()).await.unwrap();
        db.delete_by_id("products", &saved.id).await.unwrap();

        let writer = db.writer.lock().await;
        let repo = writer.as_ref().unwrap();
        assert_eq!(repo.commit_count().unwrap(), 3);
        assert!(!repo.has_changes().unwrap());
    }

    #[tokio::test]
    async fn test_failed_commit_undoes_write() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).await.unwrap();

        let mut doc = Document::draft();
        doc.set("title", "Shirt").set("quantity", 5i64);
        let saved = db.insert("products", doc).await.unwrap();

        // a held index lock makes every commit fail
        let lock = tmp.path().join(".git").join("index.lock");
        std::fs::write(&lock, "").unwrap();

        let mut draft = Document::draft();
        draft.set("title", "Jacket");
        assert!(db.insert("products", draft).await.is_err());
        assert_eq!(db.count("products", &Filter::All).await.unwrap(), 1);

        let mut patch = DocumentPatch::default();
        patch.fields.insert("quantity".into(), 0i64.into());
        assert!(db.update_by_id("products", &saved.id, patch).await.is_err());
        let current = db.find_by_id("products", &saved.id).await.unwrap().unwrap();
        assert_eq!(current.get("quantity").and_then(|v| v.as_i64()), Some(5));

        assert!(db.delete_by_id("products", &saved.id).await.is_err());
        assert!(db.find_by_id("products", &saved.id).await.unwrap().is_some());

        std::fs::remove_file(&lock).unwrap();
        assert!(db.delete_by_id("products", &saved.id).await.unwrap());
        assert_eq!(db.commit_count().await.unwrap(), Some(3));
        assert!(!db.has_uncommitted_changes().await.unwrap());
    }

    #[test]
    fn test_patch_apply() {
        let mut doc = Document::new("p-1").with_body("Soft.");
        doc.set("title", "Shirt").set("quantity", 5i64);

        let mut patch = DocumentPatch::default();
        patch.fields.insert("quantity".into(), 0i64.into());
        patch.apply(&mut doc);

        assert_eq!(doc.get("title").and_then(|v| v.as_str()), Some("Shirt"));
        assert_eq!(doc.get("quantity").and_then(|v| v.as_i64()), Some(0));
        assert_eq!(doc.body, "Soft.");
    }
}
