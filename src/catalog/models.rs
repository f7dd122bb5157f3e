//! Catalog entities and their mapping onto store documents

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::storage::document::{Document, Fields, Value};
use crate::storage::DocumentPatch;

/// A node of the three-level category taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// 1, 2 or 3
    pub level: u8,
    /// Absent only at level 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_category: Option<String>,
}

/// A size a product is offered in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

/// A product. Numeric attributes accept whole and fractional values.
///
/// The description is stored as the markdown body of the product document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub image_url: String,
    pub color: String,
    pub price: f64,
    pub discounted_price: f64,
    pub discount_percent: f64,
    pub quantity: f64,
    pub sizes: Vec<Size>,
    /// Id of the level-3 category
    pub category: String,
}

/// A product creation request: product attributes plus the three category
/// names its leaf category is resolved from.
///
/// Accepts the legacy `topLavelCategory`-style keys, `discountPersent` and
/// `size` as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    #[serde(alias = "topLavelCategory")]
    pub top_level_category: String,
    #[serde(alias = "secondLavelCategory")]
    pub second_level_category: String,
    #[serde(alias = "thirdLavelCategory")]
    pub third_level_category: String,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub image_url: String,
    pub color: String,
    pub price: f64,
    pub discounted_price: f64,
    #[serde(alias = "discountPersent")]
    pub discount_percent: f64,
    pub quantity: f64,
    #[serde(alias = "size")]
    pub sizes: Vec<Size>,
}

impl NewProduct {
    /// The product this request describes, attached to `category`
    pub fn into_product(self, category: String) -> Product {
        Product {
            id: String::new(),
            title: self.title,
            description: self.description,
            brand: self.brand,
            image_url: self.image_url,
            color: self.color,
            price: self.price,
            discounted_price: self.discounted_price,
            discount_percent: self.discount_percent,
            quantity: self.quantity,
            sizes: self.sizes,
            category,
        }
    }
}

/// A product with its category reference dereferenced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    /// `None` when the referenced category no longer exists
    pub category: Option<Category>,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// The requested 1-based page number, echoed back
    pub current_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// The page returned when a category filter names no category
    pub fn empty(current_page: i64) -> Self {
        Self {
            content: Vec::new(),
            current_page,
            total_pages: 1,
        }
    }
}

/// A category with its descendants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

const DESCRIPTION: &str = "description";

impl Category {
    pub fn from_document(collection: &str, doc: &Document) -> crate::Result<Self> {
        decode(collection, doc, None)
    }

    pub fn to_document(&self) -> crate::Result<Document> {
        encode(self, &self.id, None)
    }
}

impl Product {
    pub fn from_document(collection: &str, doc: &Document) -> crate::Result<Self> {
        decode(collection, doc, Some(DESCRIPTION))
    }

    pub fn to_document(&self) -> crate::Result<Document> {
        encode(self, &self.id, Some(DESCRIPTION))
    }
}

/// Turn a loosely-typed JSON object into a document patch. `description`
/// becomes the body; `id` cannot be overwritten.
pub fn product_patch(fields: serde_json::Map<String, serde_json::Value>) -> crate::Result<DocumentPatch> {
    let mut patch = DocumentPatch::default();
    for (key, value) in fields {
        match key.as_str() {
            "id" => {}
            DESCRIPTION => {
                patch.body = Some(match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                });
            }
            _ => {
                let value: Value = serde_json::from_value(value)?;
                patch.fields.insert(key, value);
            }
        }
    }
    Ok(patch)
}

fn decode<T: DeserializeOwned>(collection: &str, doc: &Document, body_field: Option<&str>) -> crate::Result<T> {
    let malformed = |message: String| Error::MalformedDocument {
        collection: collection.to_string(),
        id: doc.id.clone(),
        message,
    };

    let mut map = match serde_json::to_value(&doc.fields)? {
        serde_json::Value::Object(map) => map,
        _ => return Err(malformed("fields are not a mapping".to_string())),
    };
    map.insert("id".to_string(), serde_json::Value::String(doc.id.clone()));
    if let Some(field) = body_field {
        map.insert(field.to_string(), serde_json::Value::String(doc.body.clone()));
    }

    serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| malformed(e.to_string()))
}

fn encode<T: Serialize>(value: &T, id: &str, body_field: Option<&str>) -> crate::Result<Document> {
    let mut map = match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => map,
        other => return Err(Error::Other(format!("cannot store {} as a document", other))),
    };
    map.remove("id");

    let mut doc = Document::new(id);
    if let Some(field) = body_field {
        if let Some(serde_json::Value::String(body)) = map.remove(field) {
            doc.body = body;
        }
    }
    doc.fields = serde_json::from_value::<Fields>(serde_json::Value::Object(map))?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> Product {
        Product {
            title: "Linen Shirt".into(),
            description: "Breathable linen.".into(),
            color: "White".into(),
            price: 12.99,
            discounted_price: 8.99,
            discount_percent: 30.0,
            quantity: 4.0,
            sizes: vec![Size { name: "M".into(), quantity: Some(4.0) }],
            category: "leaf-1".into(),
            ..Product::default()
        }
    }

    #[test]
    fn test_product_document_mapping() {
        let doc = shirt().to_document().unwrap();

        assert!(doc.id.is_empty());
        assert_eq!(doc.body, "Breathable linen.");
        assert!(doc.get("description").is_none());
        assert_eq!(doc.get("discountedPrice"), Some(&Value::Float(8.99)));
        assert_eq!(doc.resolve_path("sizes.name"), vec![&Value::from("M")]);

        let mut stored = doc;
        stored.id = "p-1".into();
        let back = Product::from_document("products", &stored).unwrap();
        assert_eq!(back, Product { id: "p-1".into(), ..shirt() });
    }

    #[test]
    fn test_level_one_category_has_no_parent_field() {
        let top = Category {
            id: "c-1".into(),
            name: "Men".into(),
            level: 1,
            parent_category: None,
        };
        let doc = top.to_document().unwrap();
        assert_eq!(doc.id, "c-1");
        assert!(doc.get("parentCategory").is_none());
        assert_eq!(Category::from_document("categories", &doc).unwrap(), top);
    }

    #[test]
    fn test_malformed_document() {
        let mut doc = Document::new("c-1");
        doc.set("name", "Men").set("level", "one");
        let err = Category::from_document("categories", &doc).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn test_new_product_accepts_legacy_keys() {
        let request: NewProduct = serde_json::from_value(serde_json::json!({
            "topLavelCategory": "Men",
            "secondLavelCategory": "Clothing",
            "thirdLavelCategory": "Shirts",
            "discountPersent": 30,
            "size": [{ "name": "M", "quantity": 2 }],
            "title": "Linen Shirt"
        }))
        .unwrap();

        assert_eq!(request.top_level_category, "Men");
        assert_eq!(request.third_level_category, "Shirts");
        assert_eq!(request.discount_percent, 30.0);
        assert_eq!(request.sizes.len(), 1);

        let product = request.into_product("leaf".into());
        assert_eq!(product.category, "leaf");
        assert_eq!(product.title, "Linen Shirt");
    }

    #[test]
    fn test_numbers_decode_whole_or_fractional() {
        let mut doc = Document::new("p-1");
        doc.set("price", 20i64)
            .set("discountedPrice", 14.99)
            .set("quantity", 3i64);
        let product = Product::from_document("products", &doc).unwrap();
        assert_eq!((product.price, product.discounted_price, product.quantity), (20.0, 14.99, 3.0));

        let request: NewProduct =
            serde_json::from_value(serde_json::json!({ "discountedPrice": 14.99, "quantity": 2 })).unwrap();
        assert_eq!(request.discounted_price, 14.99);
        assert_eq!(request.quantity, 2.0);
    }

    #[test]
    fn test_product_patch() {
        let patch = product_patch(
            serde_json::json!({ "id": "other", "quantity": 0, "description": "New copy" })
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap();

        assert_eq!(patch.body.as_deref(), Some("New copy"));
        assert_eq!(patch.fields.get("quantity"), Some(&Value::Int(0)));
        assert!(!patch.fields.contains_key("id"));
    }
}
