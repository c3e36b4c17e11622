use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shelf_content::TypedEntry;
use url::Url;

/// JSON Schema every entry of the `books` collection must satisfy.
static BOOK_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "title": "BookEntry",
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "minLength": 1,
                "description": "Title of the book"
            },
            "author": {
                "type": "string",
                "minLength": 1,
                "description": "Author of the book"
            },
            "img": {
                "type": "string",
                "format": "url",
                "description": "Absolute URL of the cover image"
            },
            "readtime": {
                "type": "number",
                "description": "Estimated reading time, in minutes"
            },
            "description": {
                "type": "string",
                "description": "Free-text blurb"
            },
            "buy": {
                "type": "object",
                "description": "Where to buy the book, per region",
                "properties": {
                    "spain": { "type": "string" },
                    "usa": { "type": "string" }
                },
                "required": ["spain", "usa"]
            }
        },
        "required": ["title", "author", "img", "readtime", "description", "buy"]
    })
});

/// The schema document for book entries.
pub fn schema() -> Value {
    BOOK_SCHEMA.clone()
}

/// A validated entry of the `books` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    pub title: String,
    pub author: String,
    /// Cover image. Serialized in WHATWG-normalized form, so
    /// `https://example.com` reads back as `https://example.com/`.
    pub img: Url,
    /// Minutes
    pub readtime: f64,
    pub description: String,
    pub buy: PurchaseLinks,
}

/// Region-specific purchase links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLinks {
    pub spain: String,
    pub usa: String,
}

/// A book as served by the API: identity plus the entry fields.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    /// Path of the source file inside the collection
    pub id: String,
    /// URL-friendly slug for the book
    pub slug: String,
    #[serde(flatten)]
    pub entry: BookEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<TypedEntry<BookEntry>> for Book {
    fn from(entry: TypedEntry<BookEntry>) -> Self {
        Self {
            id: entry.id,
            slug: entry.slug,
            entry: entry.data,
            body: entry.body,
        }
    }
}
