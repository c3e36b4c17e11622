use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use shelf_content::{ContentError, ContentStore};
use shelf_http::error::AppError;

use super::models::{Book, BookEntry};
use super::COLLECTION;

/// Books decoded once at startup, plus the store for validating candidates.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<ContentStore>,
    books: Arc<Vec<Book>>,
}

impl Catalog {
    pub fn new(store: Arc<ContentStore>) -> Result<Self, ContentError> {
        let books = store
            .collection::<BookEntry>(COLLECTION)?
            .into_iter()
            .map(Book::from)
            .collect();

        Ok(Self {
            store,
            books: Arc::new(books),
        })
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    fn find(&self, slug: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.slug == slug)
    }
}

/// Paths owned by fixed routes; no book may use them as its slug.
pub const RESERVED_SLUGS: &[&str] = &["health", "validate"];

/// HTTP routes for the books module
pub fn router(catalog: Catalog) -> Router {
    // Slugs of nested entries contain '/', so the lookup is a catch-all.
    Router::new()
        .route("/", get(list_books))
        .route("/health", get(health_check))
        .route("/validate", post(validate_book))
        .route("/{*slug}", get(get_book))
        .with_state(catalog)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(catalog): State<Catalog>) -> Json<Vec<Book>> {
    Json(catalog.books.as_ref().clone())
}

async fn get_book(
    State(catalog): State<Catalog>,
    Path(slug): Path<String>,
) -> Result<Json<Book>, AppError> {
    catalog
        .find(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no book with slug '{slug}'")))
}

/// Check a candidate entry against the books schema without storing it
async fn validate_book(
    State(catalog): State<Catalog>,
    candidate: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookEntry>, AppError> {
    let Json(candidate) =
        candidate.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let entry = catalog
        .store
        .registry()
        .get(COLLECTION)?
        .parse::<BookEntry>("request body", &candidate)?;

    tracing::debug!(title = %entry.title, "candidate book entry is valid");
    Ok(Json(entry))
}
