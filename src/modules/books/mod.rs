pub mod models;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_content::{define_collection, CollectionDefinition, ContentStore};
use shelf_kernel::{InitCtx, Module};

use routes::Catalog;

/// Name of the content collection holding book entries
pub const COLLECTION: &str = "books";

/// The `books` collection binding: entries must satisfy [`models::schema`]
pub fn collection() -> CollectionDefinition {
    define_collection(COLLECTION, models::schema())
        .reserve_slugs(routes::RESERVED_SLUGS.iter().copied())
}

/// Books module serving the `books` collection
pub struct BooksModule {
    catalog: Catalog,
}

impl BooksModule {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = self.catalog.len(),
            "books module initialized"
        );
        if self.catalog.is_empty() {
            tracing::warn!(module = self.name(), "books collection has no entries");
        }
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };

        let mut book_schema = models::schema();
        book_schema["properties"]["id"] = json!({
            "type": "string",
            "description": "Path of the source file inside the collection"
        });
        book_schema["properties"]["slug"] = json!({
            "type": "string",
            "description": "URL-friendly slug for the book"
        });
        book_schema["properties"]["body"] = json!({
            "type": "string",
            "description": "Markdown body, when the entry has one"
        });
        if let Some(required) = book_schema["required"].as_array_mut() {
            required.push(json!("id"));
            required.push(json!("slug"));
        }

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Books ordered by id",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{slug}": {
                    "get": {
                        "summary": "Get a book by slug",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "slug",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": error_response("No book with that slug")
                        }
                    }
                },
                "/validate": {
                    "post": {
                        "summary": "Validate a candidate book entry",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookEntry" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "The entry is valid",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookEntry" }
                                    }
                                }
                            },
                            "422": error_response("The entry does not match the books schema")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookEntry": models::schema(),
                    "Book": book_schema
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over an already loaded content store
pub fn create_module(store: Arc<ContentStore>) -> anyhow::Result<Arc<dyn Module>> {
    let catalog = Catalog::new(store).context("failed to decode the books collection")?;
    Ok(Arc::new(BooksModule::new(catalog)))
}
