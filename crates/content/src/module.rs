use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Path, extract::State, routing::get, Json, Router};
use serde_json::json;
use shelf_http::error::AppError;
use shelf_kernel::{InitCtx, Module};

use crate::entry::Entry;
use crate::store::{CollectionSummary, ContentStore};

/// Core module exposing the loaded collections read-only
pub struct ContentModule {
    store: Arc<ContentStore>,
}

impl ContentModule {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for ContentModule {
    fn name(&self) -> &'static str {
        "content"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            root = %self.store.root().display(),
            collections = self.store.registry().len(),
            entries = self.store.len(),
            strict = ctx.settings.content.strict,
            "content module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_collections))
            .route("/{collection}", get(list_entries))
            .route("/{collection}/schema", get(collection_schema))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let not_found = json!({
            "description": "Unknown collection",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let collection_param = json!([{
            "name": "collection",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List collections with entry counts",
                        "tags": ["Content"],
                        "responses": {
                            "200": {
                                "description": "Collections",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/CollectionSummary" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{collection}": {
                    "get": {
                        "summary": "List raw entries of a collection",
                        "tags": ["Content"],
                        "parameters": collection_param,
                        "responses": {
                            "200": {
                                "description": "Entries ordered by id",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Entry" }
                                        }
                                    }
                                }
                            },
                            "404": not_found
                        }
                    }
                },
                "/{collection}/schema": {
                    "get": {
                        "summary": "JSON Schema entries of a collection must satisfy",
                        "tags": ["Content"],
                        "parameters": collection_param,
                        "responses": {
                            "200": {
                                "description": "JSON Schema document",
                                "content": { "application/json": { "schema": { "type": "object" } } }
                            },
                            "404": not_found
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "CollectionSummary": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "entries": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["name", "entries"]
                    },
                    "Entry": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "slug": { "type": "string" },
                            "collection": { "type": "string" },
                            "data": { "type": "object" },
                            "body": { "type": "string" }
                        },
                        "required": ["id", "slug", "collection", "data"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "content module stopped");
        Ok(())
    }
}

async fn list_collections(State(store): State<Arc<ContentStore>>) -> Json<Vec<CollectionSummary>> {
    Json(store.summary())
}

async fn list_entries(
    State(store): State<Arc<ContentStore>>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Entry>>, AppError> {
    Ok(Json(store.entries(&collection)?.to_vec()))
}

async fn collection_schema(
    State(store): State<Arc<ContentStore>>,
    Path(collection): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let collection = store.registry().get(&collection)?;
    Ok(Json(collection.schema().raw().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{define_collection, CollectionRegistry};
    use crate::store::LoadOptions;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn module() -> (tempfile::TempDir, ContentModule) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/hello.json"), r#"{"title": "hi"}"#).unwrap();

        let mut registry = CollectionRegistry::new();
        registry
            .define(define_collection(
                "notes",
                json!({ "type": "object", "required": ["title"] }),
            ))
            .unwrap();
        let store = ContentStore::load(registry, dir.path(), LoadOptions::default()).unwrap();
        (dir, ContentModule::new(Arc::new(store)))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn lists_collection_summaries() {
        let (_dir, module) = module();
        let (status, body) = get(module.routes(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "name": "notes", "entries": 1 }]));
    }

    #[tokio::test]
    async fn lists_raw_entries() {
        let (_dir, module) = module();
        let (status, body) = get(module.routes(), "/notes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["slug"], "hello");
        assert_eq!(body[0]["data"]["title"], "hi");
    }

    #[tokio::test]
    async fn serves_schema_and_404s_unknown_collections() {
        let (_dir, module) = module();
        let (status, body) = get(module.routes(), "/notes/schema").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["required"], json!(["title"]));

        let (status, body) = get(module.routes(), "/books/schema").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[test]
    fn openapi_fragment_documents_every_route() {
        let (_dir, module) = module();
        let spec = module.openapi().unwrap();
        for path in ["/", "/{collection}", "/{collection}/schema"] {
            assert!(spec["paths"].get(path).is_some(), "{path}");
        }
    }
}
