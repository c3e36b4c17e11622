//! shelf application library
//!
//! Declares the site's content collections and the modules that serve them,
//! and wires both into the shelf kernel and HTTP server.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use shelf_content::{ContentModule, ContentStore, LoadOptions};
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Load and validate every declared collection from the configured root.
pub fn load_content(settings: &Settings) -> anyhow::Result<ContentStore> {
    let collections = modules::collections().context("failed to declare content collections")?;
    let options = LoadOptions {
        strict: settings.content.strict,
    };

    ContentStore::load(collections, &settings.content.root, options).with_context(|| {
        format!(
            "failed to load content from {}",
            settings.content.root.display()
        )
    })
}

/// Build the module registry over a loaded store: `content` as the core
/// module, then every project module.
pub fn build_registry(store: Arc<ContentStore>) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    registry.register_core(Arc::new(ContentModule::new(store.clone())));
    modules::register_all(&mut registry, store)?;
    Ok(registry)
}

/// Load content, boot every module, and serve HTTP until shutdown.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let store = Arc::new(load_content(&settings)?);
    let registry = build_registry(store)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.boot(&ctx).await?;
    let served = shelf_http::start_server(&registry, &settings).await;
    registry.shutdown().await?;

    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings_for(root: PathBuf) -> Settings {
        let mut settings = Settings::default();
        settings.content.root = root;
        settings
    }

    #[test]
    fn bundled_content_is_valid() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("content");
        let store = load_content(&settings_for(root)).unwrap();
        assert!(!store.entries(modules::books::COLLECTION).unwrap().is_empty());
    }

    #[test]
    fn invalid_content_fails_strict_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("books")).unwrap();
        std::fs::write(dir.path().join("books/bad.json"), r#"{"title": "No author"}"#).unwrap();

        let err = load_content(&settings_for(dir.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().starts_with("failed to load content from"));

        let mut lenient = settings_for(dir.path().to_path_buf());
        lenient.content.strict = false;
        assert!(load_content(&lenient).unwrap().is_empty());
    }

    #[tokio::test]
    async fn registry_boots_content_then_books() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(dir.path().to_path_buf());
        let store = Arc::new(load_content(&settings).unwrap());
        let registry = build_registry(store).unwrap();

        let names: Vec<&str> = registry.modules().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["content", "books"]);

        let ctx = InitCtx {
            settings: &settings,
        };
        registry.boot(&ctx).await.unwrap();
        registry.shutdown().await.unwrap();
    }
}
