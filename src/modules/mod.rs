pub mod books;

use std::sync::Arc;

use shelf_content::{CollectionRegistry, ContentError, ContentStore};
use shelf_kernel::ModuleRegistry;

/// Every content collection this site declares
pub fn collections() -> Result<CollectionRegistry, ContentError> {
    let mut registry = CollectionRegistry::new();
    registry.define(books::collection())?;
    Ok(registry)
}

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<ContentStore>) -> anyhow::Result<()> {
    registry.register_custom(books::create_module(store)?);
    Ok(())
}
