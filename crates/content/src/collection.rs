//! Collection declarations and the registry that compiles them.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ContentError;
use crate::schema::EntrySchema;

/// Declaration of a named, schema-validated content collection.
#[derive(Debug, Clone)]
pub struct CollectionDefinition {
    pub name: String,
    pub schema: Value,
    /// Slugs no entry may take, usually because a route already owns them.
    pub reserved_slugs: Vec<String>,
}

impl CollectionDefinition {
    /// Refuse entries whose slug is one of `slugs`.
    pub fn reserve_slugs<I, S>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_slugs.extend(slugs.into_iter().map(Into::into));
        self
    }
}

/// Declare a collection named `name` whose entries must satisfy `schema`.
pub fn define_collection(name: impl Into<String>, schema: Value) -> CollectionDefinition {
    CollectionDefinition {
        name: name.into(),
        schema,
        reserved_slugs: Vec::new(),
    }
}

/// A collection with its schema compiled and ready to check entries.
#[derive(Debug)]
pub struct Collection {
    name: String,
    schema: EntrySchema,
    reserved_slugs: Vec<String>,
}

impl Collection {
    fn compile(definition: CollectionDefinition) -> Result<Self, ContentError> {
        if !is_valid_name(&definition.name) {
            return Err(ContentError::InvalidName(definition.name));
        }
        let schema = EntrySchema::compile(&definition.name, definition.schema)?;
        Ok(Self {
            name: definition.name,
            schema,
            reserved_slugs: definition.reserved_slugs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &EntrySchema {
        &self.schema
    }

    pub fn is_reserved(&self, slug: &str) -> bool {
        self.reserved_slugs.iter().any(|reserved| reserved == slug)
    }

    /// Check `data` for the entry `id` against this collection's schema.
    pub fn validate(&self, id: &str, data: &Value) -> Result<(), ContentError> {
        self.schema
            .validate(data)
            .map_err(|issues| ContentError::Validation {
                collection: self.name.clone(),
                id: id.to_string(),
                issues,
            })
    }

    /// Validate `data`, then decode it into the collection's record type.
    pub fn parse<T: DeserializeOwned>(&self, id: &str, data: &Value) -> Result<T, ContentError> {
        self.validate(id, data)?;
        self.decode(id, data)
    }

    pub(crate) fn decode<T: DeserializeOwned>(
        &self,
        id: &str,
        data: &Value,
    ) -> Result<T, ContentError> {
        T::deserialize(data).map_err(|source| ContentError::Decode {
            collection: self.name.clone(),
            id: id.to_string(),
            source,
        })
    }
}

/// The set of collections exported by an application.
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    collections: BTreeMap<String, Collection>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register a collection.
    ///
    /// # Errors
    ///
    /// Fails when the name is malformed or already taken, or when the schema
    /// does not compile.
    pub fn define(&mut self, definition: CollectionDefinition) -> Result<&Collection, ContentError> {
        if self.collections.contains_key(&definition.name) {
            return Err(ContentError::DuplicateCollection(definition.name));
        }

        let collection = Collection::compile(definition)?;
        tracing::debug!(collection = collection.name(), "collection defined");

        let name = collection.name.clone();
        Ok(self.collections.entry(name).or_insert(collection))
    }

    pub fn get(&self, name: &str) -> Result<&Collection, ContentError> {
        self.collections
            .get(name)
            .ok_or_else(|| ContentError::UnknownCollection(name.to_string()))
    }

    /// Collection names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
