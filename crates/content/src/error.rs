//! Errors raised while declaring, loading, or reading content collections.

use std::path::PathBuf;

use serde_json::json;
use shelf_http::error::AppError;
use thiserror::Error;

use crate::schema::Issues;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("entry '{id}' in collection '{collection}' does not match the collection schema:\n{issues}")]
    Validation {
        collection: String,
        id: String,
        issues: Issues,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("duplicate slug '{slug}' in collection '{collection}': '{first}' and '{second}'")]
    DuplicateSlug {
        collection: String,
        slug: String,
        first: String,
        second: String,
    },

    #[error("entry '{id}' in collection '{collection}' uses the reserved slug '{slug}'")]
    ReservedSlug {
        collection: String,
        slug: String,
        id: String,
    },

    #[error("collection '{0}' is already defined")]
    DuplicateCollection(String),

    #[error("invalid collection name '{0}'; use lowercase letters, digits, '-' or '_'")]
    InvalidName(String),

    #[error("invalid schema for collection '{collection}': {reason}")]
    Schema { collection: String, reason: String },

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("entry '{slug}' not found in collection '{collection}'")]
    EntryNotFound { collection: String, slug: String },

    #[error("failed to decode entry '{id}' in collection '{collection}': {source}")]
    Decode {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{count} content entries failed to load", count = .0.len())]
    Failed(Vec<ContentError>),
}

impl ContentError {
    /// Individual failures, flattening an aggregated load error.
    pub fn failures(&self) -> Vec<&ContentError> {
        match self {
            ContentError::Failed(failures) => failures.iter().collect(),
            other => vec![other],
        }
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation { collection, issues, .. } => AppError::validation(
                issues
                    .iter()
                    .map(|issue| json!({ "path": issue.path, "message": issue.message }))
                    .collect(),
                format!("entry does not match the '{collection}' collection schema"),
            ),
            ContentError::UnknownCollection(_) | ContentError::EntryNotFound { .. } => {
                AppError::not_found(err.to_string())
            }
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}
