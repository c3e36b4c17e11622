//! # Entry schemas
//!
//! Collections describe their entries with a JSON Schema document (draft
//! 2020-12). Schemas are compiled once, when the collection is defined, and
//! every entry is checked against the compiled validator at load time.
//!
//! Format assertions are enabled. On top of the built-in formats a `url`
//! format is registered, accepting anything [`url::Url`] can parse as an
//! absolute URL.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::Value;

use crate::error::ContentError;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// JSON Pointer to the offending value; empty for the entry root.
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.path, self.message)
        }
    }
}

/// Every violation found in one entry, in validator order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Issues(Vec<Issue>);

impl Issues {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.0.iter()
    }

    /// True when some issue points at `path`.
    pub fn touches(&self, path: &str) -> bool {
        self.0.iter().any(|issue| issue.path == path)
    }
}

impl From<Vec<Issue>> for Issues {
    fn from(issues: Vec<Issue>) -> Self {
        Self(issues)
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// A compiled entry schema.
pub struct EntrySchema {
    raw: Value,
    validator: Validator,
}

impl EntrySchema {
    /// Compile `schema` for the collection named `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Schema`] when the document is not a valid
    /// draft 2020-12 schema.
    pub fn compile(collection: &str, schema: Value) -> Result<Self, ContentError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .should_validate_formats(true)
            .with_format("url", is_absolute_url)
            .build(&schema)
            .map_err(|e| ContentError::Schema {
                collection: collection.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            raw: schema,
            validator,
        })
    }

    /// The schema document this validator was compiled from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Check `instance`, collecting every violation.
    pub fn validate(&self, instance: &Value) -> Result<(), Issues> {
        let issues: Vec<Issue> = self
            .validator
            .iter_errors(instance)
            .map(|e| {
                let mut path = e.instance_path.to_string();
                // Point missing-property errors at the property itself.
                if let ValidationErrorKind::Required { property } = &e.kind {
                    if let Some(name) = property.as_str() {
                        path = format!("{path}/{name}");
                    }
                }
                Issue {
                    path,
                    message: e.to_string(),
                }
            })
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Issues(issues))
        }
    }
}

impl fmt::Debug for EntrySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntrySchema")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

fn is_absolute_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> EntrySchema {
        EntrySchema::compile(
            "notes",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "link": { "type": "string", "format": "url" },
                    "meta": {
                        "type": "object",
                        "properties": { "tag": { "type": "string" } },
                        "required": ["tag"]
                    }
                },
                "required": ["name", "link", "meta"]
            }),
        )
        .unwrap()
    }

    #[test]
    fn accepts_conforming_instance() {
        let schema = sample();
        let instance = json!({
            "name": "first",
            "link": "https://example.com/a",
            "meta": { "tag": "x" }
        });
        assert!(schema.validate(&instance).is_ok());
    }

    #[test]
    fn rejects_relative_url() {
        let schema = sample();
        let instance = json!({
            "name": "first",
            "link": "/images/cover.png",
            "meta": { "tag": "x" }
        });
        let issues = schema.validate(&instance).unwrap_err();
        assert!(issues.touches("/link"));
    }

    #[test]
    fn missing_nested_property_points_at_property() {
        let schema = sample();
        let instance = json!({
            "name": "first",
            "link": "https://example.com/a",
            "meta": {}
        });
        let issues = schema.validate(&instance).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues.touches("/meta/tag"));
    }

    #[test]
    fn collects_every_violation() {
        let schema = sample();
        let issues = schema.validate(&json!({ "name": "" })).unwrap_err();
        assert!(issues.touches("/name"));
        assert!(issues.touches("/link"));
        assert!(issues.touches("/meta"));
        assert!(issues.to_string().contains("/link"));
    }

    #[test]
    fn invalid_schema_is_reported() {
        let err = EntrySchema::compile("broken", json!({ "type": "banana" })).unwrap_err();
        assert!(matches!(err, ContentError::Schema { ref collection, .. } if collection == "broken"));
    }

    #[test]
    fn raw_schema_is_kept() {
        let schema = sample();
        assert_eq!(schema.raw()["required"][0], "name");
    }
}
