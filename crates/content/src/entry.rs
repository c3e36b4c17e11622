//! Content entries and the file formats they are read from.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

/// Reserved data key that overrides the slug derived from the file path.
const SLUG_KEY: &str = "slug";
const FRONT_MATTER_FENCE: &str = "---";

/// An entry as loaded from disk, already validated against its collection.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// Path relative to the collection directory, `/`-separated, extension kept.
    pub id: String,
    pub slug: String,
    pub collection: String,
    pub data: Value,
    /// Markdown body following the front matter, if the source had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip)]
    pub source: PathBuf,
}

/// An entry decoded into its collection's record type.
#[derive(Debug, Clone, Serialize)]
pub struct TypedEntry<T> {
    pub id: String,
    pub slug: String,
    pub collection: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Source formats an entry file can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceFormat {
    Markdown,
    Json,
    Yaml,
    Toml,
}

impl SourceFormat {
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Raw data and optional body extracted from a source file.
#[derive(Debug)]
pub(crate) struct ParsedSource {
    pub data: Map<String, Value>,
    pub body: Option<String>,
}

impl ParsedSource {
    /// Remove the reserved `slug` key, returning it when it holds a string.
    pub(crate) fn take_slug(&mut self) -> Option<String> {
        match self.data.remove(SLUG_KEY) {
            Some(Value::String(slug)) => Some(slug),
            Some(other) => {
                // Not ours to interpret; leave it for the schema to judge.
                self.data.insert(SLUG_KEY.to_string(), other);
                None
            }
            None => None,
        }
    }
}

pub(crate) fn parse_source(format: SourceFormat, text: &str) -> Result<ParsedSource, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let (value, body) = match format {
        SourceFormat::Markdown => {
            let (front_matter, body) = split_front_matter(text);
            let value = match front_matter {
                Some(yaml) => parse_yaml(yaml)?,
                None => Value::Null,
            };
            (value, Some(body.to_string()))
        }
        SourceFormat::Json => (
            serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?,
            None,
        ),
        SourceFormat::Yaml => (parse_yaml(text)?, None),
        SourceFormat::Toml => (
            toml::from_str(text).map_err(|e| format!("invalid TOML: {e}"))?,
            None,
        ),
    };

    let data = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(format!(
                "entry data must be a mapping, found {}",
                kind_of(&other)
            ))
        }
    };

    Ok(ParsedSource { data, body })
}

fn parse_yaml(text: &str) -> Result<Value, String> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text).map_err(|e| format!("invalid YAML: {e}"))
}

/// Split `---` fenced YAML front matter from the Markdown body.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = strip_fence_line(text) else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            let front_matter = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(front_matter), body.trim_start_matches(['\r', '\n']));
        }
        offset += line.len();
    }

    // An opening fence without a closing one is plain Markdown.
    (None, text)
}

fn strip_fence_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FRONT_MATTER_FENCE)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Slug derived from an entry id: extension dropped, lowercased, whitespace
/// runs collapsed to `-`.
pub(crate) fn default_slug(id: &str) -> String {
    let stem = match id.rfind('.') {
        Some(dot) if !id[dot..].contains('/') => &id[..dot],
        _ => id,
    };

    stem.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a/b.MD")),
            Some(SourceFormat::Markdown)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("b.yml")),
            Some(SourceFormat::Yaml)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("b.toml")),
            Some(SourceFormat::Toml)
        );
        assert_eq!(SourceFormat::from_path(Path::new("cover.png")), None);
        assert_eq!(SourceFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn markdown_front_matter_and_body() {
        let text = "---\ntitle: Dune\nreadtime: 12\n---\n\n# Chapter one\n";
        let parsed = parse_source(SourceFormat::Markdown, text).unwrap();
        assert_eq!(parsed.data["title"], "Dune");
        assert_eq!(parsed.data["readtime"], 12);
        assert_eq!(parsed.body.as_deref(), Some("# Chapter one\n"));
    }

    #[test]
    fn markdown_with_crlf_line_endings() {
        let text = "---\r\ntitle: Dune\r\n---\r\nBody\r\n";
        let parsed = parse_source(SourceFormat::Markdown, text).unwrap();
        assert_eq!(parsed.data["title"], "Dune");
        assert_eq!(parsed.body.as_deref(), Some("Body\r\n"));
    }

    #[test]
    fn markdown_without_front_matter_has_empty_data() {
        let parsed = parse_source(SourceFormat::Markdown, "just text").unwrap();
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.body.as_deref(), Some("just text"));
    }

    #[test]
    fn unterminated_front_matter_is_body() {
        let parsed = parse_source(SourceFormat::Markdown, "---\ntitle: x\n").unwrap();
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn toml_and_json_sources() {
        let parsed = parse_source(
            SourceFormat::Toml,
            "title = \"Dune\"\nreadtime = 7.5\n[buy]\nusa = \"u\"\n",
        )
        .unwrap();
        assert_eq!(parsed.data["readtime"], 7.5);
        assert_eq!(parsed.data["buy"]["usa"], "u");

        let parsed = parse_source(SourceFormat::Json, r#"{"title":"Dune"}"#).unwrap();
        assert_eq!(parsed.data["title"], "Dune");
        assert!(parsed.body.is_none());
    }

    #[test]
    fn non_mapping_data_is_rejected() {
        let err = parse_source(SourceFormat::Yaml, "- a\n- b\n").unwrap_err();
        assert!(err.contains("a sequence"));

        let err = parse_source(SourceFormat::Json, "{").unwrap_err();
        assert!(err.starts_with("invalid JSON"));
    }

    #[test]
    fn slug_override_is_taken_from_data() {
        let mut parsed = parse_source(SourceFormat::Yaml, "slug: custom\ntitle: x\n").unwrap();
        assert_eq!(parsed.take_slug().as_deref(), Some("custom"));
        assert!(!parsed.data.contains_key("slug"));

        let mut parsed = parse_source(SourceFormat::Yaml, "slug: 3\n").unwrap();
        assert_eq!(parsed.take_slug(), None);
        assert!(parsed.data.contains_key("slug"));
    }

    #[test]
    fn slugs_from_ids() {
        assert_eq!(default_slug("the-hobbit.md"), "the-hobbit");
        assert_eq!(default_slug("Sci Fi/Dune  Messiah.yaml"), "sci-fi/dune-messiah");
        assert_eq!(default_slug("v1.2/notes"), "v1.2/notes");
    }
}
