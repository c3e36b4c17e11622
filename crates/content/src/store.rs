//! Loading collections from disk into an immutable, validated store.
//!
//! Each collection lives in `<root>/<collection name>/`. Every supported
//! file below that directory becomes one entry; files and directories whose
//! name starts with `_` or `.` are skipped. Entries are validated once here
//! and never mutated afterwards.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use walkdir::{DirEntry, WalkDir};

use crate::collection::{Collection, CollectionRegistry};
use crate::entry::{default_slug, parse_source, Entry, SourceFormat, TypedEntry};
use crate::error::ContentError;

/// How load failures are handled.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Fail the whole load when any entry is invalid. When false, invalid
    /// entries are logged and left out.
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Entry count for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub entries: usize,
}

/// Every collection's validated entries, sorted by id.
#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
    registry: CollectionRegistry,
    entries: BTreeMap<String, Vec<Entry>>,
}

impl ContentStore {
    /// Load and validate every collection in `registry` from `root`.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`ContentError::Failed`] carrying every
    /// problem found across all collections.
    pub fn load(
        registry: CollectionRegistry,
        root: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<Self, ContentError> {
        let root = root.as_ref().to_path_buf();
        let mut entries = BTreeMap::new();
        let mut failures = Vec::new();

        for collection in registry.iter() {
            let dir = root.join(collection.name());
            let (loaded, mut failed) = load_collection(collection, &dir);

            tracing::info!(
                collection = collection.name(),
                entries = loaded.len(),
                failures = failed.len(),
                dir = %dir.display(),
                "collection loaded"
            );

            failures.append(&mut failed);
            entries.insert(collection.name().to_string(), loaded);
        }

        if !failures.is_empty() {
            if options.strict {
                return Err(ContentError::Failed(failures));
            }
            for failure in &failures {
                tracing::warn!(error = %failure, "skipping invalid content entry");
            }
        }

        Ok(Self {
            root,
            registry,
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Raw entries of a collection.
    pub fn entries(&self, collection: &str) -> Result<&[Entry], ContentError> {
        self.entries
            .get(collection)
            .map(Vec::as_slice)
            .ok_or_else(|| ContentError::UnknownCollection(collection.to_string()))
    }

    /// A single raw entry by slug.
    pub fn entry(&self, collection: &str, slug: &str) -> Result<&Entry, ContentError> {
        self.entries(collection)?
            .iter()
            .find(|entry| entry.slug == slug)
            .ok_or_else(|| ContentError::EntryNotFound {
                collection: collection.to_string(),
                slug: slug.to_string(),
            })
    }

    /// Every entry of a collection decoded as `T`.
    pub fn collection<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<TypedEntry<T>>, ContentError> {
        let definition = self.registry.get(collection)?;
        self.entries(collection)?
            .iter()
            .map(|entry| typed(definition, entry))
            .collect()
    }

    /// A single entry decoded as `T`.
    pub fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        slug: &str,
    ) -> Result<TypedEntry<T>, ContentError> {
        let definition = self.registry.get(collection)?;
        typed(definition, self.entry(collection, slug)?)
    }

    /// Collections with their entry counts, sorted by name.
    pub fn summary(&self) -> Vec<CollectionSummary> {
        self.entries
            .iter()
            .map(|(name, entries)| CollectionSummary {
                name: name.clone(),
                entries: entries.len(),
            })
            .collect()
    }

    /// Total number of loaded entries across all collections.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn typed<T: DeserializeOwned>(
    collection: &Collection,
    entry: &Entry,
) -> Result<TypedEntry<T>, ContentError> {
    Ok(TypedEntry {
        id: entry.id.clone(),
        slug: entry.slug.clone(),
        collection: entry.collection.clone(),
        data: collection.decode(&entry.id, &entry.data)?,
        body: entry.body.clone(),
    })
}

fn load_collection(collection: &Collection, dir: &Path) -> (Vec<Entry>, Vec<ContentError>) {
    let mut entries: Vec<Entry> = Vec::new();
    let mut failures = Vec::new();

    if !dir.is_dir() {
        tracing::warn!(
            collection = collection.name(),
            dir = %dir.display(),
            "collection directory does not exist; treating it as empty"
        );
        return (entries, failures);
    }

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    for item in walker {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                failures.push(ContentError::Walk(err));
                continue;
            }
        };
        if !item.file_type().is_file() {
            continue;
        }

        let path = item.path();
        let Some(format) = SourceFormat::from_path(path) else {
            tracing::debug!(
                collection = collection.name(),
                path = %path.display(),
                "skipping unsupported file"
            );
            continue;
        };
        let Some(id) = entry_id(dir, path) else {
            tracing::warn!(
                collection = collection.name(),
                path = %path.display(),
                "content path is not valid UTF-8"
            );
            failures.push(ContentError::Parse {
                path: path.to_path_buf(),
                reason: "path is not valid UTF-8".to_string(),
            });
            continue;
        };

        match load_entry(collection, id, path, format) {
            Ok(entry) => entries.push(entry),
            Err(err) => failures.push(err),
        }
    }

    entries.sort_by(|a, b| a.id.cmp(&b.id));

    let mut seen: HashMap<String, String> = HashMap::new();
    entries.retain(|entry| match seen.get(&entry.slug) {
        Some(first) => {
            failures.push(ContentError::DuplicateSlug {
                collection: collection.name().to_string(),
                slug: entry.slug.clone(),
                first: first.clone(),
                second: entry.id.clone(),
            });
            false
        }
        None => {
            seen.insert(entry.slug.clone(), entry.id.clone());
            true
        }
    });

    (entries, failures)
}

fn load_entry(
    collection: &Collection,
    id: String,
    path: &Path,
    format: SourceFormat,
) -> Result<Entry, ContentError> {
    let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut parsed = parse_source(format, &text).map_err(|reason| ContentError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;

    let slug = parsed.take_slug().unwrap_or_else(|| default_slug(&id));
    if collection.is_reserved(&slug) {
        return Err(ContentError::ReservedSlug {
            collection: collection.name().to_string(),
            slug,
            id,
        });
    }
    let data = Value::Object(parsed.data);
    collection.validate(&id, &data)?;

    tracing::trace!(collection = collection.name(), entry = %id, %slug, "entry validated");

    Ok(Entry {
        id,
        slug,
        collection: collection.name().to_string(),
        data,
        body: parsed.body,
        source: path.to_path_buf(),
    })
}

fn entry_id(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('_') || name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::define_collection;
    use serde::Deserialize;
    use serde_json::json;
    use std::fs;

    #[derive(Debug, Deserialize)]
    struct Note {
        title: String,
    }

    fn registry() -> CollectionRegistry {
        let mut registry = CollectionRegistry::new();
        registry
            .define(define_collection(
                "notes",
                json!({
                    "type": "object",
                    "properties": { "title": { "type": "string", "minLength": 1 } },
                    "required": ["title"]
                }),
            ))
            .unwrap();
        registry
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn loads_every_supported_format() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/b.md", "---\ntitle: From markdown\n---\nbody\n");
        write(dir.path(), "notes/a.json", r#"{"title": "From json"}"#);
        write(dir.path(), "notes/nested/c.yaml", "title: From yaml\n");
        write(dir.path(), "notes/d.toml", "title = \"From toml\"\n");
        write(dir.path(), "notes/cover.png", "not an entry");

        let store = ContentStore::load(registry(), dir.path(), LoadOptions::default()).unwrap();
        let ids: Vec<&str> = store
            .entries("notes")
            .unwrap()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a.json", "b.md", "d.toml", "nested/c.yaml"]);
        assert_eq!(store.len(), 4);

        let note = store.get::<Note>("notes", "nested/c").unwrap();
        assert_eq!(note.data.title, "From yaml");
        assert_eq!(
            store.entry("notes", "b").unwrap().body.as_deref(),
            Some("body\n")
        );
    }

    #[test]
    fn underscore_and_dot_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/_draft.md", "---\n---\n");
        write(dir.path(), "notes/_partials/x.json", "{}");
        write(dir.path(), "notes/.hidden.json", "{}");
        write(dir.path(), "notes/ok.json", r#"{"title": "ok"}"#);

        let store = ContentStore::load(registry(), dir.path(), LoadOptions::default()).unwrap();
        assert_eq!(store.entries("notes").unwrap().len(), 1);
    }

    #[test]
    fn strict_load_reports_all_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/empty-title.json", r#"{"title": ""}"#);
        write(dir.path(), "notes/broken.json", "{");
        write(dir.path(), "notes/fine.json", r#"{"title": "fine"}"#);

        let err = ContentStore::load(registry(), dir.path(), LoadOptions::default()).unwrap_err();
        let failures = err.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures
            .iter()
            .any(|f| matches!(f, ContentError::Parse { .. })));
        assert!(failures
            .iter()
            .any(|f| matches!(f, ContentError::Validation { id, .. } if id == "empty-title.json")));
    }

    #[test]
    fn lenient_load_skips_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/missing.md", "---\nauthor: nobody\n---\n");
        write(dir.path(), "notes/fine.json", r#"{"title": "fine"}"#);

        let store =
            ContentStore::load(registry(), dir.path(), LoadOptions { strict: false }).unwrap();
        let notes = store.collection::<Note>("notes").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].slug, "fine");
    }

    #[test]
    fn slug_override_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/one.json", r#"{"title": "1", "slug": "same"}"#);
        write(dir.path(), "notes/two.yaml", "title: '2'\nslug: same\n");

        let err = ContentStore::load(registry(), dir.path(), LoadOptions::default()).unwrap_err();
        match err.failures().as_slice() {
            [ContentError::DuplicateSlug {
                slug,
                first,
                second,
                ..
            }] => {
                assert_eq!(slug, "same");
                assert_eq!(first, "one.json");
                assert_eq!(second, "two.yaml");
            }
            other => panic!("unexpected failures: {other:?}"),
        }
    }

    #[test]
    fn reserved_slugs_are_refused() {
        let mut registry = CollectionRegistry::new();
        registry
            .define(
                define_collection("notes", json!({ "type": "object" })).reserve_slugs(["health"]),
            )
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/health.json", "{}");
        write(dir.path(), "notes/renamed.json", r#"{"slug": "health"}"#);
        write(dir.path(), "notes/nested/health.json", "{}");

        let err = ContentStore::load(registry, dir.path(), LoadOptions::default()).unwrap_err();
        let ids: Vec<&str> = err
            .failures()
            .into_iter()
            .filter_map(|f| match f {
                ContentError::ReservedSlug { slug, id, .. } if slug == "health" => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["health.json", "renamed.json"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_paths_are_reported() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/fine.json", r#"{"title": "fine"}"#);
        let bad = dir
            .path()
            .join("notes")
            .join(OsStr::from_bytes(b"bad-\xff.json"));
        fs::write(&bad, r#"{"title": "bad"}"#).unwrap();

        let err = ContentStore::load(registry(), dir.path(), LoadOptions::default()).unwrap_err();
        match err.failures().as_slice() {
            [ContentError::Parse { path, reason }] => {
                assert_eq!(path, &bad);
                assert!(reason.contains("UTF-8"));
            }
            other => panic!("unexpected failures: {other:?}"),
        }

        let store =
            ContentStore::load(registry(), dir.path(), LoadOptions { strict: false }).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_collection_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::load(registry(), dir.path(), LoadOptions::default()).unwrap();
        assert!(store.is_empty());
        assert_eq!(
            store.summary(),
            vec![CollectionSummary {
                name: "notes".into(),
                entries: 0
            }]
        );
    }

    #[test]
    fn lookups_report_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::load(registry(), dir.path(), LoadOptions::default()).unwrap();
        assert!(matches!(
            store.entries("books"),
            Err(ContentError::UnknownCollection(_))
        ));
        assert!(matches!(
            store.entry("notes", "nope"),
            Err(ContentError::EntryNotFound { .. })
        ));
    }
}
