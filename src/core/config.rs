use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::document;
use crate::storage::store::Store;

/// Validated bootstrap configuration: the storage root plus every store
/// and index declared under it.
///
/// Construction is fatal on any misconfiguration, so a `Config` that
/// exists is fully usable and the engine never sees raw configuration.
#[derive(Debug)]
pub struct Config {
    root: PathBuf,
    stores: HashMap<String, Store>,
}

impl Config {
    /// Validate the root directory, then build each store and its indexes.
    ///
    /// `stores` maps store name → object of index name → index config,
    /// e.g. `{"docs": {"_fulltext": {"fields": ["title"]}, "tags": {}}}`.
    pub fn new(root: impl Into<PathBuf>, stores: &Value, timeout_secs: i64) -> Result<Self> {
        let root = root.into();

        if !root.is_dir() {
            fs::create_dir_all(&root).map_err(|err| {
                Error::new(ErrorKind::FailedDirectoryCreate, format!("storage root {}: {}", root.display(), err))
            })?;
        }

        if !document::is_writable(&root) {
            return Err(Error::new(ErrorKind::NotWritable, format!("storage root {} is not writable", root.display())));
        }

        let mut validated = HashMap::new();
        let declared = stores.as_object().cloned().unwrap_or_default();

        for (name, indexes) in &declared {
            let mut store = Store::new(&root, name, timeout_secs)?;

            if let Some(indexes) = indexes.as_object() {
                for (index, config) in indexes {
                    store.add_index(index, config)?;
                }
            }

            validated.insert(name.clone(), store);
        }

        Ok(Config {
            root,
            stores: validated,
        })
    }

    pub fn get_store(&self, name: &str) -> Result<&Store> {
        self.stores.get(name).ok_or_else(|| {
            Error::new(ErrorKind::InvalidStore, format!("no store named '{}'", name)).with_store(name)
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_stores_and_indexes_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(
            dir.path(),
            &json!({
                "docs": {
                    "_fulltext": {"fields": ["title", "description"]},
                    "tags": {"distinct": true},
                },
                "users": {},
            }),
            5,
        )
        .unwrap();

        let docs = config.get_store("docs").unwrap();
        assert!(docs.get_index("_fulltext").unwrap().is_fulltext());
        assert!(docs.get_index("tags").unwrap().is_distinct());
        assert!(config.get_store("users").is_ok());
        assert!(dir.path().join("docs/indexes/tags").is_dir());
    }

    #[test]
    fn creates_the_root_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("root");

        Config::new(&root, &json!({"docs": {}}), 5).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn unknown_store_lookup_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path(), &json!({"docs": {}}), 5).unwrap();

        let err = config.get_store("nope").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidStore);
    }

    #[test]
    fn index_misconfiguration_aborts_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::new(
            dir.path(),
            &json!({"docs": {"_fulltext": {"fields": []}}}),
            5,
        )
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::FulltextEmptyFields);
    }
}
