use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::ident;
use crate::index::hash::hash_value;
use crate::storage::document;

/// Reserved name of the fulltext index of a store.
pub const FULLTEXT_INDEX: &str = "_fulltext";

/// Validated configuration for one index.
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// Document fields feeding the fulltext blob, in declared order.
    /// Empty for ordinary indexes.
    pub fields: Vec<String>,
    /// Maintain the distinct value→count cache. Ordinary indexes only.
    pub distinct: bool,
}

/// One secondary index bound to its directory under `<store>/indexes/`.
///
/// Construction performs full validation; a descriptor that exists is
/// usable. Path construction is pure: the indexer and the query engine
/// derive every entry filename through these methods.
#[derive(Debug)]
pub struct IndexDescriptor {
    name: String,
    directory: PathBuf,
    config: IndexConfig,
}

impl IndexDescriptor {
    pub fn new(store_dir: &Path, store: &str, name: &str, config: &Value) -> Result<Self> {
        if !ident::valid_key(name) {
            return Err(Error::new(ErrorKind::IndexKeyMalformed, format!("invalid index name '{}'", name))
                .with_store(store)
                .with_index(name));
        }

        let config = if name == FULLTEXT_INDEX {
            Self::validate_fulltext(store, name, config)?
        } else {
            Self::validate_ordinary(store, name, config)?
        };

        let directory = store_dir.join("indexes").join(name);

        if !directory.is_dir() {
            fs::create_dir_all(&directory).map_err(|err| {
                Error::new(ErrorKind::FailedDirectoryCreate, err.to_string())
                    .with_store(store)
                    .with_index(name)
            })?;
        }

        if !document::is_writable(&directory) {
            return Err(Error::new(ErrorKind::NotWritable, format!("index directory {} is not writable", directory.display()))
                .with_store(store)
                .with_index(name));
        }

        Ok(IndexDescriptor {
            name: name.to_string(),
            directory,
            config,
        })
    }

    /// The reserved fulltext index: `fields` required, `distinct` forbidden.
    fn validate_fulltext(store: &str, name: &str, config: &Value) -> Result<IndexConfig> {
        let empty = serde_json::Map::new();
        let config = config.as_object().unwrap_or(&empty);

        if config.contains_key("distinct") {
            return Err(Error::new(ErrorKind::FulltextNoDistinct, "fulltext indexes cannot be distinct")
                .with_store(store)
                .with_index(name));
        }

        let fields = match config.get("fields") {
            Some(Value::Array(fields)) => fields,
            _ => {
                return Err(Error::new(ErrorKind::FulltextInvalidFields, "fulltext config requires a 'fields' list")
                    .with_store(store)
                    .with_index(name));
            }
        };

        if fields.is_empty() {
            return Err(Error::new(ErrorKind::FulltextEmptyFields, "fulltext 'fields' list is empty")
                .with_store(store)
                .with_index(name));
        }

        let mut names = Vec::with_capacity(fields.len());
        for field in fields {
            match field {
                Value::String(field) => names.push(field.clone()),
                _ => {
                    return Err(Error::new(ErrorKind::FulltextInvalidFieldsString, "fulltext field names must be strings")
                        .with_store(store)
                        .with_index(name));
                }
            }
        }

        Ok(IndexConfig {
            fields: names,
            distinct: false,
        })
    }

    /// Ordinary indexes: the `_` prefix stays reserved, `distinct` must be
    /// a boolean when present.
    fn validate_ordinary(store: &str, name: &str, config: &Value) -> Result<IndexConfig> {
        if name.starts_with('_') {
            return Err(Error::new(ErrorKind::SystemReserved, format!("index name '{}' uses the reserved prefix", name))
                .with_store(store)
                .with_index(name));
        }

        let empty = serde_json::Map::new();
        let config = config.as_object().unwrap_or(&empty);

        let distinct = match config.get("distinct") {
            None => false,
            Some(Value::Bool(distinct)) => *distinct,
            Some(_) => {
                return Err(Error::new(ErrorKind::InvalidDistinctValue, "'distinct' must be a boolean")
                    .with_store(store)
                    .with_index(name));
            }
        };

        Ok(IndexConfig {
            fields: Vec::new(),
            distinct,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_fulltext(&self) -> bool {
        self.name == FULLTEXT_INDEX
    }

    pub fn is_distinct(&self) -> bool {
        self.config.distinct
    }

    pub fn fields(&self) -> &[String] {
        &self.config.fields
    }

    /// `<dir>/<id>._fulltext.ddi`
    pub fn fulltext_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{}._fulltext.ddi", id))
    }

    /// `<dir>/_distinct.ddt`
    pub fn distinct_path(&self) -> PathBuf {
        self.directory.join("_distinct.ddt")
    }

    /// `<dir>/<id>.<hash>.ddi` where `<hash>` is the content hash of `value`.
    pub fn entry_path(&self, id: &str, value: &Value) -> PathBuf {
        self.directory.join(format!("{}.{}.ddi", id, hash_value(value)))
    }
}
