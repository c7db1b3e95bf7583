use std::fs;

use serde_json::{Map, Value};
use tracing::debug;

use crate::analysis::filter::filter_forbidden;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Document;
use crate::index::descriptor::IndexDescriptor;
use crate::storage::document;
use crate::storage::store::Store;

/// Entry file suffix shared by ordinary and fulltext indexes.
const ENTRY_EXT: &str = ".ddi";

/// Maintains the derived index files for a store's documents.
///
/// Entries for a document id are cleaned and rewritten as a unit whenever
/// the document changes, so no stale entry can outlive the field value it
/// was derived from. Distinct caches are fully recomputed on every
/// affecting write; the entry files are the only durable record of the
/// value→id associations, so there is nothing cheaper to update.
#[derive(Debug, Default)]
pub struct Indexer;

impl Indexer {
    pub fn new() -> Self {
        Indexer
    }

    /// Rewrite every index entry derived from `document`.
    pub fn write_indexes(&self, store: &Store, document: &Document, id: &str) -> Result<()> {
        self.clean_indexes(store, id)?;

        for index in store.indexes() {
            if index.is_fulltext() {
                self.write_fulltext(store, index, document, id)?;
            } else if let Some(value) = document.get(index.name()) {
                self.write_entries(store, index, id, value)?;
            }
        }

        debug!(store = %store.name(), id = %id, "indexes rewritten");
        Ok(())
    }

    /// Remove every entry for `id` and refresh affected distinct caches.
    pub fn delete_indexes(&self, store: &Store, id: &str) -> Result<()> {
        self.clean_indexes(store, id)?;

        for index in store.indexes() {
            if !index.is_fulltext() && index.is_distinct() {
                self.recalculate_distinct(store, index)?;
            }
        }
        Ok(())
    }

    /// Delete all entries for `id` across every index directory.
    fn clean_indexes(&self, store: &Store, id: &str) -> Result<()> {
        let prefix = format!("{}.", id);

        let Ok(subdirs) = fs::read_dir(store.indexes_dir()) else {
            return Ok(()); // store without indexes
        };

        for subdir in subdirs.flatten() {
            let Ok(entries) = fs::read_dir(subdir.path()) else {
                continue;
            };

            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };

                if !name.starts_with(&prefix) || !name.ends_with(ENTRY_EXT) {
                    continue;
                }

                let path = entry.path();
                if !document::is_writable(&path) || fs::remove_file(&path).is_err() {
                    return Err(Error::new(ErrorKind::CleanError, format!("could not remove stale entry {}", path.display()))
                        .with_store(store.name())
                        .with_id(id));
                }
            }
        }
        Ok(())
    }

    /// Build and write the filtered fulltext blob for one document.
    fn write_fulltext(&self, store: &Store, index: &IndexDescriptor, document: &Document, id: &str) -> Result<()> {
        let mut buffer = Vec::new();

        for field in index.fields() {
            if let Some(value) = document.get(field) {
                buffer.push(filter_forbidden(&normalize_fulltext(value)));
            }
        }

        let blob = buffer.join(" ");
        let path = index.fulltext_path(id);

        // A zero-byte write is indistinguishable from a failed one and is
        // treated as a failure either way.
        if fs::write(&path, &blob).is_err() || blob.is_empty() {
            return Err(Error::new(ErrorKind::FulltextWriteError, format!("empty or unwritable fulltext blob at {}", path.display()))
                .with_store(store.name())
                .with_index(index.name())
                .with_id(id));
        }
        Ok(())
    }

    /// Write one entry per element of the indexed field value.
    fn write_entries(&self, store: &Store, index: &IndexDescriptor, id: &str, value: &Value) -> Result<()> {
        let values: Vec<Value> = match value {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };

        for value in &values {
            let path = index.entry_path(id, value);
            let content = element_text(value);

            if fs::write(&path, &content).is_err() || content.is_empty() {
                return Err(Error::new(ErrorKind::IndexWriteError, format!("empty or unwritable entry at {}", path.display()))
                    .with_store(store.name())
                    .with_index(index.name())
                    .with_id(id));
            }
        }

        if index.is_distinct() {
            self.recalculate_distinct(store, index)?;
        }
        Ok(())
    }

    /// Drop the stale cache, rescan every entry file, write the new counts.
    fn recalculate_distinct(&self, store: &Store, index: &IndexDescriptor) -> Result<()> {
        let file = index.distinct_path();

        if file.exists() {
            if !document::is_writable(&file) || fs::remove_file(&file).is_err() {
                return Err(Error::new(ErrorKind::DistinctDeleteError, format!("could not remove stale cache {}", file.display()))
                    .with_store(store.name())
                    .with_index(index.name()));
            }
        }

        let mut counts: Map<String, Value> = Map::new();

        if let Ok(entries) = fs::read_dir(index.directory()) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if !is_entry_name(name) {
                    continue;
                }

                let Ok(bytes) = fs::read(entry.path()) else {
                    continue;
                };
                let key = String::from_utf8_lossy(&bytes).into_owned();

                let count = counts.get(&key).and_then(Value::as_u64).unwrap_or(0);
                counts.insert(key, Value::from(count + 1));
            }
        }

        document::write_json(&file, &counts).map_err(|err| {
            Error::new(ErrorKind::DistinctWriteError, err.to_string())
                .with_store(store.name())
                .with_index(index.name())
        })
    }
}

/// `<id>.<infix>.ddi` — two dots minimum.
fn is_entry_name(name: &str) -> bool {
    name.ends_with(ENTRY_EXT) && name[..name.len() - ENTRY_EXT.len()].contains('.')
}

/// Normalize a document field for fulltext extraction: sequences join with
/// single spaces, numbers stringify, strings pass through, anything else
/// contributes nothing.
fn normalize_fulltext(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        _ => String::new(),
    }
}

/// Scalar rendering for entry contents and sequence elements; non-scalars
/// contribute nothing.
fn element_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}
