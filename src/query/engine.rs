use std::fs;
use std::io;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::analysis::filter::SearchFilter;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::ident;
use crate::core::types::{Document, DocumentRecord};
use crate::index::descriptor::IndexDescriptor;
use crate::index::hash::hash_value;
use crate::index::writer::Indexer;
use crate::query::fetch::FetchWindow;
use crate::reader::scan::EntryScan;
use crate::storage::document;
use crate::storage::store::Store;

/// Executes every store operation against validated descriptors.
///
/// Mutating operations follow acquire → mutate → index → release. If index
/// maintenance fails after the document write succeeded, the just-written
/// document is deleted again (under the already-held lock) and the original
/// index error surfaces. The rollback is not atomic across the document and
/// its index files; a crash in between leaves index files stale until the
/// next successful reindex.
pub struct QueryEngine {
    indexer: Indexer,
}

impl QueryEngine {
    pub fn new(indexer: Indexer) -> Self {
        QueryEngine { indexer }
    }

    /// Write a new document under a generated id and return the id.
    pub fn create_document(&self, store: &Store, document: &Document) -> Result<String> {
        let _guard = store.lock_write()?;

        let id = ident::generate_id();
        let file = store.document_path(&id);

        // Should never happen
        if file.exists() {
            return Err(Error::new(ErrorKind::IdCollision, "generated id already exists")
                .with_store(store.name())
                .with_id(&id));
        }

        store.write_document(&file, document).map_err(|err| {
            Error::new(ErrorKind::WriteError, err.to_string())
                .with_store(store.name())
                .with_id(&id)
        })?;

        if let Err(err) = self.indexer.write_indexes(store, document, &id) {
            warn!(store = %store.name(), id = %id, "index write failed, rolling back document");
            self.delete_locked(store, &id)?;
            return Err(err);
        }

        debug!(store = %store.name(), id = %id, "document created");
        Ok(id)
    }

    /// Overwrite an existing document in place and rewrite its indexes.
    pub fn update_document_by_id(&self, store: &Store, document: &Document, id: &str) -> Result<String> {
        let _guard = store.lock_write()?;

        self.require_writable_document(store, id)?;

        let file = store.document_path(id);
        store.write_document(&file, document).map_err(|err| {
            Error::new(ErrorKind::WriteError, err.to_string())
                .with_store(store.name())
                .with_id(id)
        })?;

        if let Err(err) = self.indexer.write_indexes(store, document, id) {
            warn!(store = %store.name(), id = %id, "index write failed, rolling back document");
            self.delete_locked(store, id)?;
            return Err(err);
        }

        debug!(store = %store.name(), id = %id, "document updated");
        Ok(id.to_string())
    }

    /// Remove a document and every index entry derived from it.
    pub fn delete_document_by_id(&self, store: &Store, id: &str) -> Result<()> {
        let _guard = store.lock_write()?;
        self.delete_locked(store, id)
    }

    /// Point read; takes no lock and may observe a concurrent write.
    pub fn get_document_by_id(&self, store: &Store, id: &str) -> Result<DocumentRecord> {
        if !ident::validate_id(id) {
            return Err(Error::new(ErrorKind::IdMalformed, format!("invalid document id '{}'", id))
                .with_store(store.name())
                .with_id(id));
        }

        let file = store.document_path(id);
        if !file.exists() {
            return Err(Error::new(ErrorKind::FileMissing, "document file does not exist")
                .with_store(store.name())
                .with_id(id));
        }

        let value = match store.load_document(&file) {
            Ok(value) => value,
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                return Err(Error::new(ErrorKind::NotReadable, err.to_string())
                    .with_store(store.name())
                    .with_id(id));
            }
            Err(err) => {
                return Err(Error::new(ErrorKind::ReadError, err.to_string())
                    .with_store(store.name())
                    .with_id(id));
            }
        };

        let document = match value {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(Error::new(ErrorKind::ReadError, "document is not a non-empty object")
                    .with_store(store.name())
                    .with_id(id));
            }
        };

        let (date_created, date_modified) = document::file_times(&file).map_err(|err| {
            Error::new(ErrorKind::ReadError, err.to_string())
                .with_store(store.name())
                .with_id(id)
        })?;

        Ok(DocumentRecord {
            id: id.to_string(),
            date_created,
            date_modified,
            document,
        })
    }

    /// Fulltext search, materialized. Drains the lazy scan.
    pub fn get_documents_by_fulltext_search(
        &self,
        store: &Store,
        index: &IndexDescriptor,
        search: &str,
        op_and: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DocumentRecord>> {
        self.get_documents_by_fulltext_search_iter(store, index, search, op_and, limit, offset)
            .collect()
    }

    /// Fulltext search as a lazy, forward-only scan. Dropping the iterator
    /// early stops the directory walk.
    pub fn get_documents_by_fulltext_search_iter<'a>(
        &'a self,
        store: &'a Store,
        index: &IndexDescriptor,
        search: &str,
        op_and: bool,
        limit: usize,
        offset: usize,
    ) -> EntryScan<'a> {
        store.wait_write_lock();

        EntryScan::fulltext(
            self,
            store,
            index,
            SearchFilter::new(search, op_and),
            FetchWindow::new(limit, offset),
        )
    }

    /// Exact-match index lookup, materialized.
    pub fn get_documents_by_index(
        &self,
        store: &Store,
        index: &IndexDescriptor,
        value: &Value,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DocumentRecord>> {
        self.get_documents_by_index_iter(store, index, value, limit, offset)
            .collect()
    }

    /// Exact-match index lookup as a lazy scan over `*.<hash>.ddi`.
    pub fn get_documents_by_index_iter<'a>(
        &'a self,
        store: &'a Store,
        index: &IndexDescriptor,
        value: &Value,
        limit: usize,
        offset: usize,
    ) -> EntryScan<'a> {
        store.wait_write_lock();

        EntryScan::by_value(self, store, index, value, FetchWindow::new(limit, offset))
    }

    /// Count entries matching `value`, optionally excluding one document id.
    pub fn count_value_by_index(
        &self,
        store: &Store,
        index: &IndexDescriptor,
        value: &Value,
        exclude_id: &str,
    ) -> usize {
        store.wait_write_lock();

        let suffix = format!(".{}.ddi", hash_value(value));
        let mut count = 0;

        if let Ok(entries) = fs::read_dir(index.directory()) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if !name.ends_with(&suffix) {
                    continue;
                }

                if exclude_id.is_empty()
                    || ident::id_from_filename(&entry.path()).as_deref() != Some(exclude_id)
                {
                    count += 1;
                }
            }
        }

        count
    }

    /// Return the precomputed distinct value→count cache of an index.
    pub fn get_distinct_by_index(&self, store: &Store, index: &IndexDescriptor) -> Result<Map<String, Value>> {
        store.wait_write_lock();

        let file = index.distinct_path();
        if !file.exists() {
            return Err(Error::new(ErrorKind::FileMissing, "distinct cache does not exist")
                .with_store(store.name())
                .with_index(index.name()));
        }

        let value = match document::load_json(&file) {
            Ok(value) => value,
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                return Err(Error::new(ErrorKind::NotReadable, err.to_string())
                    .with_store(store.name())
                    .with_index(index.name()));
            }
            Err(err) => {
                return Err(Error::new(ErrorKind::ReadError, err.to_string())
                    .with_store(store.name())
                    .with_index(index.name()));
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(Error::new(ErrorKind::ReadError, "distinct cache is not an object")
                .with_store(store.name())
                .with_index(index.name())),
        }
    }

    /// Reload every document in the store and rewrite its indexes.
    ///
    /// A full table scan; meant for deploy-time use after an index schema
    /// change, not for online traffic.
    pub fn force_reindex(&self, store: &Store) -> Result<()> {
        store.wait_write_lock();

        let Ok(entries) = fs::read_dir(store.directory()) else {
            return Ok(());
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(".ddb") {
                continue;
            }

            let Some(id) = ident::id_from_filename(&entry.path()) else {
                continue;
            };

            let record = self.get_document_by_id(store, &id)?;
            self.indexer.write_indexes(store, &record.document, &id)?;
        }

        debug!(store = %store.name(), "store reindexed");
        Ok(())
    }

    /// Delete while the caller already holds the write lock. Also the
    /// rollback path for a failed index write, so it must not re-acquire.
    fn delete_locked(&self, store: &Store, id: &str) -> Result<()> {
        self.require_writable_document(store, id)?;

        let file = store.document_path(id);
        fs::remove_file(&file).map_err(|err| {
            Error::new(ErrorKind::DeleteError, err.to_string())
                .with_store(store.name())
                .with_id(id)
        })?;

        self.indexer.delete_indexes(store, id)?;

        debug!(store = %store.name(), id = %id, "document deleted");
        Ok(())
    }

    /// Shared precondition of update and delete: valid id, existing and
    /// writable document file.
    fn require_writable_document(&self, store: &Store, id: &str) -> Result<()> {
        if !ident::validate_id(id) {
            return Err(Error::new(ErrorKind::IdMalformed, format!("invalid document id '{}'", id))
                .with_store(store.name())
                .with_id(id));
        }

        let file = store.document_path(id);
        if !file.exists() {
            return Err(Error::new(ErrorKind::FileMissing, "document file does not exist")
                .with_store(store.name())
                .with_id(id));
        }

        if !document::is_writable(&file) {
            return Err(Error::new(ErrorKind::NotWritable, format!("document file {} is not writable", file.display()))
                .with_store(store.name())
                .with_id(id));
        }

        Ok(())
    }
}
