use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::types::{Document, DocumentRecord};
use crate::index::descriptor::FULLTEXT_INDEX;
use crate::index::writer::Indexer;
use crate::query::engine::QueryEngine;
use crate::reader::scan::EntryScan;

/// Filesystem document store facade.
///
/// Owns the validated configuration and the engine, resolves store and
/// index names, and forwards every call. Fulltext operations always target
/// the reserved `_fulltext` index of the named store.
pub struct Database {
    config: Config,
    engine: QueryEngine,
}

impl Database {
    /// Open (creating directories as needed) the store layout under `root`.
    ///
    /// `stores` maps store name → object of index name → index config.
    /// `timeout_secs` bounds every lock wait; zero or negative values fall
    /// back to the default of 5 seconds.
    pub fn open(root: impl Into<PathBuf>, stores: &Value, timeout_secs: i64) -> Result<Self> {
        let config = Config::new(root, stores, timeout_secs)?;

        Ok(Database {
            config,
            engine: QueryEngine::new(Indexer::new()),
        })
    }

    pub fn create_document(&self, store: &str, document: &Document) -> Result<String> {
        self.engine.create_document(self.config.get_store(store)?, document)
    }

    pub fn update_document_by_id(&self, store: &str, document: &Document, id: &str) -> Result<String> {
        self.engine.update_document_by_id(self.config.get_store(store)?, document, id)
    }

    pub fn delete_document_by_id(&self, store: &str, id: &str) -> Result<()> {
        self.engine.delete_document_by_id(self.config.get_store(store)?, id)
    }

    pub fn get_document_by_id(&self, store: &str, id: &str) -> Result<DocumentRecord> {
        self.engine.get_document_by_id(self.config.get_store(store)?, id)
    }

    pub fn get_documents_by_fulltext_search(
        &self,
        store: &str,
        search: &str,
        op_and: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DocumentRecord>> {
        let store = self.config.get_store(store)?;
        self.engine.get_documents_by_fulltext_search(
            store,
            store.get_index(FULLTEXT_INDEX)?,
            search,
            op_and,
            limit,
            offset,
        )
    }

    pub fn get_documents_by_fulltext_search_iter(
        &self,
        store: &str,
        search: &str,
        op_and: bool,
        limit: usize,
        offset: usize,
    ) -> Result<EntryScan<'_>> {
        let store = self.config.get_store(store)?;
        Ok(self.engine.get_documents_by_fulltext_search_iter(
            store,
            store.get_index(FULLTEXT_INDEX)?,
            search,
            op_and,
            limit,
            offset,
        ))
    }

    pub fn get_documents_by_index(
        &self,
        store: &str,
        index: &str,
        value: &Value,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DocumentRecord>> {
        let store = self.config.get_store(store)?;
        self.engine.get_documents_by_index(store, store.get_index(index)?, value, limit, offset)
    }

    pub fn get_documents_by_index_iter(
        &self,
        store: &str,
        index: &str,
        value: &Value,
        limit: usize,
        offset: usize,
    ) -> Result<EntryScan<'_>> {
        let store = self.config.get_store(store)?;
        Ok(self.engine.get_documents_by_index_iter(store, store.get_index(index)?, value, limit, offset))
    }

    pub fn count_value_by_index(&self, store: &str, index: &str, value: &Value, exclude_id: &str) -> Result<usize> {
        let store = self.config.get_store(store)?;
        Ok(self.engine.count_value_by_index(store, store.get_index(index)?, value, exclude_id))
    }

    pub fn get_distinct_by_index(&self, store: &str, index: &str) -> Result<Map<String, Value>> {
        let store = self.config.get_store(store)?;
        self.engine.get_distinct_by_index(store, store.get_index(index)?)
    }

    pub fn force_reindex(&self, store: &str) -> Result<()> {
        self.engine.force_reindex(self.config.get_store(store)?)
    }

    /// The validated configuration, for callers driving the engine directly.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }
}
