use std::fs;

use serde_json::Value;

use crate::analysis::filter::SearchFilter;
use crate::core::error::Result;
use crate::core::ident;
use crate::core::types::DocumentRecord;
use crate::index::descriptor::IndexDescriptor;
use crate::index::hash::hash_value;
use crate::query::engine::QueryEngine;
use crate::query::fetch::{FetchDecision, FetchWindow};
use crate::storage::store::Store;

/// Which entry files a scan accepts.
enum ScanMode {
    /// `*._fulltext.ddi` whose content matches the search terms.
    Fulltext(SearchFilter),
    /// `*.<hash>.ddi` for one content hash.
    Value { suffix: String },
}

/// Lazy, forward-only, single-pass scan over one index directory.
///
/// Yields full document records in filesystem order. Dropping the iterator
/// early stops the underlying directory walk; the list-returning search
/// variants simply drain this same iterator. Entry files with unreadable
/// names or invalid embedded ids are skipped, not reported.
pub struct EntryScan<'a> {
    engine: &'a QueryEngine,
    store: &'a Store,
    entries: Option<fs::ReadDir>,
    mode: ScanMode,
    window: FetchWindow,
    done: bool,
}

impl<'a> EntryScan<'a> {
    pub(crate) fn fulltext(
        engine: &'a QueryEngine,
        store: &'a Store,
        index: &IndexDescriptor,
        filter: SearchFilter,
        window: FetchWindow,
    ) -> Self {
        EntryScan {
            engine,
            store,
            entries: fs::read_dir(index.directory()).ok(),
            mode: ScanMode::Fulltext(filter),
            window,
            done: false,
        }
    }

    pub(crate) fn by_value(
        engine: &'a QueryEngine,
        store: &'a Store,
        index: &IndexDescriptor,
        value: &Value,
        window: FetchWindow,
    ) -> Self {
        EntryScan {
            engine,
            store,
            entries: fs::read_dir(index.directory()).ok(),
            mode: ScanMode::Value {
                suffix: format!(".{}.ddi", hash_value(value)),
            },
            window,
            done: false,
        }
    }
}

impl Iterator for EntryScan<'_> {
    type Item = Result<DocumentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let entry = match self.entries.as_mut()?.next()? {
                Ok(entry) => entry,
                Err(_) => continue,
            };

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };

            match &self.mode {
                ScanMode::Fulltext(filter) => {
                    if !name.ends_with("._fulltext.ddi") {
                        continue;
                    }
                    let Ok(bytes) = fs::read(entry.path()) else {
                        continue;
                    };
                    if !filter.matches(&String::from_utf8_lossy(&bytes)) {
                        continue;
                    }
                }
                ScanMode::Value { suffix } => {
                    if !name.ends_with(suffix.as_str()) {
                        continue;
                    }
                }
            }

            let Some(id) = ident::id_from_filename(&entry.path()) else {
                continue;
            };

            match self.window.next() {
                FetchDecision::Fetch => {
                    return Some(self.engine.get_document_by_id(self.store, &id));
                }
                FetchDecision::Skip => continue,
                FetchDecision::Stop => self.done = true,
            }
        }

        None
    }
}
