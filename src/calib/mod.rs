//! Core calibration documents module.

pub mod columns;
pub mod csv_loader;
pub mod error;
pub mod grammar;
pub mod index;
pub mod lexical;
pub mod loader;
pub mod meta;
pub mod record;
pub mod utils;
pub mod validity;

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use serde_json::{json, Value};

use error::{Error, Result};
use index::{DocumentEntry, ValidityIndex};
use loader::{key_json, Defaults, Loader, LoaderHandle, ScopedDefaults};
use meta::{LoadLog, MetaInfo};
use record::CalibRecord;
use validity::{ValidityKey, ValidityRange};

/// Per-entry state the controller records at discovery time.
///
/// Keeps the responsible loader together with its defaults as they were
/// when the document was pre-parsed, so a later read restores exactly the
/// environment the document was discovered under.
pub struct DocLoadState<K: ValidityKey> {
    /// Loader defaults at the pre-parsing instant, overrides included.
    pub doc_defaults: Defaults<K>,
    /// The loader responsible for the document.
    pub loader: LoaderHandle<K>,
    /// Marker of the data block start within the document.
    pub block_start: usize,
}

impl<K: ValidityKey> Clone for DocLoadState<K> {
    fn clone(&self) -> Self {
        Self {
            doc_defaults: self.doc_defaults.clone(),
            loader: Rc::clone(&self.loader),
            block_start: self.block_start,
        }
    }
}

impl<K: ValidityKey> std::fmt::Debug for DocLoadState<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocLoadState")
            .field("doc_defaults", &self.doc_defaults)
            .field("block_start", &self.block_start)
            .finish()
    }
}

impl<K: ValidityKey> DocLoadState<K> {
    pub fn to_json(&self) -> Value {
        json!({
            "defaults": self.doc_defaults.to_json(),
            "blockStart": self.block_start,
        })
    }
}

/// Optional per-document overrides applied to the responsible loader's
/// defaults for the duration of one discovery call.
pub struct AddOverrides<K: ValidityKey> {
    pub data_type: Option<String>,
    pub validity: Option<ValidityRange<K>>,
    pub base_meta: Option<MetaInfo>,
    /// Explicit loader choice, bypassing acceptance probing.
    pub loader: Option<LoaderHandle<K>>,
}

impl<K: ValidityKey> Default for AddOverrides<K> {
    fn default() -> Self {
        Self {
            data_type: None,
            validity: None,
            base_meta: None,
            loader: None,
        }
    }
}

/// A document id with its discovery overrides, for bulk registration.
pub struct DocSpec<K: ValidityKey> {
    pub doc_id: String,
    pub overrides: AddOverrides<K>,
}

/// Reentrant collection of calibration data documents.
///
/// Holds the registered loaders and a validity index of every data block
/// discovered so far. Documents are added incrementally; the same
/// controller then serves any number of typed load queries.
pub struct Documents<K: ValidityKey> {
    /// Registered loaders, probed in order.
    pub loaders: Vec<LoaderHandle<K>>,
    /// Index of discovered data blocks.
    pub index: ValidityIndex<K, DocLoadState<K>>,
}

impl<K: ValidityKey> Documents<K> {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            index: ValidityIndex::new(),
        }
    }

    /// Registers a loader and returns a shared handle to it, so callers
    /// can keep customizing its grammar or defaults afterwards.
    pub fn add_loader<L: Loader<K> + 'static>(&mut self, loader: L) -> Rc<RefCell<L>> {
        let handle = Rc::new(RefCell::new(loader));
        let registered: LoaderHandle<K> = handle.clone();
        self.loaders.push(registered);
        handle
    }

    /// Adds a document, pre-parsing its structure into the index.
    ///
    /// Returns `Ok(false)` when no registered loader accepts the document
    /// and `Ok(true)` when at least one data block was indexed.
    pub fn add(&mut self, doc_id: &str) -> Result<bool> {
        self.add_with(doc_id, AddOverrides::default())
    }

    /// Adds a document with per-document default overrides.
    ///
    /// The chosen loader's defaults are replaced by the overrides for the
    /// duration of the discovery call and restored on every exit path.
    /// Each returned block must carry a data type and a non-empty validity
    /// range, else the loader broke its contract. The (possibly
    /// overridden) defaults are snapshotted into every indexed entry.
    pub fn add_with(&mut self, doc_id: &str, overrides: AddOverrides<K>) -> Result<bool> {
        let loader = match overrides
            .loader
            .clone()
            .or_else(|| self.pick_loader(doc_id))
        {
            Some(handle) => handle,
            None => {
                warn!("no loader accepts document \"{doc_id}\"");
                return Ok(false);
            }
        };
        let _guard = ScopedDefaults::save(&loader);
        {
            let mut borrowed = loader.borrow_mut();
            let defaults = borrowed.defaults_mut();
            if let Some(data_type) = overrides.data_type {
                defaults.data_type = data_type;
            }
            if let Some(validity) = overrides.validity {
                defaults.validity = validity;
            }
            if let Some(base_meta) = overrides.base_meta {
                defaults.base_meta = base_meta;
            }
        }
        let blocks = loader
            .borrow_mut()
            .doc_struct(doc_id)
            .map_err(|e| e.with_doc_id(doc_id))?;
        let snapshot = loader.borrow().defaults().clone();
        for block in &blocks {
            if block.data_type.is_empty() {
                return Err(Error::LoaderApi {
                    detail: format!(
                        "loader returned empty data type for a block of \"{doc_id}\""
                    ),
                });
            }
            if !(block.validity.from.is_set() || block.validity.to.is_set()) {
                return Err(Error::LoaderApi {
                    detail: format!(
                        "loader returned empty validity range for a block of \"{doc_id}\""
                    ),
                });
            }
            self.index.add_entry(
                doc_id,
                &block.data_type,
                block.validity.from,
                block.validity.to,
                DocLoadState {
                    doc_defaults: snapshot.clone(),
                    loader: Rc::clone(&loader),
                    block_start: block.start,
                },
            );
        }
        debug!("added \"{doc_id}\": {} block(s)", blocks.len());
        Ok(!blocks.is_empty())
    }

    fn pick_loader(&self, doc_id: &str) -> Option<LoaderHandle<K>> {
        self.loaders
            .iter()
            .find(|handle| handle.borrow().can_handle(doc_id))
            .cloned()
    }

    /// Adds every document yielded by the generator. Returns how many
    /// documents contributed at least one indexed block.
    pub fn add_from<I>(&mut self, docs: I) -> Result<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for doc_id in docs {
            if self.add(&doc_id)? {
                added += 1;
            }
        }
        info!("indexed {added} document(s)");
        Ok(added)
    }

    /// Adds every document spec yielded by the generator, applying each
    /// one's overrides. Returns how many documents contributed blocks.
    pub fn add_from_specs<I>(&mut self, specs: I) -> Result<usize>
    where
        I: IntoIterator<Item = DocSpec<K>>,
    {
        let mut added = 0;
        for spec in specs {
            if self.add_with(&spec.doc_id, spec.overrides)? {
                added += 1;
            }
        }
        info!("indexed {added} document(s)");
        Ok(added)
    }

    /// Loads records of type `T` valid at `key`, in overlay mode.
    ///
    /// Every still-valid update is applied in index order, so later
    /// updates shadow or extend earlier ones through the record type's
    /// collection step. With `lenient` set, an unknown data type yields an
    /// empty collection instead of an error.
    pub fn load<T: CalibRecord>(&self, key: K, lenient: bool) -> Result<T::Collection> {
        self.load_impl::<T>(key, lenient, None)
    }

    /// Same as [`load`], recording every value read into the journal.
    ///
    /// [`load`]: Documents::load
    pub fn load_logged<T: CalibRecord>(
        &self,
        key: K,
        lenient: bool,
        log: &mut LoadLog,
    ) -> Result<T::Collection> {
        self.load_impl::<T>(key, lenient, Some(log))
    }

    fn load_impl<T: CalibRecord>(
        &self,
        key: K,
        lenient: bool,
        mut log: Option<&mut LoadLog>,
    ) -> Result<T::Collection> {
        let mut dest = T::Collection::default();
        let updates = self.index.updates(T::TYPE_NAME, key, lenient)?;
        debug!(
            "loading {}: {} update(s) for key {key:?}",
            T::TYPE_NAME,
            updates.len()
        );
        for (_, entry) in updates {
            self.load_update_into::<T>(entry, &mut dest, key, log.as_deref_mut())?;
        }
        Ok(dest)
    }

    /// Loads the single most recent update of type `T` valid at `key`.
    pub fn get_latest<T: CalibRecord>(&self, key: K) -> Result<T::Collection> {
        let mut dest = T::Collection::default();
        let (_, entry) = self.index.latest(T::TYPE_NAME, key)?;
        self.load_update_into::<T>(entry, &mut dest, key, None)?;
        Ok(dest)
    }

    /// Applies one indexed update to a collection.
    ///
    /// The loader's live defaults are replaced by the ones saved at
    /// discovery time and restored on every exit path. Row parsing or
    /// collection failures are wrapped with the document id, line number
    /// and row text before propagation.
    pub fn load_update_into<T: CalibRecord>(
        &self,
        entry: &DocumentEntry<K, DocLoadState<K>>,
        dest: &mut T::Collection,
        for_key: K,
        mut log: Option<&mut LoadLog>,
    ) -> Result<()> {
        let loader = Rc::clone(&entry.aux.loader);
        let doc_id = entry.doc_id.clone();
        let _guard = ScopedDefaults::save(&loader);
        *loader.borrow_mut().defaults_mut() = entry.aux.doc_defaults.clone();
        let mut row_cb = |meta: &MetaInfo, line_no: usize, row: &str| -> Result<bool> {
            if let Some(journal) = log.as_deref_mut() {
                journal.set_source(&doc_id, line_no);
            }
            let collected = T::parse_row(row, line_no, meta, &doc_id, log.as_deref_mut())
                .and_then(|item| T::collect(dest, item, meta, line_no));
            if let Err(e) = collected {
                let line_no = meta
                    .get_or::<usize>("@lineNo", line_no, MetaInfo::ANY_LINE)
                    .unwrap_or(line_no);
                return Err(Error::Collect {
                    doc_id: doc_id.clone(),
                    line_no,
                    row: row.to_string(),
                    source: Box::new(e),
                });
            }
            if let Some(journal) = log.as_deref_mut() {
                journal.set_source("(none)", 0);
            }
            Ok(true)
        };
        let result = loader
            .borrow_mut()
            .read_data(
                &doc_id,
                for_key,
                T::TYPE_NAME,
                entry.aux.block_start,
                &mut row_cb,
            )
            .map_err(|e| e.with_doc_id(&doc_id));
        result
    }

    /// Dumps loaders and index content as a JSON object, for diagnostics.
    pub fn dump_to_json(&self) -> Value {
        let loaders: Vec<Value> = self
            .loaders
            .iter()
            .map(|handle| handle.borrow().defaults().to_json())
            .collect();
        let mut by_type = serde_json::Map::new();
        for (type_name, by_from) in self.index.entries() {
            let mut entries = Vec::new();
            for (from, bucket) in by_from {
                for entry in bucket {
                    entries.push(json!({
                        "docID": entry.doc_id,
                        "validity": [key_json(*from), key_json(entry.valid_to)],
                        "auxInfo": entry.aux.to_json(),
                    }));
                }
            }
            by_type.insert(type_name.clone(), Value::Array(entries));
        }
        json!({ "loaders": loaders, "byType": by_type })
    }
}

impl<K: ValidityKey> Default for Documents<K> {
    fn default() -> Self {
        Self::new()
    }
}
