//! Document loader contract and the scoped parse-defaults protocol.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use super::error::Result;
use super::meta::MetaInfo;
use super::validity::{ValidityKey, ValidityRange};

/// Description of one data block found in a document.
#[derive(Debug, Clone)]
pub struct DataBlock<K: ValidityKey> {
    /// Data type provided by the block.
    pub data_type: String,
    /// Validity range of the block.
    pub validity: ValidityRange<K>,
    /// Intradocument position of the block's first data row, used to seek
    /// back to the block on re-read.
    pub start: usize,
}

/// Row delivery callback used by [`Loader::read_data`].
///
/// Receives the inherited metadata environment, the row's line number and
/// the raw row text. Returning `false` skips the row without aborting the
/// read.
pub type RowCallback<'a> = &'a mut dyn FnMut(&MetaInfo, usize, &str) -> Result<bool>;

/// Externally scoped fallback state of a loader.
///
/// An empty default data type requires every block to declare its own; a
/// validity range with both bounds unset likewise. The base metadata is
/// the environment every read starts from.
#[derive(Debug, Clone)]
pub struct Defaults<K: ValidityKey> {
    pub data_type: String,
    pub validity: ValidityRange<K>,
    pub base_meta: MetaInfo,
}

impl<K: ValidityKey> Defaults<K> {
    /// Snapshot of the defaults as JSON, for diagnostics.
    pub fn to_json(&self) -> Value {
        json!({
            "dataType": self.data_type,
            "validityRange": [key_json(self.validity.from), key_json(self.validity.to)],
            "baseMD": self.base_meta.to_json(),
        })
    }
}

impl<K: ValidityKey> Default for Defaults<K> {
    fn default() -> Self {
        Self {
            data_type: String::new(),
            validity: ValidityRange::unbounded(),
            base_meta: MetaInfo::new(),
        }
    }
}

pub(crate) fn key_json<K: ValidityKey>(key: K) -> Value {
    if key.is_set() {
        Value::String(key.to_text())
    } else {
        Value::Null
    }
}

/// A document reader of a certain source format.
///
/// Loaders adapt data sources (text files in some grammar, databases,
/// archives) to the discovery and loading pipeline. A loader owns the
/// grammar of its source, not the structure of any particular record
/// type. The controller mutates the `defaults` record around every call
/// and restores it on all exit paths.
pub trait Loader<K: ValidityKey> {
    /// Fast acceptance predicate; may inspect only the identifier.
    fn can_handle(&self, _doc_id: &str) -> bool {
        true
    }

    /// Pre-parses the document and returns its block structure.
    ///
    /// Implementations seed a synthetic `@docID` metadata entry for the
    /// duration of the call.
    fn doc_struct(&mut self, doc_id: &str) -> Result<Vec<DataBlock<K>>>;

    /// Re-reads the document, positioned at a stored block marker, and
    /// forwards rows of blocks matching `(for_type, key)` to the callback.
    fn read_data(
        &mut self,
        doc_id: &str,
        key: K,
        for_type: &str,
        accept_rows_from: usize,
        callback: RowCallback<'_>,
    ) -> Result<()>;

    fn defaults(&self) -> &Defaults<K>;

    fn defaults_mut(&mut self) -> &mut Defaults<K>;
}

/// Shared handle to a registered loader.
pub type LoaderHandle<K> = Rc<RefCell<dyn Loader<K>>>;

/// Guard restoring a loader's defaults when dropped.
///
/// The defaults record is the only mutable state shared between the
/// controller and a loader, so every scope that rewrites it saves the
/// previous value through one of these.
pub(crate) struct ScopedDefaults<K: ValidityKey> {
    loader: LoaderHandle<K>,
    saved: Option<Defaults<K>>,
}

impl<K: ValidityKey> ScopedDefaults<K> {
    pub(crate) fn save(loader: &LoaderHandle<K>) -> Self {
        let saved = loader.borrow().defaults().clone();
        Self {
            loader: Rc::clone(loader),
            saved: Some(saved),
        }
    }
}

impl<K: ValidityKey> Drop for ScopedDefaults<K> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.loader.borrow_mut().defaults_mut() = saved;
        }
    }
}
