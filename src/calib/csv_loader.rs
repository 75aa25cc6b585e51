//! Extended-CSV file loader.

use std::fs::File;
use std::io::{BufRead, BufReader};

use log::{debug, info};

use super::error::{Error, Result};
use super::grammar::{parse_stream, Grammar, IndexingState, ReadingState};
use super::loader::{DataBlock, Defaults, Loader, RowCallback};
use super::validity::ValidityKey;

/// Loader for documents in the extended-CSV grammar.
///
/// The grammar and the defaults are public and may be customized before
/// documents are handed to a controller. Stream entry points are exposed
/// alongside the file-based [`Loader`] implementation so in-memory
/// sources can be driven directly.
pub struct CsvLoader<K: ValidityKey> {
    pub grammar: Grammar,
    /// Stop a read after the first accepted block completes. On by
    /// default; turn off to stream every block matching the target type
    /// and key in one pass.
    pub single_block: bool,
    pub defaults: Defaults<K>,
}

impl<K: ValidityKey> CsvLoader<K> {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::default(),
            single_block: true,
            defaults: Defaults::default(),
        }
    }

    /// Indexing pass over a stream: returns the block structure.
    pub fn doc_struct_from<R: BufRead>(&mut self, reader: &mut R) -> Result<Vec<DataBlock<K>>> {
        let mut state = IndexingState::new(
            &self.grammar,
            self.defaults.validity,
            self.defaults.data_type.clone(),
        );
        parse_stream(reader, &mut state, 0, false)?;
        Ok(state.into_blocks())
    }

    /// Reading pass over a stream: forwards rows of blocks matching
    /// `(for_type, key)` to the callback, starting at a block marker.
    pub fn read_data_from<R: BufRead>(
        &mut self,
        reader: &mut R,
        key: K,
        for_type: &str,
        accept_rows_from: usize,
        callback: RowCallback<'_>,
    ) -> Result<()> {
        let mut state = ReadingState::new(
            &self.grammar,
            self.defaults.validity,
            self.defaults.data_type.clone(),
            for_type,
            key,
            callback,
            self.defaults.base_meta.clone(),
        );
        parse_stream(reader, &mut state, accept_rows_from, self.single_block)?;
        Ok(())
    }
}

impl<K: ValidityKey> Default for CsvLoader<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ValidityKey> Loader<K> for CsvLoader<K> {
    fn doc_struct(&mut self, doc_id: &str) -> Result<Vec<DataBlock<K>>> {
        debug!("indexing document structure: {doc_id}");
        let file = File::open(doc_id).map_err(|source| Error::Io {
            doc_id: doc_id.to_string(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        self.defaults.base_meta.set("@docID", doc_id, 0);
        let result = self.doc_struct_from(&mut reader);
        self.defaults.base_meta.drop_key("@docID");
        if let Ok(blocks) = &result {
            info!("document {doc_id}: {} data block(s)", blocks.len());
        }
        result
    }

    fn read_data(
        &mut self,
        doc_id: &str,
        key: K,
        for_type: &str,
        accept_rows_from: usize,
        callback: RowCallback<'_>,
    ) -> Result<()> {
        debug!("reading {doc_id} for type {for_type} from line {accept_rows_from}");
        let file = File::open(doc_id).map_err(|source| Error::Io {
            doc_id: doc_id.to_string(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        self.defaults.base_meta.set("@docID", doc_id, 0);
        let result = self.read_data_from(&mut reader, key, for_type, accept_rows_from, callback);
        self.defaults.base_meta.drop_key("@docID");
        result
    }

    fn defaults(&self) -> &Defaults<K> {
        &self.defaults
    }

    fn defaults_mut(&mut self) -> &mut Defaults<K> {
        &mut self.defaults
    }
}
