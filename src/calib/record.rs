//! Compile-time binding of user record types to parsing and collection.

use super::error::Result;
use super::meta::{LoadLog, MetaInfo};

/// A user calibration record type, registered by implementing this trait.
///
/// The binding is static: the row parse path stays monomorphic per record
/// type. `TYPE_NAME` identifies the type in document metadata, and the
/// collection is whatever container loading should produce. A collection
/// need not be a sequence; incremental records often collect into a single
/// accumulating value.
pub trait CalibRecord: Sized {
    /// Name identifying this record type in document metadata.
    const TYPE_NAME: &'static str;

    /// Container produced by loading.
    type Collection: Default;

    /// Parses one data row into a record.
    fn parse_row(
        row: &str,
        line_no: usize,
        meta: &MetaInfo,
        doc_id: &str,
        log: Option<&mut LoadLog>,
    ) -> Result<Self>;

    /// Places a parsed record into the collection, applying any
    /// semantic-level validation.
    fn collect(
        dest: &mut Self::Collection,
        item: Self,
        meta: &MetaInfo,
        line_no: usize,
    ) -> Result<()>;
}

/// A record wrapper carrying the source position of each entry.
///
/// Lets consumers keep provenance (document and line) without changing
/// the underlying record type. Collected into a plain vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub data: T,
    pub line_no: usize,
    pub doc_id: String,
}

impl<T: CalibRecord> CalibRecord for Sourced<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    type Collection = Vec<Sourced<T>>;

    fn parse_row(
        row: &str,
        line_no: usize,
        meta: &MetaInfo,
        doc_id: &str,
        log: Option<&mut LoadLog>,
    ) -> Result<Self> {
        Ok(Sourced {
            data: T::parse_row(row, line_no, meta, doc_id, log)?,
            line_no,
            doc_id: doc_id.to_string(),
        })
    }

    fn collect(
        dest: &mut Self::Collection,
        item: Self,
        _meta: &MetaInfo,
        _line_no: usize,
    ) -> Result<()> {
        dest.push(item);
        Ok(())
    }
}
