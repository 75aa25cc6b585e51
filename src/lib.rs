//! Reader and validity index for self-descriptive calibration data.
//!
//! Calibration constants live in plain text documents written in an
//! "extended CSV" grammar: sections of `key=value` metadata followed by
//! columnar data rows. Each data block declares the data type it provides
//! and the validity period (run range, time span) it applies to. This
//! crate indexes such documents by type and validity and materializes
//! user-defined record types for a requested validity key.
//!
//! A [`Documents`] controller is composed incrementally at runtime:
//!
//! ```no_run
//! use calib_reader::{CalibRecord, CsvLoader, Documents, LoadLog, MetaInfo, Result};
//!
//! struct ChannelCalib {
//!     label: String,
//!     scale: f64,
//! }
//!
//! impl CalibRecord for ChannelCalib {
//!     const TYPE_NAME: &'static str = "ChannelCalib";
//!     type Collection = Vec<ChannelCalib>;
//!
//!     fn parse_row(
//!         row: &str,
//!         line_no: usize,
//!         meta: &MetaInfo,
//!         _doc_id: &str,
//!         log: Option<&mut LoadLog>,
//!     ) -> Result<Self> {
//!         let columns = meta.get::<calib_reader::ColumnsOrder>("columns", line_no)?;
//!         let tokens = calib_reader::tokenize_ws(row);
//!         let row = columns.interpret(&tokens, log)?;
//!         Ok(ChannelCalib {
//!             label: row.parse("label")?,
//!             scale: row.parse("scale")?,
//!         })
//!     }
//!
//!     fn collect(
//!         dest: &mut Self::Collection,
//!         item: Self,
//!         _meta: &MetaInfo,
//!         _line_no: usize,
//!     ) -> Result<()> {
//!         dest.push(item);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut docs = Documents::<u32>::new();
//!     docs.add_loader(CsvLoader::new());
//!     docs.add("calib/channels.txt")?;
//!     docs.add("calib/channels-update.txt")?;
//!     // Overlay of every update still valid for run 5103.
//!     let calib = docs.load::<ChannelCalib>(5103, false)?;
//!     println!("{} channel(s)", calib.len());
//!     Ok(())
//! }
//! ```
//!
//! Loaders adapt document sources; [`CsvLoader`] covers the extended-CSV
//! grammar and its [`Grammar`] configuration covers common dialects.
//! Record types are registered at compile time through [`CalibRecord`].

pub mod calib;

pub use calib::columns::{ColumnsOrder, CsvRow};
pub use calib::csv_loader::CsvLoader;
pub use calib::error::{Error, Result};
pub use calib::grammar::{
    parse_stream, CommentSpan, Grammar, IndexingState, MetadataOutcome, ParserState, ReadingState,
};
pub use calib::index::{DocumentEntry, Updates, ValidityIndex};
pub use calib::lexical::{
    expression_evaluator, is_numeric_literal, lexical_cast, ExprEvaluator, FromLexical,
};
pub use calib::loader::{DataBlock, Defaults, Loader, LoaderHandle, RowCallback};
pub use calib::meta::{LoadLog, MetaInfo};
pub use calib::record::{CalibRecord, Sourced};
pub use calib::utils::{tokenize_on, tokenize_ws};
pub use calib::validity::{ValidityKey, ValidityRange};
pub use calib::{AddOverrides, DocLoadState, DocSpec, Documents};
