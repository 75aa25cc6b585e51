//! Custom error types for the calib-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from I/O operations on a document.
    #[error("I/O error on document \"{doc_id}\": {source}")]
    Io {
        doc_id: String,
        #[source]
        source: std::io::Error,
    },

    /// A grammatic or semantic issue within a document or query expression.
    #[error("{}", parse_message(.reason, .token, .doc_id, .line_no))]
    Parse {
        reason: String,
        /// Expression or token that caused the error (may be empty).
        token: String,
        /// Document that caused the error (filled during propagation).
        doc_id: String,
        /// Line number within the document (0 if not applicable).
        line_no: usize,
    },

    /// No metadata entry with this key is defined anywhere in the document.
    #[error("no metadata entry `{name}' defined")]
    NoMetadataEntry { name: String },

    /// The metadata key exists, but only on lines after the queried one.
    #[error("metadata entry \"{name}\" was expected to be defined before line {line_no}")]
    NoCurrentMetadataEntry { name: String, line_no: usize },

    /// A data block starts without a resolvable validity range.
    #[error("unable to resolve validity range of block starting at {doc_id}:{line_no} (key \"{tag}\")")]
    NoValidityRange {
        tag: String,
        line_no: usize,
        doc_id: String,
    },

    /// A data block starts without a resolvable data type.
    #[error("unable to resolve data type of block starting at {doc_id}:{line_no} (key \"{tag}\")")]
    NoDataType {
        tag: String,
        line_no: usize,
        doc_id: String,
    },

    /// No documents were ever indexed for this data type.
    #[error("no documents indexed for calibration data type \"{type_name}\"")]
    UnknownDataType { type_name: String },

    /// No entry of this type is valid for the queried key.
    #[error("could not find calibration of type \"{type_name}\" for key {key}")]
    NoData { type_name: String, key: String },

    /// A row accessor requested a column absent from the columns directive.
    #[error("no column \"{column}\" defined for the table")]
    MissingColumn { column: String },

    /// No registered loader accepts the document.
    #[error("cannot parse document \"{doc_id}\": none of the registered loaders can handle it")]
    NoLoader { doc_id: String },

    /// A loader implementation violated its contract (empty type or range).
    #[error("loader API violation: {detail}")]
    LoaderApi { detail: String },

    /// User-supplied code (record parsing, collection) violated an API assumption.
    #[error("user API violation: {detail}")]
    UserApi { detail: String },

    /// Generic runtime failure not covered by a more specific kind.
    #[error("{detail}")]
    Runtime { detail: String },

    /// Two blocks of the same type within one document declare overlapping
    /// ranges. Reserved for policy layers above the core index.
    #[error("overlapping validity ranges for type \"{data_type}\" in \"{doc_id}\" (lines {prev_line} and {this_line})")]
    OverlappingRanges {
        data_type: String,
        doc_id: String,
        prev_line: usize,
        this_line: usize,
    },

    /// Two documents declare overlapping ranges for the same type. Reserved
    /// for policy layers above the core index.
    #[error("overlapping validity ranges for type \"{data_type}\" between \"{prev_doc_id}\":{prev_line} and \"{doc_id}\":{this_line}")]
    OverlappingRangesAcrossDocs {
        data_type: String,
        prev_doc_id: String,
        prev_line: usize,
        doc_id: String,
        this_line: usize,
    },

    /// A record failed to parse or collect while loading a data block. Keeps
    /// the underlying error together with the document position and row text.
    #[error("error \"{source}\" occurred while parsing or collecting data block at {doc_id}:{line_no}, row \"{row}\"")]
    Collect {
        doc_id: String,
        line_no: usize,
        row: String,
        #[source]
        source: Box<Error>,
    },
}

/// A convenience `Result` type alias using the crate's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            doc_id: String::new(),
            source,
        }
    }
}

impl Error {
    /// Creates a parse error carrying only a reason and the offending token.
    /// Positional context is attached later, while the error propagates.
    pub fn parse(reason: impl Into<String>, token: impl Into<String>) -> Self {
        Error::Parse {
            reason: reason.into(),
            token: token.into(),
            doc_id: String::new(),
            line_no: 0,
        }
    }

    /// Fills the document id on variants that carry one, if still empty.
    ///
    /// Loaders and parsers usually do not know which document they operate
    /// on; the controller enriches their errors on the way up.
    pub fn with_doc_id(mut self, id: &str) -> Self {
        match &mut self {
            Error::Io { doc_id, .. }
            | Error::Parse { doc_id, .. }
            | Error::NoValidityRange { doc_id, .. }
            | Error::NoDataType { doc_id, .. }
            | Error::Collect { doc_id, .. } => {
                if doc_id.is_empty() {
                    *doc_id = id.to_string();
                }
            }
            _ => {}
        }
        self
    }
}

fn parse_message(reason: &str, token: &str, doc_id: &str, line_no: &usize) -> String {
    let mut msg = String::new();
    if !doc_id.is_empty() {
        msg.push_str(&format!("at document {doc_id}"));
    }
    if *line_no != 0 {
        msg.push_str(&format!(
            "{}{line_no}",
            if doc_id.is_empty() { "line #" } else { ":" }
        ));
    }
    if !msg.is_empty() {
        msg.push_str(": ");
    }
    msg.push_str(reason);
    if !token.is_empty() {
        msg.push_str(&format!(", \"{token}\""));
    }
    msg
}
