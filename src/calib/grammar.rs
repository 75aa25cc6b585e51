//! Line-oriented state machine over the "extended CSV" document grammar.
//!
//! A document is a sequence of sections. Each section is a group of
//! metadata lines (`key=value`) followed by a contiguous block of data
//! rows. A new validity-range or data-type definition starts a new logical
//! block; any other metadata value persists downward. The same engine
//! drives two passes: indexing (discover blocks, their type and validity)
//! and reading (stream one block's rows to a callback).

use std::io::BufRead;

use super::error::{Error, Result};
use super::loader::{DataBlock, RowCallback};
use super::meta::MetaInfo;
use super::validity::{ValidityKey, ValidityRange};

/// Grammar configuration for extended-CSV documents.
///
/// `None` disables the corresponding marker; an empty tag name disables
/// recognition of that metadata key.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Character starting a comment that runs to the end of the line.
    pub comment_char: Option<char>,
    /// Character separating a metadata key from its value.
    pub metadata_marker: Option<char>,
    /// Metadata key holding a block's validity range.
    pub validity_tag: String,
    /// Metadata key holding a block's data type.
    pub type_tag: String,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            comment_char: Some('#'),
            metadata_marker: Some('='),
            validity_tag: "runs".to_string(),
            type_tag: "type".to_string(),
        }
    }
}

/// Portion of a line occupied by a comment.
///
/// `end` of `None` means the comment runs to the end of the line. An end
/// within the line allows inline comment forms; multi-line comments are
/// not supported.
#[derive(Debug, Clone, Copy)]
pub struct CommentSpan {
    pub start: usize,
    pub end: Option<usize>,
}

/// Locates a single-character comment running to the end of the line.
pub(crate) fn locate_comment_char(marker: Option<char>, line: &str) -> Option<CommentSpan> {
    let marker = marker?;
    line.find(marker)
        .map(|start| CommentSpan { start, end: None })
}

/// What a state made of one metadata-candidate line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataOutcome {
    /// The line was a metadata definition and is fully handled.
    pub consumed: bool,
    /// The definition breaks the document: the next data row starts a new
    /// block.
    pub boundary: bool,
}

/// Reentrant per-pass state driven by [`parse_stream`].
pub trait ParserState {
    /// Reports the next comment within the line, if any.
    fn locate_comment(&self, line: &str) -> Option<CommentSpan>;

    /// Tries to treat the line as a metadata definition.
    fn on_metadata(&mut self, line: &str, line_no: usize) -> Result<MetadataOutcome>;

    /// Handles a data row. Returning `false` skips the row without
    /// aborting the pass.
    fn on_row(&mut self, line: &str, line_no: usize) -> Result<bool>;

    /// Handles the first accepted row of a new block.
    fn on_block_start(&mut self, line_no: usize) -> Result<()>;
}

/// Reads the next meaningful line: comments stripped, whitespace trimmed,
/// empty lines skipped. Returns `false` on end of input. The line counter
/// advances for every physical line read.
fn next_meaningful_line<R: BufRead, S: ParserState + ?Sized>(
    reader: &mut R,
    buf: &mut String,
    line_no: &mut usize,
    state: &S,
) -> Result<bool> {
    loop {
        buf.clear();
        if reader.read_line(buf)? == 0 {
            return Ok(false);
        }
        *line_no += 1;
        while let Some(span) = state.locate_comment(buf) {
            let end = span.end.unwrap_or(buf.len());
            buf.replace_range(span.start..end, "");
        }
        buf.truncate(buf.trim_end().len());
        let leading = buf.len() - buf.trim_start().len();
        buf.drain(..leading);
        if buf.is_empty() {
            continue;
        }
        return Ok(true);
    }
}

/// Drives a parser state over a document stream.
///
/// Steers the block structure shared by both passes: metadata lines are
/// handled first and a boundary definition arms the new-block flag; rows
/// below `accept_rows_from` are ignored, which positions a re-read at a
/// stored block marker; the block-start handler fires on the first
/// accepted row of each block. With `single_block` set the pass ends when
/// a second block would start. Returns the number of physical lines read.
pub fn parse_stream<R: BufRead, S: ParserState + ?Sized>(
    reader: &mut R,
    state: &mut S,
    accept_rows_from: usize,
    single_block: bool,
) -> Result<usize> {
    let mut line = String::new();
    let mut line_no = 0usize;
    let mut block_pending = true;
    let mut block_seen = false;
    while next_meaningful_line(reader, &mut line, &mut line_no, state)? {
        let md = state.on_metadata(&line, line_no)?;
        if md.consumed {
            if md.boundary {
                block_pending = true;
            }
            continue;
        }
        if line_no < accept_rows_from {
            continue;
        }
        if block_pending && single_block {
            if block_seen {
                return Ok(line_no);
            }
            block_seen = true;
        }
        if !state.on_row(&line, line_no)? {
            continue;
        }
        if block_pending {
            state.on_block_start(line_no)?;
            block_pending = false;
        }
    }
    Ok(line_no)
}

fn split_metadata(marker: Option<char>, line: &str) -> Option<(usize, char)> {
    let marker = marker?;
    line.find(marker).map(|pos| (pos, marker))
}

/// Indexing pass: tracks only the current block's type and validity and
/// emits one block descriptor per discovered data block.
pub struct IndexingState<'g, K: ValidityKey> {
    grammar: &'g Grammar,
    validity: ValidityRange<K>,
    data_type: String,
    blocks: Vec<DataBlock<K>>,
}

impl<'g, K: ValidityKey> IndexingState<'g, K> {
    /// Seeds the pass with the loader's default type and validity, used
    /// for blocks that declare none of their own.
    pub fn new(grammar: &'g Grammar, validity: ValidityRange<K>, data_type: String) -> Self {
        Self {
            grammar,
            validity,
            data_type,
            blocks: Vec::new(),
        }
    }

    /// The discovered block descriptors.
    pub fn into_blocks(self) -> Vec<DataBlock<K>> {
        self.blocks
    }
}

impl<K: ValidityKey> ParserState for IndexingState<'_, K> {
    fn locate_comment(&self, line: &str) -> Option<CommentSpan> {
        locate_comment_char(self.grammar.comment_char, line)
    }

    fn on_metadata(&mut self, line: &str, _line_no: usize) -> Result<MetadataOutcome> {
        let Some((pos, marker)) = split_metadata(self.grammar.metadata_marker, line) else {
            return Ok(MetadataOutcome::default());
        };
        let key = line[..pos].trim();
        let value = &line[pos + marker.len_utf8()..];
        let mut outcome = MetadataOutcome {
            consumed: true,
            boundary: false,
        };
        if !self.grammar.validity_tag.is_empty() && key == self.grammar.validity_tag {
            self.validity = ValidityRange::parse(value)?;
            outcome.boundary = true;
        }
        if !self.grammar.type_tag.is_empty() && key == self.grammar.type_tag {
            self.data_type = value.trim().to_string();
            outcome.boundary = true;
        }
        Ok(outcome)
    }

    fn on_row(&mut self, _line: &str, _line_no: usize) -> Result<bool> {
        Ok(true)
    }

    fn on_block_start(&mut self, line_no: usize) -> Result<()> {
        if self.data_type.is_empty() {
            return Err(Error::NoDataType {
                tag: self.grammar.type_tag.clone(),
                line_no,
                doc_id: String::new(),
            });
        }
        if !(self.validity.from.is_set() || self.validity.to.is_set()) {
            return Err(Error::NoValidityRange {
                tag: self.grammar.validity_tag.clone(),
                line_no,
                doc_id: String::new(),
            });
        }
        self.blocks.push(DataBlock {
            data_type: self.data_type.clone(),
            validity: self.validity,
            start: line_no,
        });
        Ok(())
    }
}

/// Reading pass: forwards rows of blocks matching a target type and key to
/// the row callback, maintaining the inherited metadata environment.
pub struct ReadingState<'a, K: ValidityKey> {
    grammar: &'a Grammar,
    validity: ValidityRange<K>,
    data_type: String,
    for_type: &'a str,
    for_key: K,
    callback: RowCallback<'a>,
    meta: MetaInfo,
}

impl<'a, K: ValidityKey> ReadingState<'a, K> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grammar: &'a Grammar,
        validity: ValidityRange<K>,
        data_type: String,
        for_type: &'a str,
        for_key: K,
        callback: RowCallback<'a>,
        base_meta: MetaInfo,
    ) -> Self {
        Self {
            grammar,
            validity,
            data_type,
            for_type,
            for_key,
            callback,
            meta: base_meta,
        }
    }
}

impl<K: ValidityKey> ParserState for ReadingState<'_, K> {
    fn locate_comment(&self, line: &str) -> Option<CommentSpan> {
        locate_comment_char(self.grammar.comment_char, line)
    }

    fn on_metadata(&mut self, line: &str, line_no: usize) -> Result<MetadataOutcome> {
        let Some((pos, marker)) = split_metadata(self.grammar.metadata_marker, line) else {
            return Ok(MetadataOutcome::default());
        };
        let key = line[..pos].trim();
        let value = line[pos + marker.len_utf8()..].trim();
        self.meta.set(key, value, line_no);
        let mut outcome = MetadataOutcome {
            consumed: true,
            boundary: false,
        };
        if !self.grammar.validity_tag.is_empty() && key == self.grammar.validity_tag {
            self.validity = ValidityRange::parse(value)?;
            outcome.boundary = true;
        }
        if !self.grammar.type_tag.is_empty() && key == self.grammar.type_tag {
            self.data_type = value.to_string();
            outcome.boundary = true;
        }
        Ok(outcome)
    }

    fn on_row(&mut self, line: &str, line_no: usize) -> Result<bool> {
        if self.data_type != self.for_type {
            return Ok(true); // other type
        }
        if !self.validity.contains(self.for_key) {
            return Ok(true); // block not valid for the requested key
        }
        self.meta.set("@lineNo", &line_no.to_string(), 0);
        let outcome = (self.callback)(&self.meta, line_no, line);
        self.meta.drop_key("@lineNo");
        outcome
    }

    fn on_block_start(&mut self, _line_no: usize) -> Result<()> {
        Ok(())
    }
}
