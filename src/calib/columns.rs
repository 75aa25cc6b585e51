//! Columns-order directive and tokenized row interpretation.

use std::collections::HashMap;

use super::error::{Error, Result};
use super::lexical::FromLexical;
use super::meta::LoadLog;
use super::utils::tokenize_on;

/// An ordered enumeration of column names from a columns directive.
///
/// Parsed from a comma-separated list; each name gets a zero-based index.
/// Used to turn a tokenized data row into a name-addressable record.
#[derive(Debug, Default, Clone)]
pub struct ColumnsOrder {
    /// Column names in directive order.
    names: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl ColumnsOrder {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Zero-based index assigned to a column name, if defined.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Interprets row tokens according to this column order.
    ///
    /// Tokens beyond the last declared column are ignored. A row shorter
    /// than the declared columns fails with a parse error citing the first
    /// missing column and the actual token count. Every value read is also
    /// recorded in the journal, when one is given.
    pub fn interpret(&self, tokens: &[String], mut log: Option<&mut LoadLog>) -> Result<CsvRow> {
        let mut values = HashMap::new();
        for (index, name) in self.names.iter().enumerate() {
            let token = tokens.get(index).ok_or_else(|| {
                Error::parse(
                    format!(
                        "columns number mismatch; no column #{} expected for \"{}\" \
                         in current line (has only {} columns)",
                        index + 1,
                        name,
                        tokens.len()
                    ),
                    "",
                )
            })?;
            values.insert(name.clone(), token.clone());
            if let Some(journal) = log.as_deref_mut() {
                journal.add_entry(name, token);
            }
        }
        Ok(CsvRow { values })
    }
}

impl FromLexical for ColumnsOrder {
    fn from_lexical(s: &str) -> Result<Self> {
        let names = tokenize_on(s, ',');
        let by_name = names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        Ok(Self { names, by_name })
    }
}

/// A tokenized data row interpreted against a [`ColumnsOrder`].
#[derive(Debug, Clone)]
pub struct CsvRow {
    values: HashMap<String, String>,
}

impl CsvRow {
    /// The raw token for a column, or a missing-column error.
    pub fn raw(&self, name: &str) -> Result<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Lexes the token for a column into a typed value.
    pub fn parse<T: FromLexical>(&self, name: &str) -> Result<T> {
        T::from_lexical(self.raw(name)?)
    }

    /// Lexes the token for a column, or returns `default` when the column
    /// is not part of the directive.
    pub fn parse_or<T: FromLexical>(&self, name: &str, default: T) -> Result<T> {
        match self.values.get(name) {
            Some(token) => T::from_lexical(token),
            None => Ok(default),
        }
    }
}
