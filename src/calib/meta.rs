//! Line-aware metadata environment and the loading journal.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{json, Value};

use super::error::{Error, Result};
use super::lexical::FromLexical;

/// A dictionary of a document's metadata.
///
/// Entries are kept per key and per defining line, so lookups resolve to
/// the latest definition at or before a given line. This handles values
/// that are overridden partway through a document. Keys may have aliases
/// pointing at a canonical name; lookups resolve aliases first.
///
/// Typed retrievals are cached per `(name, defining line, type)`. The
/// cache belongs to one environment instance: cloning copies entries and
/// aliases but starts with an empty cache.
pub struct MetaInfo {
    entries: HashMap<String, BTreeMap<usize, String>>,
    /// Alias to canonical name, one to one.
    aliases: HashMap<String, String>,
    cache: RefCell<HashMap<(String, usize, TypeId), Rc<dyn Any>>>,
}

impl MetaInfo {
    /// Line argument meaning "no upper line restriction".
    pub const ANY_LINE: usize = usize::MAX;

    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            aliases: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct metadata keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolves an aliased name, or returns the argument intact.
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Defines an alias for a canonical key name.
    ///
    /// Idempotent. Returns `false` only when the alias is already bound to
    /// a different canonical name, which usually indicates a naming clash
    /// in user code.
    pub fn define_alias(&mut self, alias: &str, canonical: &str) -> bool {
        let canonical = self.resolve_alias(canonical).to_string();
        match self.aliases.get(alias) {
            Some(existing) => *existing == canonical,
            None => {
                self.aliases.insert(alias.to_string(), canonical);
                true
            }
        }
    }

    /// Records a metadata value defined at the given line.
    pub fn set(&mut self, name: &str, value: &str, line_no: usize) {
        let canonical = self.resolve_alias(name).to_string();
        self.entries
            .entry(canonical)
            .or_default()
            .insert(line_no, value.to_string());
    }

    /// Whether any entry exists for the key, on any line.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(self.resolve_alias(name))
    }

    /// Retrieves the raw value defined at or before `upto_line`, together
    /// with its defining line.
    ///
    /// Fails with a no-entry error if the key is never defined, or with a
    /// no-current-entry error if it is defined only on later lines.
    pub fn raw_entry(&self, name: &str, upto_line: usize) -> Result<(&str, usize)> {
        let canonical = self.resolve_alias(name);
        let by_line = self
            .entries
            .get(canonical)
            .ok_or_else(|| Error::NoMetadataEntry {
                name: name.to_string(),
            })?;
        let (line, value) = by_line.range(..=upto_line).next_back().ok_or_else(|| {
            Error::NoCurrentMetadataEntry {
                name: name.to_string(),
                line_no: upto_line,
            }
        })?;
        Ok((value.as_str(), *line))
    }

    /// Retrieves a typed value defined at or before `upto_line`.
    ///
    /// The lexed value is cached by `(canonical name, defining line, type)`
    /// so repeated retrievals of the same entry lex it once.
    pub fn get<T>(&self, name: &str, upto_line: usize) -> Result<T>
    where
        T: FromLexical + Clone + 'static,
    {
        let (raw, found_line) = self.raw_entry(name, upto_line)?;
        let canonical = self.resolve_alias(name).to_string();
        let key = (canonical, found_line, TypeId::of::<T>());
        if let Some(cached) = self.cache.borrow().get(&key) {
            if let Some(value) = cached.downcast_ref::<T>() {
                return Ok(value.clone());
            }
        }
        let parsed = T::from_lexical(raw)?;
        let rc: Rc<dyn Any> = Rc::new(parsed.clone());
        self.cache.borrow_mut().insert(key, rc);
        Ok(parsed)
    }

    /// Same as [`get`], falling back to `default` when no entry is defined
    /// for that line. Lexing failures still propagate.
    ///
    /// [`get`]: MetaInfo::get
    pub fn get_or<T>(&self, name: &str, default: T, upto_line: usize) -> Result<T>
    where
        T: FromLexical + Clone + 'static,
    {
        match self.raw_entry(name, upto_line) {
            Ok(_) => self.get(name, upto_line),
            Err(Error::NoMetadataEntry { .. }) | Err(Error::NoCurrentMetadataEntry { .. }) => {
                Ok(default)
            }
            Err(e) => Err(e),
        }
    }

    /// Removes all entries and cached values for a key.
    pub fn drop_key(&mut self, name: &str) {
        let canonical = self.resolve_alias(name).to_string();
        self.entries.remove(&canonical);
        self.cache
            .borrow_mut()
            .retain(|(name, _, _), _| *name != canonical);
    }

    /// Dumps entries and aliases as a JSON object, for diagnostics.
    pub fn to_json(&self) -> Value {
        let entries: serde_json::Map<String, Value> = self
            .entries
            .iter()
            .map(|(name, by_line)| {
                let defs: Vec<Value> = by_line
                    .iter()
                    .map(|(line, value)| json!([line, value]))
                    .collect();
                (name.clone(), Value::Array(defs))
            })
            .collect();
        json!({ "entries": entries, "aliases": self.aliases })
    }
}

impl Default for MetaInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetaInfo {
    /// Copies entries and aliases. The typed-value cache is not shared and
    /// not copied; the clone starts caching from scratch.
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            aliases: self.aliases.clone(),
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for MetaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaInfo")
            .field("entries", &self.entries)
            .field("aliases", &self.aliases)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct LogEntry {
    #[serde(rename = "srcID")]
    src_id: String,
    #[serde(rename = "lineNo")]
    line_no: usize,
    #[serde(rename = "c")]
    column: String,
    #[serde(rename = "v")]
    value: String,
}

/// A journal of values picked up during loading, for debug dumps.
///
/// The loading pipeline stamps the current source position before each row
/// and row interpretation appends one entry per column read.
#[derive(Debug, Default)]
pub struct LoadLog {
    current_src: String,
    current_line: usize,
    entries: Vec<LogEntry>,
}

impl LoadLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source position attributed to subsequent entries.
    pub fn set_source(&mut self, src_id: &str, line_no: usize) {
        self.current_src = src_id.to_string();
        self.current_line = line_no;
    }

    /// Appends a column/value observation at the current source position.
    pub fn add_entry(&mut self, column: &str, value: &str) {
        self.entries.push(LogEntry {
            src_id: self.current_src.clone(),
            line_no: self.current_line,
            column: column.to_string(),
            value: value.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dumps the journal as a JSON array.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.entries).unwrap_or(Value::Null)
    }
}
