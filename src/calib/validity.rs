//! Validity keys and half-open validity ranges.

use std::fmt;
use std::hash::Hash;
use std::ops::BitAnd;

use super::error::{Error, Result};

/// An ordered value a document entry's applicability is tied to, such as a
/// run number or a timestamp.
///
/// Every key type reserves one distinguished `UNSET` value standing for an
/// open range bound. `UNSET` must order before any set value used as a
/// bound, so that indexes keep open-start entries first. Comparisons
/// against `UNSET` are meaningless and must go through [`is_set`] checks
/// rather than raw ordering.
///
/// [`is_set`]: ValidityKey::is_set
pub trait ValidityKey: Copy + Ord + Eq + Hash + fmt::Debug {
    /// The value standing for "no bound".
    const UNSET: Self;

    /// Character separating the two bounds in the textual range form.
    const RANGE_DELIMITER: char = '-';

    /// Whether this value is an actual key rather than `UNSET`.
    fn is_set(self) -> bool {
        self != Self::UNSET
    }

    /// Strict order between two set values.
    fn precedes(self, other: Self) -> bool {
        self < other
    }

    /// The successor of a set value.
    fn advance(self) -> Self;

    /// Textual form of a set value.
    fn to_text(self) -> String;

    /// Parses a set value from its textual form.
    fn from_text(s: &str) -> Result<Self>;
}

macro_rules! integer_validity_key {
    ($($t:ty),* $(,)?) => {$(
        impl ValidityKey for $t {
            const UNSET: Self = 0;

            fn advance(self) -> Self {
                self + 1
            }

            fn to_text(self) -> String {
                self.to_string()
            }

            fn from_text(s: &str) -> Result<Self> {
                s.trim().parse().map_err(|_| {
                    Error::parse("validity key conversion cannot be performed", s)
                })
            }
        }
    )*};
}

integer_validity_key!(u16, u32, u64, usize, i32, i64);

/// A validity period `[from, to)`. Either bound may be unset, which leaves
/// that side of the period open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityRange<K: ValidityKey> {
    /// Validity period start (inclusive).
    pub from: K,
    /// Validity period end (exclusive).
    pub to: K,
}

impl<K: ValidityKey> ValidityRange<K> {
    pub fn new(from: K, to: K) -> Self {
        Self { from, to }
    }

    /// A range with both bounds open, spanning every key.
    pub fn unbounded() -> Self {
        Self {
            from: K::UNSET,
            to: K::UNSET,
        }
    }

    /// Whether the range covers at least one key. A single unset bound
    /// makes the range non-empty; otherwise `from < to` decides.
    pub fn is_non_empty(&self) -> bool {
        if !(self.from.is_set() && self.to.is_set()) {
            return true;
        }
        self.from.precedes(self.to)
    }

    /// Whether a set key lies within the half-open period.
    pub fn contains(&self, key: K) -> bool {
        if self.from.is_set() && key.precedes(self.from) {
            return false;
        }
        if self.to.is_set() && !key.precedes(self.to) {
            return false;
        }
        true
    }

    /// Pointwise intersection. For each bound the tighter of the two set
    /// values wins, a sole set value is kept, and two unset bounds stay
    /// unset. The result may be empty; callers test [`is_non_empty`].
    ///
    /// [`is_non_empty`]: ValidityRange::is_non_empty
    pub fn intersect(&self, other: &Self) -> Self {
        let from = if self.from.is_set() {
            if other.from.is_set() {
                if self.from.precedes(other.from) {
                    other.from
                } else {
                    self.from
                }
            } else {
                self.from
            }
        } else {
            other.from
        };
        let to = if self.to.is_set() {
            if other.to.is_set() {
                if self.to.precedes(other.to) {
                    self.to
                } else {
                    other.to
                }
            } else {
                self.to
            }
        } else {
            other.to
        };
        Self { from, to }
    }

    /// Parses the textual form `FROM<delim>TO`.
    ///
    /// Each side is either a key literal or `...` for an open bound. A bare
    /// single value `V` reads as `[V, succ(V))`. A textual upper bound is
    /// advanced once on parse so that storage keeps the exclusive-end
    /// invariant. An open `from` bound (`...`) is rejected: left-open
    /// ranges exist only programmatically.
    pub fn parse(s: &str) -> Result<Self> {
        let mut range = Self::unbounded();
        match s.find(K::RANGE_DELIMITER) {
            Some(pos) => {
                if pos > 0 {
                    let sub = s[..pos].trim();
                    if sub == "..." {
                        return Err(Error::parse(
                            "left open bound for validity range is not permitted",
                            s,
                        ));
                    }
                    range.from = K::from_text(sub)?;
                }
                let sub = s[pos + K::RANGE_DELIMITER.len_utf8()..].trim();
                if sub != "..." {
                    range.to = K::from_text(sub)?.advance();
                }
            }
            None => {
                let sub = s.trim();
                if sub == "..." {
                    return Err(Error::parse(
                        "left open bound for validity range is not permitted",
                        s,
                    ));
                }
                range.from = K::from_text(sub)?;
                // defined for a single key: end just after the start
                if !range.from.is_set() {
                    return Err(Error::parse("bad validity range expression", s));
                }
                range.to = range.from.advance();
            }
        }
        Ok(range)
    }
}

impl<K: ValidityKey> BitAnd for ValidityRange<K> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersect(&rhs)
    }
}

impl<K: ValidityKey> fmt::Display for ValidityRange<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from.is_set() {
            write!(f, "{}", self.from.to_text())?;
        } else {
            write!(f, "...")?;
        }
        write!(f, "{}", K::RANGE_DELIMITER)?;
        if self.to.is_set() {
            write!(f, "{}", self.to.to_text())
        } else {
            write!(f, "...")
        }
    }
}
