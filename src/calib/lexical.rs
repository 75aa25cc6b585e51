//! Type-directed conversions from document tokens to typed values.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{Error, Result};
use super::validity::{ValidityKey, ValidityRange};

/// Sign, digits, optional fraction, optional decimal exponent.
static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$").expect("numeric literal pattern")
});

/// Returns `true` if the expression looks like a numeric literal.
///
/// Case-insensitive `nan` is accepted as a literal; `inf` is not.
pub fn is_numeric_literal(s: &str) -> bool {
    if s.eq_ignore_ascii_case("nan") {
        return true;
    }
    NUMERIC_LITERAL.is_match(s)
}

/// Signature of the optional arithmetic-expression fallback for float
/// lexing. Returns `None` when the expression does not evaluate.
pub type ExprEvaluator = fn(&str) -> Option<f64>;

/// The expression evaluator compiled into this build, if any.
///
/// With the `expressions` feature enabled, non-literal float tokens are
/// evaluated as arithmetic expressions; without it they fail to lex.
#[cfg(feature = "expressions")]
pub fn expression_evaluator() -> Option<ExprEvaluator> {
    fn eval(expr: &str) -> Option<f64> {
        meval::eval_str(expr).ok()
    }
    Some(eval)
}

/// The expression evaluator compiled into this build, if any.
#[cfg(not(feature = "expressions"))]
pub fn expression_evaluator() -> Option<ExprEvaluator> {
    None
}

/// Conversion from a raw document token into a typed value.
///
/// Every type retrievable from metadata or row columns implements this.
/// Failures are parse errors carrying the offending token.
pub trait FromLexical: Sized {
    fn from_lexical(s: &str) -> Result<Self>;
}

/// Shorthand for `T::from_lexical(s)`.
pub fn lexical_cast<T: FromLexical>(s: &str) -> Result<T> {
    T::from_lexical(s)
}

impl FromLexical for String {
    fn from_lexical(s: &str) -> Result<Self> {
        Ok(s.to_string())
    }
}

impl FromLexical for bool {
    fn from_lexical(s: &str) -> Result<Self> {
        match s {
            "true" | "True" | "TRUE" | "yes" | "1" => Ok(true),
            "false" | "False" | "FALSE" | "no" | "0" => Ok(false),
            _ => Err(Error::parse(
                "expression does not look like a boolean literal",
                s,
            )),
        }
    }
}

macro_rules! integer_from_lexical {
    ($($t:ty),* $(,)?) => {$(
        impl FromLexical for $t {
            fn from_lexical(s: &str) -> Result<Self> {
                s.parse().map_err(|e: std::num::ParseIntError| {
                    Error::parse(format!("integer conversion failed ({e})"), s)
                })
            }
        }
    )*};
}

integer_from_lexical!(i16, i32, i64, u16, u32, u64, usize);

macro_rules! float_from_lexical {
    ($($t:ty),* $(,)?) => {$(
        impl FromLexical for $t {
            fn from_lexical(s: &str) -> Result<Self> {
                if is_numeric_literal(s) {
                    return s.parse().map_err(|e: std::num::ParseFloatError| {
                        Error::parse(format!("float conversion failed ({e})"), s)
                    });
                }
                match expression_evaluator() {
                    Some(eval) => match eval(s) {
                        Some(v) => Ok(v as $t),
                        None => Err(Error::parse(
                            "invalid numeric literal or arithmetic expression",
                            s,
                        )),
                    },
                    None => Err(Error::parse(
                        "expression does not match a numeric literal pattern",
                        s,
                    )),
                }
            }
        }
    )*};
}

float_from_lexical!(f32, f64);

impl<K: ValidityKey> FromLexical for ValidityRange<K> {
    fn from_lexical(s: &str) -> Result<Self> {
        ValidityRange::parse(s)
    }
}
