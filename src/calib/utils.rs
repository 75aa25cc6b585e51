//! Small string helpers used by the grammar engine and record parsers.

/// Splits a line into whitespace-delimited tokens.
///
/// The usual way to take apart a data row in the default grammar.
pub fn tokenize_ws(expr: &str) -> Vec<String> {
    expr.split_whitespace().map(str::to_string).collect()
}

/// Splits an expression on a delimiter, trimming every token.
///
/// Empty tokens are kept, so `"a,,b"` yields three entries. Used for
/// directive values such as a columns list.
pub fn tokenize_on(expr: &str, delim: char) -> Vec<String> {
    expr.split(delim).map(|tok| tok.trim().to_string()).collect()
}
