use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Display;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\w\-]+").expect("valid regex");
}

/// Tokenize text into lower-cased runs of word characters and hyphens.
/// Everything else (pipes, commas, whitespace) acts as a delimiter.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

/// Tokenize any displayable value by its string form.
pub fn tokenize_value<T: Display + ?Sized>(value: &T) -> Vec<String> {
    tokenize(&value.to_string())
}

/// A missing field is treated as the empty string, so it yields no tokens and
/// the item gets an all-zero vector. Items with missing text are therefore
/// never similar to each other; pandas-style coercion of a missing value to
/// the literal `"nan"` would instead make them share a term.
pub fn tokenize_field(value: Option<&str>) -> Vec<String> {
    tokenize(value.unwrap_or(""))
}
