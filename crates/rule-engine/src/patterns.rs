//! Phrase patterns for rules that can be checked without the model

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "at least 2 page(s)" / "at least two page(s)", any case
    static ref MIN_TWO_PAGES: Regex =
        Regex::new(r"(?i)at least (?:2|two) page").expect("static regex");
}

/// Rule asks for a document of at least two pages.
///
/// Matching is literal: "must span two or more pages" is not recognized.
pub fn is_minimum_two_pages_rule(rule: &str) -> bool {
    MIN_TWO_PAGES.is_match(rule)
}
