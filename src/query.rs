//! Query-string extraction.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// One `key=value` pair; neither side may contain `=`, `/` or `&`.
static PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^=/&]+=[^=/&]+").unwrap_or_else(|e| panic!("query pattern: {e}"))
});

/// Extracts the `key=value` pairs following the first `?` of `url`.
///
/// Returns an empty mapping when `url` has no query string. See
/// [`parse_query`] for how the query itself is read.
///
/// ```rust
/// use kumi::extract_query_string;
///
/// let q = extract_query_string("/page/101?type=news&&page=2");
/// assert_eq!(q["type"], "news");
/// assert_eq!(q["page"], "2");
/// assert!(extract_query_string("/page/101").is_empty());
/// ```
pub fn extract_query_string(url: &str) -> HashMap<String, String> {
    match url.split_once('?') {
        Some((_, query)) => parse_query(query),
        None => HashMap::new(),
    }
}

/// Reads the `key=value` pairs of a raw query string.
///
/// Values are returned verbatim, without percent-decoding. Fragments that do
/// not have the `key=value` shape (`&&`, a bare `flag`) are skipped, and a
/// repeated key keeps its last value.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    PAIR.find_iter(query)
        .filter_map(|m| m.as_str().split_once('='))
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(url: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = extract_query_string(url).into_iter().collect();
        pairs.sort();
        pairs
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn raw(query: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = parse_query(query).into_iter().collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn raw_query_strings() {
        assert_eq!(raw("a=1&b=2"), pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(raw("a_c=1&&test=2"), pairs(&[("a_c", "1"), ("test", "2")]));
        assert!(raw("aaaa").is_empty());
    }

    #[test]
    fn simple_pairs() {
        assert_eq!(q("?a=1&b=2"), pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(q("/x?a_c=1&test=2"), pairs(&[("a_c", "1"), ("test", "2")]));
    }

    #[test]
    fn empty_fragments_are_skipped() {
        assert_eq!(q("?a_c=1&&test=2"), pairs(&[("a_c", "1"), ("test", "2")]));
        assert_eq!(q("?&&&a=1&"), pairs(&[("a", "1")]));
    }

    #[test]
    fn tokens_without_equals_yield_nothing() {
        assert!(q("?aaaa").is_empty());
        assert!(q("?").is_empty());
        assert!(q("/no/query").is_empty());
    }

    #[test]
    fn later_duplicates_win() {
        assert_eq!(q("?k=1&k=2"), pairs(&[("k", "2")]));
    }

    #[test]
    fn no_percent_decoding() {
        assert_eq!(q("?name=a%20b"), pairs(&[("name", "a%20b")]));
    }

    #[test]
    fn only_text_after_first_question_mark() {
        assert_eq!(q("/p?a=1?b=2"), pairs(&[("a", "1?b")]));
    }

    #[test]
    fn malformed_shapes() {
        // the value of `a==1` would start with '='
        assert!(q("?a==1").is_empty());
        assert_eq!(q("?a=1=2&b=3"), pairs(&[("a", "1"), ("b", "3")]));
        assert!(q("?=1&=2").is_empty());
    }
}
