//! Default fuzzy search predicate using nucleo-matcher.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

/// Default fuzzy match predicate for a table's `search_fn`.
///
/// Case-insensitive fuzzy match of `query` against `haystack`. An empty
/// query matches everything.
///
/// # Example
///
/// ```ignore
/// let table = TableView::new("works", columns)
///     .with_search_fn(|work: &Work, query| fuzzy_matches(&work.title, query));
/// ```
pub fn fuzzy_matches(haystack: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(
        query,
        CaseMatching::Ignore,
        Normalization::Smart,
        AtomKind::Fuzzy,
    );

    let mut buf = Vec::new();
    let haystack = Utf32Str::new(haystack, &mut buf);
    pattern.score(haystack, &mut matcher).is_some()
}
