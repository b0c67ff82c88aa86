use serde::Serialize;
use tracing::debug;

use crate::models::BookRecord;

/// Relevance partition of a title against the query, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Exact,
    Prefix,
    Contains,
    Other,
}

impl Relevance {
    /// Both arguments must already be passed through [`normalize_for_match`].
    /// An empty query matches nothing, so every record lands in `Other` and
    /// keeps its arrival order.
    pub fn classify(title: &str, query: &str) -> Self {
        if query.is_empty() {
            Self::Other
        } else if title == query {
            Self::Exact
        } else if title.starts_with(query) {
            Self::Prefix
        } else if title.contains(query) {
            Self::Contains
        } else {
            Self::Other
        }
    }
}

/// Lower-cases, trims and drops everything outside `[a-z0-9 ]`.
pub fn normalize_for_match(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect()
}

/// Orders records exact, prefix, contains, other. Within a partition the
/// input order is kept.
pub fn rank(records: Vec<BookRecord>, query: &str) -> Vec<BookRecord> {
    rank_with_relevance(records, query)
        .into_iter()
        .map(|(_, record)| record)
        .collect()
}

pub fn rank_with_relevance(records: Vec<BookRecord>, query: &str) -> Vec<(Relevance, BookRecord)> {
    let query = normalize_for_match(query);
    let mut ranked: Vec<(Relevance, BookRecord)> = records
        .into_iter()
        .map(|record| {
            let title = normalize_for_match(record.title_str());
            (Relevance::classify(&title, &query), record)
        })
        .collect();

    // sort_by_key is stable
    ranked.sort_by_key(|(relevance, _)| *relevance);

    let count = |wanted: Relevance| ranked.iter().filter(|(r, _)| *r == wanted).count();
    debug!(
        exact = count(Relevance::Exact),
        prefix = count(Relevance::Prefix),
        contains = count(Relevance::Contains),
        other = count(Relevance::Other),
        "ranked records"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn books(titles: &[&str]) -> Vec<BookRecord> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                BookRecord::new(Source::Google, i.to_string())
                    .with_title(*title)
                    .with_author("Author")
            })
            .collect()
    }

    fn titles(records: &[BookRecord]) -> Vec<&str> {
        records.iter().map(BookRecord::title_str).collect()
    }

    #[test]
    fn orders_exact_prefix_contains_other() {
        let ranked = rank(
            books(&[
                "Python Crash Course",
                "Learning Python",
                "Python",
                "Automate the Boring Stuff",
            ]),
            "python",
        );
        assert_eq!(
            titles(&ranked),
            vec![
                "Python",
                "Python Crash Course",
                "Learning Python",
                "Automate the Boring Stuff"
            ]
        );
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        let ranked = rank_with_relevance(books(&["C++ Primer!", "The C Book"]), "  C++ PRIMER ");
        assert_eq!(ranked[0].0, Relevance::Exact);
        assert_eq!(ranked[0].1.title_str(), "C++ Primer!");
    }

    #[test]
    fn ties_keep_arrival_order() {
        let ranked = rank(
            books(&["Rust in Action", "Zero to Rust", "Rust Atomics", "Programming Rust"]),
            "rust",
        );
        assert_eq!(
            titles(&ranked),
            vec!["Rust in Action", "Rust Atomics", "Zero to Rust", "Programming Rust"]
        );
    }

    #[test]
    fn ranking_is_deterministic() {
        let input = books(&["b python", "python a", "python", "x", "python a"]);
        let first = rank(input.clone(), "python");
        let second = rank(input, "python");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_query_preserves_order() {
        let ranked = rank(books(&["B", "A", "C"]), "!!");
        assert_eq!(titles(&ranked), vec!["B", "A", "C"]);
    }

    #[test]
    fn normalization_strips_symbols() {
        assert_eq!(normalize_for_match("  Harry Potter & the Sorcerer's Stone "), "harry potter  the sorcerers stone");
        assert_eq!(normalize_for_match("C#"), "c");
    }
}
