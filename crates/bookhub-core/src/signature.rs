//! Duplicate-detection keys derived from a normalized record.
//!
//! The semantic signature is a heuristic, not a bibliographic key: it folds
//! "Learning Python" and "Learning Python, 5th Edition" onto the same work
//! while keeping "Design Patterns in Python" apart from "Design Patterns in
//! Java".

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::identifiers::isbn::{canonical_isbn_key, isbn_key};
use crate::models::BookRecord;

static TECHNOLOGY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:in|with)\s+([a-z#][\w+.#]*)").expect("valid technology regex")
});
static EDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d+[a-z]{0,2}|second|third|fourth|fifth)\s+edition\b")
        .expect("valid edition regex")
});
static TECHNOLOGY_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+(?:in|with)\s+[a-z#][\w+.#]*").expect("valid technology phrase regex")
});
static DASH_EDITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+-\s+.*edition.*$").expect("valid dash edition regex"));
static EDITION_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s,:;(\-]+(?:\d+[a-z]{0,2}|[a-z]+)\s+edition\b.*$")
        .expect("valid edition suffix regex")
});
static HANDBOOK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*[-:]\s*a\s+handbook\s+of.*$").expect("valid handbook regex")
});
static ART_OF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*the\s+art\s+of\s+").expect("valid art-of regex"));

const TRAILING_SEPARATORS: &[char] = &[',', ':', ';', '-', '(', ' '];

/// Both dedup keys of one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Signature {
    /// `""` means the record has no usable ISBN.
    pub isbn_key: String,
    pub semantic: SemanticSignature,
}

/// `(baseTitle, technologyTag, editionTag, normalizedAuthor)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SemanticSignature {
    pub base_title: String,
    pub technology: String,
    pub edition: String,
    pub author: String,
}

impl SemanticSignature {
    /// The signature without its edition tag; identifies the work across
    /// editions.
    pub fn work_key(&self) -> WorkKey {
        WorkKey {
            base_title: self.base_title.clone(),
            technology: self.technology.clone(),
            author: self.author.clone(),
        }
    }
}

impl fmt::Display for SemanticSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.base_title, self.technology, self.edition, self.author
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkKey {
    pub base_title: String,
    pub technology: String,
    pub author: String,
}

/// Derives signatures; `canonical_isbn` folds ISBN-10 keys onto ISBN-13.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureBuilder {
    pub canonical_isbn: bool,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canonical_isbn(mut self, enabled: bool) -> Self {
        self.canonical_isbn = enabled;
        self
    }

    pub fn build(&self, record: &BookRecord) -> Signature {
        let isbn_key = if self.canonical_isbn {
            canonical_isbn_key(&record.isbn)
        } else {
            isbn_key(&record.isbn)
        };
        Signature {
            isbn_key,
            semantic: semantic_signature(record.title_str(), record.author_str()),
        }
    }
}

pub fn derive_signature(record: &BookRecord) -> Signature {
    SignatureBuilder::default().build(record)
}

pub fn semantic_signature(title: &str, author: &str) -> SemanticSignature {
    let title = title.trim().to_lowercase();

    let technology = TECHNOLOGY_RE
        .captures(&title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .unwrap_or_default();

    let edition = EDITION_RE
        .find(&title)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    SemanticSignature {
        base_title: base_title(&title),
        technology,
        edition,
        author: author.trim().to_lowercase(),
    }
}

/// Title with technology, edition and handbook qualifiers and a leading
/// "the art of" removed. Expects an already lower-cased, trimmed title.
pub fn base_title(title: &str) -> String {
    let stripped = TECHNOLOGY_PHRASE_RE.replace_all(title, "");
    let stripped = DASH_EDITION_RE.replace(&stripped, "");
    let stripped = EDITION_SUFFIX_RE.replace(&stripped, "");
    let stripped = HANDBOOK_RE.replace(&stripped, "");
    let stripped = ART_OF_RE.replace(&stripped, "");
    stripped
        .trim()
        .trim_end_matches(TRAILING_SEPARATORS)
        .trim()
        .to_string()
}
