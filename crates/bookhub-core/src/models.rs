use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal used by providers (and by the normalizer) when a book has no ISBN.
pub const ISBN_NOT_AVAILABLE: &str = "N/A";

/// Origin of a normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Internal,
    Google,
    #[serde(rename = "OPENLIBRARY")]
    OpenLibrary,
    Amazon,
}

impl Source {
    /// Fixed merge order used by the aggregation facade.
    pub const ALL: [Source; 4] = [
        Source::Internal,
        Source::Google,
        Source::OpenLibrary,
        Source::Amazon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "INTERNAL",
            Self::Google => "GOOGLE",
            Self::OpenLibrary => "OPENLIBRARY",
            Self::Amazon => "AMAZON",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A book as it flows through the pipeline, regardless of which provider
/// produced it.
///
/// `title` and `author` stay optional: the normalizer passes partial entries
/// through and the deduplicator drops them. Every other display attribute is
/// copied unchanged from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// Unique only within `source`.
    pub id: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Provider-native formatting, or [`ISBN_NOT_AVAILABLE`].
    pub isbn: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl BookRecord {
    pub fn new(source: Source, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source,
            title: None,
            author: None,
            isbn: ISBN_NOT_AVAILABLE.to_string(),
            price: crate::pricing::DEFAULT_PRICE,
            image_url: None,
            publication_year: None,
            page_count: None,
            genre: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = isbn.into();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Title text, or `""` when the provider supplied none.
    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Author text, or `""` when the provider supplied none.
    pub fn author_str(&self) -> &str {
        self.author.as_deref().unwrap_or_default()
    }

    /// A record without a non-blank title and author never reaches dedup
    /// output or ranking.
    pub fn is_valid(&self) -> bool {
        !self.title_str().trim().is_empty() && !self.author_str().trim().is_empty()
    }
}
