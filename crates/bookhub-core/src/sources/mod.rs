//! Provider payload normalization.
//!
//! Each provider ships its own JSON shape. A [`ProviderSchema`] knows how to
//! read one item of that shape into a [`ProviderItem`]; [`normalize`] walks a
//! whole payload and turns every item into a [`BookRecord`] tagged with its
//! origin.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BookhubError, Result};
use crate::models::{BookRecord, ISBN_NOT_AVAILABLE, Source};
use crate::pricing::{PricePolicy, parse_price};

pub mod amazon;
pub mod google_books;
pub mod internal;
pub mod openlibrary;

pub use amazon::AmazonSchema;
pub use google_books::GoogleBooksSchema;
pub use internal::InternalSchema;
pub use openlibrary::OpenLibrarySchema;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));

/// Reads one provider-native item.
pub trait ProviderSchema: Send + Sync {
    fn source(&self) -> Source;

    fn read_item(&self, item: &Map<String, Value>) -> ProviderItem;
}

/// Provider fields after schema-specific lookup, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderItem {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub publication_year: Option<i32>,
    pub page_count: Option<u32>,
    pub genre: Option<String>,
}

impl ProviderItem {
    /// Reads the flat field names shared by the internal catalog and the
    /// backend-produced DTOs of every external provider.
    pub fn flat(item: &Map<String, Value>) -> Self {
        Self {
            id: item.get("id").and_then(scalar_string),
            title: string_field(item, "title"),
            author: string_field(item, "author")
                .or_else(|| item.get("authors").and_then(first_string)),
            isbn: item.get("isbn").and_then(first_string),
            price: item.get("price").and_then(parse_price),
            image_url: string_field(item, "imageUrl"),
            publication_year: item
                .get("publicationYear")
                .and_then(year_from)
                .or_else(|| item.get("publishDate").and_then(year_from)),
            page_count: item.get("pageCount").and_then(count_from),
            genre: string_field(item, "genre"),
        }
    }

    /// Applies the identifier, ISBN and price defaults. A missing id becomes
    /// `#<index>`, the item's position in its provider list; the `#` keeps it
    /// apart from ids the provider did send.
    pub fn into_record(self, source: Source, index: usize, prices: &PricePolicy) -> BookRecord {
        let price = self.price.unwrap_or_else(|| {
            prices.fallback_price(self.publication_year, self.page_count, self.genre.as_deref())
        });
        BookRecord {
            id: self.id.unwrap_or_else(|| format!("#{index}")),
            source,
            title: self.title,
            author: self.author,
            isbn: self
                .isbn
                .filter(|isbn| !isbn.trim().is_empty())
                .unwrap_or_else(|| ISBN_NOT_AVAILABLE.to_string()),
            price,
            image_url: self.image_url,
            publication_year: self.publication_year,
            page_count: self.page_count,
            genre: self.genre,
        }
    }
}

pub fn schema_for(source: Source) -> &'static dyn ProviderSchema {
    match source {
        Source::Internal => &InternalSchema,
        Source::Google => &GoogleBooksSchema,
        Source::OpenLibrary => &OpenLibrarySchema,
        Source::Amazon => &AmazonSchema,
    }
}

/// Normalizes a provider payload with the default price policy.
pub fn normalize(payload: &Value, source: Source) -> Result<Vec<BookRecord>> {
    normalize_with(payload, source, &PricePolicy::default())
}

/// Normalizes a provider payload. Items missing a title or author are passed
/// through; only a payload that is not a list of objects is rejected.
pub fn normalize_with(
    payload: &Value,
    source: Source,
    prices: &PricePolicy,
) -> Result<Vec<BookRecord>> {
    let items = payload.as_array().ok_or_else(|| {
        BookhubError::payload(
            source.as_str(),
            format!("expected a list, found {}", value_kind(payload)),
        )
    })?;

    let schema = schema_for(source);
    debug_assert_eq!(schema.source(), source);
    let records = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| {
                BookhubError::payload(
                    source.as_str(),
                    format!("item {index} is {}, not an object", value_kind(item)),
                )
            })?;
            Ok(schema.read_item(object).into_record(source, index, prices))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(provider = %source, count = records.len(), "normalized provider payload");
    Ok(records)
}

/// Normalizes a single object, e.g. an exact-hit record sent outside the
/// provider lists.
pub fn normalize_item(item: &Value, source: Source, prices: &PricePolicy) -> Result<BookRecord> {
    let object = item.as_object().ok_or_else(|| {
        BookhubError::payload(
            source.as_str(),
            format!("expected an object, found {}", value_kind(item)),
        )
    })?;
    Ok(schema_for(source).read_item(object).into_record(source, 0, prices))
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn string_field(item: &Map<String, Value>, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

/// A string, or the first string of an array of strings.
pub(crate) fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(arr) => arr.iter().find_map(Value::as_str).map(ToOwned::to_owned),
        _ => None,
    }
}

/// Every string of an array joined with `", "`, or a lone string.
pub(crate) fn joined_strings(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(arr) => {
            let parts: Vec<&str> = arr.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

/// Ids arrive as strings from external services and as numbers from the
/// catalog.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A year from a number or from the first four-digit run of a date string.
pub(crate) fn year_from(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => YEAR_RE.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

pub(crate) fn count_from(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}
