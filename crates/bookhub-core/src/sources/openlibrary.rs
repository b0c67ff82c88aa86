use serde_json::{Map, Value};

use crate::identifiers::isbn::isbn_key;
use crate::models::Source;
use crate::sources::{
    ProviderItem, ProviderSchema, count_from, first_string, joined_strings, scalar_string,
    year_from,
};

const COVERS_URL: &str = "https://covers.openlibrary.org/b";

/// Open Library `search.json` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenLibrarySchema;

impl ProviderSchema for OpenLibrarySchema {
    fn source(&self) -> Source {
        Source::OpenLibrary
    }

    fn read_item(&self, item: &Map<String, Value>) -> ProviderItem {
        let mut out = ProviderItem::flat(item);

        out.id = item.get("key").and_then(scalar_string).or(out.id);
        out.author = out
            .author
            .or_else(|| item.get("author_name").and_then(first_string));
        out.publication_year = out
            .publication_year
            .or_else(|| item.get("first_publish_year").and_then(year_from));
        out.page_count = out
            .page_count
            .or_else(|| item.get("number_of_pages_median").and_then(count_from));
        out.genre = out.genre.or_else(|| {
            item.get("subject")
                .and_then(joined_strings)
                .or_else(|| item.get("subject_facet").and_then(joined_strings))
        });
        out.image_url = out.image_url.or_else(|| cover_url(item));
        out
    }
}

/// Cover id first, then the first ISBN, then the first edition OLID.
fn cover_url(item: &Map<String, Value>) -> Option<String> {
    if let Some(cover_id) = item.get("cover_i").and_then(Value::as_i64).filter(|id| *id > 0) {
        return Some(format!("{COVERS_URL}/id/{cover_id}-L.jpg"));
    }
    if let Some(isbn) = item
        .get("isbn")
        .and_then(first_string)
        .filter(|isbn| !isbn_key(isbn).is_empty())
    {
        return Some(format!("{COVERS_URL}/isbn/{isbn}-L.jpg"));
    }
    item.get("edition_key")
        .and_then(first_string)
        .map(|olid| format!("{COVERS_URL}/olid/{olid}-L.jpg"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn read(value: Value) -> ProviderItem {
        OpenLibrarySchema.read_item(value.as_object().unwrap())
    }

    #[test]
    fn parses_search_doc() {
        let item = read(json!({
            "key": "/works/OL45883W",
            "title": "Deep Learning",
            "author_name": ["Ian Goodfellow", "Yoshua Bengio"],
            "isbn": ["9780262035613", "0262035618"],
            "first_publish_year": 2016,
            "number_of_pages_median": 775,
            "subject": ["Machine learning", "Neural networks"],
            "cover_i": 12345
        }));

        assert_eq!(item.id.as_deref(), Some("/works/OL45883W"));
        assert_eq!(item.author.as_deref(), Some("Ian Goodfellow"));
        assert_eq!(item.isbn.as_deref(), Some("9780262035613"));
        assert_eq!(item.publication_year, Some(2016));
        assert_eq!(item.page_count, Some(775));
        assert_eq!(item.genre.as_deref(), Some("Machine learning, Neural networks"));
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/12345-L.jpg")
        );
    }

    #[test]
    fn cover_falls_back_to_isbn_then_edition() {
        let by_isbn = read(json!({"title": "T", "isbn": ["0306406152"], "cover_i": -1}));
        assert_eq!(
            by_isbn.image_url.as_deref(),
            Some("https://covers.openlibrary.org/b/isbn/0306406152-L.jpg")
        );

        let by_olid = read(json!({"title": "T", "edition_key": ["OL7353617M"]}));
        assert_eq!(
            by_olid.image_url.as_deref(),
            Some("https://covers.openlibrary.org/b/olid/OL7353617M-L.jpg")
        );

        let none = read(json!({"title": "T"}));
        assert_eq!(none.image_url, None);
    }

    #[test]
    fn subject_facet_is_used_without_subjects() {
        let item = read(json!({"title": "T", "subject_facet": ["Fiction"]}));
        assert_eq!(item.genre.as_deref(), Some("Fiction"));
    }
}
