use serde_json::{Map, Value};

use crate::models::Source;
use crate::sources::{
    ProviderItem, ProviderSchema, count_from, first_string, joined_strings, string_field,
    year_from,
};

const IMAGE_LINK_PRECEDENCE: [&str; 5] =
    ["extraLarge", "large", "medium", "thumbnail", "smallThumbnail"];

/// Google Books volumes, either already flattened by the backend or in the raw
/// `volumeInfo` / `saleInfo` shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleBooksSchema;

impl ProviderSchema for GoogleBooksSchema {
    fn source(&self) -> Source {
        Source::Google
    }

    fn read_item(&self, item: &Map<String, Value>) -> ProviderItem {
        let mut out = ProviderItem::flat(item);

        if let Some(info) = item.get("volumeInfo").and_then(Value::as_object) {
            out.title = out.title.or_else(|| string_field(info, "title"));
            out.author = out.author.or_else(|| {
                info.get("authors")
                    .and_then(first_string)
                    .or_else(|| string_field(info, "author"))
            });
            out.isbn = out.isbn.or_else(|| industry_isbn(info));
            out.image_url = out.image_url.or_else(|| image_link(info));
            out.publication_year = out
                .publication_year
                .or_else(|| info.get("publishedDate").and_then(year_from));
            out.page_count = out
                .page_count
                .or_else(|| info.get("pageCount").and_then(count_from));
            out.genre = out
                .genre
                .or_else(|| info.get("categories").and_then(joined_strings));
        }

        out.price = out.price.or_else(|| sale_price(item));
        out
    }
}

/// ISBN-13 if listed, else ISBN-10.
fn industry_isbn(info: &Map<String, Value>) -> Option<String> {
    let ids = info.get("industryIdentifiers").and_then(Value::as_array)?;
    let find = |kind: &str| {
        ids.iter()
            .filter(|id| id.get("type").and_then(Value::as_str) == Some(kind))
            .find_map(|id| id.get("identifier").and_then(Value::as_str))
            .map(ToOwned::to_owned)
    };
    find("ISBN_13").or_else(|| find("ISBN_10"))
}

fn image_link(info: &Map<String, Value>) -> Option<String> {
    let links = info.get("imageLinks").and_then(Value::as_object)?;
    IMAGE_LINK_PRECEDENCE
        .iter()
        .find_map(|key| links.get(*key).and_then(Value::as_str))
        .map(force_https)
}

fn force_https(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{rest}"),
        None => url.to_string(),
    }
}

fn sale_price(item: &Map<String, Value>) -> Option<f64> {
    let sale = item.get("saleInfo").and_then(Value::as_object)?;
    ["retailPrice", "listPrice"].iter().find_map(|key| {
        sale.get(*key)
            .and_then(|price| price.get("amount"))
            .and_then(Value::as_f64)
    })
}
