use serde_json::{Map, Value};

use crate::models::Source;
use crate::sources::{ProviderItem, ProviderSchema, scalar_string, string_field};

/// Amazon product search results. Prices arrive as display strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonSchema;

impl ProviderSchema for AmazonSchema {
    fn source(&self) -> Source {
        Source::Amazon
    }

    fn read_item(&self, item: &Map<String, Value>) -> ProviderItem {
        let mut out = ProviderItem::flat(item);
        out.id = out.id.or_else(|| item.get("asin").and_then(scalar_string));
        out.image_url = out
            .image_url
            .or_else(|| string_field(item, "productUrl"));
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn read(value: Value) -> ProviderItem {
        AmazonSchema.read_item(value.as_object().unwrap())
    }

    #[test]
    fn parses_product() {
        let item = read(json!({
            "asin": "B08XYZ",
            "title": "Rust in Action",
            "author": "Tim McNamara",
            "price": "$39.99",
            "productUrl": "https://m.media-amazon.com/images/I/rust.jpg"
        }));
        assert_eq!(item.id.as_deref(), Some("B08XYZ"));
        assert_eq!(item.price, Some(39.99));
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/rust.jpg")
        );
    }

    #[test]
    fn thousands_separator_price_is_kept() {
        let records = crate::sources::normalize(
            &json!([{"asin": "B1", "title": "T", "author": "A", "price": "$1,299.99"}]),
            Source::Amazon,
        )
        .unwrap();
        assert_eq!(records[0].price, 1299.99);
    }

    #[test]
    fn unavailable_price_is_absent() {
        let item = read(json!({"id": "a1", "title": "T", "author": "A", "price": "N/A"}));
        assert_eq!(item.id.as_deref(), Some("a1"));
        assert_eq!(item.price, None);
    }
}
