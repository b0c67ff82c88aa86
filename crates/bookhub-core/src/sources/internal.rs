use serde_json::{Map, Value};

use crate::models::Source;
use crate::sources::{ProviderItem, ProviderSchema};

/// The local catalog: flat rows straight from the books table.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalSchema;

impl ProviderSchema for InternalSchema {
    fn source(&self) -> Source {
        Source::Internal
    }

    fn read_item(&self, item: &Map<String, Value>) -> ProviderItem {
        ProviderItem::flat(item)
    }
}
