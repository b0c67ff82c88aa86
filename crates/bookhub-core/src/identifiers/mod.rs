pub mod isbn;

pub use isbn::{Isbn, canonical_isbn_key, isbn_key};
