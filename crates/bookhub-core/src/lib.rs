//! Bookhub core: provider normalization, duplicate collapsing and relevance ranking.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod identifiers;
pub mod models;
pub mod pricing;
pub mod rank;
pub mod signature;
pub mod sources;

pub use aggregate::{
    Aggregation, AggregationOptions, Aggregator, LocalMatchPolicy, ProviderPayloads, Resolution,
    aggregate,
};
pub use cache::{CachedSearch, FileSearchCache, MemorySearchCache, SearchCache};
pub use config::BookhubConfig;
pub use dedup::{DedupReport, DedupStrategy, Deduplicator, dedupe};
pub use error::{BookhubError, Result};
pub use models::{BookRecord, ISBN_NOT_AVAILABLE, Source};
pub use pricing::PricePolicy;
pub use rank::{Relevance, rank};
pub use signature::{SemanticSignature, Signature, SignatureBuilder, derive_signature};
pub use sources::{normalize, normalize_with};
