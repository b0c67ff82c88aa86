//! Entry point of the pipeline: normalize → dedupe → rank.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dedup::{DedupReport, DedupStrategy, Deduplicator};
use crate::error::{BookhubError, Result};
use crate::models::{BookRecord, Source};
use crate::pricing::PricePolicy;
use crate::rank::{Relevance, normalize_for_match, rank};
use crate::sources::{normalize_item, normalize_with};

/// Raw provider lists as delivered by the fetch layer. Every provider key must
/// be present; a provider that produced nothing sends `[]`.
///
/// `googleBookDto` and `amazonResult` are older names for the Google and
/// Amazon lists. Send one name per provider: an envelope carrying both is
/// rejected as a duplicate field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayloads {
    /// Set when the fetch layer already resolved one authoritative hit.
    #[serde(default)]
    pub single: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_result: Option<Value>,
    #[serde(default)]
    pub local_results: Value,
    #[serde(default, alias = "googleBookDto")]
    pub google_book_results: Value,
    #[serde(default)]
    pub open_library_results: Value,
    #[serde(default, alias = "amazonResult")]
    pub amazon_book_results: Value,
}

impl ProviderPayloads {
    pub fn new(internal: Value, google: Value, open_library: Value, amazon: Value) -> Self {
        Self {
            single: false,
            single_result: None,
            local_results: internal,
            google_book_results: google,
            open_library_results: open_library,
            amazon_book_results: amazon,
        }
    }

    /// Payload carrying only an exact single hit.
    pub fn single(hit: Value) -> Self {
        Self {
            single: true,
            single_result: Some(hit),
            ..Self::default()
        }
    }

    pub fn for_source(&self, source: Source) -> &Value {
        match source {
            Source::Internal => &self.local_results,
            Source::Google => &self.google_book_results,
            Source::OpenLibrary => &self.open_library_results,
            Source::Amazon => &self.amazon_book_results,
        }
    }
}

/// What to do when the local catalog already holds an exact title match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalMatchPolicy {
    /// Merge every provider regardless; the local hit still ranks first.
    #[default]
    Merge,
    /// Return the local exact match alone without merging external providers.
    ShortCircuit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregationOptions {
    pub strategy: DedupStrategy,
    pub local_match: LocalMatchPolicy,
    pub canonical_isbn: bool,
    pub prices: PricePolicy,
}

/// How the output list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    SingleResult,
    LocalExactMatch,
    Merged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub resolution: Resolution,
    pub records: Vec<BookRecord>,
    /// Present only when dedup ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DedupReport>,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    options: AggregationOptions,
}

impl Aggregator {
    pub fn new(options: AggregationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AggregationOptions {
        &self.options
    }

    pub fn aggregate(&self, payloads: &ProviderPayloads, query: &str) -> Result<Vec<BookRecord>> {
        self.run(payloads, query).map(|aggregation| aggregation.records)
    }

    pub fn run(&self, payloads: &ProviderPayloads, query: &str) -> Result<Aggregation> {
        let prices = &self.options.prices;

        if payloads.single {
            let hit = payloads.single_result.as_ref().ok_or_else(|| {
                BookhubError::payload("singleResult", "single flag set without a result")
            })?;
            let record = normalize_item(hit, Source::Internal, prices)?;
            debug!(id = %record.id, "returning single authoritative result");
            return Ok(Aggregation {
                resolution: Resolution::SingleResult,
                records: vec![record],
                report: None,
            });
        }

        let internal = normalize_with(payloads.for_source(Source::Internal), Source::Internal, prices)?;

        if self.options.local_match == LocalMatchPolicy::ShortCircuit {
            if let Some(hit) = local_exact_match(&internal, query) {
                debug!(id = %hit.id, "local exact title match, skipping external providers");
                return Ok(Aggregation {
                    resolution: Resolution::LocalExactMatch,
                    records: vec![hit.clone()],
                    report: None,
                });
            }
        }

        let mut candidates = internal;
        for source in &Source::ALL[1..] {
            candidates.extend(normalize_with(payloads.for_source(*source), *source, prices)?);
        }
        debug!(candidates = candidates.len(), "merged provider candidates");

        let deduplicator = Deduplicator::new()
            .with_strategy(self.options.strategy)
            .with_canonical_isbn(self.options.canonical_isbn);
        let (unique, report) = deduplicator.dedupe_with_report(&candidates);

        Ok(Aggregation {
            resolution: Resolution::Merged,
            records: rank(unique, query),
            report: Some(report),
        })
    }
}

/// Aggregates with default options: signature dedup, no local short-circuit,
/// fixed fallback price.
pub fn aggregate(payloads: &ProviderPayloads, query: &str) -> Result<Vec<BookRecord>> {
    Aggregator::default().aggregate(payloads, query)
}

fn local_exact_match<'a>(internal: &'a [BookRecord], query: &str) -> Option<&'a BookRecord> {
    let query = normalize_for_match(query);
    internal.iter().filter(|record| record.is_valid()).find(|record| {
        Relevance::classify(&normalize_for_match(record.title_str()), &query) == Relevance::Exact
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_payloads() -> ProviderPayloads {
        ProviderPayloads::new(
            json!([
                {"id": 1, "title": "Python", "author": "Guido", "isbn": "N/A", "price": 10.0}
            ]),
            json!([
                {"id": "g1", "volumeInfo": {"title": "Python Crash Course", "authors": ["Eric Matthes"]}},
                {"id": "g2", "volumeInfo": {"title": "Python", "authors": ["Guido"]}}
            ]),
            json!([
                {"key": "/works/OL1W", "title": "Learning Python", "author_name": ["Mark Lutz"]}
            ]),
            json!([
                {"asin": "B1", "title": "Learning Python, 5th Edition", "author": "Mark Lutz", "price": "$45.00"}
            ]),
        )
    }

    #[test]
    fn merges_dedupes_and_ranks() {
        let aggregation = Aggregator::default().run(&sample_payloads(), "python").unwrap();
        assert_eq!(aggregation.resolution, Resolution::Merged);

        let ids: Vec<(Source, &str)> = aggregation
            .records
            .iter()
            .map(|r| (r.source, r.id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (Source::Internal, "1"),
                (Source::Google, "g1"),
                (Source::OpenLibrary, "/works/OL1W"),
            ]
        );

        let report = aggregation.report.unwrap();
        assert_eq!(report.kept, 3);
        assert_eq!(report.signature_duplicates, 2);
    }

    #[test]
    fn single_result_bypasses_pipeline() {
        let payloads = ProviderPayloads::single(json!({"id": 9, "title": "Dune", "author": "Frank Herbert"}));
        let aggregation = Aggregator::default().run(&payloads, "anything").unwrap();
        assert_eq!(aggregation.resolution, Resolution::SingleResult);
        assert_eq!(aggregation.records.len(), 1);
        assert_eq!(aggregation.records[0].id, "9");
        assert!(aggregation.report.is_none());
    }

    #[test]
    fn single_flag_without_result_is_an_error() {
        let payloads = ProviderPayloads {
            single: true,
            ..ProviderPayloads::default()
        };
        assert!(aggregate(&payloads, "x").is_err());
    }

    #[test]
    fn short_circuit_returns_local_exact_match() {
        let aggregator = Aggregator::new(AggregationOptions {
            local_match: LocalMatchPolicy::ShortCircuit,
            ..AggregationOptions::default()
        });
        let aggregation = aggregator.run(&sample_payloads(), "Python!").unwrap();
        assert_eq!(aggregation.resolution, Resolution::LocalExactMatch);
        assert_eq!(aggregation.records.len(), 1);
        assert_eq!(aggregation.records[0].source, Source::Internal);
    }

    #[test]
    fn short_circuit_falls_through_without_local_match() {
        let aggregator = Aggregator::new(AggregationOptions {
            local_match: LocalMatchPolicy::ShortCircuit,
            ..AggregationOptions::default()
        });
        let aggregation = aggregator.run(&sample_payloads(), "learning").unwrap();
        assert_eq!(aggregation.resolution, Resolution::Merged);
        assert_eq!(aggregation.records[0].title_str(), "Learning Python");
    }

    #[test]
    fn missing_provider_is_a_payload_error() {
        let payloads: ProviderPayloads = serde_json::from_value(json!({
            "localResults": [],
            "googleBookResults": [],
            "openLibraryResults": []
        }))
        .unwrap();
        let err = aggregate(&payloads, "x").unwrap_err();
        assert!(matches!(err, BookhubError::PayloadShape { ref provider, .. } if provider == "AMAZON"));
    }

    #[test]
    fn envelope_rejects_both_names_for_one_provider() {
        let both_google = serde_json::from_value::<ProviderPayloads>(json!({
            "localResults": [],
            "googleBookResults": [],
            "googleBookDto": [],
            "openLibraryResults": [],
            "amazonBookResults": []
        }));
        assert!(both_google.unwrap_err().to_string().contains("duplicate field"));

        let both_amazon = serde_json::from_value::<ProviderPayloads>(json!({
            "localResults": [],
            "googleBookResults": [],
            "openLibraryResults": [],
            "amazonBookResults": [],
            "amazonResult": []
        }));
        assert!(both_amazon.is_err());
    }

    #[test]
    fn envelope_accepts_legacy_keys() {
        let payloads: ProviderPayloads = serde_json::from_value(json!({
            "localResults": [],
            "googleBookDto": [{"title": "T", "author": "A"}],
            "openLibraryResults": [],
            "amazonResult": []
        }))
        .unwrap();
        assert_eq!(aggregate(&payloads, "t").unwrap().len(), 1);
    }
}
