use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::BookRecord;
use crate::signature::{SemanticSignature, SignatureBuilder, WorkKey};

pub const DEFAULT_TITLE_THRESHOLD: f64 = 0.8;

/// How aggressively candidates are collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DedupStrategy {
    /// ISBN key, then semantic signature.
    #[default]
    Signature,
    /// Signature checks plus title similarity against every kept record.
    Fuzzy { threshold: f64 },
}

/// Why a candidate did not survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    Invalid,
    DuplicateIsbn,
    DuplicateSignature,
    SimilarTitle,
}

/// Per-run tally: every input record is either kept or counted under one
/// exclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub kept: usize,
    pub invalid: usize,
    pub isbn_duplicates: usize,
    pub signature_duplicates: usize,
    pub similar_titles: usize,
}

impl DedupReport {
    pub fn excluded(&self) -> usize {
        self.invalid + self.isbn_duplicates + self.signature_duplicates + self.similar_titles
    }

    fn exclude(&mut self, reason: Exclusion) {
        match reason {
            Exclusion::Invalid => self.invalid += 1,
            Exclusion::DuplicateIsbn => self.isbn_duplicates += 1,
            Exclusion::DuplicateSignature => self.signature_duplicates += 1,
            Exclusion::SimilarTitle => self.similar_titles += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    strategy: DedupStrategy,
    signatures: SignatureBuilder,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: DedupStrategy) -> Self {
        self.strategy = match strategy {
            DedupStrategy::Fuzzy { threshold } => DedupStrategy::Fuzzy {
                threshold: threshold.clamp(0.0, 1.0),
            },
            other => other,
        };
        self
    }

    /// Switches to fuzzy mode with the given similarity threshold.
    pub fn with_title_threshold(self, threshold: f64) -> Self {
        self.with_strategy(DedupStrategy::Fuzzy { threshold })
    }

    pub fn with_canonical_isbn(mut self, enabled: bool) -> Self {
        self.signatures = self.signatures.with_canonical_isbn(enabled);
        self
    }

    pub fn strategy(&self) -> DedupStrategy {
        self.strategy
    }

    pub fn dedupe(&self, records: &[BookRecord]) -> Vec<BookRecord> {
        self.dedupe_with_report(records).0
    }

    /// First occurrence wins; output keeps input order.
    pub fn dedupe_with_report(&self, records: &[BookRecord]) -> (Vec<BookRecord>, DedupReport) {
        let mut kept = Vec::new();
        let mut report = DedupReport::default();
        let mut seen_isbns: HashSet<String> = HashSet::new();
        let mut seen_works = SeenWorks::default();
        let mut kept_titles: Vec<String> = Vec::new();

        for record in records {
            if !record.is_valid() {
                report.exclude(Exclusion::Invalid);
                continue;
            }

            let signature = self.signatures.build(record);

            if !signature.isbn_key.is_empty() && seen_isbns.contains(&signature.isbn_key) {
                report.exclude(Exclusion::DuplicateIsbn);
                continue;
            }

            if seen_works.contains(&signature.semantic) {
                report.exclude(Exclusion::DuplicateSignature);
                continue;
            }

            let title = comparable_title(record.title_str());
            if let DedupStrategy::Fuzzy { threshold } = self.strategy {
                if kept_titles
                    .iter()
                    .any(|other| similar_titles(other, &title, threshold))
                {
                    report.exclude(Exclusion::SimilarTitle);
                    continue;
                }
            }

            if !signature.isbn_key.is_empty() {
                seen_isbns.insert(signature.isbn_key);
            }
            seen_works.insert(signature.semantic);
            kept_titles.push(title);
            kept.push(record.clone());
            report.kept += 1;
        }

        debug!(
            candidates = records.len(),
            kept = report.kept,
            invalid = report.invalid,
            isbn_duplicates = report.isbn_duplicates,
            signature_duplicates = report.signature_duplicates,
            similar_titles = report.similar_titles,
            "deduplicated candidates"
        );
        (kept, report)
    }
}

/// Signature-based dedup with default settings.
pub fn dedupe(records: &[BookRecord]) -> Vec<BookRecord> {
    Deduplicator::default().dedupe(records)
}

/// Kept signatures grouped by work. An empty edition tag matches any edition
/// of the same work; two different non-empty editions do not match.
#[derive(Debug, Default)]
struct SeenWorks {
    editions: HashMap<WorkKey, Vec<String>>,
}

impl SeenWorks {
    fn contains(&self, signature: &SemanticSignature) -> bool {
        match self.editions.get(&signature.work_key()) {
            None => false,
            Some(editions) => {
                signature.edition.is_empty()
                    || editions
                        .iter()
                        .any(|edition| edition.is_empty() || *edition == signature.edition)
            }
        }
    }

    fn insert(&mut self, signature: SemanticSignature) {
        let key = signature.work_key();
        self.editions.entry(key).or_default().push(signature.edition);
    }
}

fn comparable_title(title: &str) -> String {
    title.trim().to_lowercase()
}

fn similar_titles(a: &str, b: &str, threshold: f64) -> bool {
    if a == b {
        return true;
    }
    strsim::sorensen_dice(a, b) >= threshold
}
