use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregationOptions, LocalMatchPolicy};
use crate::dedup::{DEFAULT_TITLE_THRESHOLD, DedupStrategy};
use crate::error::{BookhubError, Result};
use crate::pricing::{DEFAULT_PRICE, PricePolicy};

/// Root configuration, loaded from `~/.config/bookhub/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookhubConfig {
    pub dedup: DedupConfig,
    pub ranking: RankingConfig,
    pub pricing: PricingConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Adds title-similarity collapsing on top of the signature checks.
    pub fuzzy: bool,
    pub title_threshold: f64,
    /// Treat an ISBN-10 and its ISBN-13 form as the same key.
    pub canonical_isbn: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub local_match: LocalMatchPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Estimate missing prices from age, length and genre instead of using
    /// `fixed_price`.
    pub estimate: bool,
    pub fixed_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            fuzzy: false,
            title_threshold: DEFAULT_TITLE_THRESHOLD,
            canonical_isbn: false,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            estimate: false,
            fixed_price: DEFAULT_PRICE,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl BookhubConfig {
    /// `$BOOKHUB_CONFIG`, or `~/.config/bookhub/config.toml`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("BOOKHUB_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bookhub")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.dedup.title_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(BookhubError::Config(format!(
                "dedup.title_threshold must be within 0.0..=1.0, got {threshold}"
            )));
        }
        if !self.pricing.fixed_price.is_finite() || self.pricing.fixed_price < 0.0 {
            return Err(BookhubError::Config(format!(
                "pricing.fixed_price must be a non-negative amount, got {}",
                self.pricing.fixed_price
            )));
        }
        Ok(())
    }

    // ─── Derived values ────────────────────────────────────

    pub fn to_options(&self) -> AggregationOptions {
        let strategy = if self.dedup.fuzzy {
            DedupStrategy::Fuzzy {
                threshold: self.dedup.title_threshold,
            }
        } else {
            DedupStrategy::Signature
        };
        let prices = if self.pricing.estimate {
            PricePolicy::estimated_now()
        } else {
            PricePolicy::Fixed {
                amount: self.pricing.fixed_price,
            }
        };

        AggregationOptions {
            strategy,
            local_match: self.ranking.local_match,
            canonical_isbn: self.dedup.canonical_isbn,
            prices,
        }
    }

    /// Last-search cache file; `~/.local/share/bookhub/last_search.json`
    /// unless overridden.
    pub fn cache_path(&self) -> PathBuf {
        match &self.cache.path {
            Some(path) => PathBuf::from(path),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("bookhub")
                .join("last_search.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_maps_to_default_options() {
        let cfg = BookhubConfig::default();
        assert_eq!(cfg.to_options(), AggregationOptions::default());
        assert!(cfg.cache.enabled);
        assert!(cfg.cache_path().ends_with("bookhub/last_search.json"));
    }

    #[test]
    fn toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = BookhubConfig::default();
        cfg.dedup.fuzzy = true;
        cfg.dedup.title_threshold = 0.9;
        cfg.ranking.local_match = LocalMatchPolicy::ShortCircuit;
        cfg.cache.path = Some("/tmp/bookhub-cache.json".to_string());
        cfg.save_to(&path).unwrap();

        let loaded = BookhubConfig::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.cache_path(), PathBuf::from("/tmp/bookhub-cache.json"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ranking]\nlocal_match = \"short_circuit\"\n").unwrap();

        let cfg = BookhubConfig::load_from(&path).unwrap();
        let options = cfg.to_options();
        assert_eq!(options.local_match, LocalMatchPolicy::ShortCircuit);
        assert_eq!(options.strategy, DedupStrategy::Signature);
        assert_eq!(cfg.pricing.fixed_price, DEFAULT_PRICE);
    }

    #[test]
    fn fuzzy_and_estimate_flags_select_policies() {
        let mut cfg = BookhubConfig::default();
        cfg.dedup.fuzzy = true;
        cfg.pricing.estimate = true;

        let options = cfg.to_options();
        assert_eq!(
            options.strategy,
            DedupStrategy::Fuzzy {
                threshold: DEFAULT_TITLE_THRESHOLD
            }
        );
        assert!(matches!(options.prices, PricePolicy::Estimated { .. }));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dedup]\ntitle_threshold = 1.5\n").unwrap();

        let err = BookhubConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, BookhubError::Config(_)));
    }

    #[test]
    fn load_nonexistent_returns_default() {
        let cfg = BookhubConfig::load_from(Path::new("/tmp/nonexistent_bookhub_config.toml")).unwrap();
        assert_eq!(cfg, BookhubConfig::default());
    }
}
