use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Price substituted when a provider reports none and the fixed policy is active.
pub const DEFAULT_PRICE: f64 = 29.99;

const BASELINE_CENTS: i64 = 2000;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid price regex"));

/// How a missing provider price is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PricePolicy {
    /// Always the same amount.
    Fixed { amount: f64 },
    /// Baseline price adjusted for age, length and genre.
    Estimated { reference_year: i32 },
}

impl Default for PricePolicy {
    fn default() -> Self {
        Self::Fixed {
            amount: DEFAULT_PRICE,
        }
    }
}

impl PricePolicy {
    /// Estimated pricing relative to the current calendar year.
    pub fn estimated_now() -> Self {
        Self::Estimated {
            reference_year: Utc::now().year(),
        }
    }

    pub fn fallback_price(
        &self,
        publication_year: Option<i32>,
        page_count: Option<u32>,
        genre: Option<&str>,
    ) -> f64 {
        match *self {
            Self::Fixed { amount } => amount,
            Self::Estimated { reference_year } => {
                estimate_price(reference_year, publication_year, page_count, genre)
            }
        }
    }
}

fn estimate_price(
    reference_year: i32,
    publication_year: Option<i32>,
    page_count: Option<u32>,
    genre: Option<&str>,
) -> f64 {
    // Multiplier in hundredths, so the result stays exact to the cent.
    let mut multiplier: i64 = 100;

    if let Some(year) = publication_year {
        let age = reference_year - year;
        if age <= 5 {
            multiplier += 10;
        } else if age >= 20 {
            multiplier -= 10;
        }
    }

    if let Some(pages) = page_count {
        if pages > 300 {
            multiplier += 5;
        } else if pages < 100 {
            multiplier -= 5;
        }
    }

    match genre.map(str::to_lowercase).as_deref() {
        Some("technical") | Some("academic") => multiplier += 15,
        Some("children") => multiplier -= 10,
        _ => {}
    }

    let multiplier = multiplier.clamp(80, 150);
    (BASELINE_CENTS * multiplier / 100) as f64 / 100.0
}

/// Reads a provider price that may be a JSON number or a string such as
/// `"$12.99"` or `"$1,299.99"`. Strings that are not plain decimals once `$`
/// and `,` are dropped (e.g. `"N/A"`) count as absent.
pub fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.trim().replace(['$', ','], "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return None;
            }
            if !PRICE_RE.is_match(cleaned) {
                warn!(price = %s, "ignoring unparseable provider price");
                return None;
            }
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fixed_policy_is_the_default() {
        let policy = PricePolicy::default();
        assert_eq!(policy.fallback_price(Some(2001), Some(900), Some("technical")), 29.99);
    }

    #[test]
    fn estimated_price_applies_adjustments() {
        let policy = PricePolicy::Estimated {
            reference_year: 2024,
        };
        assert_eq!(policy.fallback_price(None, None, None), 20.0);
        // recent (+10) and long (+5)
        assert_eq!(policy.fallback_price(Some(2022), Some(450), None), 23.0);
        // old (-10), short (-5), children (-10) clamps to 0.8
        assert_eq!(
            policy.fallback_price(Some(1990), Some(40), Some("Children")),
            16.0
        );
        // recent, long, technical
        assert_eq!(
            policy.fallback_price(Some(2023), Some(500), Some("Technical")),
            26.0
        );
    }

    #[test]
    fn genre_must_match_whole_value() {
        let policy = PricePolicy::Estimated {
            reference_year: 2024,
        };
        assert_eq!(
            policy.fallback_price(None, None, Some("Computers, Technical")),
            20.0
        );
    }

    #[test]
    fn parses_provider_prices() {
        assert_eq!(parse_price(&json!(12.5)), Some(12.5));
        assert_eq!(parse_price(&json!("$12.99")), Some(12.99));
        assert_eq!(parse_price(&json!(" 7 ")), Some(7.0));
        assert_eq!(parse_price(&json!("$1,299.99")), Some(1299.99));
        assert_eq!(parse_price(&json!("$12,345")), Some(12345.0));
        assert_eq!(parse_price(&json!("N/A")), None);
        assert_eq!(parse_price(&json!("")), None);
        assert_eq!(parse_price(&Value::Null), None);
    }

    #[test]
    fn policy_roundtrips_through_toml() {
        let policy = PricePolicy::Estimated {
            reference_year: 2020,
        };
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            pricing: PricePolicy,
        }
        let text = toml::to_string(&Wrapper { pricing: policy }).unwrap();
        let back: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(back.pricing, policy);
    }
}
