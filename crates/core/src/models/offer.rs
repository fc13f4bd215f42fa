//! Offer-related models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Market an offer is available in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Market {
    Au,
    Uk,
    /// Markets the catalog may grow into that this build has no special
    /// handling for
    Other(String),
}

impl Market {
    pub fn as_str(&self) -> &str {
        match self {
            Market::Au => "AU",
            Market::Uk => "UK",
            Market::Other(code) => code,
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &str {
        match self {
            Market::Au => "Australia",
            Market::Uk => "United Kingdom",
            Market::Other(code) => code,
        }
    }
}

impl From<String> for Market {
    fn from(code: String) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "AU" => Market::Au,
            "UK" => Market::Uk,
            _ => Market::Other(code),
        }
    }
}

impl From<Market> for String {
    fn from(market: Market) -> String {
        market.as_str().to_string()
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized offer as held by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub market: Market,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub payout: f64,
    /// Key into the networks document; offers without one get the raw URL
    #[serde(default)]
    pub network: Option<String>,
    pub url: String,
    #[serde(default)]
    pub sub_id: Option<String>,
}

/// Raw offer entry as found in the catalog document
///
/// Tolerates the legacy vintage (`name`/`link`, no id) and records in the
/// nested document shape where market/category come from the map keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub market: Option<Market>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    pub payout: f64,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(alias = "link")]
    pub url: String,
    #[serde(default)]
    pub sub_id: Option<String>,
}

/// Offers document in either observed shape: a flat array of records, or a
/// market -> category -> records map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OffersDocument {
    Flat(Vec<OfferRecord>),
    Nested(BTreeMap<String, BTreeMap<String, Vec<OfferRecord>>>),
}

impl Default for OffersDocument {
    fn default() -> Self {
        OffersDocument::Flat(Vec::new())
    }
}

/// Deserialize an f64 that may arrive as a number, string, or null
fn deserialize_f64_lenient<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct F64Lenient;

    impl<'de> de::Visitor<'de> for F64Lenient {
        type Value = f64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, string, or null")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<f64, E> {
            v.trim_start_matches('$').parse::<f64>().map_err(de::Error::custom)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<f64, E> {
            Ok(0.0)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<f64, E> {
            Ok(0.0)
        }
    }

    deserializer.deserialize_any(F64Lenient)
}
