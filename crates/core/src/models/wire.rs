//! Analytics wire models: sessions, clicks, conversions, referrals

use super::Market;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One app session from start to end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub device_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Session length in milliseconds, stamped when the session ends
    #[serde(default)]
    pub duration_ms: Option<i64>,
    /// Last market the user browsed into
    #[serde(default)]
    pub market: Option<Market>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub offers_viewed: Vec<String>,
    #[serde(default)]
    pub offers_clicked: Vec<String>,
    #[serde(default)]
    pub page_views: u32,
}

/// An outbound click on an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRecord {
    pub id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub offer_id: String,
    pub offer_title: String,
    pub market: Market,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub payout: f64,
    #[serde(default)]
    pub network: Option<String>,
    pub url: String,
}

/// A completed offer attributed back to a click
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRecord {
    pub id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub offer_id: String,
    pub offer_title: String,
    pub market: Market,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Advertised payout at completion time
    pub payout: f64,
    /// What the completion actually earned
    pub actual_amount: f64,
    #[serde(default)]
    pub network: Option<String>,
    pub conversion_type: String,
}

/// An inbound visit that carried a referral id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRecord {
    pub id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub referrer_id: String,
    pub referred_device_id: String,
}

/// Persisted analytics document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingData {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(default)]
    pub clicks: Vec<ClickRecord>,
    #[serde(default)]
    pub conversions: Vec<ConversionRecord>,
    #[serde(default)]
    pub referrals: Vec<ReferralRecord>,
}
