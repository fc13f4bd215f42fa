//! Derived analytics aggregates and the exported report

use super::{ClickRecord, CompletionRecord, ConversionRecord, ReferralRecord, SessionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate counters across all recorded activity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    pub total_clicks: usize,
    pub total_conversions: usize,
    pub total_referrals: usize,
    /// Conversions per click, as a percentage; 0 when there are no clicks
    pub conversion_rate: f64,
}

/// Per-offer click/conversion/revenue rollup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferPerformance {
    pub title: String,
    pub clicks: u32,
    pub conversions: u32,
    pub revenue: f64,
}

/// Per-market click/conversion/revenue rollup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPerformance {
    pub clicks: u32,
    pub conversions: u32,
    pub revenue: f64,
}

/// Full analytics export: the ledger, the raw wire records, and the
/// aggregates derived from them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub exported_at: DateTime<Utc>,
    pub completed: Vec<CompletionRecord>,
    pub sessions: Vec<SessionRecord>,
    pub clicks: Vec<ClickRecord>,
    pub conversions: Vec<ConversionRecord>,
    pub referrals: Vec<ReferralRecord>,
    pub stats: SessionStats,
    pub offer_performance: BTreeMap<String, OfferPerformance>,
    pub market_performance: BTreeMap<String, MarketPerformance>,
}
