//! Local analytics: sessions, clicks, conversions, referrals

use chrono::{DateTime, Utc};
use perkpocket_core::{
    ClickRecord, CompletionRecord, ConversionRecord, ExportReport, MarketPerformance, Offer,
    OfferPerformance, ReferralRecord, SessionRecord, SessionStats, TrackingData,
};
use perkpocket_ledger::Store;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Storage key holding the analytics document
const TRACKING_KEY: &str = "perkpocket_tracking";

/// Conversion type recorded for completions driven from this app
const CONVERSION_SIMULATED: &str = "simulated";

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Records user activity and derives the aggregate views over it
///
/// All writes go through the store best-effort; a failed save keeps the
/// in-memory data consistent and the operation still counts.
pub struct OfferWire {
    store: Arc<Store>,
    device_id: String,
    data: TrackingData,
    session: Option<SessionRecord>,
}

impl OfferWire {
    /// Load recorded analytics from the store; unreadable data starts fresh
    pub fn open(store: Arc<Store>, device_id: &str) -> Self {
        let data = match store.get::<TrackingData>(TRACKING_KEY) {
            Ok(Some(data)) => data,
            Ok(None) => TrackingData::default(),
            Err(e) => {
                warn!("Failed to load tracking data, starting fresh: {}", e);
                TrackingData::default()
            }
        };

        Self {
            store,
            device_id: device_id.to_string(),
            data,
            session: None,
        }
    }

    // ─── Session lifecycle ───────────────────────────────────────────────

    /// Begin a session; an unfinished previous session is ended first
    pub fn start_session(&mut self) {
        self.start_session_at(Utc::now());
    }

    fn start_session_at(&mut self, now: DateTime<Utc>) {
        if self.session.is_some() {
            self.end_session_at(now);
        }

        self.session = Some(SessionRecord {
            id: generate_id_at(now),
            device_id: self.device_id.clone(),
            start_time: now,
            end_time: None,
            duration_ms: None,
            market: None,
            category: None,
            subcategory: None,
            offers_viewed: Vec::new(),
            offers_clicked: Vec::new(),
            page_views: 1,
        });
    }

    /// End the current session, stamping its duration, and record it
    pub fn end_session(&mut self) {
        self.end_session_at(Utc::now());
    }

    fn end_session_at(&mut self, now: DateTime<Utc>) {
        if let Some(mut session) = self.session.take() {
            session.end_time = Some(now);
            session.duration_ms =
                Some(now.signed_duration_since(session.start_time).num_milliseconds());
            self.data.sessions.push(session);
            self.persist();
        }
    }

    pub fn session(&self) -> Option<&SessionRecord> {
        self.session.as_ref()
    }

    /// Record where the user browsed to within the current session
    pub fn track_browse(
        &mut self,
        market: Option<&str>,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) {
        if let Some(session) = self.session.as_mut() {
            if let Some(market) = market {
                session.market = Some(market.to_string().into());
            }
            if let Some(category) = category {
                session.category = Some(category.to_string());
            }
            if let Some(subcategory) = subcategory {
                session.subcategory = Some(subcategory.to_string());
            }
        }
    }

    // ─── Event recording ─────────────────────────────────────────────────

    /// Record that an offer was shown; each offer counts once per session
    pub fn track_offer_view(&mut self, offer: &Offer) {
        if let Some(session) = self.session.as_mut() {
            if !session.offers_viewed.contains(&offer.id) {
                session.offers_viewed.push(offer.id.clone());
            }
        }
    }

    /// Record an outbound click; `url` is the address the user was sent to
    #[instrument(skip(self, offer, url), fields(offer_id = %offer.id))]
    pub fn track_click(&mut self, offer: &Offer, url: &str) {
        self.track_click_at(offer, url, Utc::now());
    }

    fn track_click_at(&mut self, offer: &Offer, url: &str, now: DateTime<Utc>) {
        let click = ClickRecord {
            id: generate_id_at(now),
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            device_id: self.device_id.clone(),
            timestamp: now,
            offer_id: offer.id.clone(),
            offer_title: offer.title.clone(),
            market: offer.market.clone(),
            category: (!offer.category.is_empty()).then(|| offer.category.clone()),
            subcategory: offer.subcategory.clone(),
            payout: offer.payout,
            network: offer.network.clone(),
            url: url.to_string(),
        };
        self.data.clicks.push(click);

        if let Some(session) = self.session.as_mut() {
            if !session.offers_clicked.contains(&offer.id) {
                session.offers_clicked.push(offer.id.clone());
            }
        }

        self.persist();
    }

    /// Record a completion and what it actually earned
    #[instrument(skip(self, offer), fields(offer_id = %offer.id))]
    pub fn track_conversion(&mut self, offer: &Offer, amount: f64) {
        self.track_conversion_at(offer, amount, Utc::now());
    }

    fn track_conversion_at(&mut self, offer: &Offer, amount: f64, now: DateTime<Utc>) {
        let conversion = ConversionRecord {
            id: generate_id_at(now),
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            device_id: self.device_id.clone(),
            timestamp: now,
            offer_id: offer.id.clone(),
            offer_title: offer.title.clone(),
            market: offer.market.clone(),
            category: (!offer.category.is_empty()).then(|| offer.category.clone()),
            subcategory: offer.subcategory.clone(),
            payout: offer.payout,
            actual_amount: amount,
            network: offer.network.clone(),
            conversion_type: CONVERSION_SIMULATED.to_string(),
        };
        self.data.conversions.push(conversion);
        self.persist();
    }

    /// Record an inbound visit that carried a referral id
    pub fn track_referral(&mut self, referrer_id: &str) {
        self.track_referral_at(referrer_id, Utc::now());
    }

    fn track_referral_at(&mut self, referrer_id: &str, now: DateTime<Utc>) {
        let referral = ReferralRecord {
            id: generate_id_at(now),
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            device_id: self.device_id.clone(),
            timestamp: now,
            referrer_id: referrer_id.to_string(),
            referred_device_id: self.device_id.clone(),
        };
        self.data.referrals.push(referral);
        self.persist();
    }

    // ─── Aggregates and export ───────────────────────────────────────────

    /// Aggregate counters over everything recorded so far
    pub fn session_stats(&self) -> SessionStats {
        let clicks = self.data.clicks.len();
        let conversions = self.data.conversions.len();
        let conversion_rate = if clicks > 0 {
            conversions as f64 / clicks as f64 * 100.0
        } else {
            0.0
        };

        SessionStats {
            total_sessions: self.data.sessions.len(),
            total_clicks: clicks,
            total_conversions: conversions,
            total_referrals: self.data.referrals.len(),
            conversion_rate,
        }
    }

    /// Per-offer rollup; conversions count only toward offers that have at
    /// least one recorded click
    pub fn offer_performance(&self) -> BTreeMap<String, OfferPerformance> {
        let mut stats: BTreeMap<String, OfferPerformance> = BTreeMap::new();

        for click in &self.data.clicks {
            let entry = stats
                .entry(click.offer_id.clone())
                .or_insert_with(|| OfferPerformance {
                    title: click.offer_title.clone(),
                    ..Default::default()
                });
            entry.clicks += 1;
        }

        for conversion in &self.data.conversions {
            if let Some(entry) = stats.get_mut(&conversion.offer_id) {
                entry.conversions += 1;
                entry.revenue += conversion.actual_amount;
            }
        }

        stats
    }

    /// Per-market rollup, keyed by market code
    pub fn market_performance(&self) -> BTreeMap<String, MarketPerformance> {
        let mut stats: BTreeMap<String, MarketPerformance> = BTreeMap::new();

        for click in &self.data.clicks {
            stats
                .entry(click.market.as_str().to_string())
                .or_default()
                .clicks += 1;
        }

        for conversion in &self.data.conversions {
            if let Some(entry) = stats.get_mut(conversion.market.as_str()) {
                entry.conversions += 1;
                entry.revenue += conversion.actual_amount;
            }
        }

        stats
    }

    /// Assemble the full export document: ledger, raw records, aggregates
    pub fn export(&self, completed: &[CompletionRecord]) -> ExportReport {
        self.export_at(completed, Utc::now())
    }

    fn export_at(&self, completed: &[CompletionRecord], now: DateTime<Utc>) -> ExportReport {
        ExportReport {
            exported_at: now,
            completed: completed.to_vec(),
            sessions: self.data.sessions.clone(),
            clicks: self.data.clicks.clone(),
            conversions: self.data.conversions.clone(),
            referrals: self.data.referrals.clone(),
            stats: self.session_stats(),
            offer_performance: self.offer_performance(),
            market_performance: self.market_performance(),
        }
    }

    pub fn data(&self) -> &TrackingData {
        &self.data
    }

    /// Drop all recorded analytics, in memory and from the store
    pub fn clear(&mut self) {
        self.data = TrackingData::default();
        self.session = None;
        if let Err(e) = self.store.remove(TRACKING_KEY) {
            warn!("Failed to clear tracking data: {}", e);
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.put(TRACKING_KEY, &self.data) {
            warn!("Failed to save tracking data: {}", e);
        }
    }
}

/// Event id in the `id_<random>_<millis>` form
fn generate_id_at(now: DateTime<Utc>) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("id_{suffix}_{}", now.timestamp_millis())
}
