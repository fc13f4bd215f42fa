//! Completion ledger: lifecycle state machine, daily limits, retention
//!
//! Persistence is best-effort. A failed write is logged and the in-memory
//! state stays authoritative for the rest of the session, so browsing and
//! completing keep working even when the store is unwritable.

use crate::daily::{self, DAILY_LIMIT};
use crate::store::Store;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use perkpocket_core::{
    CompletionRecord, CompletionStatus, DailyCounter, Error, LedgerData, Offer, Payout, Result,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Paid records older than this many days are deleted
pub const RETENTION_DAYS: i64 = 30;

/// Storage key for the completion ledger document
pub const LEDGER_KEY: &str = "perkpocket_offer_tracker";
/// Storage key for the daily counter document
pub const DAILY_KEY: &str = "perkpocket_daily_tracker";

/// Tracks offer completions through pending -> paid -> deleted
pub struct CompletionLedger {
    store: Arc<Store>,
    data: LedgerData,
    counter: DailyCounter,
}

impl CompletionLedger {
    /// Load ledger state from the store
    ///
    /// Never fails: unreadable documents are logged and replaced with empty
    /// state. Expired paid records are purged as part of loading.
    pub fn load(store: Arc<Store>) -> Self {
        Self::load_at(store, Utc::now(), Local::now().date_naive())
    }

    /// Load with an explicit clock
    pub fn load_at(store: Arc<Store>, now: DateTime<Utc>, today: NaiveDate) -> Self {
        let data = match store.get::<LedgerData>(LEDGER_KEY) {
            Ok(Some(data)) => data,
            Ok(None) => LedgerData::default(),
            Err(e) => {
                warn!("Ledger document unreadable, starting empty: {}", e);
                LedgerData::default()
            }
        };

        let counter = match store.get::<DailyCounter>(DAILY_KEY) {
            Ok(Some(mut counter)) => {
                // Re-derive count so a hand-edited document can't break the
                // count == len(completedOfferIds) invariant
                counter.count = counter.completed_offer_ids.len() as u32;
                counter
            }
            Ok(None) => DailyCounter::new(today),
            Err(e) => {
                warn!("Daily counter unreadable, starting empty: {}", e);
                DailyCounter::new(today)
            }
        };

        let mut ledger = Self {
            store,
            data,
            counter,
        };
        ledger.rollover(today);

        let purged = ledger.purge_expired(now);
        if purged > 0 {
            debug!("Purged {} expired paid completions", purged);
        }

        ledger
    }

    // ─── Completion lifecycle ───────────────────────────────────────────

    /// Record a completion of `offer`, subject to today's limits
    #[instrument(skip(self, offer), fields(offer_id = %offer.id))]
    pub fn complete(&mut self, offer: &Offer) -> Result<CompletionRecord> {
        self.complete_at(offer, Utc::now(), Local::now().date_naive())
    }

    /// Record a completion with an explicit clock
    pub fn complete_at(
        &mut self,
        offer: &Offer,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<CompletionRecord> {
        self.rollover(today);
        daily::check_completion_allowed(&self.counter, &offer.id)?;

        let record = CompletionRecord {
            offer_id: offer.id.clone(),
            title: offer.title.clone(),
            payout: offer.payout,
            completed_at: now,
            status: CompletionStatus::Pending,
            paid_at: None,
        };

        self.counter.record(&offer.id);
        self.data.completed.push(record.clone());
        self.persist();

        debug!(
            "Offer completed, {} remaining today",
            daily::remaining(&self.counter)
        );
        Ok(record)
    }

    /// Transition the earliest pending completion of `offer_id` to paid
    #[instrument(skip(self))]
    pub fn mark_paid(&mut self, offer_id: &str) -> Result<()> {
        self.mark_paid_at(offer_id, Utc::now())
    }

    /// Mark paid with an explicit clock
    pub fn mark_paid_at(&mut self, offer_id: &str, now: DateTime<Utc>) -> Result<()> {
        let record = self
            .data
            .completed
            .iter_mut()
            .filter(|r| r.offer_id == offer_id && r.is_pending())
            .min_by_key(|r| r.completed_at)
            .ok_or_else(|| Error::NotFound(offer_id.to_string()))?;

        record.status = CompletionStatus::Paid;
        record.paid_at = Some(now);
        self.persist_ledger();

        debug!("Offer {} marked paid", offer_id);
        Ok(())
    }

    /// Delete paid records older than the retention window, returning how
    /// many were removed
    ///
    /// Pending records are never deleted, whatever their age.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.data.completed.len();
        self.data.completed.retain(|record| match record.paid_at {
            Some(paid_at) if record.is_paid() => {
                now.signed_duration_since(paid_at) <= Duration::days(RETENTION_DAYS)
            }
            _ => true,
        });

        let removed = before - self.data.completed.len();
        if removed > 0 {
            self.persist_ledger();
        }
        removed
    }

    // ─── Views and aggregates ───────────────────────────────────────────

    /// Pending completions, oldest first
    pub fn list_pending(&self) -> Vec<CompletionRecord> {
        self.filtered(CompletionStatus::Pending)
    }

    /// Paid completions, oldest first
    pub fn list_paid(&self) -> Vec<CompletionRecord> {
        self.filtered(CompletionStatus::Paid)
    }

    /// Sum of payouts over paid completions
    pub fn total_earnings(&self) -> Payout {
        self.sum_where(CompletionStatus::Paid)
    }

    /// Sum of payouts over pending completions
    pub fn pending_earnings(&self) -> Payout {
        self.sum_where(CompletionStatus::Pending)
    }

    /// The raw ledger document (for export)
    pub fn data(&self) -> &LedgerData {
        &self.data
    }

    fn filtered(&self, status: CompletionStatus) -> Vec<CompletionRecord> {
        let mut records: Vec<CompletionRecord> = self
            .data
            .completed
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.completed_at);
        records
    }

    fn sum_where(&self, status: CompletionStatus) -> Payout {
        Payout(
            self.data
                .completed
                .iter()
                .filter(|r| r.status == status)
                .map(|r| r.payout)
                .sum(),
        )
    }

    // ─── Daily counter ──────────────────────────────────────────────────

    /// Whether another completion is allowed today
    pub fn can_complete(&mut self) -> bool {
        self.can_complete_on(Local::now().date_naive())
    }

    /// `can_complete` with an explicit day
    pub fn can_complete_on(&mut self, today: NaiveDate) -> bool {
        self.rollover(today);
        self.counter.count < DAILY_LIMIT
    }

    /// Completions still allowed today
    pub fn remaining_today(&mut self) -> u32 {
        self.remaining_on(Local::now().date_naive())
    }

    /// `remaining_today` with an explicit day
    pub fn remaining_on(&mut self, today: NaiveDate) -> u32 {
        self.rollover(today);
        daily::remaining(&self.counter)
    }

    /// Completions recorded today
    pub fn completed_today(&mut self) -> u32 {
        self.completed_on(Local::now().date_naive())
    }

    /// `completed_today` with an explicit day
    pub fn completed_on(&mut self, today: NaiveDate) -> u32 {
        self.rollover(today);
        self.counter.count
    }

    /// Whether `offer_id` was already completed today
    pub fn is_completed_today(&mut self, offer_id: &str) -> bool {
        self.is_completed_on(offer_id, Local::now().date_naive())
    }

    /// `is_completed_today` with an explicit day
    pub fn is_completed_on(&mut self, offer_id: &str, today: NaiveDate) -> bool {
        self.rollover(today);
        self.counter.contains(offer_id)
    }

    /// Reset the counter when the stored day no longer matches `today`
    ///
    /// Prior counts are not retained anywhere; the old counter document is
    /// simply replaced.
    fn rollover(&mut self, today: NaiveDate) {
        if !self.counter.is_for(today) {
            debug!("Daily counter rolling over to {}", today);
            self.counter = DailyCounter::new(today);
            self.persist_counter();
        }
    }

    // ─── Persistence (best-effort) ──────────────────────────────────────

    fn persist(&self) {
        self.persist_ledger();
        self.persist_counter();
    }

    fn persist_ledger(&self) {
        if let Err(e) = self.store.put(LEDGER_KEY, &self.data) {
            warn!("Failed to persist ledger: {}", e);
        }
    }

    fn persist_counter(&self) {
        if let Err(e) = self.store.put(DAILY_KEY, &self.counter) {
            warn!("Failed to persist daily counter: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perkpocket_core::Market;

    fn offer(id: &str, payout: f64) -> Offer {
        Offer {
            id: id.to_string(),
            title: format!("Offer {}", id),
            description: None,
            market: Market::Au,
            category: "Test".to_string(),
            subcategory: None,
            payout,
            network: Some("awin".to_string()),
            url: format!("https://example.com/{}", id),
            sub_id: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn at_noon(d: u32) -> DateTime<Utc> {
        day(d).and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    fn fresh_ledger() -> CompletionLedger {
        CompletionLedger::load_at(Arc::new(Store::open_in_memory()), at_noon(1), day(1))
    }

    #[test]
    fn test_complete_creates_pending_record() {
        let mut ledger = fresh_ledger();
        let record = ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();

        assert_eq!(record.offer_id, "hf");
        assert_eq!(record.payout, 25.0);
        assert_eq!(record.status, CompletionStatus::Pending);
        assert_eq!(record.paid_at, None);
        assert_eq!(ledger.list_pending().len(), 1);
        assert_eq!(ledger.completed_on(day(1)), 1);
    }

    #[test]
    fn test_duplicate_same_day_rejected() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();

        let err = ledger
            .complete_at(&offer("hf", 25.0), at_noon(1), day(1))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyCompletedToday(_)));
        assert_eq!(ledger.list_pending().len(), 1);
    }

    #[test]
    fn test_daily_limit_enforced() {
        let mut ledger = fresh_ledger();
        for i in 0..DAILY_LIMIT {
            ledger
                .complete_at(&offer(&format!("offer-{}", i), 5.0), at_noon(1), day(1))
                .unwrap();
        }
        assert!(!ledger.can_complete_on(day(1)));
        assert_eq!(ledger.remaining_on(day(1)), 0);

        let err = ledger
            .complete_at(&offer("one-more", 5.0), at_noon(1), day(1))
            .unwrap_err();
        assert!(matches!(err, Error::DailyLimitReached { .. }));
        assert_eq!(ledger.list_pending().len(), DAILY_LIMIT as usize);
    }

    #[test]
    fn test_day_boundary_resets_counter() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();
        assert_eq!(ledger.completed_on(day(1)), 1);

        // Next day: the counter resets and yesterday's offer can be
        // completed again
        assert_eq!(ledger.completed_on(day(2)), 0);
        assert!(ledger.can_complete_on(day(2)));
        ledger.complete_at(&offer("hf", 25.0), at_noon(2), day(2)).unwrap();

        assert_eq!(ledger.list_pending().len(), 2);
    }

    #[test]
    fn test_completed_membership_rolls_with_the_day() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();

        assert!(ledger.is_completed_on("hf", day(1)));
        assert!(!ledger.is_completed_on("ubank", day(1)));
        assert!(!ledger.is_completed_on("hf", day(2)));
    }

    #[test]
    fn test_mark_paid_transitions_and_stamps() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();

        ledger.mark_paid_at("hf", at_noon(3)).unwrap();

        let paid = ledger.list_paid();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].status, CompletionStatus::Paid);
        assert_eq!(paid[0].paid_at, Some(at_noon(3)));
        assert!(ledger.list_pending().is_empty());
    }

    #[test]
    fn test_mark_paid_requires_pending_record() {
        let mut ledger = fresh_ledger();
        let err = ledger.mark_paid_at("nope", at_noon(1)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // A record already paid is no longer a target
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();
        ledger.mark_paid_at("hf", at_noon(2)).unwrap();
        let err = ledger.mark_paid_at("hf", at_noon(3)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_mark_paid_targets_earliest_pending() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();
        ledger.complete_at(&offer("hf", 25.0), at_noon(2), day(2)).unwrap();

        ledger.mark_paid_at("hf", at_noon(3)).unwrap();

        let pending = ledger.list_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].completed_at, at_noon(2));
    }

    #[test]
    fn test_purge_boundary() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();
        ledger.mark_paid_at("hf", at_noon(1)).unwrap();
        let paid_at = at_noon(1);

        // 29 days after payout: kept
        assert_eq!(ledger.purge_expired(paid_at + Duration::days(29)), 0);
        assert_eq!(ledger.list_paid().len(), 1);

        // Exactly 30 days: still within the window
        assert_eq!(ledger.purge_expired(paid_at + Duration::days(30)), 0);
        assert_eq!(ledger.list_paid().len(), 1);

        // 31 days: removed
        assert_eq!(ledger.purge_expired(paid_at + Duration::days(31)), 1);
        assert!(ledger.list_paid().is_empty());
    }

    #[test]
    fn test_purge_never_removes_pending() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();

        let far_future = at_noon(1) + Duration::days(365 * 10);
        assert_eq!(ledger.purge_expired(far_future), 0);
        assert_eq!(ledger.list_pending().len(), 1);
    }

    #[test]
    fn test_earnings_split() {
        let mut ledger = fresh_ledger();
        for i in 0..10u32 {
            ledger
                .complete_at(
                    &offer(&format!("offer-{}", i), (i + 1) as f64),
                    at_noon(1),
                    day(1),
                )
                .unwrap();
        }

        ledger.mark_paid_at("offer-3", at_noon(2)).unwrap();

        // offer-3 pays 4.0; the other nine pay 1+2+3+5+..+10 = 51
        assert_eq!(ledger.total_earnings().as_f64(), 4.0);
        assert_eq!(ledger.pending_earnings().as_f64(), 51.0);
    }

    #[test]
    fn test_lists_ordered_by_completed_at() {
        let mut ledger = fresh_ledger();
        ledger.complete_at(&offer("b", 1.0), at_noon(2), day(2)).unwrap();
        // Different day, earlier timestamp: the ledger orders by time, not
        // by insertion
        ledger.complete_at(&offer("a", 1.0), at_noon(1), day(3)).unwrap();

        let pending = ledger.list_pending();
        assert_eq!(pending[0].offer_id, "a");
        assert_eq!(pending[1].offer_id, "b");
    }

    #[test]
    fn test_state_survives_reload() {
        let store = Arc::new(Store::open_in_memory());
        {
            let mut ledger = CompletionLedger::load_at(store.clone(), at_noon(1), day(1));
            ledger.complete_at(&offer("hf", 25.0), at_noon(1), day(1)).unwrap();
            ledger.mark_paid_at("hf", at_noon(1)).unwrap();
        }

        let mut reloaded = CompletionLedger::load_at(store, at_noon(2), day(2));
        assert_eq!(reloaded.list_paid().len(), 1);
        assert_eq!(reloaded.total_earnings().as_f64(), 25.0);
        // The counter belongs to day 1 and has rolled over
        assert_eq!(reloaded.completed_on(day(2)), 0);
    }

    #[test]
    fn test_unwritable_store_still_completes() {
        let dir = std::env::temp_dir().join(format!(
            "perkpocket-ledger-unwritable-{}",
            std::process::id()
        ));
        // A directory squatting on each document path makes every write
        // fail, whoever runs the tests
        std::fs::create_dir_all(dir.join(format!("{LEDGER_KEY}.json"))).unwrap();
        std::fs::create_dir_all(dir.join(format!("{DAILY_KEY}.json"))).unwrap();

        let store = Arc::new(Store::open(&dir).unwrap());
        let mut ledger = CompletionLedger::load_at(store, at_noon(1), day(1));

        // The failed writes are logged; the completion itself succeeds
        let record = ledger
            .complete_at(&offer("hf", 25.0), at_noon(1), day(1))
            .unwrap();
        assert_eq!(record.status, CompletionStatus::Pending);
        assert_eq!(ledger.list_pending().len(), 1);
        assert_eq!(ledger.completed_on(day(1)), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_purges_expired() {
        let store = Arc::new(Store::open_in_memory());
        {
            let mut ledger = CompletionLedger::load_at(store.clone(), at_noon(1), day(1));
            ledger.complete_at(&offer("old", 10.0), at_noon(1), day(1)).unwrap();
            ledger.complete_at(&offer("new", 20.0), at_noon(1), day(1)).unwrap();
            ledger.mark_paid_at("old", at_noon(1)).unwrap();
        }

        let reloaded =
            CompletionLedger::load_at(store, at_noon(1) + Duration::days(40), day(11));
        assert!(reloaded.list_paid().is_empty());
        // Pending records survive any age
        assert_eq!(reloaded.list_pending().len(), 1);
        assert_eq!(reloaded.list_pending()[0].offer_id, "new");
    }

    #[test]
    fn test_counter_count_rederived_on_load() {
        let store = Arc::new(Store::open_in_memory());
        let mut counter = DailyCounter::new(day(1));
        counter.record("a");
        counter.count = 9; // out of step with the id list
        store.put(DAILY_KEY, &counter).unwrap();

        let mut ledger = CompletionLedger::load_at(store, at_noon(1), day(1));
        assert_eq!(ledger.completed_on(day(1)), 1);
        assert_eq!(ledger.remaining_on(day(1)), DAILY_LIMIT - 1);
    }
}
