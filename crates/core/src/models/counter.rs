//! Daily completion counter model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-day completion counter document
///
/// Reset whenever the stored `date` no longer matches the current local
/// calendar day. Invariant: `count == completed_offer_ids.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounter {
    /// Local calendar day this counter covers, ISO `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub completed_offer_ids: Vec<String>,
    #[serde(default)]
    pub count: u32,
}

impl DailyCounter {
    /// Fresh counter for the given local day
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: date.to_string(),
            completed_offer_ids: Vec::new(),
            count: 0,
        }
    }

    /// Whether this counter covers the given local day
    pub fn is_for(&self, date: NaiveDate) -> bool {
        self.date == date.to_string()
    }

    pub fn contains(&self, offer_id: &str) -> bool {
        self.completed_offer_ids.iter().any(|id| id == offer_id)
    }

    /// Record a completion, keeping `count` in step with the id list
    pub fn record(&mut self, offer_id: &str) {
        self.completed_offer_ids.push(offer_id.to_string());
        self.count = self.completed_offer_ids.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_tracks_ids_and_count() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let mut counter = DailyCounter::new(date);
        assert_eq!(counter.date, "2025-03-14");
        assert!(counter.is_for(date));
        assert_eq!(counter.count, 0);

        counter.record("offer-a");
        counter.record("offer-b");
        assert_eq!(counter.count, 2);
        assert!(counter.contains("offer-a"));
        assert!(!counter.contains("offer-c"));

        let next_day = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert!(!counter.is_for(next_day));
    }
}
