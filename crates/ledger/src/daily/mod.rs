//! Daily completion limit rules

use chrono::{DateTime, Days, LocalResult, TimeZone};
use perkpocket_core::{DailyCounter, Error, Result};

/// Maximum offer completions per calendar day
pub const DAILY_LIMIT: u32 = 10;

/// Check whether completing `offer_id` is allowed under today's counter
///
/// The duplicate check runs before the limit check, so re-completing an
/// offer on a full day still reports the duplicate.
pub fn check_completion_allowed(counter: &DailyCounter, offer_id: &str) -> Result<()> {
    if counter.contains(offer_id) {
        return Err(Error::AlreadyCompletedToday(offer_id.to_string()));
    }

    if counter.count >= DAILY_LIMIT {
        return Err(Error::DailyLimitReached { limit: DAILY_LIMIT });
    }

    Ok(())
}

/// Completions still allowed under the counter
pub fn remaining(counter: &DailyCounter) -> u32 {
    DAILY_LIMIT.saturating_sub(counter.count)
}

/// Time until the counter resets at the next midnight, formatted
/// `"Xh Ym"`. Pass `Local::now()`.
///
/// Midnight is resolved through the timezone, so the countdown stays
/// honest across DST transitions.
pub fn time_until_reset<Tz: TimeZone>(now: DateTime<Tz>) -> String {
    let midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|d| d.and_hms_opt(0, 0, 0));

    let Some(midnight) = midnight else {
        return "0h 0m".to_string();
    };

    let diff = match now.timezone().from_local_datetime(&midnight) {
        LocalResult::Single(reset) => reset.signed_duration_since(now),
        // A backward DST jump doubles midnight; the day starts at the
        // earlier one
        LocalResult::Ambiguous(earliest, _) => earliest.signed_duration_since(now),
        // A forward jump can remove midnight from the clock entirely
        LocalResult::None => midnight - now.naive_local(),
    };

    format!("{}h {}m", diff.num_hours(), diff.num_minutes() % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn counter_with(ids: &[&str]) -> DailyCounter {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut counter = DailyCounter::new(date);
        for id in ids {
            counter.record(id);
        }
        counter
    }

    #[test]
    fn test_allowed_under_limit() {
        let counter = counter_with(&["a", "b"]);
        assert!(check_completion_allowed(&counter, "c").is_ok());
        assert_eq!(remaining(&counter), 8);
    }

    #[test]
    fn test_duplicate_rejected() {
        let counter = counter_with(&["a"]);
        let err = check_completion_allowed(&counter, "a").unwrap_err();
        assert!(matches!(err, Error::AlreadyCompletedToday(_)));
    }

    #[test]
    fn test_limit_rejected() {
        let ids: Vec<String> = (0..DAILY_LIMIT).map(|i| format!("offer-{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let counter = counter_with(&refs);

        let err = check_completion_allowed(&counter, "one-more").unwrap_err();
        assert!(matches!(err, Error::DailyLimitReached { limit: DAILY_LIMIT }));
        assert_eq!(remaining(&counter), 0);
    }

    #[test]
    fn test_duplicate_reported_even_when_full() {
        let ids: Vec<String> = (0..DAILY_LIMIT).map(|i| format!("offer-{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let counter = counter_with(&refs);

        let err = check_completion_allowed(&counter, "offer-0").unwrap_err();
        assert!(matches!(err, Error::AlreadyCompletedToday(_)));
    }

    #[test]
    fn test_time_until_reset_format() {
        let evening = Utc.with_ymd_and_hms(2025, 6, 1, 19, 28, 0).unwrap();
        assert_eq!(time_until_reset(evening), "4h 32m");

        let almost_midnight = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 0).unwrap();
        assert_eq!(time_until_reset(almost_midnight), "0h 1m");

        let midnight = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(time_until_reset(midnight), "24h 0m");
    }
}
