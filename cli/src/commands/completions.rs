//! Completion lifecycle commands and the earnings dashboard

use crate::state::AppServices;
use chrono::{Local, Utc};
use perkpocket_core::{Error, Payout, Result};
use perkpocket_ledger::completions::RETENTION_DAYS;
use perkpocket_ledger::{daily, DAILY_LIMIT};

/// Record a completion for an offer, honoring the daily limit
pub fn complete(services: &mut AppServices, offer_id: &str) -> Result<()> {
    let offer = services
        .catalog
        .get(offer_id)
        .ok_or_else(|| Error::NotFound(offer_id.to_string()))?
        .clone();

    let record = services.ledger.complete(&offer)?;
    services.wire.track_conversion(&offer, offer.payout);

    println!(
        "Offer completed! {} remaining today",
        services.ledger.remaining_today()
    );
    println!(
        "{} is pending payment ({}).",
        record.title,
        Payout::new(record.payout).display()
    );
    Ok(())
}

/// Mark the earliest pending completion of an offer as paid
pub fn mark_paid(services: &mut AppServices, offer_id: &str) -> Result<()> {
    services.ledger.mark_paid(offer_id)?;

    println!("Marked paid: {offer_id}");
    println!(
        "Total earned: {}",
        services.ledger.total_earnings().display()
    );
    Ok(())
}

/// Show earnings, completion lists, and today's allowance
pub fn dashboard(services: &mut AppServices) -> Result<()> {
    let pending = services.ledger.list_pending();
    let paid = services.ledger.list_paid();

    println!("My Offers Dashboard");
    println!("===================");
    println!(
        "Total Earned:     {}",
        services.ledger.total_earnings().display()
    );
    println!(
        "Pending Payment:  {}",
        services.ledger.pending_earnings().display()
    );
    println!("Offers Completed: {}", pending.len() + paid.len());
    println!(
        "Daily limit:      {} of {} used, resets in {}",
        services.ledger.completed_today(),
        DAILY_LIMIT,
        daily::time_until_reset(Local::now())
    );

    println!();
    println!("Pending Offers");
    if pending.is_empty() {
        println!("  No pending offers");
    }
    for record in &pending {
        println!(
            "  {}  {:<32} {:>9}",
            record.completed_at.format("%Y-%m-%d"),
            record.title,
            Payout::new(record.payout).display()
        );
    }

    println!();
    println!("Paid Offers");
    if paid.is_empty() {
        println!("  No paid offers");
    }
    let now = Utc::now();
    for record in &paid {
        let deletes_in = record
            .days_since_paid(now)
            .map(|days| RETENTION_DAYS - days)
            .unwrap_or(RETENTION_DAYS);
        println!(
            "  {}  {:<32} {:>9}  deletes in {} days",
            record.completed_at.format("%Y-%m-%d"),
            record.title,
            Payout::new(record.payout).display(),
            deletes_in
        );
    }

    let stats = services.wire.session_stats();
    println!();
    println!(
        "Sessions: {}  Clicks: {}  Conversions: {}  Conversion rate: {:.2}%",
        stats.total_sessions, stats.total_clicks, stats.total_conversions, stats.conversion_rate
    );

    Ok(())
}
