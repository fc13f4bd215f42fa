//! Offer browsing and outbound opens

use crate::state::AppServices;
use perkpocket_catalog::{sort_offers, OfferFilter, SortKey};
use perkpocket_core::{Error, Market, Payout, Result};
use tracing::debug;

pub struct ListArgs {
    pub market: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub query: Option<String>,
    pub sort: SortKey,
}

/// List offers matching the provided filters
pub fn list(services: &mut AppServices, args: ListArgs) -> Result<()> {
    let filter = OfferFilter {
        market: args.market.map(Market::from),
        category: args.category,
        subcategory: args.subcategory,
        query: args.query,
    };

    services.wire.track_browse(
        filter.market.as_ref().map(|m| m.as_str()),
        filter.category.as_deref(),
        filter.subcategory.as_deref(),
    );

    let offers = sort_offers(services.catalog.filter(&filter), args.sort);
    debug!("Listing {} of {} offers", offers.len(), services.catalog.len());

    if offers.is_empty() {
        println!("No offers found.");
        return Ok(());
    }

    println!(
        "{:<22} {:<32} {:>9}  {:<8} {}",
        "ID", "TITLE", "PAYOUT", "MARKET", "CATEGORY"
    );
    for offer in &offers {
        services.wire.track_offer_view(offer);
        let market = offer.market.as_str();
        let done = if services.ledger.is_completed_today(&offer.id) {
            "  (completed today)"
        } else {
            ""
        };
        println!(
            "{:<22} {:<32} {:>9}  {:<8} {}{}",
            offer.id,
            offer.title,
            Payout::new(offer.payout).display(),
            if market.is_empty() { "-" } else { market },
            if offer.category.is_empty() {
                "-"
            } else {
                &offer.category
            },
            done
        );
    }

    println!();
    println!("{} offers.", offers.len());
    Ok(())
}

/// Print the tracked URL for an offer and record the click
pub fn open(services: &mut AppServices, offer_id: &str) -> Result<()> {
    let offer = services
        .catalog
        .get(offer_id)
        .ok_or_else(|| Error::NotFound(offer_id.to_string()))?;

    let network = services.catalog.network_for(offer);
    let url = services.tracker.tracked_url(offer, network);
    services.wire.track_click(offer, &url);

    println!("{url}");
    Ok(())
}
