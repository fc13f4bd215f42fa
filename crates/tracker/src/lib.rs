//! PerkPocket Tracker - Outbound link attribution and local analytics

pub mod link;
pub mod wire;

pub use link::{build_tracked_url, LinkTracker, SUB_ID_FALLBACK};
pub use wire::OfferWire;
