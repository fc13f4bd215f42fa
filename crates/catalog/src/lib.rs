//! PerkPocket Catalog - Offer/network documents, browsing, and admin editing

pub mod editor;
pub mod http;
pub mod store;

pub use editor::CatalogEditor;
pub use http::CatalogClient;
pub use store::{sort_offers, Catalog, OfferFilter, SortKey};
