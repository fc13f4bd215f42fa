//! HTTP access to the catalog documents

mod client;

pub use client::{CatalogClient, NETWORKS_DOCUMENT, OFFERS_DOCUMENT};
