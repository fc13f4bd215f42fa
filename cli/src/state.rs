//! Shared services handed to every command

use perkpocket_catalog::http::{NETWORKS_DOCUMENT, OFFERS_DOCUMENT};
use perkpocket_catalog::{Catalog, CatalogClient};
use perkpocket_core::{Error, NetworksDocument, OffersDocument, Result};
use perkpocket_ledger::{CompletionLedger, Store};
use perkpocket_tracker::{LinkTracker, OfferWire};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a command needs, constructed once at startup
pub struct AppServices {
    pub catalog: Catalog,
    pub ledger: CompletionLedger,
    pub tracker: LinkTracker,
    pub wire: OfferWire,
}

impl AppServices {
    pub async fn new(catalog_url: &str, catalog_dir: Option<&Path>, data_dir: &Path) -> Self {
        let catalog = match catalog_dir {
            Some(dir) => match load_catalog_from_dir(dir) {
                Ok(catalog) => catalog,
                Err(e) => {
                    warn!("Local catalog unreadable, starting with an empty catalog: {}", e);
                    Catalog::empty()
                }
            },
            None => match CatalogClient::new(catalog_url) {
                Ok(client) => client.load_or_empty().await,
                Err(e) => {
                    warn!("Invalid catalog URL, starting with an empty catalog: {}", e);
                    Catalog::empty()
                }
            },
        };

        // Startup never fails; an unusable data directory only costs
        // persistence
        let store = match Store::open(data_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("Data directory unusable, state will not persist: {}", e);
                Arc::new(Store::open_in_memory())
            }
        };

        let ledger = CompletionLedger::load(Arc::clone(&store));
        let tracker = LinkTracker::new(&store);
        let wire = OfferWire::open(store, tracker.user_ref());

        info!(offers = catalog.len(), "Services initialized");

        Self {
            catalog,
            ledger,
            tracker,
            wire,
        }
    }

    /// Begin the per-invocation session, recording a referral when this
    /// visit carried one
    pub fn begin_session(&mut self, referred_by: Option<&str>) {
        self.wire.start_session();
        if let Some(referrer) = referred_by {
            self.wire.track_referral(referrer);
        }
    }

    pub fn end_session(&mut self) {
        self.wire.end_session();
    }
}

/// Read the two catalog documents from a local directory
fn load_catalog_from_dir(dir: &Path) -> Result<Catalog> {
    let offers_path = dir.join(OFFERS_DOCUMENT);
    let offers: OffersDocument = serde_json::from_str(&read_document(&offers_path)?)
        .map_err(|e| Error::LoadError(format!("{}: {}", offers_path.display(), e)))?;

    let networks_path = dir.join(NETWORKS_DOCUMENT);
    let networks: NetworksDocument = serde_json::from_str(&read_document(&networks_path)?)
        .map_err(|e| Error::LoadError(format!("{}: {}", networks_path.display(), e)))?;

    Ok(Catalog::from_documents(offers, networks))
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::LoadError(format!("{}: {}", path.display(), e)))
}
