//! Catalog document client

use crate::store::Catalog;
use perkpocket_core::{Error, NetworksDocument, OffersDocument, Result};
use reqwest::Client;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Offers document name under the catalog base URL
pub const OFFERS_DOCUMENT: &str = "offers.json";
/// Networks document name under the catalog base URL
pub const NETWORKS_DOCUMENT: &str = "networks.json";

/// HTTP client for the two static catalog documents
#[derive(Debug)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Create a client for documents served under `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;

        // Url::join replaces the last path segment unless the base ends
        // with '/'
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    /// Fetch and normalize both catalog documents
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Catalog> {
        let offers: OffersDocument = self.fetch_document(OFFERS_DOCUMENT).await?;
        let networks: NetworksDocument = self.fetch_document(NETWORKS_DOCUMENT).await?;

        let catalog = Catalog::from_documents(offers, networks);
        debug!("Catalog loaded: {} offers", catalog.len());
        Ok(catalog)
    }

    /// Fetch the catalog, falling back to an empty one on any failure
    ///
    /// Browsing degrades to an empty listing instead of failing the app.
    #[instrument(skip(self))]
    pub async fn load_or_empty(&self) -> Catalog {
        match self.load().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Catalog unavailable, continuing with empty catalog: {}", e);
                Catalog::empty()
            }
        }
    }

    async fn fetch_document<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let url = self
            .base_url
            .join(name)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", name, e)))?;

        debug!("Fetching catalog document: {}", url);

        let response = self.http.get(url).send().await?;

        let response = response.error_for_status().map_err(|e| {
            error!("Catalog document request failed: {}", e);
            Error::LoadError(e.to_string())
        })?;

        let document: T = response.json().await.map_err(|e| {
            error!("Failed to parse catalog document {}: {}", name, e);
            Error::LoadError(e.to_string())
        })?;

        Ok(document)
    }
}
