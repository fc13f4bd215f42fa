//! Outbound link construction and the per-installation user reference

use perkpocket_core::{Error, Network, Offer, Result};
use perkpocket_ledger::Store;
use tracing::{debug, instrument, warn};
use url::Url;

/// Sub-id value used when an offer does not carry its own
pub const SUB_ID_FALLBACK: &str = "perkpocket";

/// Storage key holding the per-installation user reference
const USER_REF_KEY: &str = "perkpocket_device_id";

const USER_REF_PREFIX: &str = "device_";
const USER_REF_SUFFIX_LEN: usize = 9;
const USER_REF_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Append a network's tracking parameters to an offer URL
///
/// Parameters already present in the URL's query string are left untouched,
/// so applying this to its own output changes nothing. An offer without a
/// network gets its URL back unmodified.
pub fn build_tracked_url(
    offer: &Offer,
    network: Option<&Network>,
    user_ref: &str,
) -> Result<String> {
    let mut url = Url::parse(&offer.url)
        .map_err(|e| Error::InvalidUrl(format!("{}: {e}", offer.url)))?;

    let Some(network) = network else {
        return Ok(url.into());
    };

    let mut additions: Vec<(String, String)> = Vec::new();

    if let Some(param) = &network.tracking_param {
        if !is_set(param, &url, &additions) {
            additions.push((param.clone(), user_ref.to_string()));
        }
    }

    for (key, value) in &network.params {
        if !is_set(key, &url, &additions) {
            additions.push((key.clone(), value.clone()));
        }
    }

    if let Some(param) = &network.sub_id_param {
        if !is_set(param, &url, &additions) {
            let value = offer
                .sub_id
                .clone()
                .unwrap_or_else(|| SUB_ID_FALLBACK.to_string());
            additions.push((param.clone(), value));
        }
    }

    // query_pairs_mut writes a '?' even when nothing is appended, so only
    // open it when there is something to add
    if !additions.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &additions {
            pairs.append_pair(key, value);
        }
    }

    Ok(url.into())
}

fn is_set(key: &str, url: &Url, additions: &[(String, String)]) -> bool {
    url.query_pairs().any(|(k, _)| k == key) || additions.iter().any(|(k, _)| k == key)
}

/// Hands out tracked URLs bound to this installation's user reference
#[derive(Debug, Clone)]
pub struct LinkTracker {
    user_ref: String,
}

impl LinkTracker {
    /// Load the installation's user reference, provisioning one on first use
    pub fn new(store: &Store) -> Self {
        let user_ref = match store.get::<String>(USER_REF_KEY) {
            Ok(Some(user_ref)) => user_ref,
            Ok(None) => {
                let user_ref = generate_user_ref();
                debug!(user_ref = %user_ref, "Provisioned new user reference");
                if let Err(e) = store.put(USER_REF_KEY, &user_ref) {
                    warn!("Failed to persist user reference: {}", e);
                }
                user_ref
            }
            Err(e) => {
                warn!("Failed to read user reference, using a fresh one: {}", e);
                generate_user_ref()
            }
        };

        Self { user_ref }
    }

    pub fn user_ref(&self) -> &str {
        &self.user_ref
    }

    /// Tracked URL for an offer; an unparseable offer URL falls back to the
    /// raw string rather than blocking the redirect
    #[instrument(skip(self, offer, network), fields(offer_id = %offer.id))]
    pub fn tracked_url(&self, offer: &Offer, network: Option<&Network>) -> String {
        match build_tracked_url(offer, network, &self.user_ref) {
            Ok(url) => url,
            Err(e) => {
                warn!("Falling back to raw offer URL: {}", e);
                offer.url.clone()
            }
        }
    }
}

fn generate_user_ref() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..USER_REF_SUFFIX_LEN)
        .map(|_| USER_REF_ALPHABET[rng.gen_range(0..USER_REF_ALPHABET.len())] as char)
        .collect();
    format!("{USER_REF_PREFIX}{suffix}")
}
