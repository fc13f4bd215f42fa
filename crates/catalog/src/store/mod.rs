//! In-memory catalog of offers and affiliate networks

use perkpocket_core::{Market, Network, NetworksDocument, Offer, OfferRecord, OffersDocument};
use std::collections::BTreeMap;

/// Sort orders for offer listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Catalog order, as curated in the document
    Featured,
    Alphabetical,
    Category,
    Region,
}

/// Filter predicates for offer listings; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub market: Option<Market>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Case-insensitive match against title, description, category, and
    /// market
    pub query: Option<String>,
}

impl OfferFilter {
    fn matches(&self, offer: &Offer) -> bool {
        if let Some(market) = &self.market {
            if offer.market != *market {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if offer.category != *category {
                return false;
            }
        }

        if let Some(subcategory) = &self.subcategory {
            if offer.subcategory.as_deref() != Some(subcategory.as_str()) {
                return false;
            }
        }

        if let Some(query) = &self.query {
            if !query_matches(offer, query) {
                return false;
            }
        }

        true
    }
}

/// Normalized offer/network catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    offers: Vec<Offer>,
    networks: BTreeMap<String, Network>,
}

impl Catalog {
    /// An empty catalog, the load-failure fallback
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalize the two raw documents into one catalog
    ///
    /// Nested documents contribute market and category from their map keys;
    /// records without an id get one derived from the title.
    pub fn from_documents(offers: OffersDocument, networks: NetworksDocument) -> Self {
        let mut normalized = Vec::new();

        match offers {
            OffersDocument::Flat(records) => {
                for record in records {
                    normalized.push(normalize_offer(record, None, None));
                }
            }
            OffersDocument::Nested(markets) => {
                for (market, categories) in markets {
                    for (category, records) in categories {
                        for record in records {
                            normalized.push(normalize_offer(
                                record,
                                Some(market.clone()),
                                Some(category.clone()),
                            ));
                        }
                    }
                }
            }
        }

        let networks = networks
            .into_iter()
            .map(|(key, record)| {
                let network = Network::from_record(&key, record);
                (key, network)
            })
            .collect();

        Self {
            offers: normalized,
            networks,
        }
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// All offers in catalog order
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn get(&self, id: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == id)
    }

    pub fn network(&self, key: &str) -> Option<&Network> {
        self.networks.get(key)
    }

    /// The network an offer's clicks are attributed through
    pub fn network_for(&self, offer: &Offer) -> Option<&Network> {
        offer
            .network
            .as_deref()
            .and_then(|key| self.networks.get(key))
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    /// Offers matching every provided predicate, in catalog order
    pub fn filter(&self, filter: &OfferFilter) -> Vec<&Offer> {
        self.offers.iter().filter(|o| filter.matches(o)).collect()
    }

    /// Markets present in the catalog, in first-seen order
    pub fn markets(&self) -> Vec<Market> {
        let mut seen = Vec::new();
        for offer in &self.offers {
            if !seen.contains(&offer.market) {
                seen.push(offer.market.clone());
            }
        }
        seen
    }

    /// Categories available in a market, in first-seen order
    pub fn categories(&self, market: &Market) -> Vec<String> {
        let mut seen = Vec::new();
        for offer in &self.offers {
            if offer.market == *market && !seen.contains(&offer.category) {
                seen.push(offer.category.clone());
            }
        }
        seen
    }

    /// Subcategories under a market/category, in first-seen order
    pub fn subcategories(&self, market: &Market, category: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for offer in &self.offers {
            if offer.market == *market && offer.category == category {
                if let Some(subcategory) = &offer.subcategory {
                    if !seen.contains(subcategory) {
                        seen.push(subcategory.clone());
                    }
                }
            }
        }
        seen
    }
}

/// Order offers by the given key; `Featured` keeps catalog order
pub fn sort_offers<'a>(mut offers: Vec<&'a Offer>, key: SortKey) -> Vec<&'a Offer> {
    match key {
        SortKey::Featured => {}
        SortKey::Alphabetical => offers.sort_by(|a, b| compare_ci(&a.title, &b.title)),
        SortKey::Category => offers.sort_by(|a, b| compare_ci(&a.category, &b.category)),
        SortKey::Region => offers.sort_by(|a, b| {
            compare_ci(a.market.display_name(), b.market.display_name())
        }),
    }
    offers
}

/// Case-insensitive ordering over Unicode-lowercased strings
fn compare_ci(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn query_matches(offer: &Offer, query: &str) -> bool {
    let needle = query.to_lowercase();

    offer.title.to_lowercase().contains(&needle)
        || offer
            .description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
        || offer.category.to_lowercase().contains(&needle)
        || offer.market.as_str().to_lowercase().contains(&needle)
        || offer.market.display_name().to_lowercase().contains(&needle)
}

fn normalize_offer(
    record: OfferRecord,
    market: Option<String>,
    category: Option<String>,
) -> Offer {
    let market = record
        .market
        .or_else(|| market.map(Market::from))
        .unwrap_or_else(|| Market::Other(String::new()));
    let category = record.category.or(category).unwrap_or_default();
    let id = record.id.unwrap_or_else(|| slug(&record.title));

    Offer {
        id,
        title: record.title,
        description: record.description,
        market,
        category,
        subcategory: record.subcategory,
        payout: record.payout,
        network: record.network,
        url: record.url,
        sub_id: record.sub_id,
    }
}

/// Derive a stable id from a title, for records that carry none
pub(crate) fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_dash = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            prev_dash = false;
        } else if !prev_dash && !out.is_empty() {
            out.push('-');
            prev_dash = true;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        let offers = r#"[
            { "id": "hf-au", "title": "HelloFresh Box", "description": "Meal kits delivered",
              "market": "AU", "category": "Food", "subcategory": "Meal Kits",
              "payout": 25.0, "network": "awin", "url": "https://hellofresh.com.au" },
            { "id": "ubank-au", "title": "UBank Account", "market": "AU", "category": "Finance",
              "payout": 30.0, "network": "impact", "url": "https://ubank.com.au" },
            { "id": "gousto-uk", "title": "Gousto Box", "market": "UK", "category": "Food",
              "payout": 20.0, "network": "awin", "url": "https://gousto.co.uk" }
        ]"#;
        let networks = r#"{
            "awin": { "name": "Awin", "param": "ref" },
            "impact": { "name": "Impact", "param": "irclickid", "subParam": "subId1" }
        }"#;

        Catalog::from_documents(
            serde_json::from_str(offers).unwrap(),
            serde_json::from_str(networks).unwrap(),
        )
    }

    #[test]
    fn test_nested_document_fills_market_and_category() {
        let offers = r#"{
            "AU": { "Food": [ { "title": "HelloFresh", "payout": 25, "url": "https://hf.au" } ] }
        }"#;
        let catalog = Catalog::from_documents(
            serde_json::from_str(offers).unwrap(),
            NetworksDocument::new(),
        );

        assert_eq!(catalog.len(), 1);
        let offer = &catalog.offers()[0];
        assert_eq!(offer.market, Market::Au);
        assert_eq!(offer.category, "Food");
        // No id in the record: derived from the title
        assert_eq!(offer.id, "hellofresh");
    }

    #[test]
    fn test_filter_by_market_and_category() {
        let catalog = sample_catalog();

        let au = catalog.filter(&OfferFilter {
            market: Some(Market::Au),
            ..Default::default()
        });
        assert_eq!(au.len(), 2);

        let au_food = catalog.filter(&OfferFilter {
            market: Some(Market::Au),
            category: Some("Food".to_string()),
            ..Default::default()
        });
        assert_eq!(au_food.len(), 1);
        assert_eq!(au_food[0].id, "hf-au");

        // No predicates: everything
        assert_eq!(catalog.filter(&OfferFilter::default()).len(), 3);
    }

    #[test]
    fn test_filter_by_query_text() {
        let catalog = sample_catalog();

        let hits = catalog.filter(&OfferFilter {
            query: Some("MEAL".to_string()),
            ..Default::default()
        });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "hf-au");

        // Region names match too
        let hits = catalog.filter(&OfferFilter {
            query: Some("australia".to_string()),
            ..Default::default()
        });
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_sort_keys() {
        let catalog = sample_catalog();
        let all = catalog.filter(&OfferFilter::default());

        let featured = sort_offers(all.clone(), SortKey::Featured);
        assert_eq!(featured[0].id, "hf-au");

        let alphabetical = sort_offers(all.clone(), SortKey::Alphabetical);
        assert_eq!(alphabetical[0].id, "gousto-uk");
        assert_eq!(alphabetical[1].id, "hf-au");

        let by_category = sort_offers(all.clone(), SortKey::Category);
        assert_eq!(by_category[0].id, "ubank-au");

        let by_region = sort_offers(all, SortKey::Region);
        assert_eq!(by_region[2].id, "gousto-uk");
    }

    #[test]
    fn test_browse_helpers() {
        let catalog = sample_catalog();

        assert_eq!(catalog.markets(), vec![Market::Au, Market::Uk]);
        assert_eq!(catalog.categories(&Market::Au), vec!["Food", "Finance"]);
        assert_eq!(
            catalog.subcategories(&Market::Au, "Food"),
            vec!["Meal Kits"]
        );
        assert!(catalog.subcategories(&Market::Uk, "Food").is_empty());
    }

    #[test]
    fn test_network_resolution() {
        let catalog = sample_catalog();

        let offer = catalog.get("hf-au").unwrap();
        let network = catalog.network_for(offer).unwrap();
        assert_eq!(network.key, "awin");
        assert_eq!(network.tracking_param.as_deref(), Some("ref"));

        // Unknown network key resolves to nothing
        let mut orphan = offer.clone();
        orphan.network = Some("gone".to_string());
        assert!(catalog.network_for(&orphan).is_none());
    }

    #[test]
    fn test_legacy_records_appear_only_unfiltered() {
        // Earliest catalog vintage carries no market at all
        let offers = r#"[ { "name": "Old Offer", "link": "https://example.com/old" } ]"#;
        let catalog = Catalog::from_documents(
            serde_json::from_str(offers).unwrap(),
            NetworksDocument::new(),
        );

        assert_eq!(catalog.filter(&OfferFilter::default()).len(), 1);
        let au = catalog.filter(&OfferFilter {
            market: Some(Market::Au),
            ..Default::default()
        });
        assert!(au.is_empty());
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("HelloFresh 40% Off!"), "hellofresh-40-off");
        assert_eq!(slug("  Plain  "), "plain");
    }
}
