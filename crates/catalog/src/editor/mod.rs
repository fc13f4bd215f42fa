//! Curation of the offers document on disk

use crate::store::slug;
use perkpocket_core::{Error, Market, OfferRecord, OffersDocument, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use url::Url;

/// Editor over a local offers document
///
/// Opens either document shape, holds the records in memory, and always
/// saves back the flat array form.
#[derive(Debug)]
pub struct CatalogEditor {
    path: PathBuf,
    records: Vec<OfferRecord>,
}

impl CatalogEditor {
    /// Open an offers document for editing; a missing file starts empty
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Offers document does not exist yet, starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                records: Vec::new(),
            });
        }

        let raw = fs::read_to_string(path).map_err(|e| Error::LoadError(e.to_string()))?;
        let document: OffersDocument = serde_json::from_str(&raw)?;
        let records = flatten(document);
        debug!(count = records.len(), "Opened offers document");

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn records(&self) -> &[OfferRecord] {
        &self.records
    }

    /// Look up a record by the id it is stored under
    pub fn get(&self, id: &str) -> Option<&OfferRecord> {
        self.position(id).map(|i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a new offer record; returns the id it is stored under
    pub fn add(&mut self, mut record: OfferRecord) -> Result<String> {
        validate(&record)?;
        let id = record_id(&record);

        if self.position(&id).is_some() {
            return Err(Error::InvalidData(format!(
                "duplicate offer id '{id}'"
            )));
        }

        record.id = Some(id.clone());
        self.records.push(record);
        Ok(id)
    }

    /// Replace the record stored under `id`, keeping the id itself
    pub fn update(&mut self, id: &str, mut record: OfferRecord) -> Result<()> {
        validate(&record)?;
        let position = self
            .position(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        record.id = Some(id.to_string());
        self.records[position] = record;
        Ok(())
    }

    /// Remove and return the record stored under `id`
    pub fn remove(&mut self, id: &str) -> Result<OfferRecord> {
        let position = self
            .position(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(self.records.remove(position))
    }

    /// Write the records back to disk as a flat array
    #[instrument(skip(self))]
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::PersistenceError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json).map_err(|e| Error::PersistenceError(e.to_string()))?;
        debug!(count = self.records.len(), "Saved offers document");
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| record_id(r) == id)
    }
}

/// The id a record is addressed by, derived from the title if absent
fn record_id(record: &OfferRecord) -> String {
    record.id.clone().unwrap_or_else(|| slug(&record.title))
}

fn validate(record: &OfferRecord) -> Result<()> {
    if record.title.trim().is_empty() {
        return Err(Error::InvalidData("offer title is empty".to_string()));
    }

    // A title with no alphanumerics would slug down to an empty id
    if slug(&record.title).is_empty() {
        return Err(Error::InvalidData(format!(
            "offer title '{}' yields an empty id",
            record.title
        )));
    }

    if !record.payout.is_finite() || record.payout < 0.0 {
        return Err(Error::InvalidData(format!(
            "invalid payout {}",
            record.payout
        )));
    }

    Url::parse(&record.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", record.url)))?;
    Ok(())
}

fn flatten(document: OffersDocument) -> Vec<OfferRecord> {
    match document {
        OffersDocument::Flat(records) => records,
        OffersDocument::Nested(markets) => {
            let mut records = Vec::new();
            for (market, categories) in markets {
                for (category, group) in categories {
                    for mut record in group {
                        if record.market.is_none() {
                            record.market = Some(Market::from(market.clone()));
                        }
                        if record.category.is_none() {
                            record.category = Some(category.clone());
                        }
                        records.push(record);
                    }
                }
            }
            records
        }
    }
}
