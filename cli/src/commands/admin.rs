//! Offers document curation

use crate::AdminCommand;
use perkpocket_catalog::CatalogEditor;
use perkpocket_core::{Error, Market, OfferRecord, Payout, Result};
use std::path::Path;
use tracing::info;

pub fn run(command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::List { file } => list(&file),
        AdminCommand::Add {
            file,
            id,
            title,
            description,
            market,
            category,
            subcategory,
            payout,
            network,
            url,
            sub_id,
        } => add(
            &file,
            OfferRecord {
                id,
                title,
                description,
                market: market.map(Market::from),
                category,
                subcategory,
                payout,
                network,
                url,
                sub_id,
            },
        ),
        AdminCommand::Update {
            id,
            file,
            title,
            description,
            market,
            category,
            subcategory,
            payout,
            network,
            url,
            sub_id,
        } => update(
            &file,
            &id,
            RecordPatch {
                title,
                description,
                market,
                category,
                subcategory,
                payout,
                network,
                url,
                sub_id,
            },
        ),
        AdminCommand::Remove { id, file } => remove(&file, &id),
    }
}

/// Field overrides applied to an existing record
pub struct RecordPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub market: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub payout: Option<f64>,
    pub network: Option<String>,
    pub url: Option<String>,
    pub sub_id: Option<String>,
}

fn list(file: &Path) -> Result<()> {
    let editor = CatalogEditor::open(file)?;

    if editor.is_empty() {
        println!("No offers in {}.", file.display());
        return Ok(());
    }

    println!("{:<22} {:<32} {:>9}  {}", "ID", "TITLE", "PAYOUT", "NETWORK");
    for record in editor.records() {
        println!(
            "{:<22} {:<32} {:>9}  {}",
            record.id.as_deref().unwrap_or("-"),
            record.title,
            Payout::new(record.payout).display(),
            record.network.as_deref().unwrap_or("-")
        );
    }

    println!();
    println!("{} records.", editor.len());
    Ok(())
}

fn add(file: &Path, record: OfferRecord) -> Result<()> {
    let mut editor = CatalogEditor::open(file)?;
    let id = editor.add(record)?;
    editor.save()?;

    info!("Offer '{}' added to {}", id, file.display());
    println!("Added offer '{id}' ({} records).", editor.len());
    Ok(())
}

fn update(file: &Path, id: &str, patch: RecordPatch) -> Result<()> {
    let mut editor = CatalogEditor::open(file)?;
    let mut record = editor
        .get(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(id.to_string()))?;

    if let Some(title) = patch.title {
        record.title = title;
    }
    if let Some(description) = patch.description {
        record.description = Some(description);
    }
    if let Some(market) = patch.market {
        record.market = Some(Market::from(market));
    }
    if let Some(category) = patch.category {
        record.category = Some(category);
    }
    if let Some(subcategory) = patch.subcategory {
        record.subcategory = Some(subcategory);
    }
    if let Some(payout) = patch.payout {
        record.payout = payout;
    }
    if let Some(network) = patch.network {
        record.network = Some(network);
    }
    if let Some(url) = patch.url {
        record.url = url;
    }
    if let Some(sub_id) = patch.sub_id {
        record.sub_id = Some(sub_id);
    }

    editor.update(id, record)?;
    editor.save()?;

    println!("Updated offer '{id}'.");
    Ok(())
}

fn remove(file: &Path, id: &str) -> Result<()> {
    let mut editor = CatalogEditor::open(file)?;
    let removed = editor.remove(id)?;
    editor.save()?;

    println!("Removed '{}' ({} records left).", removed.title, editor.len());
    Ok(())
}
