//! Analytics export and removal

use crate::state::AppServices;
use perkpocket_core::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Write the full analytics report as pretty JSON
pub fn export(services: &mut AppServices, out: Option<&Path>) -> Result<()> {
    let report = services.wire.export(&services.ledger.data().completed);
    let json = serde_json::to_string_pretty(&report)?;

    match out {
        Some(path) => {
            fs::write(path, &json).map_err(|e| Error::PersistenceError(e.to_string()))?;
            info!("Report written to {}", path.display());
            println!("Exported report to {}.", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Wipe recorded analytics from memory and the store
pub fn clear(services: &mut AppServices) -> Result<()> {
    services.wire.clear();
    println!("Tracking data cleared.");
    Ok(())
}
