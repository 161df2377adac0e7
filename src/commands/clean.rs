//! Clean the output directory

use anyhow::{Context, Result};
use std::fs;

use crate::Site;

/// Remove the output directory
pub fn run(site: &Site) -> Result<()> {
    if site.dest_dir.exists() {
        fs::remove_dir_all(&site.dest_dir)
            .with_context(|| format!("Failed to remove {:?}", site.dest_dir))?;
        tracing::info!("Deleted: {:?}", site.dest_dir);
    } else {
        tracing::info!("Nothing to clean at {:?}", site.dest_dir);
    }

    Ok(())
}
