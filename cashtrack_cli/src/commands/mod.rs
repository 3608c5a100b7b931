//! CLI subcommand implementations.

pub mod latest;
pub mod rates;
pub mod retailers;
pub mod scrape;
pub mod sites;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use cashtrack_lib::{builtin_sites, load_sites, Db, SiteConfig};

/// Built-in sites unless a file is given.
pub(crate) fn resolve_sites(path: Option<&PathBuf>) -> Result<Vec<SiteConfig>> {
    let sites = match path {
        Some(path) => load_sites(path)?,
        None => builtin_sites()?,
    };
    Ok(sites)
}

/// Opens an existing database for the read-only commands.
pub(crate) fn open_existing_db(path: &Path) -> Result<Db> {
    if !path.exists() {
        bail!(
            "database {} not found; run `cashtrack scrape` first",
            path.display()
        );
    }
    let db = Db::open(path)?;
    db.init()?;
    Ok(db)
}
