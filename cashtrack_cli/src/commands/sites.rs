//! The `sites` subcommand: show which sites and pages a scrape would visit.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::output::{build_site_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct SitesArgs {
    /// Sites file (TOML) replacing the built-in site list
    #[arg(long)]
    pub sites: Option<PathBuf>,
}

pub fn run(args: &SitesArgs, format: &OutputFormat) -> Result<()> {
    let sites = super::resolve_sites(args.sites.as_ref())?;
    match format {
        OutputFormat::Json => print_json(&sites),
        _ => print_rows(&build_site_rows(&sites), format)?,
    }
    Ok(())
}
