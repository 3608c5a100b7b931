//! The `latest` subcommand: most recent rate per retailer and website.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::output::{build_latest_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct LatestArgs {
    /// SQLite database path
    #[arg(long, env = "CASHTRACK_DB", default_value = "cashtrack.db")]
    pub db: PathBuf,

    /// Only show this website
    #[arg(long)]
    pub website: Option<String>,
}

pub fn run(args: &LatestArgs, format: &OutputFormat) -> Result<()> {
    let db = super::open_existing_db(&args.db)?;
    let rows = db.latest_rates(args.website.as_deref())?;
    if let Some(last_run) = db.get_meta("last_run_at")? {
        eprintln!("Last scrape: {}", last_run);
    }
    match format {
        OutputFormat::Json => print_json(&rows),
        _ => print_rows(&build_latest_rows(&rows), format)?,
    }
    Ok(())
}
