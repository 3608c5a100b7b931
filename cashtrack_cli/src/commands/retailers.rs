//! The `retailers` subcommand: list known retailers.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::output::{build_retailer_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct RetailersArgs {
    /// SQLite database path
    #[arg(long, env = "CASHTRACK_DB", default_value = "cashtrack.db")]
    pub db: PathBuf,

    /// Case-insensitive substring match on the retailer name
    #[arg(long)]
    pub search: Option<String>,
}

pub fn run(args: &RetailersArgs, format: &OutputFormat) -> Result<()> {
    let db = super::open_existing_db(&args.db)?;
    let retailers = db.list_retailers(args.search.as_deref())?;
    eprintln!("{} retailers", retailers.len());
    match format {
        OutputFormat::Json => print_json(&retailers),
        _ => print_rows(&build_retailer_rows(&retailers), format)?,
    }
    Ok(())
}
