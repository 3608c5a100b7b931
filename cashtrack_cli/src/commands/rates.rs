//! The `rates` subcommand: cashback history for one retailer.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::output::{build_history_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct RatesArgs {
    /// SQLite database path
    #[arg(long, env = "CASHTRACK_DB", default_value = "cashtrack.db")]
    pub db: PathBuf,

    /// Retailer name or ID
    #[arg(long)]
    pub retailer: String,

    /// Only show rates observed on this website
    #[arg(long)]
    pub website: Option<String>,

    /// Maximum number of observations (newest first)
    #[arg(long)]
    pub limit: Option<i64>,
}

pub fn run(args: &RatesArgs, format: &OutputFormat) -> Result<()> {
    let db = super::open_existing_db(&args.db)?;
    let matches = db.find_retailers(&args.retailer)?;
    let retailer = match matches.as_slice() {
        [] => bail!("no retailer matches {:?}", args.retailer),
        [one] => one,
        many => {
            let names: Vec<&str> = many.iter().map(|r| r.retailer_name.as_str()).collect();
            bail!(
                "{:?} matches {} retailers: {}",
                args.retailer,
                many.len(),
                names.join(", ")
            );
        }
    };

    let history = db.rate_history(&retailer.retailer_id, args.website.as_deref(), args.limit)?;
    eprintln!(
        "{} observations for {} ({})",
        history.len(),
        retailer.retailer_name,
        retailer.retailer_id
    );
    match format {
        OutputFormat::Json => print_json(&history),
        _ => print_rows(&build_history_rows(&retailer.retailer_name, &history), format)?,
    }
    Ok(())
}
