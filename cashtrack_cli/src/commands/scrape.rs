//! The `scrape` subcommand: fetch every configured page and record the
//! cashback offers in SQLite.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use cashtrack_lib::{
    run_scrape, select_sites, Client, Db, InvocationResponse, MemoryStore, RunReport,
};
use chrono::Utc;
use clap::Args;

use crate::output::print_json;

#[derive(Args)]
pub struct ScrapeArgs {
    /// SQLite database path
    #[arg(long, env = "CASHTRACK_DB", default_value = "cashtrack.db")]
    pub db: PathBuf,

    /// Sites file (TOML) replacing the built-in site list
    #[arg(long)]
    pub sites: Option<PathBuf>,

    /// Only scrape the site with this name
    #[arg(long)]
    pub site: Option<String>,

    /// Fetch and parse without touching the database
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: &ScrapeArgs) -> Result<ExitCode> {
    let sites = select_sites(super::resolve_sites(args.sites.as_ref())?, args.site.as_deref())?;
    let page_count: usize = sites.iter().map(|s| s.urls.len()).sum();
    let client = Client::new()?;

    let report = if args.dry_run {
        eprintln!(
            "Dry run: scraping {} pages across {} sites",
            page_count,
            sites.len()
        );
        let mut store = MemoryStore::new();
        let report = run_scrape(&client, &mut store, &sites).await;
        eprintln!(
            "Would record {} retailers and {} cashback rates",
            store.retailers().count(),
            store.observations().len()
        );
        report
    } else {
        let mut db = Db::open(&args.db)?;
        db.init()?;
        eprintln!(
            "Scraping {} pages across {} sites into {}",
            page_count,
            sites.len(),
            args.db.display()
        );
        let report = run_scrape(&client, &mut db, &sites).await;
        record_run(&db, &report)?;
        eprintln!(
            "Database now holds {} retailers and {} cashback rates",
            db.retailer_count()?,
            db.observation_count()?
        );
        report
    };

    print_failures(&report);

    let response = InvocationResponse::from_report(&report);
    print_json(&response);
    Ok(ExitCode::from(exit_status(response.status_code)))
}

fn record_run(db: &Db, report: &RunReport) -> Result<()> {
    let response = InvocationResponse::from_report(report);
    db.set_meta("last_run_at", &Utc::now().to_rfc3339())?;
    db.set_meta("last_run_status", &response.status_code.to_string())?;
    Ok(())
}

fn print_failures(report: &RunReport) {
    for failure in &report.page_failures {
        eprintln!("  page {} ({}): {}", failure.url, failure.website, failure.reason);
    }
    for item in &report.skipped_items {
        eprintln!(
            "  skipped block {} on {} ({}): {}",
            item.index,
            item.url,
            item.retailer_name.as_deref().unwrap_or("unknown retailer"),
            item.reason
        );
    }
    for failure in &report.write_failures {
        eprintln!(
            "  {} write for {} on {}: {}",
            failure.record, failure.retailer_name, failure.website, failure.reason
        );
    }
}

/// 0 for a clean run, 2 for a partial one, 1 when nothing was fetched.
fn exit_status(status_code: u16) -> u8 {
    match status_code {
        200 => 0,
        207 => 2,
        _ => 1,
    }
}
