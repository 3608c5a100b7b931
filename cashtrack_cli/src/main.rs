mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "cashtrack")]
#[command(about = "Track cashback rates offered by Canadian rebate sites")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured site and record the rates
    Scrape(commands::scrape::ScrapeArgs),
    /// List the configured sites
    Sites(commands::sites::SitesArgs),
    /// List known retailers
    Retailers(commands::retailers::RetailersArgs),
    /// Show the rate history for one retailer
    Rates(commands::rates::RatesArgs),
    /// Show the latest rate per retailer and website
    Latest(commands::latest::LatestArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cashtrack=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    match &cli.command {
        Commands::Scrape(args) => return commands::scrape::run(args).await,
        Commands::Sites(args) => commands::sites::run(args, &format)?,
        Commands::Retailers(args) => commands::retailers::run(args, &format)?,
        Commands::Rates(args) => commands::rates::run(args, &format)?,
        Commands::Latest(args) => commands::latest::run(args, &format)?,
    }

    Ok(ExitCode::SUCCESS)
}
