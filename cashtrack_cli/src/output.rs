use anyhow::Result;
use cashtrack_lib::{CashbackObservation, LatestRateRow, Retailer, SiteConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
pub(crate) struct RetailerRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Websites")]
    #[serde(rename = "Websites")]
    websites: String,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    updated: String,
}

#[derive(Tabled, Serialize)]
pub(crate) struct RateRow {
    #[tabled(rename = "Observed")]
    #[serde(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Retailer")]
    #[serde(rename = "Retailer")]
    retailer: String,
    #[tabled(rename = "Website")]
    #[serde(rename = "Website")]
    website: String,
    #[tabled(rename = "Cashback")]
    #[serde(rename = "Cashback")]
    cashback: String,
}

#[derive(Tabled, Serialize)]
pub(crate) struct SiteRow {
    #[tabled(rename = "Site")]
    #[serde(rename = "Site")]
    name: String,
    #[tabled(rename = "Pages")]
    #[serde(rename = "Pages")]
    pages: usize,
    #[tabled(rename = "Block Selector")]
    #[serde(rename = "Block Selector")]
    block: String,
}

// -- Row builders --

pub(crate) fn build_retailer_rows(retailers: &[Retailer]) -> Vec<RetailerRow> {
    retailers
        .iter()
        .map(|r| RetailerRow {
            name: r.retailer_name.clone(),
            id: r.retailer_id.clone(),
            websites: r
                .website_aliases
                .iter()
                .map(|(site, slug)| format!("{} ({})", site, slug))
                .collect::<Vec<_>>()
                .join(", "),
            updated: format_time(&r.updated_at),
        })
        .collect()
}

/// History rows for one retailer, in the order given.
pub(crate) fn build_history_rows(
    retailer_name: &str,
    observations: &[CashbackObservation],
) -> Vec<RateRow> {
    observations
        .iter()
        .map(|o| RateRow {
            observed: format_time(&o.observed_at),
            retailer: retailer_name.to_string(),
            website: o.website_name.clone(),
            cashback: format_rate(&o.cashback_rate, o.is_up_to),
        })
        .collect()
}

pub(crate) fn build_latest_rows(rows: &[LatestRateRow]) -> Vec<RateRow> {
    rows.iter()
        .map(|r| RateRow {
            observed: format_time(&r.observed_at),
            retailer: r
                .retailer_name
                .clone()
                .unwrap_or_else(|| r.retailer_id.clone()),
            website: r.website_name.clone(),
            cashback: format_rate(&r.cashback_rate, r.is_up_to),
        })
        .collect()
}

pub(crate) fn build_site_rows(sites: &[SiteConfig]) -> Vec<SiteRow> {
    sites
        .iter()
        .map(|s| SiteRow {
            name: s.name.clone(),
            pages: s.urls.len(),
            block: s.selectors.block.clone(),
        })
        .collect()
}

// -- Printers --

/// Prints rows in the requested format. JSON prints the rows themselves;
/// use [`print_json`] to print domain records.
pub fn print_rows<T: Tabled + Serialize>(rows: &[T], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// `5` -> `5%`, flagged ceilings get an "up to" prefix. Non-numeric rates
/// are shown as stored.
pub(crate) fn format_rate(rate: &str, is_up_to: bool) -> String {
    let shown = if rate.parse::<f64>().is_ok() {
        format!("{}%", rate)
    } else if rate.is_empty() {
        "-".to_string()
    } else {
        rate.to_string()
    };
    if is_up_to {
        format!("up to {}", shown)
    } else {
        shown
    }
}

fn format_time(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
