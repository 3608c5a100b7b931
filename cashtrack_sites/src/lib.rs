mod client;
mod errors;
mod extract;
mod site;
pub mod types;
mod user_agent;
pub use self::client::{Client, PageFetcher};
pub use self::errors::{Error, ExtractError};
pub use self::extract::{extract_offers, BlockFailure, PageExtraction};
pub use self::site::{CompiledSelectors, SiteConfig, SiteSelectors};
pub use self::types::ScrapedOffer;
