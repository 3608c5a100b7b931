//! Error types for page fetching and block extraction.

/// Errors that can occur when fetching a listing page or preparing a site.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The site answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },
    /// A configured page URL does not parse.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// A configured CSS selector does not parse.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

/// Why a single retailer block could not be turned into an offer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing {field} element")]
    MissingElement { field: &'static str },
    #[error("empty {field}")]
    EmptyField { field: &'static str },
}
