//! Site definitions: the built-in set and user-supplied TOML files.
//!
//! Follows the same compile-time `include_str!` pattern for the defaults;
//! a file passed at runtime replaces them wholesale.

use std::collections::HashSet;
use std::path::Path;

use cashtrack_sites::SiteConfig;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Top-level structure of a sites file: a list of `[[site]]` tables.
#[derive(Deserialize, Debug)]
struct SitesFile {
    #[serde(rename = "site", default)]
    sites: Vec<SiteConfig>,
}

/// Parse and validate site definitions from TOML content.
pub fn parse_sites(toml_content: &str) -> Result<Vec<SiteConfig>, ConfigError> {
    let file: SitesFile = toml::from_str(toml_content)?;
    validate_sites(&file.sites)?;
    Ok(file.sites)
}

/// Load site definitions from a TOML file on disk.
pub fn load_sites(path: &Path) -> Result<Vec<SiteConfig>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_sites(&content)
}

/// The sites shipped with the crate.
pub fn builtin_sites() -> Result<Vec<SiteConfig>, ConfigError> {
    parse_sites(include_str!("../seed_data/sites.toml"))
}

/// Narrow `sites` to the one named `name`, or return all of them.
pub fn select_sites(
    sites: Vec<SiteConfig>,
    name: Option<&str>,
) -> Result<Vec<SiteConfig>, ConfigError> {
    let Some(name) = name else {
        return Ok(sites);
    };
    let selected: Vec<SiteConfig> = sites.into_iter().filter(|s| s.name == name).collect();
    if selected.is_empty() {
        return Err(ConfigError::UnknownSite(name.to_string()));
    }
    Ok(selected)
}

fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Invalid("no sites defined".into()));
    }

    let mut names = HashSet::new();
    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Invalid("site name must not be empty".into()));
        }
        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate site name {}", site.name)));
        }
        if site.urls.is_empty() {
            return Err(ConfigError::Invalid(format!("site {} has no urls", site.name)));
        }
        for raw in &site.urls {
            let url = Url::parse(raw)
                .map_err(|e| ConfigError::Invalid(format!("site {}: bad url {}: {}", site.name, raw, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Invalid(format!(
                    "site {}: url {} is not http(s)",
                    site.name, raw
                )));
            }
        }
        site.selectors
            .compile()
            .map_err(|e| ConfigError::Invalid(format!("site {}: {}", site.name, e)))?;
    }

    Ok(())
}
