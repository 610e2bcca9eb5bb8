//! Site crawling with scope limits, retries and politeness
//!
//! This module provides:
//! - URL fetching with timeouts, bounded retry and polite random delays
//! - A global request rate cap
//! - Host/root-segment scope checks, optionally narrowed to one division
//! - FIFO traversal with per-traversal visited sets
//! - Flat and country -> division discovery strategies

mod discovery;
mod fetch;
mod frontier;
mod rate_limit;
mod retry;
mod scope;

pub use discovery::*;
pub use fetch::*;
pub use frontier::*;
pub use rate_limit::*;
pub use retry::*;
pub use scope::*;

use crate::config::{CrawlConfig, CrawlMode};
use crate::error::{Error, Result};
use std::sync::Arc;
use url::Url;

/// Build the discovery strategy selected by the configuration
pub fn build_discovery(
    config: &CrawlConfig,
    fetcher: Arc<Fetcher>,
) -> Result<Box<dyn AssetDiscovery>> {
    let start = Url::parse(&config.start_url)
        .map_err(|e| Error::Config(format!("Invalid start URL {}: {}", config.start_url, e)))?;

    let scope = Scope::site(&start, &config.root_segment);
    if !scope.in_scope(&start) {
        return Err(Error::OutOfScope(format!(
            "start URL {} does not contain {}",
            start,
            scope.root_marker()
        )));
    }

    let options = TraversalOptions {
        max_pages: config.max_pages,
        collect_archives: config.include_archives,
    };

    let discovery: Box<dyn AssetDiscovery> = match config.mode {
        CrawlMode::Flat => Box::new(FlatDiscovery::new(
            fetcher,
            start,
            &config.root_segment,
            options,
        )),
        CrawlMode::Divisions => Box::new(DivisionDiscovery::new(
            fetcher,
            start,
            &config.root_segment,
            options,
            config.division_workers,
        )),
    };
    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_discovery_rejects_out_of_scope_start() {
        let fetcher = Arc::new(Fetcher::new(FetchSettings::from_config(&CrawlConfig::default())).unwrap());
        let mut config = CrawlConfig::default();
        config.start_url = "https://paladarnegro.net/index.html".to_string();

        let result = build_discovery(&config, fetcher);
        assert!(matches!(result, Err(Error::OutOfScope(_))));
    }

    #[test]
    fn test_build_discovery_reports_bad_start_url_as_config_error() {
        let fetcher = Arc::new(Fetcher::new(FetchSettings::from_config(&CrawlConfig::default())).unwrap());
        let mut config = CrawlConfig::default();
        config.start_url = "not a url".to_string();

        let result = build_discovery(&config, fetcher);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_build_discovery_accepts_defaults() {
        let config = CrawlConfig::default();
        let fetcher = Arc::new(Fetcher::new(FetchSettings::from_config(&config)).unwrap());
        assert!(build_discovery(&config, fetcher).is_ok());
    }
}
