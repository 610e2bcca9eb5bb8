//! Asset discovery strategies
//!
//! Two strategies share one trait so the downloader does not care how the
//! asset set was built:
//! - [`FlatDiscovery`]: one traversal over everything below the root segment
//! - [`DivisionDiscovery`]: country -> division discovery, then one bounded
//!   traversal per division

use super::fetch::Fetcher;
use super::frontier::{DiscoveredAssets, Traversal, TraversalOptions};
use super::scope::Scope;
use crate::error::{Error, Result};
use crate::parse::extract_links;
use crate::progress::{finish_progress, start_spinner};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

/// Something that can produce the set of assets to mirror
#[async_trait]
pub trait AssetDiscovery: Send + Sync {
    async fn discover_assets(&self) -> Result<DiscoveredAssets>;
}

/// A first-level folder below the root segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub name: String,
    pub landing: Url,
}

/// A second-level folder below the root segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    pub country: String,
    pub name: String,
    pub landing: Url,
    /// `/<root>/<country>/<division>/`
    pub prefix: String,
}

/// Countries linked from the start page, in order of first appearance
///
/// A link names a country when at least one more path segment follows the
/// country segment. Among several links to one country the shallowest one
/// becomes its landing page.
pub fn find_countries(scope: &Scope, links: &[Url]) -> Vec<Country> {
    let mut countries: Vec<(Country, usize)> = Vec::new();

    for link in links {
        let Some(segments) = scope.segments_below_root(link) else {
            continue;
        };
        if segments.len() < 2 || segments[0].is_empty() {
            continue;
        }
        let depth = segments.len();
        match countries.iter_mut().find(|(c, _)| c.name == segments[0]) {
            Some((country, best)) if depth < *best => {
                country.landing = link.clone();
                *best = depth;
            }
            Some(_) => {}
            None => countries.push((
                Country {
                    name: segments[0].to_string(),
                    landing: link.clone(),
                },
                depth,
            )),
        }
    }

    countries.into_iter().map(|(c, _)| c).collect()
}

/// Divisions of `country` linked from its landing page
pub fn find_divisions(scope: &Scope, country: &Country, links: &[Url]) -> Vec<Division> {
    let mut divisions: Vec<(Division, usize)> = Vec::new();

    for link in links {
        let Some((through_root, rest)) = scope.split_root(link) else {
            continue;
        };
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() < 3 || segments[0] != country.name || segments[1].is_empty() {
            continue;
        }
        let depth = segments.len();
        match divisions.iter_mut().find(|(d, _)| d.name == segments[1]) {
            Some((division, best)) if depth < *best => {
                division.landing = link.clone();
                *best = depth;
            }
            Some(_) => {}
            None => divisions.push((
                Division {
                    country: country.name.clone(),
                    name: segments[1].to_string(),
                    landing: link.clone(),
                    prefix: format!("{}{}/{}/", through_root, segments[0], segments[1]),
                },
                depth,
            )),
        }
    }

    divisions.into_iter().map(|(d, _)| d).collect()
}

/// Single traversal over the whole root segment
pub struct FlatDiscovery {
    fetcher: Arc<Fetcher>,
    start: Url,
    scope: Scope,
    options: TraversalOptions,
}

impl FlatDiscovery {
    pub fn new(fetcher: Arc<Fetcher>, start: Url, root_segment: &str, options: TraversalOptions) -> Self {
        let scope = Scope::site(&start, root_segment);
        Self {
            fetcher,
            start,
            scope,
            options,
        }
    }
}

#[async_trait]
impl AssetDiscovery for FlatDiscovery {
    async fn discover_assets(&self) -> Result<DiscoveredAssets> {
        info!("Crawling {} (flat mode)", self.start);

        let spinner = start_spinner("Discovering pages");
        let outcome = Traversal::new(&self.fetcher, self.scope.clone(), self.options)
            .with_progress(spinner.clone())
            .run(self.start.clone())
            .await;
        finish_progress(Some(spinner), "Discovery finished");
        let outcome = outcome?;

        info!(
            "Visited {} pages ({} failed), found {} images and {} archives",
            outcome.assets.pages_visited,
            outcome.pages_failed,
            outcome.assets.images.len(),
            outcome.assets.archives.len()
        );
        Ok(outcome.assets)
    }
}

/// Country -> division discovery followed by one traversal per division
pub struct DivisionDiscovery {
    fetcher: Arc<Fetcher>,
    start: Url,
    scope: Scope,
    options: TraversalOptions,
    division_workers: usize,
}

impl DivisionDiscovery {
    pub fn new(
        fetcher: Arc<Fetcher>,
        start: Url,
        root_segment: &str,
        options: TraversalOptions,
        division_workers: usize,
    ) -> Self {
        let scope = Scope::site(&start, root_segment);
        Self {
            fetcher,
            start,
            scope,
            options,
            division_workers: division_workers.max(1),
        }
    }

    /// In-scope page links of one page, or `None` if it could not be fetched
    async fn page_links(&self, url: &Url) -> Option<Vec<Url>> {
        let resource = self.fetcher.fetch(url).await;
        self.fetcher.polite_pause().await;
        let resource = resource?;
        let links = extract_links(
            &resource.url,
            resource.content_type.as_deref(),
            &resource.text(),
            &self.scope,
            false,
        );
        Some(links.pages)
    }

    /// Enumerate every division reachable from the start page
    pub async fn find_all_divisions(&self) -> Result<(Vec<Division>, usize)> {
        let start_links = self
            .page_links(&self.start)
            .await
            .ok_or_else(|| Error::StartUnreachable(self.start.to_string()))?;
        let mut pages_fetched = 1;

        let countries = find_countries(&self.scope, &start_links);
        info!("Found {} countries", countries.len());

        let mut seen_prefixes: HashSet<String> = HashSet::new();
        let mut divisions = Vec::new();
        for country in &countries {
            let Some(links) = self.page_links(&country.landing).await else {
                warn!("Skipping country {}: landing page unavailable", country.name);
                continue;
            };
            pages_fetched += 1;

            let found = find_divisions(&self.scope, country, &links);
            info!("{}: {} divisions", country.name, found.len());
            for division in found {
                if seen_prefixes.insert(division.prefix.clone()) {
                    divisions.push(division);
                }
            }
        }

        Ok((divisions, pages_fetched))
    }

    /// Bounded traversal of one division
    pub async fn crawl_division(&self, division: &Division) -> Result<DiscoveredAssets> {
        let scope = self.scope.restricted_to(division.prefix.clone());
        let outcome = Traversal::new(&self.fetcher, scope, self.options)
            .run(division.landing.clone())
            .await?;

        info!(
            "{}/{}: {} pages, {} images, {} archives",
            division.country,
            division.name,
            outcome.assets.pages_visited,
            outcome.assets.images.len(),
            outcome.assets.archives.len()
        );

        let mut assets = outcome.assets;
        assets.divisions_crawled = 1;
        Ok(assets)
    }
}

#[async_trait]
impl AssetDiscovery for DivisionDiscovery {
    async fn discover_assets(&self) -> Result<DiscoveredAssets> {
        info!("Crawling {} (divisions mode)", self.start);

        let (divisions, pages_fetched) = self.find_all_divisions().await?;
        if divisions.is_empty() {
            warn!("No divisions found below {}", self.scope.root_marker());
        }

        let sink = Mutex::new(DiscoveredAssets::default());
        let spinner = start_spinner("Crawling divisions");

        stream::iter(divisions.clone())
            .map(|division: Division| {
                let sink = &sink;
                let spinner = spinner.clone();
                async move {
                    spinner.set_message(format!("{}/{}", division.country, division.name));
                    match self.crawl_division(&division).await {
                        Ok(assets) => sink.lock().await.merge(assets),
                        Err(e) => warn!(
                            "Skipping division {}/{}: {}",
                            division.country, division.name, e
                        ),
                    }
                    spinner.inc(1);
                }
            })
            .buffer_unordered(self.division_workers)
            .collect::<Vec<()>>()
            .await;

        finish_progress(Some(spinner), "Discovery finished");

        let mut assets = sink.into_inner();
        assets.pages_visited += pages_fetched;
        info!(
            "Crawled {} of {} divisions, found {} images and {} archives",
            assets.divisions_crawled,
            divisions.len(),
            assets.images.len(),
            assets.archives.len()
        );
        Ok(assets)
    }
}
