//! Frontier-driven traversal over one scope

use super::fetch::Fetcher;
use super::scope::Scope;
use crate::error::{Error, Result};
use crate::parse::extract_links;
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, warn};
use url::Url;

/// Asset URLs accumulated by discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveredAssets {
    pub images: BTreeSet<Url>,
    pub archives: BTreeSet<Url>,
    pub pages_visited: usize,
    pub divisions_crawled: usize,
}

impl DiscoveredAssets {
    /// Fold another result into this one
    pub fn merge(&mut self, other: DiscoveredAssets) {
        self.images.extend(other.images);
        self.archives.extend(other.archives);
        self.pages_visited += other.pages_visited;
        self.divisions_crawled += other.divisions_crawled;
    }

    pub fn total_assets(&self) -> usize {
        self.images.len() + self.archives.len()
    }
}

/// Limits and switches of a single traversal
#[derive(Debug, Clone, Copy)]
pub struct TraversalOptions {
    pub max_pages: u32,
    pub collect_archives: bool,
}

/// What a finished traversal saw
#[derive(Debug, Clone, Default)]
pub struct TraversalOutcome {
    pub assets: DiscoveredAssets,
    /// Distinct pages ever put on the frontier, the seed included
    pub pages_enqueued: usize,
    /// Pages whose fetch failed after retries
    pub pages_failed: usize,
}

/// Sequential FIFO crawl confined to one [`Scope`]
///
/// The frontier, the enqueued set and the visited set belong to this
/// instance, so several traversals can run side by side without sharing
/// state.
pub struct Traversal<'a> {
    fetcher: &'a Fetcher,
    scope: Scope,
    options: TraversalOptions,
    frontier: VecDeque<Url>,
    enqueued: HashSet<String>,
    visited: HashSet<String>,
    assets: DiscoveredAssets,
    pages_failed: usize,
    progress: Option<ProgressBar>,
}

impl<'a> Traversal<'a> {
    pub fn new(fetcher: &'a Fetcher, scope: Scope, options: TraversalOptions) -> Self {
        Self {
            fetcher,
            scope,
            options,
            frontier: VecDeque::new(),
            enqueued: HashSet::new(),
            visited: HashSet::new(),
            assets: DiscoveredAssets::default(),
            pages_failed: 0,
            progress: None,
        }
    }

    /// Tick this spinner once per visited page
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Put a page on the frontier unless it was enqueued before
    ///
    /// Returns whether the page was added.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if !self.enqueued.insert(url.as_str().to_string()) {
            return false;
        }
        self.frontier.push_back(url);
        true
    }

    /// Crawl from `seed` until the frontier drains or the page limit is hit
    ///
    /// An unreachable seed is an error; any later page failure is counted
    /// and skipped.
    pub async fn run(mut self, seed: Url) -> Result<TraversalOutcome> {
        let seed_key = seed.as_str().to_string();
        self.enqueue(seed);

        while let Some(url) = self.frontier.pop_front() {
            if self.visited.len() >= self.options.max_pages as usize {
                warn!(
                    "Reached max pages limit ({}) in {}",
                    self.options.max_pages,
                    self.scope.prefix().unwrap_or(self.scope.root_marker())
                );
                break;
            }

            let key = url.as_str().to_string();
            if !self.visited.insert(key.clone()) {
                continue;
            }
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }

            let fetched = self.fetcher.fetch(&url).await;
            self.fetcher.polite_pause().await;

            let Some(resource) = fetched else {
                if key == seed_key {
                    return Err(Error::StartUnreachable(key));
                }
                self.pages_failed += 1;
                continue;
            };

            let links = extract_links(
                &resource.url,
                resource.content_type.as_deref(),
                &resource.text(),
                &self.scope,
                self.options.collect_archives,
            );
            debug!(
                "{}: {} pages, {} images, {} archives",
                url,
                links.pages.len(),
                links.images.len(),
                links.archives.len()
            );

            self.assets.images.extend(links.images);
            self.assets.archives.extend(links.archives);
            for page in links.pages {
                self.enqueue(page);
            }
        }

        self.assets.pages_visited = self.visited.len();
        Ok(TraversalOutcome {
            assets: self.assets,
            pages_enqueued: self.enqueued.len(),
            pages_failed: self.pages_failed,
        })
    }
}
