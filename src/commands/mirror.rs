//! Discover and mirror commands

use crate::config::{Config, CrawlMode};
use crate::crawl::{build_discovery, DiscoveredAssets, FetchSettings, Fetcher};
use crate::download::{DownloadReport, Downloader};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Command-line overrides for the crawl and download settings
#[derive(Debug, Clone, Default)]
pub struct MirrorOverrides {
    pub start_url: Option<String>,
    pub output_dir: Option<String>,
    pub mode: Option<CrawlMode>,
    pub workers: Option<usize>,
    pub include_archives: bool,
}

impl MirrorOverrides {
    /// Apply the overrides and re-validate the result
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(start_url) = self.start_url {
            config.crawl.start_url = start_url;
        }
        if let Some(output_dir) = self.output_dir {
            config.download.output_dir = output_dir;
        }
        if let Some(mode) = self.mode {
            config.crawl.mode = mode;
        }
        if let Some(workers) = self.workers {
            config.download.workers = workers;
        }
        if self.include_archives {
            config.crawl.include_archives = true;
        }
        config.validate()
    }
}

/// Result of a full mirror run
#[derive(Debug, Clone, Serialize)]
pub struct MirrorStats {
    pub output_dir: String,
    pub pages_visited: usize,
    pub divisions_crawled: usize,
    pub images: DownloadReport,
    pub archives: Option<DownloadReport>,
}

fn build_fetcher(config: &Config) -> Result<Arc<Fetcher>> {
    Ok(Arc::new(Fetcher::new(FetchSettings::from_config(
        &config.crawl,
    ))?))
}

async fn discover_with(config: &Config, fetcher: Arc<Fetcher>) -> Result<DiscoveredAssets> {
    let discovery = build_discovery(&config.crawl, fetcher)?;
    discovery.discover_assets().await
}

/// Discover assets without downloading them
pub async fn cmd_discover(config: &Config) -> Result<DiscoveredAssets> {
    let fetcher = build_fetcher(config)?;
    discover_with(config, fetcher).await
}

/// Discover assets and download them into the output directory
pub async fn cmd_mirror(config: &Config) -> Result<MirrorStats> {
    let fetcher = build_fetcher(config)?;
    let assets = discover_with(config, fetcher.clone()).await?;
    info!(
        "Discovered {} assets ({} PNG files)",
        assets.total_assets(),
        assets.images.len()
    );

    let output_dir = config.output_dir();
    tokio::fs::create_dir_all(&output_dir).await?;
    let downloader = Downloader::new(fetcher, &output_dir, &config.crawl.root_segment);

    let images = downloader
        .download_all(
            assets.images.iter().cloned().collect(),
            config.download.workers,
            "Downloading PNG",
        )
        .await;

    let archives = if config.crawl.include_archives && !assets.archives.is_empty() {
        info!("Discovered {} ZIP packs", assets.archives.len());
        Some(
            downloader
                .download_all(
                    assets.archives.iter().cloned().collect(),
                    config.download.archive_workers,
                    "Downloading ZIP",
                )
                .await,
        )
    } else {
        None
    };

    Ok(MirrorStats {
        output_dir: output_dir.display().to_string(),
        pages_visited: assets.pages_visited,
        divisions_crawled: assets.divisions_crawled,
        images,
        archives,
    })
}

/// Print discovered asset URLs, one per line
pub fn print_discovered(assets: &DiscoveredAssets) {
    for url in assets.images.iter().chain(assets.archives.iter()) {
        println!("{}", url);
    }
    eprintln!(
        "\n{} images, {} archives ({} pages visited, {} divisions)",
        assets.images.len(),
        assets.archives.len(),
        assets.pages_visited,
        assets.divisions_crawled
    );
}

fn print_report(label: &str, report: &DownloadReport) {
    println!(
        "  {} saved: {}/{} ({} failed)",
        label,
        report.saved,
        report.attempted,
        report.failed()
    );
    for failure in &report.failures {
        println!("    ✗ {} ({})", failure.url, failure.reason);
    }
}

/// Print a mirror run summary
pub fn print_mirror_stats(stats: &MirrorStats) {
    println!("\n✓ Mirror complete");
    println!("  Output: {}", stats.output_dir);
    println!("  Pages visited: {}", stats.pages_visited);
    if stats.divisions_crawled > 0 {
        println!("  Divisions crawled: {}", stats.divisions_crawled);
    }
    print_report("PNG", &stats.images);
    if let Some(archives) = &stats.archives {
        print_report("ZIP", archives);
    }
}
