//! Configuration management for crestmirror
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Discovery configuration
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Asset download configuration
    #[serde(default)]
    pub download: DownloadConfig,

    /// Catalog builder configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// How pages are discovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Country -> division discovery, then one bounded crawl per division
    #[default]
    Divisions,
    /// A single crawl over the whole root segment
    Flat,
}

/// Crawl configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// First page fetched
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Path segment every in-scope URL must contain (e.g. "escudoteca")
    #[serde(default = "default_root_segment")]
    pub root_segment: String,

    /// Discovery strategy
    #[serde(default)]
    pub mode: CrawlMode,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per URL before it is reported unavailable
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Lower bound of the random pause between requests (seconds)
    #[serde(default = "default_polite_delay_min")]
    pub polite_delay_min_secs: f64,

    /// Upper bound of the random pause between requests (seconds)
    #[serde(default = "default_polite_delay_max")]
    pub polite_delay_max_secs: f64,

    /// Global request rate cap shared by all workers
    #[serde(default = "default_max_requests_per_second")]
    pub max_requests_per_second: u32,

    /// Maximum pages visited by a single traversal
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Divisions crawled concurrently in divisions mode
    #[serde(default = "default_division_workers")]
    pub division_workers: usize,

    /// Also collect .zip league packs
    #[serde(default = "default_include_archives")]
    pub include_archives: bool,
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory the mirrored tree is written under
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Concurrent image downloads
    #[serde(default = "default_download_workers")]
    pub workers: usize,

    /// Concurrent archive downloads
    #[serde(default = "default_archive_workers")]
    pub archive_workers: usize,
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Leaf folder name that holds crest images
    #[serde(default = "default_sentinel_dir")]
    pub sentinel_dir: String,

    /// Extension of files listed in the catalog
    #[serde(default = "default_image_extension")]
    pub image_extension: String,

    /// Catalog file name, relative to the output directory
    #[serde(default = "default_catalog_file")]
    pub output_file: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for crestmirror settings
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            root_segment: default_root_segment(),
            mode: CrawlMode::default(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            polite_delay_min_secs: default_polite_delay_min(),
            polite_delay_max_secs: default_polite_delay_max(),
            max_requests_per_second: default_max_requests_per_second(),
            max_pages: default_max_pages(),
            division_workers: default_division_workers(),
            include_archives: default_include_archives(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            workers: default_download_workers(),
            archive_workers: default_archive_workers(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            sentinel_dir: default_sentinel_dir(),
            image_extension: default_image_extension(),
            output_file: default_catalog_file(),
        }
    }
}

impl CrawlConfig {
    /// Per-attempt request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Polite delay bounds as durations
    ///
    /// Values that are not a representable duration (NaN, negative,
    /// overflowing) become zero; `Config::validate` rejects them up front.
    pub fn polite_delay_range(&self) -> (Duration, Duration) {
        let secs = |s: f64| Duration::try_from_secs_f64(s).unwrap_or_default();
        (
            secs(self.polite_delay_min_secs),
            secs(self.polite_delay_max_secs),
        )
    }
}

impl Config {
    /// Get the default base directory for crestmirror (~/.crestmirror)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".crestmirror")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Directory the mirrored tree is written under
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.download.output_dir)
    }

    /// Where the catalog file is written by default
    pub fn catalog_path(&self) -> PathBuf {
        self.output_dir().join(&self.catalog.output_file)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let crawl = &self.crawl;

        Url::parse(&crawl.start_url).map_err(|e| {
            Error::Config(format!("crawl.start_url is not a valid URL: {}", e))
        })?;

        if crawl.root_segment.is_empty() || crawl.root_segment.contains('/') {
            return Err(Error::Config(
                "crawl.root_segment must be a single non-empty path segment".to_string(),
            ));
        }

        if crawl.max_retries == 0 {
            return Err(Error::Config(
                "crawl.max_retries must be at least 1".to_string(),
            ));
        }

        let (min, max) = (crawl.polite_delay_min_secs, crawl.polite_delay_max_secs);
        let in_range = |s: f64| s.is_finite() && (0.0..=MAX_POLITE_DELAY_SECS).contains(&s);
        if !in_range(min) || !in_range(max) || min > max {
            return Err(Error::Config(format!(
                "crawl.polite_delay_min_secs and crawl.polite_delay_max_secs must satisfy \
                 0 <= min <= max <= {}",
                MAX_POLITE_DELAY_SECS
            )));
        }

        if crawl.max_requests_per_second == 0 {
            return Err(Error::Config(
                "crawl.max_requests_per_second must be positive".to_string(),
            ));
        }

        if crawl.max_pages == 0 {
            return Err(Error::Config("crawl.max_pages must be positive".to_string()));
        }

        if crawl.division_workers == 0 {
            return Err(Error::Config(
                "crawl.division_workers must be positive".to_string(),
            ));
        }

        if self.download.workers == 0 || self.download.archive_workers == 0 {
            return Err(Error::Config(
                "download.workers and download.archive_workers must be positive".to_string(),
            ));
        }

        if self.catalog.sentinel_dir.is_empty() || self.catalog.image_extension.is_empty() {
            return Err(Error::Config(
                "catalog.sentinel_dir and catalog.image_extension must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
