//! Default values for configuration

/// Default start page of the crawl
pub fn default_start_url() -> String {
    "https://paladarnegro.net/escudoteca/index.html".to_string()
}

/// Default root path segment every in-scope URL must contain
pub fn default_root_segment() -> String {
    "escudoteca".to_string()
}

/// Default user agent
pub fn default_user_agent() -> String {
    format!("crestmirror/{} (+personal use)", env!("CARGO_PKG_VERSION"))
}

/// Default request timeout in seconds
pub fn default_timeout() -> u64 {
    25
}

/// Default number of attempts per URL
pub fn default_max_retries() -> u32 {
    3
}

/// Default lower bound of the polite delay (seconds)
pub fn default_polite_delay_min() -> f64 {
    0.2
}

/// Default upper bound of the polite delay (seconds)
pub fn default_polite_delay_max() -> f64 {
    0.8
}

/// Default global request rate cap (requests per second)
pub fn default_max_requests_per_second() -> u32 {
    4
}

/// Default maximum pages visited by one traversal
pub fn default_max_pages() -> u32 {
    10_000
}

/// Default number of divisions crawled concurrently
pub fn default_division_workers() -> usize {
    1
}

/// Default: archive packs are not collected
pub fn default_include_archives() -> bool {
    false
}

/// Default output directory
pub fn default_output_dir() -> String {
    "mirror".to_string()
}

/// Default concurrent image downloads
pub fn default_download_workers() -> usize {
    6
}

/// Default concurrent archive downloads
pub fn default_archive_workers() -> usize {
    2
}

/// Default sentinel folder holding the crest images
pub fn default_sentinel_dir() -> String {
    "png".to_string()
}

/// Default image extension picked up by the catalog
pub fn default_image_extension() -> String {
    "png".to_string()
}

/// Default catalog file name, relative to the output directory
pub fn default_catalog_file() -> String {
    "catalog.json".to_string()
}

/// Upper bound for either polite delay bound, in seconds
pub const MAX_POLITE_DELAY_SECS: f64 = 300.0;
