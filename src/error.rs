//! Custom error types for crestmirror

use thiserror::Error;

/// Main error type for crestmirror operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Crawl error: {0}")]
    Crawl(String),

    #[error("Start page unreachable: {0}")]
    StartUnreachable(String),

    #[error("URL outside crawl scope: {0}")]
    OutOfScope(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),
}

/// Result type alias for crestmirror
pub type Result<T> = std::result::Result<T, Error>;
