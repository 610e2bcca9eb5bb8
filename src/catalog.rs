//! Catalog builder: a flat JSON index of the mirrored crests

use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One crest in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub country: String,
    pub league: String,
    pub name: String,
    pub crest: String,
}

/// The catalog document: `{ "items": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub items: Vec<CatalogItem>,
}

impl Catalog {
    /// Pretty-printed JSON (2-space indent)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the catalog to `path`, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        info!("Wrote {} with {} items", path.display(), self.items.len());
        Ok(())
    }
}

/// Title-case a word list the way crest names are displayed
///
/// The first letter after any non-letter is uppercased, every other letter
/// lowercased: `boca juniors` -> `Boca Juniors`, `o'higgins` -> `O'Higgins`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Human-readable crest name from a file name
pub fn pretty_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    title_case(&stem.replace(['_', '-'], " "))
}

/// Server-relative form of a path: forward slashes, `./` prefix unless rooted
pub fn server_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    if path.starts_with("./") || path.starts_with('/') {
        path
    } else {
        format!("./{}", path)
    }
}

/// Scans a directory tree for crest images inside sentinel folders
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    sentinel_dir: String,
    image_extension: String,
}

impl CatalogBuilder {
    pub fn new(sentinel_dir: &str, image_extension: &str) -> Self {
        Self {
            sentinel_dir: sentinel_dir.to_string(),
            image_extension: image_extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(&config.sentinel_dir, &config.image_extension)
    }

    fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.image_extension))
    }

    fn is_sentinel(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.sentinel_dir)
    }

    /// Catalog item for one file, if it sits in a sentinel folder with a
    /// league and a country above it
    ///
    /// A path with any non-UTF-8 component yields nothing.
    fn item_for(&self, relative: &Path) -> Option<CatalogItem> {
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_str()),
                _ => None,
            })
            .collect::<Option<_>>()?;

        // [.., country, league, sentinel, file]
        if parts.len() < 4 {
            return None;
        }
        let n = parts.len();
        let (country, league, folder, file) = (parts[n - 4], parts[n - 3], parts[n - 2], parts[n - 1]);
        if !self.is_sentinel(folder) {
            return None;
        }

        Some(CatalogItem {
            country: country.to_lowercase(),
            league: league.to_lowercase(),
            name: pretty_name(file),
            crest: server_path(&relative.to_string_lossy()),
        })
    }

    /// Walk `root` and build the catalog
    ///
    /// Crest paths and ancestry are taken relative to `base`; a `root`
    /// outside `base` is read as given.
    pub fn build(&self, root: &Path, base: &Path) -> Result<Catalog> {
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "Catalog root is not a directory: {}",
                root.display()
            )));
        }

        let mut catalog = Catalog::default();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_image(entry.path()) {
                continue;
            }

            let relative = entry.path().strip_prefix(base).unwrap_or(entry.path());
            match self.item_for(relative) {
                Some(item) => catalog.items.push(item),
                None => debug!("Not a catalog entry: {}", relative.display()),
            }
        }

        Ok(catalog)
    }
}
