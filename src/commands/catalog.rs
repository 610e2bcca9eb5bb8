//! Catalog command implementation

use crate::catalog::CatalogBuilder;
use crate::config::Config;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of a catalog build
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub items: usize,
    pub root: PathBuf,
    pub output: PathBuf,
}

/// Build the JSON catalog from a mirrored tree
///
/// Without `dir` the walk starts at `<output_dir>/<root_segment>` and crest
/// paths are relative to the output directory, next to the catalog file.
/// With `dir`, crest paths are relative to its parent so they keep the
/// directory name as their first component.
pub fn cmd_catalog(config: &Config, dir: Option<PathBuf>, out: Option<PathBuf>) -> Result<CatalogStats> {
    let (root, base) = match dir {
        Some(dir) => {
            let base = dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            (dir, base)
        }
        None => {
            let base = config.output_dir();
            (base.join(&config.crawl.root_segment), base)
        }
    };
    let output = out.unwrap_or_else(|| config.catalog_path());

    let catalog = CatalogBuilder::from_config(&config.catalog).build(&root, &base)?;
    catalog.write_to(&output)?;

    Ok(CatalogStats {
        items: catalog.items.len(),
        root,
        output,
    })
}

pub fn print_catalog_stats(stats: &CatalogStats) {
    println!(
        "✓ Wrote {} with {} items",
        stats.output.display(),
        stats.items
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"png").unwrap();
    }

    fn read_catalog(path: &Path) -> Catalog {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_catalog_defaults_to_output_dir() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "escudoteca/argentina/primeradivision/png/boca_juniors.png");
        touch(tmp.path(), "escudoteca/argentina/primeradivision/primeradivision.zip");

        let mut config = Config::default();
        config.download.output_dir = tmp.path().display().to_string();

        let stats = cmd_catalog(&config, None, None).unwrap();

        assert_eq!(stats.items, 1);
        assert_eq!(stats.output, tmp.path().join("catalog.json"));
        let catalog = read_catalog(&stats.output);
        assert_eq!(
            catalog.items[0].crest,
            "./escudoteca/argentina/primeradivision/png/boca_juniors.png"
        );
        assert!(tmp
            .path()
            .join(catalog.items[0].crest.trim_start_matches("./"))
            .is_file());
    }

    #[test]
    fn test_catalog_with_explicit_dir_and_output() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "crests/uruguay/primera/png/penarol.png");
        touch(tmp.path(), "crests/uruguay/primera/png/nacional.png");

        let config = Config::default();
        let out = tmp.path().join("site/catalog.json");
        let stats = cmd_catalog(&config, Some(tmp.path().join("crests")), Some(out.clone())).unwrap();

        assert_eq!(stats.items, 2);
        let catalog = read_catalog(&out);
        // Sorted walk: nacional before penarol
        assert_eq!(catalog.items[0].name, "Nacional");
        assert_eq!(catalog.items[0].crest, "./crests/uruguay/primera/png/nacional.png");
        assert_eq!(catalog.items[1].country, "uruguay");
    }

    #[test]
    fn test_catalog_missing_tree_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.download.output_dir = tmp.path().display().to_string();

        assert!(cmd_catalog(&config, None, None).is_err());
        assert!(!tmp.path().join("catalog.json").exists());
    }
}
