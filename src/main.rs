//! crestmirror CLI entry point

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use crestmirror::{
    commands::{
        cmd_catalog, cmd_discover, cmd_init, cmd_mirror, print_catalog_stats, print_discovered,
        print_mirror_stats, MirrorOverrides,
    },
    config::{Config, CrawlMode},
    error::Result,
    progress::LogWriterFactory,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "crestmirror")]
#[command(version, about = "Mirror a club crest collection and build a JSON catalog", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// List the assets the crawl would download
    Discover {
        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Crawl the site and download every asset into the output directory
    Mirror {
        #[command(flatten)]
        crawl: CrawlArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<String>,

        /// Concurrent image downloads
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Build the JSON catalog from a mirrored tree
    Catalog {
        /// Directory to scan (defaults to <output_dir>/<root_segment>)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Catalog file to write (defaults to <output_dir>/catalog.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct CrawlArgs {
    /// Page to start crawling from
    #[arg(long)]
    start_url: Option<String>,

    /// Discovery strategy
    #[arg(long, value_enum)]
    mode: Option<CrawlMode>,

    /// Also collect ZIP packs
    #[arg(long)]
    archives: bool,
}

impl CrawlArgs {
    fn into_overrides(self, output_dir: Option<String>, workers: Option<usize>) -> MirrorOverrides {
        MirrorOverrides {
            start_url: self.start_url,
            output_dir,
            mode: self.mode,
            workers,
            include_archives: self.archives,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let config_file = cli.config.as_deref().map(config_file_path);
            let path = cmd_init(config_file, force)?;

            println!("✓ crestmirror initialized");
            println!("  Config: {}", path.display());
            println!("\nNext steps:");
            println!("  1. Edit the config file to customize settings");
            println!("  2. Mirror the crests: crestmirror mirror");
            println!("  3. Build the catalog: crestmirror catalog");
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "crestmirror", &mut std::io::stdout());
        }

        Commands::Discover { crawl } => {
            let mut config = load_config(cli.config.as_deref())?;
            crawl.into_overrides(None, None).apply(&mut config)?;

            let assets = cmd_discover(&config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&assets)?);
            } else {
                print_discovered(&assets);
            }
        }

        Commands::Mirror {
            crawl,
            output,
            workers,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            crawl.into_overrides(output, workers).apply(&mut config)?;

            let stats = cmd_mirror(&config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_mirror_stats(&stats);
            }
        }

        Commands::Catalog { dir, out } => {
            let config = load_config(cli.config.as_deref())?;
            let stats = cmd_catalog(&config, dir, out)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_catalog_stats(&stats);
            }
        }
    }

    Ok(())
}

/// File `init` writes: a `.toml` path as given, or `config.toml` inside a directory
fn config_file_path(path: &std::path::Path) -> PathBuf {
    if path.extension().is_some_and(|e| e == "toml") {
        path.to_path_buf()
    } else {
        path.join("config.toml")
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
