use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod config;
mod detail;
mod fetch;
mod listing;
mod retry;
mod scrape;
mod store;
mod types;
mod utils;

use config::{ensure_dotenv, output_path, Config, Overrides};
use store::CsvStore;

#[derive(Parser)]
#[command(name = "cpu-scraper")]
#[command(about = "PCPartPicker CPU catalog scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one catalog page and append new CPUs to the CSV file
    Scrape {
        /// Listing page index (defaults to CPU_SCRAPER_PAGE, then 1)
        #[arg(short, long)]
        page: Option<u32>,
        /// Output CSV file (defaults to CPU_SCRAPER_OUTPUT, then cpus_detailed.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Show how many CPU names the CSV file already holds
    Known {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete the CSV file so the next scrape starts from scratch
    Clean {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn run_known(output: Option<PathBuf>) -> Result<()> {
    let store = CsvStore::new(output_path(output));
    if !store.path().exists() {
        println!("No CSV file at {}", store.path().display());
        return Ok(());
    }
    let known = store.read_known_names()?;
    if known.is_empty() {
        println!("No CPUs in {} yet", store.path().display());
    } else {
        println!("{} CPUs in {}", known.len(), store.path().display());
    }
    Ok(())
}

fn run_clean(output: Option<PathBuf>) -> Result<()> {
    let store = CsvStore::new(output_path(output));
    if store.remove()? {
        info!("Removed {}", store.path().display());
    } else {
        info!("Nothing to clean at {}", store.path().display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    ensure_dotenv();
    utils::init_tracing("cpu_scraper=info")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            page,
            output,
            timeout_secs,
        } => {
            let config = Config::load(Overrides {
                page,
                output,
                timeout_secs,
            })?;
            scrape::run_scrape(config).await
        }
        Commands::Known { output } => run_known(output),
        Commands::Clean { output } => run_clean(output),
    }
}
