mod retailers;
mod search;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "getmeds")]
#[command(about = "Search Bulgarian pharmacy chains for medicine availability")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every enabled retailer for a medicine
    Search {
        /// Medicine name or part of it
        query: String,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Only show pharmacies that have the product
        #[arg(long)]
        in_stock: bool,
        /// Only show pharmacies in this city
        #[arg(long)]
        city: Option<String>,
        /// Only show these availability classes (available, limited, unavailable, unknown)
        #[arg(long = "status", value_parser = search::parse_class)]
        statuses: Vec<getmeds_core::AvailabilityClass>,
        /// Maximum number of rows to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List configured retailers
    Retailers,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = getmeds_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search {
            query,
            json,
            in_stock,
            city,
            statuses,
            limit,
        } => {
            let args = search::SearchArgs {
                query,
                json,
                filter: getmeds_scraper::ResultFilter {
                    classes: statuses,
                    city,
                    in_stock_only: in_stock,
                    name_contains: None,
                },
                limit,
            };
            search::run_search(&config, &args).await
        }
        Commands::Retailers => {
            retailers::run_list_retailers(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
