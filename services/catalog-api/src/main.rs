//! Satellite image catalog service.
//!
//! Answers "which images exist on this channel between these dates" from
//! the monthly index files published alongside the imagery:
//! - One-shot queries and month listings from the command line
//! - A JSON HTTP API for front ends
//! - Per-process cache so each month's index is fetched once

mod config;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use catalog::CatalogService;
use catalog_common::{Channel, IndexRecord, MonthKey};

use server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "catalog-api")]
#[command(about = "Date-indexed satellite image catalog")]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the image host
    #[arg(long, env = "CATALOG_BASE_URL")]
    base_url: Option<String>,

    /// Read index files from a local mirror instead of over HTTP
    #[arg(long, env = "CATALOG_MIRROR_DIR")]
    mirror_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List images on one channel between two dates
    Query {
        /// Start date (YYYYMMDD)
        #[arg(long)]
        start: String,

        /// End date (YYYYMMDD), inclusive
        #[arg(long)]
        end: String,

        /// Channel: IR1, IR2, IR3, IR4 or VIS
        #[arg(long)]
        channel: Channel,

        /// Print JSON instead of one line per image
        #[arg(long)]
        json: bool,
    },

    /// List every image of one month
    List {
        /// Month (YYYYMM)
        #[arg(long)]
        month: MonthKey,

        /// Only list this channel
        #[arg(long)]
        channel: Option<Channel>,

        #[arg(long)]
        json: bool,
    },

    /// Serve the JSON API
    Serve {
        #[arg(long, env = "CATALOG_PORT", default_value = "8082")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so query output on stdout stays clean.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = config::load_config(args.config.as_deref(), args.base_url, args.mirror_dir)?;
    let service = Arc::new(CatalogService::from_config(&config)?);

    match args.command {
        Command::Query {
            start,
            end,
            channel,
            json,
        } => {
            let records = service.query(&start, &end, channel).await?;
            print_records(&records, json)?;
        }
        Command::List {
            month,
            channel,
            json,
        } => {
            let records = service.month(month, channel).await?;
            print_records(&records, json)?;
        }
        Command::Serve { port } => {
            info!("Starting satellite image catalog");
            let state = Arc::new(ServerState { service });
            server::run_server(state, port).await?;
        }
    }

    Ok(())
}

fn print_records(records: &[Arc<IndexRecord>], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&server::to_entries(records))?
        );
    } else {
        for record in records {
            println!("{}  {}", record.display_timestamp(), record.filename());
        }
    }
    Ok(())
}
