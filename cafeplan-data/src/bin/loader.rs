use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cafeplan_data::WithholdingLoader;
use cafeplan_db_sqlite::SqliteRepository;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Load withholding configuration from CSV files into the database.
///
/// The federal CSV has one row per bracket of the annualized
/// percentage-method table: tax_year, filing_status (single/married/head),
/// over, base_tax, rate.
///
/// The state CSV has one row per state (or per bracket for bracket states):
/// state, method (none/flat/brackets), over, rate, standard_deduction,
/// personal_exemption, dependent_exemption.
#[derive(Parser, Debug)]
#[command(name = "cafeplan-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the federal brackets CSV file
    #[arg(long)]
    federal: Option<PathBuf>,

    /// Path to the state withholding CSV file
    #[arg(long)]
    states: Option<PathBuf>,

    /// SQLite database URL (e.g., sqlite:cafeplan.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:cafeplan.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        tracing::info!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        tracing::info!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        tracing::info!("Seeds complete.");
    }

    if let Some(federal_path) = &args.federal {
        tracing::info!("Loading federal brackets from: {}", federal_path.display());

        let file = File::open(federal_path)
            .with_context(|| format!("Failed to open: {}", federal_path.display()))?;
        let records = WithholdingLoader::parse_federal(file)
            .with_context(|| format!("Failed to parse CSV: {}", federal_path.display()))?;

        tracing::info!("Parsed {} records from CSV", records.len());

        let inserted = WithholdingLoader::load_federal(&repo, &records)
            .await
            .context("Failed to load federal brackets into database")?;

        tracing::info!("Successfully loaded {} federal brackets.", inserted);
    }

    if let Some(states_path) = &args.states {
        tracing::info!("Loading state configs from: {}", states_path.display());

        let file = File::open(states_path)
            .with_context(|| format!("Failed to open: {}", states_path.display()))?;
        let records = WithholdingLoader::parse_states(file)
            .with_context(|| format!("Failed to parse CSV: {}", states_path.display()))?;

        tracing::info!("Parsed {} records from CSV", records.len());

        let upserted = WithholdingLoader::load_states(&repo, &records)
            .await
            .context("Failed to load state configs into database")?;

        tracing::info!("Successfully loaded {} state configs.", upserted);
    }

    if args.federal.is_none() && args.states.is_none() {
        tracing::info!("Nothing to load: pass --federal and/or --states.");
    }

    Ok(())
}
