use std::{error::Error, path::PathBuf};

use clap::Parser;
use engine::{Engine, ImportReport};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "discounts_loader")]
#[command(about = "Load the discount locations feed into the directory database")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./discounts.db?mode=rwc"
    )]
    database_url: String,

    /// JSON array of location records, Windows-1251 encoded.
    #[arg(long, default_value = "data.json")]
    file: PathBuf,

    /// Tracing level.
    #[arg(long, default_value = "info")]
    level: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_report(report: &ImportReport) {
    println!("added: {}", report.added);
    println!("skipped: {}", report.skipped);
    for (reason, count) in &report.skipped_by_reason {
        println!("  {}: {count}", reason.as_str());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "discounts_loader={level},engine={level}",
            level = cli.level
        ))
        .init();

    let bytes = std::fs::read(&cli.file).map_err(|err| {
        tracing::error!(file = %cli.file.display(), "cannot read feed: {err}");
        err
    })?;
    let records = engine::decode_feed(&bytes)?;
    tracing::info!(records = records.len(), file = %cli.file.display(), "feed decoded");

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    let report = engine.import_locations(&records).await?;
    print_report(&report);

    Ok(())
}
