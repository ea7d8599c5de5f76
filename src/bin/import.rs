//! Batch import of the lending CSV dataset into the CRUD tables.

use clap::Parser;
use lending_crud::{
    apply_schema, connect, ensure_database_exists, import_csv, init_tracing, load_model, resolve,
    LogFormat,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lending-import", about = "Import the lending CSV dataset")]
struct Args {
    /// CSV file to import.
    #[arg(default_value = "dataset.csv")]
    csv_path: PathBuf,
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost/lending")]
    database_url: String,
    /// Model declaration; the embedded lending model when unset.
    #[arg(long, env = "MODEL_PATH")]
    model_path: Option<PathBuf>,
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

async fn run(args: Args) -> Result<u64, Box<dyn std::error::Error>> {
    ensure_database_exists(&args.database_url).await?;
    let pool = connect(&args.database_url, 1).await?;
    let config = load_model(args.model_path.as_deref()).await?;
    let model = resolve(&config)?;
    apply_schema(&pool, &config).await?;
    let count = import_csv(&pool, &model, &args.csv_path).await?;
    pool.close().await;
    Ok(count)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_format);

    match run(args).await {
        Ok(count) => {
            tracing::info!(count, "import finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "import failed");
            ExitCode::FAILURE
        }
    }
}
