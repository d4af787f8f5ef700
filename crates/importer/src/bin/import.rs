use clap::{Parser, Subcommand};
use lead_importer::{
    ConflictStrategy, ImportConfig, ImportLeadsRequest, ImportRequest, ImportSummary,
    LeadImporter, LocalOperator, Principal, validator::RecordValidator,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use storage::repository::LeadRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lead-import")]
#[command(about = "Bulk lead importer with conflict resolution", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one JSON file: either an array of records or a full request object
    File {
        file: PathBuf,

        #[command(flatten)]
        options: ImportOptions,
    },
    /// Import every JSON file in a directory, one request per file
    BulkImport {
        #[arg(long, default_value = "./imports")]
        directory: PathBuf,

        #[command(flatten)]
        options: ImportOptions,
    },
}

#[derive(clap::Args)]
struct ImportOptions {
    /// Default strategy for conflicting emails (skip, replace, update, merge)
    #[arg(short, long)]
    strategy: Option<ConflictStrategy>,

    /// JSON object mapping email to strategy, e.g. '{"a@x.com":"merge"}'
    #[arg(long)]
    overrides: Option<String>,

    #[arg(long)]
    validate_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("lead_import={},lead_importer={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::File { file, options } => {
            let request = load_request(&file, &options).await?;
            let pool = connect(&options, cli.database_url.as_deref()).await?;
            let summary = run_import(request, pool.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::BulkImport { directory, options } => {
            handle_bulk_import(directory, &options, cli.database_url.as_deref()).await?;
        }
    }

    Ok(())
}

async fn load_request(
    file: &Path,
    options: &ImportOptions,
) -> Result<ImportRequest, Box<dyn std::error::Error>> {
    tracing::info!("Loading leads from: {}", file.display());

    let json_content = tokio::fs::read_to_string(file).await?;
    let value: serde_json::Value = serde_json::from_str(&json_content)?;

    let mut wire: ImportLeadsRequest = match value {
        serde_json::Value::Array(records) => ImportLeadsRequest {
            records,
            default_strategy: ConflictStrategy::default(),
            strategy_overrides: HashMap::new(),
        },
        other => serde_json::from_value(other)?,
    };

    if let Some(strategy) = options.strategy {
        wire.default_strategy = strategy;
    }
    if let Some(overrides) = &options.overrides {
        let overrides: HashMap<String, ConflictStrategy> = serde_json::from_str(overrides)?;
        wire.strategy_overrides.extend(overrides);
    }

    Ok(wire.into())
}

/// Opens the pool once per invocation. `None` means a dry run.
async fn connect(
    options: &ImportOptions,
    database_url: Option<&str>,
) -> Result<Option<PgPool>, Box<dyn std::error::Error>> {
    if options.validate_only {
        return Ok(None);
    }

    let database_url = database_url.ok_or("DATABASE_URL is required unless --validate-only is set")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(Some(pool))
}

async fn run_import(
    request: ImportRequest,
    pool: Option<&PgPool>,
) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    let Some(pool) = pool else {
        return Ok(validate_only(&request));
    };

    let repository = LeadRepository::new(pool);
    let principal = Principal::new(std::env::var("USER").unwrap_or_else(|_| "operator".to_string()));

    let summary = LeadImporter::new(&repository, &LocalOperator, ImportConfig::default())
        .import_leads(&principal, request)
        .await?;

    tracing::info!("✓ Import completed");
    Ok(summary)
}

/// Dry run: only sanitization and validation, no database access.
fn validate_only(request: &ImportRequest) -> ImportSummary {
    let mut summary = ImportSummary::new(request.records.len());

    for (index, raw) in request.records.iter().enumerate() {
        if let Err(errors) = RecordValidator::validate(index + 1, raw) {
            summary.skipped_invalid_count += 1;
            tracing::warn!(
                "  Record {}: {}",
                index + 1,
                RecordValidator::describe(&errors)
            );
        }
    }
    summary.skipped_count = summary.skipped_invalid_count;

    tracing::info!(
        "✓ Validation finished: {} valid, {} invalid",
        summary.total_records - summary.skipped_invalid_count,
        summary.skipped_invalid_count
    );

    summary
}

async fn handle_bulk_import(
    directory: PathBuf,
    options: &ImportOptions,
    database_url: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Scanning directory for lead JSON files: {}", directory.display());

    let mut json_files = Vec::new();
    let mut entries = tokio::fs::read_dir(&directory).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            json_files.push(path);
        }
    }

    if json_files.is_empty() {
        tracing::warn!("No JSON files found in {}", directory.display());
        return Ok(());
    }

    json_files.sort();
    tracing::info!("Found {} lead file(s)", json_files.len());

    let pool = connect(options, database_url).await?;

    let mut error_count = 0;

    for (idx, file_path) in json_files.iter().enumerate() {
        tracing::info!("[{}/{}] Processing: {}", idx + 1, json_files.len(), file_path.display());

        let result = match load_request(file_path, options).await {
            Ok(request) => run_import(request, pool.as_ref()).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(summary) => tracing::info!(
                "  ✓ {} inserted, {} updated, {} skipped, {} failed",
                summary.inserted_count,
                summary.updated_count,
                summary.skipped_count,
                summary.failed_count
            ),
            Err(e) => {
                error_count += 1;
                tracing::error!("  ✗ Error: {}", e);
            }
        }
    }

    tracing::info!(
        "Summary: {} succeeded, {} failed",
        json_files.len() - error_count,
        error_count
    );

    if error_count > 0 {
        return Err(format!("{} file(s) failed to import", error_count).into());
    }

    Ok(())
}
