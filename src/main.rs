//! CLI entry point for the vehicle maintenance dashboard.
//!
//! Provides subcommands for rendering the dashboard behind a login, listing
//! the analysis categories, and inspecting a dataset's columns.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use vehicle_dashboard::{
    analyzers::{
        analyzer::render_selection,
        recipes::recipes_for,
        types::Category,
    },
    config::DashboardConfig,
    dataset::{DatasetCache, Field, Table},
    fetch::read_source,
    output::{print_json, print_pretty, write_csv},
    parser::parse_dataset,
    session::{CredentialStore, Session},
    stats::kpis_for,
};

static DATASET: DatasetCache = DatasetCache::new();

#[derive(Parser)]
#[command(name = "vehicle_dashboard")]
#[command(about = "Vehicle maintenance analytics dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and render the dashboard for a category and display mode
    Render {
        /// Path or URL of the dataset (defaults to DASHBOARD_DATA_SOURCE)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Category title or short name, or "All"
        #[arg(short, long, default_value = "All")]
        category: String,

        /// "Count" or "Percentage"
        #[arg(short, long, default_value = "Count")]
        mode: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,

        /// Login user (defaults to DASHBOARD_USERNAME)
        #[arg(short, long)]
        username: Option<String>,

        /// Login password (defaults to DASHBOARD_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List the analysis categories with their KPIs and charts
    Categories,
    /// Load a dataset and report its size and columns
    Inspect {
        /// Path or URL of the dataset (defaults to DASHBOARD_DATA_SOURCE)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    let config = DashboardConfig::from_env();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file)
        .file_name()
        .unwrap_or(OsStr::new("vehicle_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            source,
            category,
            mode,
            format,
            username,
            password,
        } => {
            let store = match &config.credentials_file {
                Some(path) => CredentialStore::load(path)?,
                None => CredentialStore::default(),
            };
            let (Some(username), Some(password)) = (
                username.or_else(|| config.username.clone()),
                password.or_else(|| config.password.clone()),
            ) else {
                bail!("login required: pass --username/--password or set DASHBOARD_USERNAME/DASHBOARD_PASSWORD");
            };

            let mut session = Session::default();
            session.login(&store, &username, &password)?;
            let user = session.require_login()?;
            info!(user, "Rendering dashboard");

            let source = source.unwrap_or_else(|| config.data_source.clone());
            let table = load_dataset(&source, config.data_token.as_deref()).await?;
            let dashboard = render_selection(table, &category, &mode);

            match format {
                Format::Pretty => print_pretty(&dashboard)?,
                Format::Json => print_json(&dashboard)?,
                Format::Csv => write_csv(std::io::stdout().lock(), &dashboard)?,
            }
            session.logout();
        }
        Commands::Categories => {
            for category in Category::ALL {
                println!("{category}");
                for kpi in kpis_for(category) {
                    println!("  KPI    {}", kpi.label);
                }
                for recipe in recipes_for(category) {
                    println!("  Chart  {} ({})", recipe.title, recipe.id);
                }
            }
        }
        Commands::Inspect { source } => {
            let source = source.unwrap_or_else(|| config.data_source.clone());
            let table = load_dataset(&source, config.data_token.as_deref()).await?;

            let missing = table.missing_fields();
            println!("Source:  {source}");
            println!("Rows:    {}", table.len());
            println!("Columns: {}", table.headers().join(", "));
            if missing.is_empty() {
                println!("All {} expected columns present", Field::ALL.len());
            } else {
                let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
                println!("Missing: {}", names.join(", "));
                warn!(missing = names.len(), "Dataset is missing expected columns");
            }
        }
    }

    Ok(())
}

/// Loads the dataset once per process; later calls reuse the parsed table.
#[tracing::instrument(skip(token), fields(source = %source))]
async fn load_dataset(source: &str, token: Option<&str>) -> Result<&'static Table> {
    if let Some(table) = DATASET.get() {
        return Ok(table);
    }
    let bytes = read_source(source, token).await?;
    let table = DATASET
        .get_or_load(|| parse_dataset(&bytes))
        .with_context(|| format!("failed to load dataset from '{source}'"))?;
    info!(rows = table.len(), columns = table.headers().len(), "Dataset loaded");
    Ok(table)
}
