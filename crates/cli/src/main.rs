//! BundleLens command line interface
//!
//! Sends client records to the bundle classification service and prints
//! the recommended coverage bundles with their explanations.

mod render;

use anyhow::{bail, Context, Result};
use bundlelens_insights::{
    parse_batch, parse_single_prediction, BatchPrediction, BatchReport, BatchTable, BundleCatalog,
    InsightConfig, PredictionRow, SingleReport, SinglePrediction, SortKey,
};
use bundlelens_classifier::{ClassifierClient, ClassifierError, ConfigManager, SessionContext};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bundlelens")]
#[command(about = "Coverage bundle recommendations from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to config/<environment>.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Classification service URL, overriding configuration
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print view models as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Password (can also be provided via BUNDLELENS_PASSWORD env)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show model status, classes and global importances
    Metadata,
    /// Classify one client record
    Single {
        /// JSON object with the client's column values
        #[arg(long, value_name = "PATH")]
        input: PathBuf,
    },
    /// Upload a CSV file and classify every row
    Batch {
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Render a saved service response without contacting the service
    Report {
        #[arg(long, value_name = "PATH")]
        response: PathBuf,
        /// Response kind; inferred from the payload when omitted
        #[arg(long, value_enum)]
        kind: Option<ReportKind>,
        #[command(flatten)]
        table: TableArgs,
    },
}

#[derive(clap::Args)]
struct TableArgs {
    /// Sort request (row, confidence, bundle); repeat a key to flip direction
    #[arg(long = "sort", value_name = "KEY")]
    sort: Vec<SortKey>,
    /// Show every row instead of the preview
    #[arg(long)]
    all: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    Single,
    Batch,
}

/// Settings shared by every command
struct App {
    config: ConfigManager,
    insights: InsightConfig,
    catalog: BundleCatalog,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::load(cli.config.as_deref(), Path::new("config"), |key| {
        env::var(key).ok()
    })
    .context("failed to load configuration")?;
    init_logging(&config.logging().level);

    debug!(environment = ?config.environment(), "configuration loaded");

    let mut client_config = config.client_config().clone();
    if let Some(url) = &cli.api_url {
        client_config.api_url = url.trim().trim_end_matches('/').to_string();
    }
    let client = ClassifierClient::new(&client_config)?;

    let insights = config.insight_config().clone();
    let ctx = App {
        catalog: insights.catalog(),
        insights,
        config,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Login { email, password } => handle_login(&ctx, &client, &email, password).await,
        Commands::Logout => handle_logout(&ctx),
        Commands::Metadata => handle_metadata(&ctx, &client).await,
        Commands::Single { input } => handle_single(&ctx, &client, &input).await,
        Commands::Batch { file, table } => handle_batch(&ctx, &client, &file, &table).await,
        Commands::Report {
            response,
            kind,
            table,
        } => handle_report(&ctx, &response, kind, &table),
    };

    if let Err(err) = &result {
        if clear_rejected_session(err, &session_path(&ctx)?)? {
            bail!("session expired; run `bundlelens login` again");
        }
    }
    result
}

/// Remove the stored session when `err` says its token was rejected.
/// Returns whether the session was cleared.
fn clear_rejected_session(err: &anyhow::Error, path: &Path) -> Result<bool> {
    if !matches!(err.downcast_ref::<ClassifierError>(), Some(ClassifierError::Unauthorized)) {
        return Ok(false);
    }
    SessionContext::load(path)?.discard(path)?;
    info!(path = %path.display(), "stored session cleared");
    Ok(true)
}

fn init_logging(level: &str) {
    // Logs go to stderr so that stdout stays parseable with --json.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn session_path(ctx: &App) -> Result<PathBuf> {
    ctx.config
        .session_path()
        .context("no session location available; set BUNDLELENS_SESSION_FILE")
}

fn require_session(ctx: &App) -> Result<SessionContext> {
    let session = SessionContext::load(&session_path(ctx)?)?;
    if !session.is_authenticated() {
        bail!("not logged in; run `bundlelens login` first");
    }
    Ok(session)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn handle_login(
    ctx: &App,
    client: &ClassifierClient,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password.or_else(|| env::var("BUNDLELENS_PASSWORD").ok()) {
        Some(password) => password,
        None => bail!("either --password or BUNDLELENS_PASSWORD must be provided"),
    };

    let session = client.login(email, &password).await?;
    let path = session_path(ctx)?;
    session
        .save(&path)
        .with_context(|| format!("failed to store session at {}", path.display()))?;

    match &session.user {
        Some(user) => println!("Logged in as {} <{}> ({})", user.name, user.email, user.role),
        None => println!("Logged in"),
    }
    Ok(())
}

fn handle_logout(ctx: &App) -> Result<()> {
    let path = session_path(ctx)?;
    let mut session = SessionContext::load(&path)?;
    session.discard(&path)?;
    println!("Logged out");
    Ok(())
}

async fn handle_metadata(ctx: &App, client: &ClassifierClient) -> Result<()> {
    let session = require_session(ctx)?;
    let meta = client.metadata(&session).await?;

    if ctx.json {
        return print_json(&meta);
    }
    print!(
        "{}",
        render::metadata(&meta, &ctx.catalog, ctx.insights.global_top_n)
    );
    Ok(())
}

async fn handle_single(ctx: &App, client: &ClassifierClient, input: &Path) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let record: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let session = require_session(ctx)?;
    let prediction = client.classify_single(&session, &record).await?;
    show_single(ctx, &prediction)
}

async fn handle_batch(
    ctx: &App,
    client: &ClassifierClient,
    file: &Path,
    table: &TableArgs,
) -> Result<()> {
    let session = require_session(ctx)?;
    info!(file = %file.display(), "uploading batch");
    let batch = client.classify_batch(&session, file).await?;
    show_batch(ctx, batch, table)
}

fn handle_report(
    ctx: &App,
    response: &Path,
    kind: Option<ReportKind>,
    table: &TableArgs,
) -> Result<()> {
    let content = fs::read_to_string(response)
        .with_context(|| format!("failed to read {}", response.display()))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", response.display()))?;

    match kind.unwrap_or_else(|| infer_report_kind(&payload)) {
        ReportKind::Single => show_single(ctx, &parse_single_prediction(&payload)?),
        ReportKind::Batch => show_batch(ctx, parse_batch(&payload)?, table),
    }
}

/// Batch responses carry a `predictions` array; anything else is single.
fn infer_report_kind(payload: &Value) -> ReportKind {
    if payload.get("predictions").is_some() {
        ReportKind::Batch
    } else {
        ReportKind::Single
    }
}

fn show_single(ctx: &App, prediction: &SinglePrediction) -> Result<()> {
    let report = SingleReport::build(prediction, &ctx.insights, &ctx.catalog);
    if ctx.json {
        return print_json(&report);
    }
    print!("{}", render::single(&report));
    Ok(())
}

fn show_batch(ctx: &App, batch: BatchPrediction, args: &TableArgs) -> Result<()> {
    let BatchPrediction {
        rows,
        global_importances,
        ..
    } = batch;

    let table = build_table(rows, ctx.insights.preview_limit, args);
    let report = BatchReport::build(&table, &global_importances, &ctx.insights, &ctx.catalog);
    if ctx.json {
        return print_json(&report);
    }
    print!("{}", render::batch(&report));
    Ok(())
}

/// Apply the sort requests in order, then the show-all toggle.
fn build_table(rows: Vec<PredictionRow>, preview_limit: usize, args: &TableArgs) -> BatchTable {
    let mut table = BatchTable::new(rows, preview_limit);
    for key in &args.sort {
        let state = table.sort_by(*key);
        debug!(key = %state.key, direction = ?state.direction, "sorted");
    }
    table.set_show_all(args.all);
    table
}
