//! CLI command definitions, routing, and tracing setup.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use analyst_core::{
    IngestProgress, PipelineState, ProgressReporter, Query, SwotPipeline, WebStatus,
    ingest_documents,
};
use analyst_ingest::TextSplitter;
use analyst_llm::GeminiClient;
use analyst_report::ReportStatus;
use analyst_shared::{AnalystConfig, AppConfig, init_config, load_config};
use analyst_storage::Storage;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use crate::display::render_sections;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Market Analyst: SWOT market reports from web search and local documents.
#[derive(Parser)]
#[command(
    name = "market-analyst",
    version,
    about = "Generate SWOT market reports from live web search and a local document index.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the SWOT pipeline for a query and print the report.
    Analyze {
        /// Company, product or market to analyse.
        query: String,

        /// Also write the paginated report to this PDF file.
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Ask a running server instead of running the pipeline locally.
        #[arg(long, env = "MARKET_ANALYST_SERVER")]
        server: Option<Url>,

        /// Print the raw report text without section parsing.
        #[arg(long)]
        raw: bool,
    },

    /// Add documents (.pdf, .txt, .md) to the internal index.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Serve the HTTP API (`POST /analyze`, `POST /report`).
    Serve {
        /// Bind address (defaults to the configured host).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (defaults to the configured port).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "analyst=info",
        1 => "analyst=debug,tower_http=debug",
        _ => "analyst=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            query,
            pdf,
            server,
            raw,
        } => cmd_analyze(&query, pdf.as_deref(), server.as_ref(), raw).await,
        Command::Ingest { paths } => cmd_ingest(&paths).await,
        Command::Serve { host, port } => cmd_serve(host, port).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_analyze(
    query: &str,
    pdf: Option<&Path>,
    server: Option<&Url>,
    raw: bool,
) -> Result<()> {
    let query = Query::new(query)?;

    let report = match server {
        Some(url) => {
            info!(server = %url, query = %query, "requesting remote analysis");
            let spinner = spinner();
            spinner.set_message(format!("Analyzing via {url}"));
            let report = crate::remote::analyze_remote(url, query.as_str()).await;
            spinner.finish_and_clear();
            report?
        }
        None => {
            let config = AnalystConfig::resolve(&load_config()?)?;
            let pipeline = SwotPipeline::from_config(&config).await?;
            let reporter = CliProgress::new();
            let state = pipeline.run(query.clone(), &reporter).await?;
            print_web_note(&state);
            state.into_swot_report()
        }
    };

    if raw {
        println!("{report}");
        return Ok(());
    }

    let sections = match analyst_report::assess(&report) {
        ReportStatus::Structured(sections) => sections,
        status => {
            if let Some(message) = status.message() {
                eprintln!("warning: {message}");
            }
            if status == ReportStatus::Unstructured {
                println!("{report}");
            }
            if pdf.is_some() {
                return Err(eyre!("no PDF written: the report has no SWOT sections"));
            }
            return Ok(());
        }
    };

    println!();
    print!("{}", render_sections(&sections, query.as_str()));
    println!();

    if let Some(path) = pdf {
        let rendered = analyst_report::render_pdf(&sections, query.as_str())?;
        std::fs::write(path, &rendered.bytes)
            .map_err(|e| eyre!("failed to write {}: {e}", path.display()))?;
        println!(
            "  PDF written: {} ({} page{})",
            path.display(),
            rendered.pages,
            if rendered.pages == 1 { "" } else { "s" }
        );
        println!();
    }

    Ok(())
}

fn print_web_note(state: &PipelineState) {
    match state.web_status() {
        WebStatus::Found => {}
        WebStatus::Empty => eprintln!("note: web search returned no results"),
        WebStatus::Degraded => {
            eprintln!("note: web search unavailable, report is based on internal documents only")
        }
    }
}

async fn cmd_ingest(paths: &[PathBuf]) -> Result<()> {
    let app_config = load_config()?;
    let config = AnalystConfig::resolve(&app_config)?;

    let splitter = TextSplitter::new(app_config.index.chunk_size, app_config.index.chunk_overlap)?;
    let embedder = GeminiClient::new(
        &config.llm_base_url,
        config.llm_api_key.clone(),
        &config.completion_model_id,
        &config.embedding_model_id,
        None,
    )?;
    let storage = Storage::open(&config.index_location).await?;

    info!(
        paths = paths.len(),
        index = %config.index_location.display(),
        "ingesting documents"
    );

    let reporter = CliProgress::new();
    let summary = ingest_documents(paths, &storage, &embedder, &splitter, &reporter).await?;
    reporter.spinner.finish_and_clear();

    let documents = storage.list_documents().await?.len();
    let total_chunks = storage.chunk_count().await?;

    println!();
    println!("  Ingest complete!");
    println!("  Indexed:   {}", summary.indexed);
    println!("  Unchanged: {}", summary.unchanged);
    println!("  Failed:    {}", summary.failed);
    println!("  Chunks:    {}", summary.chunks);
    println!(
        "  Index:     {} ({documents} documents, {total_chunks} chunks)",
        config.index_location.display()
    );
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let app_config = load_config()?;
    let config = AnalystConfig::resolve(&app_config)?;

    let host = host.unwrap_or(app_config.server.host);
    let port = port.unwrap_or(app_config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| eyre!("invalid bind address '{host}:{port}': {e}"))?;

    let pipeline = Arc::new(SwotPipeline::from_config(&config).await?);

    println!("Serving on http://{addr}");
    analyst_server::run_server(pipeline, addr).await?;
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        Self { spinner: spinner() }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _state: &PipelineState) {
        self.spinner.finish_and_clear();
    }
}

impl IngestProgress for CliProgress {
    fn document(&self, source: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Ingesting [{current}/{total}] {source}"));
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
