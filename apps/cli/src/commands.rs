//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use coursecraft_core::{Delivery, ExportOptions, Exporter, ProgressReporter, Workbench};
use coursecraft_render::CsvTable;
use coursecraft_shared::{
    AppConfig, ContentKind, CourseCraftError, DocumentFormat, GeneratedContent, Query, Session,
    config_dir, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

const SESSION_FILE: &str = "session.json";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CourseCraft: research answers as learning content packages.
#[derive(Parser)]
#[command(
    name = "coursecraft",
    version,
    about = "Ask domain-scoped research questions and export the answers as SCORM packages.",
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

/// Shape of the generated answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Shape {
    /// Free text, exportable as PDF or Word.
    Text,
    /// CSV table with a header row.
    Csv,
    /// Slide outline of `Title: body` blocks.
    Slides,
}

impl From<Shape> for ContentKind {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Text => ContentKind::FreeText,
            Shape::Csv => ContentKind::CsvTable,
            Shape::Slides => ContentKind::SlideOutline,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask a question and keep the answer in the session.
    Ask {
        /// The question.
        query: String,

        /// Knowledge domain (defaults to the configured domain).
        #[arg(short, long)]
        domain: Option<String>,

        /// Answer shape.
        #[arg(short, long, value_enum, default_value = "text")]
        shape: Shape,
    },

    /// Ask a question about a PDF document.
    Analyze {
        /// Path to the PDF.
        pdf: PathBuf,

        /// The question.
        question: String,

        /// Knowledge domain (defaults to the configured domain).
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Search the web and list relevant hits.
    Search {
        /// Search terms.
        query: String,
    },

    /// Export the last answer.
    Export {
        /// Output format: pdf, docx, csv, or pptx.
        #[arg(short, long)]
        format: String,

        /// Write a bare slide deck instead of a package (pptx only).
        #[arg(long)]
        raw: bool,

        /// Output directory (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Topic line for the package launch page.
        #[arg(long)]
        topic: Option<String>,
    },

    /// Check that a package's manifest matches its contents.
    Verify {
        /// Path to the package zip.
        package: PathBuf,
    },

    /// Session management.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Session subcommands.
#[derive(Subcommand)]
pub(crate) enum SessionAction {
    /// Print the stored session.
    Show,
    /// Forget the last query and answer.
    Clear,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize default config file.
    Init,
    /// Show current configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursecraft=info",
        1 => "coursecraft=debug",
        _ => "coursecraft=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
        Command::Ask {
            query,
            domain,
            shape,
        } => cmd_ask(&query, domain.as_deref(), shape).await,
        Command::Analyze {
            pdf,
            question,
            domain,
        } => cmd_analyze(&pdf, &question, domain.as_deref()).await,
        Command::Search { query } => cmd_search(&query).await,
        Command::Export {
            format,
            raw,
            out,
            topic,
        } => cmd_export(&format, raw, out.as_deref(), topic),
        Command::Verify { package } => cmd_verify(&package),
        Command::Session { action } => match action {
            SessionAction::Show => cmd_session_show(),
            SessionAction::Clear => cmd_session_clear(),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ask(query: &str, domain: Option<&str>, shape: Shape) -> Result<()> {
    let config = load_config()?;
    let workbench = Workbench::from_config(&config)?.with_progress(Box::new(CliProgress::new()));
    let domain = domain.unwrap_or(&config.defaults.domain);

    info!(domain, ?shape, "asking");

    let session_path = session_path()?;
    let session = Session::load(&session_path)?;
    let (session, result) = workbench
        .ask(session, Query::new(domain, query), shape.into())
        .await;
    session.save(&session_path)?;

    let content = result?;
    let Some(text) = displayable_answer(&content) else {
        println!("  The answer is not a valid CSV table; ask again or rephrase the query.");
        return Ok(());
    };
    println!("{text}");
    println!();
    println!(
        "  Export with: coursecraft export --format {}",
        content.kind.formats()[0]
    );
    Ok(())
}

async fn cmd_analyze(pdf: &Path, question: &str, domain: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let workbench = Workbench::from_config(&config)?.with_progress(Box::new(CliProgress::new()));
    let domain = domain.unwrap_or(&config.defaults.domain);
    let bytes = std::fs::read(pdf).map_err(|e| CourseCraftError::io(pdf, e))?;

    let session_path = session_path()?;
    let session = Session::load(&session_path)?;
    let (session, result) = workbench
        .analyze_document(session, domain, &bytes, question)
        .await;
    session.save(&session_path)?;

    println!("{}", result?.text);
    Ok(())
}

async fn cmd_search(query: &str) -> Result<()> {
    let config = load_config()?;
    let workbench = Workbench::from_config(&config)?.with_progress(Box::new(CliProgress::new()));

    if !workbench.query_is_relevant(query) {
        warn!(query, "query does not look research related; results may be empty");
    }

    let hits = workbench.research(query).await?;
    if hits.is_empty() {
        println!("No relevant results found.");
        return Ok(());
    }

    for hit in &hits {
        println!("  {}", hit.title);
        println!("    {}", hit.link);
        if !hit.snippet.is_empty() {
            println!("    {}", hit.snippet);
        }
        println!();
    }
    Ok(())
}

fn cmd_export(format: &str, raw: bool, out: Option<&Path>, topic: Option<String>) -> Result<()> {
    let config = load_config()?;
    let format = DocumentFormat::from_str(format)?;
    let session = Session::load(&session_path()?)?;
    let content = session
        .last_content
        .ok_or_else(|| eyre!("nothing to export: run `coursecraft ask` first"))?;

    let exporter = Exporter::from_config(&config)?;
    let delivery = if raw {
        if format != DocumentFormat::Pptx {
            return Err(eyre!("--raw is only supported for pptx"));
        }
        exporter.export_slides_raw(&content)?
    } else {
        let options = ExportOptions {
            topic,
            ..ExportOptions::default()
        };
        exporter.export(&content, format, &options)?
    };

    let out_dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir(&config));
    let path = write_delivery(&out_dir, &delivery)?;

    println!("  Wrote {} ({}, {} bytes)", path.display(), delivery.mime_type, delivery.bytes.len());
    Ok(())
}

fn cmd_verify(package: &Path) -> Result<()> {
    let bytes = std::fs::read(package).map_err(|e| CourseCraftError::io(package, e))?;
    let entries = coursecraft_package::validate_package(&bytes)?;

    println!("  Package OK: {}", package.display());
    println!("  SHA-256: {}", coursecraft_package::hex_digest(&bytes));
    for entry in entries {
        println!("    {entry}");
    }
    Ok(())
}

fn cmd_session_show() -> Result<()> {
    let session = Session::load(&session_path()?)?;
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

fn cmd_session_clear() -> Result<()> {
    let path = session_path()?;
    if path.exists() {
        std::fs::remove_file(&path).map_err(|e| CourseCraftError::io(&path, e))?;
    }
    println!("Session cleared.");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The answer text, or `None` for a CSV answer that does not parse as a table.
fn displayable_answer(content: &GeneratedContent) -> Option<&str> {
    if content.kind == ContentKind::CsvTable {
        if let Err(e) = CsvTable::parse(&content.text) {
            warn!(error = %e, "generated CSV is malformed, withholding it");
            return None;
        }
    }
    Some(&content.text)
}

fn session_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SESSION_FILE))
}

fn output_dir(config: &AppConfig) -> PathBuf {
    PathBuf::from(&config.defaults.output_dir)
}

/// Write a delivery into `dir` via temp file + rename.
fn write_delivery(dir: &Path, delivery: &Delivery) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| CourseCraftError::io(dir, e))?;

    let target = dir.join(&delivery.file_name);
    let temp = dir.join(format!(".{}.tmp", delivery.file_name));
    let written = std::fs::write(&temp, &delivery.bytes)
        .map_err(|e| CourseCraftError::io(&temp, e))
        .and_then(|()| std::fs::rename(&temp, &target).map_err(|e| CourseCraftError::io(&target, e)));
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(&temp) {
            debug!(path = %temp.display(), error = %cleanup, "temp file not removed");
        }
        return Err(e.into());
    }

    info!(path = %target.display(), size = delivery.bytes.len(), "delivery written");
    Ok(target)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
