//! CLI binary for doculoader.
//!
//! `doculoader serve` runs the HTTP gateway; `doculoader extract` runs the
//! same pipeline once on a local file. Both resolve their configuration
//! from flags, the environment and an optional `.env` file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use doculoader::{
    serve, AzureOcr, PageMarker, PdfiumSplitter, Pipeline, ServiceConfig, Upload,
};
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENVIRONMENT:
  AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT  Document Intelligence resource endpoint
  AZURE_DOCUMENT_INTELLIGENCE_KEY       Document Intelligence subscription key
  TEMP_WORK_DIR                         Root for per-request scratch directories
  PDFIUM_LIB_PATH                       Path to libpdfium (file or directory)
  RUST_LOG                              Log filter, overrides --verbose

  A .env file in the working directory is read before flags are parsed.
  Missing credentials do not stop `serve`; PUT /process answers 500 until
  they are provided.

EXAMPLES:
  doculoader serve --port 8000
  doculoader extract scan.pdf -o scan.txt
"#;

/// PDF OCR gateway: split, OCR and transcribe PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "doculoader",
    version,
    about = "PDF OCR gateway: split, OCR and transcribe PDF documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    service: ServiceArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCULOADER_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind.
        #[arg(long, env = "DOCULOADER_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on.
        #[arg(short, long, env = "DOCULOADER_PORT", default_value_t = 8000)]
        port: u16,
    },

    /// OCR one local PDF and print its transcript.
    Extract {
        /// PDF file to process.
        file: PathBuf,

        /// Write the transcript to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Document Intelligence endpoint URL.
    #[arg(long, global = true, env = "AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT", hide_env_values = true)]
    endpoint: Option<String>,

    /// Document Intelligence subscription key.
    #[arg(long, global = true, env = "AZURE_DOCUMENT_INTELLIGENCE_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Document Intelligence model identifier.
    #[arg(long, global = true, env = "DOCULOADER_MODEL", default_value = doculoader::config::DEFAULT_MODEL)]
    model: String,

    /// Root directory for per-request scratch files.
    #[arg(long, global = true, env = "TEMP_WORK_DIR", default_value = "/tmp/doculoader")]
    temp_dir: PathBuf,

    /// OCR calls in flight per document.
    #[arg(short, long, global = true, env = "DOCULOADER_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Per-page OCR deadline in seconds, polling included.
    #[arg(long, global = true, env = "DOCULOADER_OCR_TIMEOUT", default_value_t = 120)]
    ocr_timeout: u64,

    /// Largest accepted upload, in MiB.
    #[arg(long, global = true, env = "DOCULOADER_MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,

    /// Page marker style.
    #[arg(long, global = true, env = "DOCULOADER_MARKER", value_enum, default_value = "banner")]
    marker: MarkerArg,

    /// Path to libpdfium (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Debug)]
enum MarkerArg {
    Banner,
    Comment,
}

impl From<MarkerArg> for PageMarker {
    fn from(v: MarkerArg) -> Self {
        match v {
            MarkerArg::Banner => PageMarker::Banner,
            MarkerArg::Comment => PageMarker::Comment,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build pipeline ───────────────────────────────────────────────────
    let config = build_config(&cli.service)?;
    info!("Configuration: {:?}", config);

    std::fs::create_dir_all(&config.temp_root).with_context(|| {
        format!("Failed to create temp root {}", config.temp_root.display())
    })?;

    let splitter = PdfiumSplitter::bind(&config).context("PDF engine unavailable")?;
    let ocr = AzureOcr::new(&config).context("Failed to set up OCR client")?;
    let pipeline = Arc::new(Pipeline::new(config, Arc::new(splitter), Arc::new(ocr)));

    // ── Run ──────────────────────────────────────────────────────────────
    match cli.command {
        Command::Serve { host, port } => {
            serve(SocketAddr::new(host, port), pipeline)
                .await
                .context("Server error")?;
        }
        Command::Extract { file, output } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let result = pipeline
                .process_upload(Upload::new(bytes).with_filename(filename))
                .await
                .context("Processing failed")?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &result.page_content)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!(
                        "{} pages  →  {}",
                        result.metadata.pages,
                        path.display()
                    );
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    handle
                        .write_all(result.page_content.as_bytes())
                        .context("Failed to write to stdout")?;
                }
            }
        }
    }

    Ok(())
}

fn build_config(args: &ServiceArgs) -> Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .ocr_model(&args.model)
        .temp_root(&args.temp_dir)
        .concurrency(args.concurrency)
        .ocr_timeout_secs(args.ocr_timeout)
        .max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024))
        .page_marker(args.marker.clone().into());

    if let Some(ref endpoint) = args.endpoint {
        builder = builder.ocr_endpoint(endpoint);
    }
    if let Some(ref key) = args.key {
        builder = builder.ocr_key(key);
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }

    builder.build().context("Invalid configuration")
}
