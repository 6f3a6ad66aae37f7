//! CLI binary for edgequake-pdf2form.
//!
//! A thin shim over the library crate: maps CLI flags to
//! `ExtractionConfig`, resolves the LLM provider once, then either serves
//! the upload page or processes a single file.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2form::{
    start_server, ExtractionConfig, FormExtractor, Pdf2FormError, ServerConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the upload page on http://127.0.0.1:8501
  pdf2form

  # Listen on all interfaces
  pdf2form --bind 0.0.0.0:8080

  # Process one file and print the form HTML
  pdf2form --input bill_of_sale.pdf > form.html

  # Process one file and print fields + stats as JSON
  pdf2form --input bill_of_sale.pdf --json

  # Use a specific provider and model
  pdf2form --provider anthropic --model claude-haiku-4-20250514

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_PROVIDER      Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium

The provider is resolved once at startup. If no credential is available the
process exits before serving any page.
"#;

/// Extract vehicle-sale fields from PDF documents into a state authority form.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2form",
    version,
    about = "Extract vehicle-sale fields from PDF documents into a state authority form",
    long_about = "Upload a PDF sales document, extract buyer, seller, vehicle and sale details \
with a language model, and render them as an HTML form. Supports OpenAI, Anthropic, Google \
Gemini, and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address for the upload page.
    #[arg(long, env = "PDF2FORM_BIND", default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Process this PDF once and print the result instead of serving.
    #[arg(short, long, env = "PDF2FORM_INPUT")]
    input: Option<PathBuf>,

    /// With --input: write output to this file instead of stdout.
    #[arg(short, long, env = "PDF2FORM_OUTPUT", requires = "input")]
    output: Option<PathBuf>,

    /// With --input: print FormOutput as JSON instead of HTML.
    #[arg(long, env = "PDF2FORM_JSON", requires = "input")]
    json: bool,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-haiku-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2FORM_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "PDF2FORM_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// LLM call timeout in seconds. Unset: wait for the service.
    #[arg(long, env = "PDF2FORM_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Path to a text file with a custom prompt containing `{text}`.
    #[arg(long, env = "PDF2FORM_PROMPT")]
    prompt: Option<PathBuf>,

    /// Value rendered in the Sale Date field.
    #[arg(long, env = "PDF2FORM_SALE_DATE_PLACEHOLDER", default_value = "MM/DD/YYYY")]
    sale_date_placeholder: String,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "PDF2FORM_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,

    /// Uploads processed at the same time.
    #[arg(long, env = "PDF2FORM_MAX_CONCURRENT", default_value_t = 1)]
    max_concurrent: usize,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2FORM_PASSWORD")]
    password: Option<String>,

    /// Disable the spinner in --input mode.
    #[arg(long, env = "PDF2FORM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2FORM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2FORM_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and resolve the provider once ───────────────────────
    let config = build_config(&cli).await?;
    let extractor = FormExtractor::from_config(config).context("Failed to configure LLM provider")?;

    match cli.input {
        Some(ref path) => run_once(&cli, &extractor, path).await,
        None => {
            let server = ServerConfig {
                bind: cli.bind,
                max_concurrent_uploads: cli.max_concurrent.max(1),
            };
            if !cli.quiet {
                eprintln!(
                    "{} Dealership Paperwork Automation on {}",
                    green("▶"),
                    bold(&format!("http://{}", server.bind))
                );
            }
            start_server(extractor, server)
                .await
                .context("Server failed")?;
            Ok(())
        }
    }
}

/// Process a single file and print the result.
async fn run_once(cli: &Cli, extractor: &FormExtractor, path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    let spinner = if !cli.quiet && !cli.no_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Processing the document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = extractor.extract_from_bytes(&bytes).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            report_failure(&e);
            return Err(e).context("Extraction failed");
        }
    };

    let rendered = if cli.json {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")?
    } else {
        output.html.clone()
    };

    match cli.output {
        Some(ref out) => tokio::fs::write(out, &rendered)
            .await
            .with_context(|| format!("Failed to write {:?}", out))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    if !cli.quiet {
        eprintln!(
            "{} Form generated successfully!  {}/{} fields  {}ms",
            green("✔"),
            output.stats.fields_found,
            edgequake_pdf2form::FieldKey::ALL.len() - 1,
            output.stats.total_duration_ms,
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
        );
    }

    Ok(())
}

/// Print the same message the web page would show.
fn report_failure(e: &Pdf2FormError) {
    eprintln!("{} {}", red("✘"), e.user_message());
    if let Some(raw) = e.raw_candidate() {
        eprintln!("{}", dim("Raw model output:"));
        eprintln!("{raw}");
    }
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .sale_date_placeholder(cli.sale_date_placeholder.clone())
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024));

    if let Some(ref path) = cli.prompt {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref dir) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.pdf_password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}
