//! CLI binary for issuu2pdf.
//!
//! A thin shim over the library crate: maps CLI flags to `FetcherConfig`,
//! downloads one URL or a file of URLs, or starts the Telegram bot.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use issuu2pdf::bot::{self, BotConfig};
use issuu2pdf::{
    download, output_path_in, parse_reference, DownloadProgressCallback, FetcherConfig,
    ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar for one document. Starts as a spinner while the
/// manifest is fetched and becomes a page counter once the total is known.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(label: &str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message(format!("Fetching manifest for {label}…"));
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Downloading");
        self.bar.reset_eta();
    }

    /// Clear the bar. Safe to call when the download failed before any page.
    fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl DownloadProgressCallback for CliProgressCallback {
    fn on_download_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_complete(&self, _page_num: usize, _total: usize, _bytes: usize) {
        self.bar.inc(1);
    }

    fn on_page_skipped(&self, page_num: usize, total: usize, reason: &str) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            dim(reason),
        ));
        self.bar.inc(1);
    }

    fn on_download_complete(&self, _total_pages: usize, _downloaded: usize) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download one document into ./downloads
  issuu2pdf --url https://issuu.com/acme/docs/report2024

  # Download every URL listed in a file (one per line)
  issuu2pdf --file urls.txt --output_dir ~/Documents/issuu

  # Run the Telegram bot
  TELEGRAM_BOT_TOKEN=123:abc issuu2pdf bot

OUTPUT:
  Each document is saved as <owner>_<document_id>.pdf in the output
  directory. An existing file with that name is replaced.

ENVIRONMENT VARIABLES:
  TELEGRAM_BOT_TOKEN         Bot token (bot mode only); also read from .env
  ISSUU2PDF_OUTPUT_DIR       Default for --output_dir
  ISSUU2PDF_CONCURRENCY      Default for --concurrency
  ISSUU2PDF_TIMEOUT          Default for --timeout
  RUST_LOG                   Override the log filter (e.g. issuu2pdf=debug)
"#;

/// Download issuu documents as PDF files.
#[derive(Parser, Debug)]
#[command(
    name = "issuu2pdf",
    version,
    about = "Download issuu documents as PDF files",
    long_about = "Download documents from issuu's online reader and save them as PDF files, \
one page per page image. Works on a single URL, a file of URLs, or as a Telegram bot.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Pass `bot` to run the Telegram bot.
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// Issuu document URL (https://issuu.com/<owner>/docs/<document_id>).
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// Text file with one issuu URL per line.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Directory the PDFs are written to.
    #[arg(
        long = "output_dir",
        visible_alias = "output-dir",
        env = "ISSUU2PDF_OUTPUT_DIR",
        default_value = "downloads"
    )]
    output_dir: PathBuf,

    /// Number of page images fetched in parallel.
    #[arg(short, long, env = "ISSUU2PDF_CONCURRENCY", default_value_t = 4,
          value_parser = clap::value_parser!(u16).range(1..=64))]
    concurrency: u16,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "ISSUU2PDF_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "ISSUU2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ISSUU2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ISSUU2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Serve downloads over Telegram.
    Bot,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let bot_mode = cli.mode == Some(Mode::Bot);

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs; the bot has no
    // bar, so it logs at INFO.
    let show_progress = !bot_mode && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    let config = build_config(&cli)?;

    // ── Bot mode ─────────────────────────────────────────────────────────
    if bot_mode {
        let mut bot_config = BotConfig::from_env()?;
        bot_config.fetcher = config;
        bot::run(bot_config).await.context("Bot stopped")?;
        return Ok(ExitCode::SUCCESS);
    }

    // ── Download mode ────────────────────────────────────────────────────
    if let Some(ref file) = cli.file {
        download_batch(file, &cli, &config, show_progress).await
    } else if let Some(ref url) = cli.url {
        let ok = download_one(url, &cli, &config, show_progress).await;
        Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    } else {
        eprintln!("Please provide either --url or --file argument");
        Cli::command()
            .print_help()
            .context("Failed to print help")?;
        Ok(ExitCode::from(2))
    }
}

/// Map CLI args to `FetcherConfig`.
fn build_config(cli: &Cli) -> Result<FetcherConfig> {
    FetcherConfig::builder()
        .concurrency(cli.concurrency as usize)
        .timeout_secs(cli.timeout)
        .build()
        .context("Invalid configuration")
}

/// Download every non-blank line of `file`. Fails only when nothing succeeded.
async fn download_batch(
    file: &Path,
    cli: &Cli,
    config: &FetcherConfig,
    show_progress: bool,
) -> Result<ExitCode> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read URL list from {}", file.display()))?;

    let urls: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if urls.is_empty() {
        eprintln!("{} No URLs found in {}", cyan("⚠"), file.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut succeeded = 0usize;
    for url in &urls {
        if download_one(url, cli, config, show_progress).await {
            succeeded += 1;
        }
    }

    if !cli.quiet && urls.len() > 1 {
        eprintln!(
            "{} {}/{} documents downloaded",
            if succeeded == urls.len() {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&succeeded.to_string()),
            urls.len(),
        );
    }
    Ok(if succeeded == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Download one URL into the output directory and print the outcome.
async fn download_one(url: &str, cli: &Cli, base: &FetcherConfig, show_progress: bool) -> bool {
    let reference = match parse_reference(url) {
        Ok(reference) => reference,
        Err(_) => {
            eprintln!("{} Invalid URL format: {}", red("✘"), url);
            return false;
        }
    };
    let output_path = output_path_in(&cli.output_dir, &reference);

    let progress = show_progress.then(|| CliProgressCallback::new(&reference.to_string()));
    let mut config = base.clone();
    if let Some(ref cb) = progress {
        config.progress_callback = Some(Arc::clone(cb) as ProgressCallback);
    }

    let result = download(url, &output_path, &config).await;
    if let Some(cb) = progress {
        cb.finish();
    }

    match result {
        Ok(report) => {
            if !cli.quiet {
                println!(
                    "{} Downloaded: {}",
                    green("✔"),
                    bold(&report.output_path.display().to_string())
                );
                if !report.is_complete() {
                    eprintln!(
                        "   {} {} of {} pages skipped  {}",
                        cyan("⚠"),
                        report.skipped.len(),
                        report.total_pages,
                        dim(&format!("{}ms", report.duration_ms)),
                    );
                }
            }
            true
        }
        Err(e) => {
            eprintln!("{} Failed to download {}: {}", red("✘"), url, e);
            false
        }
    }
}
