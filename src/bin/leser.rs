//! CLI binary for leser.
//!
//! A thin shim over the library crate: `extract` maps flags to
//! `ExtractConfig` and writes a parsed record, `review` runs the interactive
//! walkthrough on stdin/stdout, `list` and `stats` print record reports.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use leser::{
    extract_to_store, review_record, ChunkStore, ExtractConfig, ExtractionProgressCallback,
    LeserError, Namespace, PageSelection, ProgressCallback, RecordStats,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Spinner while the document is being read, then a page bar with one log
/// line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Reading");
        bar.set_message("layout…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_pages as u64);
        self.bar.set_prefix("Chunking");
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chunk_count: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{chunk_count} chunks")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, chunk_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} pages → {} chunks",
                green("✔"),
                bold(&total_pages.to_string()),
                bold(&chunk_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages → {} chunks  ({} failed)",
                cyan("⚠"),
                bold(&(total_pages - failed).to_string()),
                total_pages,
                bold(&chunk_count.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a local PDF into data/parsed/report.json
  leser extract report.pdf

  # Download once, cache as data/pdfs/budget.pdf, record name "budget"
  leser extract https://example.org/files/2024.pdf budget

  # A layout dump from another extractor (may carry tables)
  leser extract scan-layout.json scan

  # Walk through the tables and figures that need a human decision
  leser review budget

  # Reports
  leser list
  leser stats

REVIEW COMMANDS:
  a  approve          e  edit (type lines, finish with an empty line)
  d  discard          s  skip (asked again next time)
  q  save and quit

ENVIRONMENT VARIABLES:
  LESER_DATA_DIR   Data directory (default: data)
  PDFIUM_LIB_PATH  Path to libpdfium
  RUST_LOG         Overrides the log filter
"#;

/// Extract PDFs into reviewable chunks and walk through the uncertain ones.
#[derive(Parser, Debug)]
#[command(
    name = "leser",
    version,
    about = "Extract PDFs into reviewable chunks",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Root of the record store.
    #[arg(long, global = true, env = "LESER_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LESER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "LESER_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a PDF, PDF URL or layout dump into a parsed record.
    Extract(ExtractArgs),
    /// Review the chunks of a record that need a human decision.
    Review {
        /// Record name.
        name: String,
    },
    /// Show stats for every parsed record.
    List,
    /// Show stats for every parsed and reviewed record.
    Stats,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Local PDF, `.json` layout dump, or HTTP/HTTPS URL.
    input: String,

    /// Record name. Default: the document's file stem.
    name: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "LESER_PASSWORD")]
    password: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "LESER_PAGES", default_value = "all")]
    pages: String,

    /// Decimal places of the top edge that words on one line share.
    #[arg(long, env = "LESER_LINE_PRECISION", default_value_t = 1,
          value_parser = clap::value_parser!(u32).range(0..=6))]
    line_precision: u32,

    /// Glyph gap (page units) that splits words in PDF text.
    #[arg(long, env = "LESER_WORD_GAP", default_value_t = 3.0)]
    word_gap: f64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "LESER_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "LESER_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Library logs share stderr with the progress bar and the review prompt;
    // keep them out of the way unless asked for.
    let show_progress = matches!(&cli.command, Command::Extract(a) if !a.no_progress) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else if matches!(cli.command, Command::Review { .. }) {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let store = ChunkStore::new(&cli.data_dir);

    match cli.command {
        Command::Extract(ref args) => run_extract(&cli, args, &store, show_progress).await,
        Command::Review { ref name } => run_review(&store, name),
        Command::List => print_reports(&store, &[Namespace::Parsed], false),
        Command::Stats => print_reports(&store, &Namespace::ALL, true),
    }
}

async fn run_extract(
    cli: &Cli,
    args: &ExtractArgs,
    store: &ChunkStore,
    show_progress: bool,
) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(args, progress)?;

    let (extraction, path) = extract_to_store(&args.input, args.name.as_deref(), store, &config)
        .await
        .context("Extraction failed")?;

    if !cli.quiet {
        let stats = RecordStats::compute(&extraction.name, &extraction.chunks);
        match stats {
            Ok(stats) => eprintln!(
                "{}  {}  {}ms  →  {}",
                green("✔"),
                stats.tally,
                extraction.stats.duration_ms,
                bold(&path.display().to_string()),
            ),
            Err(e) => eprintln!("{}  {}  →  {}", cyan("⚠"), e, path.display()),
        }
    }
    Ok(())
}

fn run_review(store: &ChunkStore, name: &str) -> Result<()> {
    // stdin reads block; keep them off the async workers.
    let outcome = tokio::task::block_in_place(|| {
        let stdin = io::stdin();
        let stdout = io::stdout();
        review_record(store, name, stdin.lock(), stdout.lock())
    });

    match outcome {
        Ok(_) => Ok(()),
        Err(e @ LeserError::NotFound { .. }) => {
            eprintln!("{e}");
            Ok(())
        }
        Err(e) => Err(e).context("Review failed"),
    }
}

/// Print the report of every record in `namespaces`, in sorted name order.
fn print_reports(store: &ChunkStore, namespaces: &[Namespace], qualify: bool) -> Result<()> {
    for &ns in namespaces {
        for name in store.names(ns).context("Failed to list records")? {
            let label = if qualify {
                format!("{ns}/{name}.json")
            } else {
                format!("{name}.json")
            };
            let chunks = store
                .load(ns, &name)
                .with_context(|| format!("Failed to load {label}"))?;
            match RecordStats::compute(&name, &chunks) {
                Ok(stats) => print!("\n{}", stats.report(&label)),
                Err(e) => println!("\n{label}\n  {e}"),
            }
        }
    }
    Ok(())
}

/// Map CLI args to `ExtractConfig`.
fn build_config(args: &ExtractArgs, progress: Option<ProgressCallback>) -> Result<ExtractConfig> {
    let mut builder = ExtractConfig::builder()
        .line_precision(args.line_precision)
        .word_gap(args.word_gap)
        .pages(parse_pages(&args.pages)?)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }
        return Ok(PageSelection::Set(pages));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}
