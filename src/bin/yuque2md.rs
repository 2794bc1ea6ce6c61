//! CLI binary for yuque2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `NormalizeConfig`, drives the per-document progress bar, and prints the
//! run summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yuque2md::{
    backup_tree, find_markdown_files, http_client, pandoc, process_file, validate_input_dir,
    NormalizeConfig, RunReport,
};

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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Normalize an export in place (images land in ./_images next to each file)
  yuque2md ./yuque-export

  # Keep a backup of the untouched tree at ./yuque-export.bak first
  yuque2md --backup ./yuque-export

  # Custom image directory name and a tighter download timeout
  yuque2md --image-dir _assets --download-timeout 10 ./yuque-export

  # Keep original image formats (no PNG normalization)
  yuque2md --keep-format ./yuque-export

  # Also produce Word documents (requires pandoc on PATH)
  yuque2md --docx-dir ./yuque-export.converted ./yuque-export

  # Machine-readable run report
  yuque2md --json ./yuque-export > report.json

WHAT IT DOES, PER DOCUMENT:
  1. Inserts the blank lines strict Markdown grammars require around
     headings, rules, code fences and paragraphs; collapses blank runs.
  2. Downloads every CDN image (https://cdn.nlark.com/yuque/...) into a
     sibling image directory, named <stem>-<line><ext>, converts it to an
     opaque PNG, and rewrites the link to ./<image-dir>/<name>.
  3. Writes the document back atomically over the original file.

  Re-running is safe: existing local images are never re-fetched.

ENVIRONMENT VARIABLES:
  YUQUE2MD_IMAGE_DIR          Image directory name (default: _images)
  YUQUE2MD_CDN_MARKER         CDN URL marker (default: yuque)
  YUQUE2MD_DOWNLOAD_TIMEOUT   Per-image HTTP timeout in seconds
"#;

/// Normalize Yuque-exported Markdown and localize its CDN images.
#[derive(Parser, Debug)]
#[command(
    name = "yuque2md",
    version,
    about = "Normalize Yuque-exported Markdown and localize its CDN images",
    long_about = "Rewrites every .md file under the input directory in place: inserts the blank \
lines strict Markdown converters require, downloads Yuque CDN images next to each document, \
normalizes them to PNG, and points the links at the local copies.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing Yuque-exported markdown files.
    input: PathBuf,

    /// Image directory name, created as a sibling of each markdown file.
    #[arg(long, env = "YUQUE2MD_IMAGE_DIR", default_value = "_images")]
    image_dir: String,

    /// Substring identifying the platform CDN in image URLs.
    #[arg(long, env = "YUQUE2MD_CDN_MARKER", default_value = "yuque")]
    cdn_marker: String,

    /// Back up the input tree to a .bak sibling before rewriting.
    #[arg(short, long)]
    backup: bool,

    /// Keep original image formats instead of normalizing to PNG.
    #[arg(long)]
    keep_format: bool,

    /// Use raw document stems (minus spaces) in image names instead of
    /// transliterating to ASCII.
    #[arg(long)]
    no_transliterate: bool,

    /// Per-image HTTP download timeout in seconds.
    #[arg(long, env = "YUQUE2MD_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Also convert each normalized document to .docx under this directory
    /// (requires pandoc on PATH).
    #[arg(long)]
    docx_dir: Option<PathBuf>,

    /// Print a JSON run report to stdout instead of the summary.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // per-document lines printed through the bar carry the same information.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Validate configuration before touching anything ──────────────────
    validate_input_dir(&cli.input).context("Invalid input directory")?;

    let config = NormalizeConfig::builder()
        .image_dir(cli.image_dir.clone())
        .cdn_marker(cli.cdn_marker.clone())
        .transliterate(!cli.no_transliterate)
        .convert_to_png(!cli.keep_format)
        .download_timeout_secs(cli.download_timeout)
        .build()
        .context("Invalid configuration")?;

    // Fail on a missing pandoc before any document is rewritten.
    let pandoc_bin = if cli.docx_dir.is_some() {
        Some(pandoc::locate_pandoc().context("--docx-dir requires pandoc")?)
    } else {
        None
    };

    // ── Backup ───────────────────────────────────────────────────────────
    if cli.backup {
        let dest = backup_tree(&cli.input).context("Backup failed")?;
        if !cli.quiet {
            eprintln!("{} backed up to {}", cyan("◆"), bold(&dest.display().to_string()));
        }
    }

    // ── Discover documents ───────────────────────────────────────────────
    let files = find_markdown_files(&cli.input);
    if files.is_empty() {
        anyhow::bail!("No markdown files found under '{}'", cli.input.display());
    }

    let client = http_client(config.download_timeout_secs)?;

    // ── Process documents sequentially ───────────────────────────────────
    let bar = if show_progress {
        let b = ProgressBar::new(files.len() as u64);
        b.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        b.set_prefix("Normalizing");
        Some(b)
    } else {
        None
    };

    let start = std::time::Instant::now();
    let mut run = RunReport::new();
    for file in files {
        if let Some(ref b) = bar {
            b.set_message(file.display().to_string());
        }
        match process_file(&file, &config, &client).await {
            Ok(report) => {
                if let Some(ref b) = bar {
                    b.println(format!(
                        "  {} {}  {}",
                        green("✓"),
                        file.display(),
                        dim(&format!(
                            "{} images ({} cached, {} failed)  {}ms",
                            report.images_found,
                            report.images_skipped,
                            report.images_failed,
                            report.duration_ms
                        )),
                    ));
                }
                run.push_ok(file, report);
            }
            Err(e) => {
                if let Some(ref b) = bar {
                    b.println(format!("  {} {}  {}", red("✗"), file.display(), red(&e.to_string())));
                }
                run.push_err(file, e.to_string());
            }
        }
        if let Some(ref b) = bar {
            b.inc(1);
        }
    }
    run.stats.total_duration_ms = start.elapsed().as_millis() as u64;
    if let Some(b) = bar {
        b.finish_and_clear();
    }

    // ── Optional Word conversion ─────────────────────────────────────────
    if let (Some(pandoc_bin), Some(docx_dir)) = (pandoc_bin, cli.docx_dir.as_deref()) {
        for outcome in run.documents.iter().filter(|o| o.report.is_some()) {
            let out_path = pandoc::docx_output_path(&cli.input, &outcome.path, docx_dir);
            match pandoc::convert_to_docx(&pandoc_bin, &outcome.path, &out_path).await {
                Ok(()) => {
                    if !cli.quiet && !cli.json {
                        eprintln!("  {} {}", green("✓"), out_path.display());
                    }
                }
                Err(e) => eprintln!("  {} {}", red("✗"), red(&e.to_string())),
            }
        }
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&run).context("Failed to serialize run report")?
        );
    } else if !cli.quiet {
        let s = &run.stats;
        eprintln!(
            "{} {}/{} documents  {} images downloaded, {} cached, {} failed  {}ms",
            if s.documents_failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&s.documents_processed.to_string()),
            s.documents_total,
            s.images_downloaded,
            s.images_skipped,
            s.images_failed,
            s.total_duration_ms,
        );
        for outcome in run.documents.iter().filter(|o| o.error.is_some()) {
            eprintln!(
                "  {} {}  {}",
                red("✗"),
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or(""),
            );
        }
    }

    if run.stats.documents_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
