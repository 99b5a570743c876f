//! Main entry point for the rgunzip CLI application.
//!
//! This binary decompresses gzip archives from the local filesystem or a
//! remote HTTP URL into a file, streaming the output through a bounded buffer.

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use rgunzip::gzip::GzipMember;
use rgunzip::{Cli, ExtractOptions, GzipExtractor, HttpRangeReader, LocalFileReader, read_fully};

/// Application entry point.
///
/// Parses command-line arguments, loads the compressed archive and either
/// lists it or decompresses it.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let data = if cli.is_http_url() {
        // Fetch the remote archive via HTTP Range requests
        let reader = HttpRangeReader::new(cli.file.clone()).await?;
        let data = read_fully(&reader).await?;

        if !cli.is_quiet() {
            eprintln!(
                "Total bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
        data
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.file))?;
        read_fully(&reader)
            .await
            .with_context(|| format!("Cannot load {}", reader.path().display()))?
    };

    if cli.list || cli.verbose {
        let member = GzipExtractor::new(&data)
            .inspect()
            .with_context(|| format!("{}: not a valid gzip file", cli.file))?;
        list_member(&member, &cli);
        return Ok(());
    }

    let stored_name = GzipExtractor::new(&data)
        .inspect()
        .ok()
        .and_then(|m| m.header.filename_lossy());
    let output_path = cli.output_path(stored_name.as_deref());

    if !prepare_output(&output_path, &cli)? {
        return Ok(());
    }

    if !cli.is_quiet() {
        println!("  inflating: {}", output_path.display());
    }

    decompress(data, output_path, &cli).await
}

/// Install the tracing subscriber, honouring `RUST_LOG` when set.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print header and footer information of a gzip member.
///
/// Supports two output formats:
/// - Simple format (`-l`): sizes, ratio and name, like `gzip -l`
/// - Verbose format (`-v`): adds method, CRC32, mtime and header details
fn list_member(member: &GzipMember<'_>, cli: &Cli) {
    let name = member
        .header
        .filename_lossy()
        .unwrap_or_else(|| cli.output_path(None).display().to_string());

    if cli.verbose {
        println!(
            "{:<6}  {:>8}  {:>10}  {:>10}  {:>10}  {:>5}  Name",
            "Method", "CRC", "Stamp", "Compressed", "Original", "Ratio"
        );
        println!(
            "{:<6}  {:08x}  {:>10}  {:>10}  {:>10}  {:>4}%  {}",
            "defla",
            member.footer.crc32,
            member.header.mtime,
            member.container_size(),
            member.footer.original_size,
            member.ratio_percent(),
            name
        );
        println!();
        println!("  OS:          {}", member.header.os_name());
        println!("  Text:        {}", member.header.is_text());
        println!("  Header CRC:  {}", member.header.has_header_crc16());
        println!("  Extra field: {}", member.header.has_extra_field());
        if let Some(comment) = member.header.comment {
            println!("  Comment:     {}", String::from_utf8_lossy(comment));
        }
        println!(
            "  Payload:     {} bytes at offset {}",
            member.payload.len(),
            member.payload_offset
        );
    } else {
        println!(
            "{:>10}  {:>10}  {:>5}  Name",
            "Compressed", "Original", "Ratio"
        );
        println!(
            "{:>10}  {:>10}  {:>4}%  {}",
            member.container_size(),
            member.footer.original_size,
            member.ratio_percent(),
            name
        );
    }
}

/// Apply the overwrite policy to the destination.
///
/// Returns `false` when the destination should be left alone. An existing
/// file is removed before decoding when `-o` is given, since decoded output
/// is appended.
fn prepare_output(output_path: &Path, cli: &Cli) -> Result<bool> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
    }

    if !output_path.exists() {
        return Ok(true);
    }

    if cli.never_overwrite {
        // -n flag: never overwrite, skip silently (unless quiet)
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (file exists)", output_path.display());
        }
        return Ok(false);
    }

    if !cli.overwrite {
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (use -o to overwrite)", output_path.display());
        }
        return Ok(false);
    }

    std::fs::remove_file(output_path)
        .with_context(|| format!("Cannot remove {}", output_path.display()))?;
    Ok(true)
}

/// Run the blocking decode on a worker thread with a progress bar and
/// Ctrl-C cancellation.
async fn decompress(data: Vec<u8>, output_path: PathBuf, cli: &Cli) -> Result<()> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancelled.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_flag.store(true, Ordering::Relaxed);
        }
    });

    let bar = if cli.is_quiet() {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(1000);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar
    };

    let options = ExtractOptions {
        verify_crc32: cli.verify_crc,
    };
    let task_bar = bar.clone();
    let task_path = output_path.clone();
    let task_cancelled = cancelled.clone();

    let result = tokio::task::spawn_blocking(move || {
        GzipExtractor::new(&data)
            .options(options)
            .on_progress(|fraction| task_bar.set_position((fraction * 1000.0) as u64))
            .cancel_when(|| task_cancelled.load(Ordering::Relaxed))
            .extract_to_file(&task_path)
    })
    .await
    .context("Decompression task failed")?;

    signal_task.abort();

    match result {
        Ok(report) => {
            bar.finish_and_clear();
            debug!(
                bytes = report.file_size,
                cycles = report.summary.cycles,
                "decompressed"
            );
            if !cli.is_quiet() {
                println!(
                    "  {} -> {}",
                    format_size(report.file_size),
                    output_path.display()
                );
            }
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            if !e.is_malformed_container() && output_path.exists() && !cli.is_very_quiet() {
                warn!(path = %output_path.display(), "partial output left on disk");
            }
            bail!("{}: {}", cli.file, e)
        }
    }
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
