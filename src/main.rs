//! Main entry point for the gmadx CLI application.
//!
//! This binary extracts GMAD addon archives from the local filesystem or
//! from HTTP URLs, printing one line per extracted file.

use clap::Parser;
use log::warn;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use gmadx::{
    ByteSource, CancellationToken, Cli, GmaError, GmaExtractor, HttpStreamSource,
    LocalFileSource, Outcome,
};

/// Application entry point.
///
/// The process exit status is the extraction outcome code, so scripts can
/// tell a non-GMAD file (1) from an empty (2), truncated (3) or cancelled (4)
/// archive.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    // Ctrl-C withdraws consent; the extractor stops at the next chunk
    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling extraction");
            interrupt.cancel();
        }
    });

    let result = run(&cli, &token).await;
    let outcome = Outcome::from_result(&result);

    if let Err(err) = result {
        report_failure(&cli, err, outcome);
    }

    ExitCode::from(outcome.code() as u8)
}

/// Open the archive source and dispatch to list or extract mode.
async fn run(cli: &Cli, token: &CancellationToken) -> gmadx::Result<()> {
    if cli.is_http_url() {
        let source = HttpStreamSource::new(cli.file.clone())
            .await?
            .with_resume_retries(cli.resume_retries);
        let counter = source.transfer_counter();

        process_gma(source, cli, token).await?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            let transferred = counter.load(Ordering::Relaxed);
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
        Ok(())
    } else {
        let source = LocalFileSource::new(Path::new(&cli.file))?;
        process_gma(source, cli, token).await
    }
}

async fn process_gma<S: ByteSource>(
    source: S,
    cli: &Cli,
    token: &CancellationToken,
) -> gmadx::Result<()> {
    let mut extractor = GmaExtractor::with_options(source, cli.extract_options());

    if cli.list {
        let (metadata, entries) = extractor.list().await?;

        println!("Name:        {}", metadata.name);
        println!("Author:      {}", metadata.author);
        println!("Description: {}", metadata.description);
        println!();
        println!("{:>10}  Name", "Length");
        println!("{}", "-".repeat(40));

        let mut total = 0u64;
        for entry in &entries {
            println!("{:>10}  {}", entry.size, entry.path);
            total += entry.size as u64;
        }

        println!("{}", "-".repeat(40));
        println!("{:>10}  {} files", total, entries.len());
        return Ok(());
    }

    let quiet = cli.is_quiet();
    let summary = extractor
        .extract(&cli.output_root(), token, |progress| {
            if !quiet {
                println!(
                    "  extracting ({}/{}): {}",
                    progress.files_processed, progress.total_files, progress.current_file
                );
            }
        })
        .await?;

    if !quiet {
        println!(
            "Extracted {} files ({}) to {}",
            summary.files,
            format_size(summary.bytes),
            summary.addon_dir.display()
        );
    }

    Ok(())
}

/// Print a message for a failed run unless `-qq` was given.
fn report_failure(cli: &Cli, err: GmaError, outcome: Outcome) {
    if cli.is_very_quiet() {
        return;
    }

    match outcome {
        Outcome::Cancelled => eprintln!("The operation has been cancelled."),
        Outcome::InvalidFormat => eprintln!("{}: not a GMAD archive ({err})", cli.file),
        Outcome::EmptyTable => eprintln!("{}: the addon contains no files", cli.file),
        _ => {
            let err = anyhow::Error::new(err).context(format!("Failed to extract {}", cli.file));
            eprintln!("{err:#}");
        }
    }
}

/// Format a byte size into a human-readable string.
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
