use absorb::actions::DRY_RUN_MARKER;
use absorb::{AbsorbConfig, AbsorbReport, Absorber};
use anyhow::Context;
use clap::Parser;
use indicatif::{MultiProgress, ProgressDrawTarget};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

mod progress;
mod writer;

use progress::IndicatifReporter;
use writer::IndicatifWriter;

/// Replace loose files that already ship inside .var packages with
/// references to the packaged copies
#[derive(Parser, Debug)]
#[command(name = "absorb", author, version, about, long_about = None)]
struct Cli {
    /// Library root holding Custom, Saves and AddonPackages
    #[arg(long, env = "ABSORB_VAM_DIR")]
    vam: PathBuf,

    /// Glob pattern of root-relative paths never to delete (repeatable)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Show what would change without writing or deleting anything
    #[arg(long, visible_alias = "noop")]
    dry_run: bool,

    /// Log every file touched
    #[arg(short, long)]
    verbose: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Number of packages scanned at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment from .env before clap reads ABSORB_VAM_DIR
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let multi = MultiProgress::new();
    if cli.json {
        multi.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(20));
    }

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(IndicatifWriter::new(multi.clone()))
        .with_target(false)
        .without_time()
        .init();

    let mut builder = AbsorbConfig::builder()
        .library_root(&cli.vam)
        .max_concurrency(cli.concurrency)
        .dry_run(cli.dry_run)
        .verbose(cli.verbose);
    for pattern in &cli.exclude {
        builder = builder.exclude(pattern);
    }
    let config = builder.build().context("Invalid configuration")?;

    let result = Absorber::new(config)
        .with_progress(Arc::new(IndicatifReporter::new(multi)))
        .run()
        .await;
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(category = e.category(), "{}", e);
            return Err(e).with_context(|| format!("Failed to absorb {}", cli.vam.display()));
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &AbsorbReport) {
    let prefix = if report.dry_run { DRY_RUN_MARKER } else { "" };
    println!(
        "{}Scanned {} files, {} packages and {} scenes.",
        prefix, report.files_scanned, report.packages_scanned, report.scenes_found
    );
    println!(
        "{}Matched {} package entries; rewrote {} references in {} scenes.",
        prefix, report.matches, report.references_rewritten, report.scenes_updated
    );
    if report.stale_references > 0 {
        println!(
            "{}Skipped {} references that changed during the run.",
            prefix, report.stale_references
        );
    }
    println!(
        "{}Deleted {} files and {} folders, {:.2} MB saved.",
        prefix,
        report.files_deleted,
        report.directories_removed,
        report.bytes_reclaimed as f64 / 1024.0 / 1024.0
    );
    println!("Done in {:.2}s", report.elapsed_ms as f64 / 1000.0);
}
