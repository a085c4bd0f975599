use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use schedule_extractor::cli::Args;
use schedule_extractor::{ExtractionEngine, ExtractionStats, ParsingResult};
use std::fs;
use std::time::Duration;
use tracing::debug;

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args);

    let config = args.to_config();
    debug!("Configuration: {:?}", config);

    let mut engine = ExtractionEngine::new(config).with_context(|| {
        format!(
            "Failed to load layouts from {}",
            args.layouts_dir().display()
        )
    })?;

    let spinner = (!args.quiet && !args.json_to_stdout()).then(|| create_spinner(&args));
    let results = engine.extract_file(&args.workbook);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let results = results
        .with_context(|| format!("Failed to extract {}", args.workbook.display()))?;

    if let Some(json_path) = &args.json {
        let json = serde_json::to_string_pretty(&results)
            .context("Failed to serialize extracted records")?;
        if args.json_to_stdout() {
            println!("{}", json);
            return Ok(());
        }
        fs::write(json_path, json)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
    }

    if !args.quiet {
        print_summary(&args, &results, engine.stats());
    }

    Ok(())
}

/// Set up structured logging on stderr
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("schedule_extractor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

fn create_spinner(args: &Args) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Extracting {}", args.workbook.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_summary(args: &Args, results: &[ParsingResult], stats: &ExtractionStats) {
    println!("{}", "Extraction Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Workbook:".bright_cyan(),
        args.workbook.display()
    );

    for result in results {
        println!(
            "  {} {} records",
            format!("{:<12}", result.sheet).bright_white(),
            result.records.len().to_string().bright_white().bold()
        );
    }

    println!(
        "  {} {} parsed, {} ignored",
        "Sheets:".bright_cyan(),
        stats.sheets_parsed,
        stats.sheets_ignored
    );
    if stats.sheets_skipped > 0 {
        println!(
            "  {} {}",
            "Sheets skipped:".bright_red(),
            stats.sheets_skipped.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Total records:".bright_cyan(),
        stats.records_extracted.to_string().bright_white().bold()
    );
    if stats.semesters_backfilled > 0 {
        println!(
            "  {} {} ({} cache hits)",
            "Semesters backfilled:".bright_cyan(),
            stats.semesters_backfilled,
            stats.reconciler_cache_hits
        );
    }
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    if let Some(json_path) = &args.json {
        println!(
            "  {} {}",
            "JSON written to:".bright_cyan(),
            json_path.display()
        );
    }
}
