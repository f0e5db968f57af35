//! Opinion feed runner
//!
//! `run` (the default) performs one scrape-summarize-publish pass and exits
//! 0 on success, 2 when some courts failed and 1 when the run was aborted.
//! `inspect` prints what each listing page looks like to the extractor.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use court_extraction::Pacer;
use opinion_feed::cli::{Cli, Commands, InspectArgs, RunArgs};
use opinion_feed::inspect::{dump_pages, inspect_court};
use opinion_feed::pipeline::{http_ingestor, listing_source};
use opinion_feed::{Config, Pipeline, RunClock, RunReport, RunStatus, StateStore};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,opinion_feed=debug,court_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.into_command() {
        Commands::Run(args) => run(args).await,
        Commands::Inspect(args) => inspect(args).await.map(|()| RunStatus::Success),
    };

    match result {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Run aborted");
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
            ExitCode::from(RunStatus::Failed.exit_code())
        }
    }
}

async fn run(args: RunArgs) -> Result<RunStatus> {
    let mut config = Config::from_env()?;
    args.apply(&mut config)?;

    tracing::info!(
        courts = config.courts.len(),
        lookback_days = config.lookback_days,
        retention_days = config.retention_days,
        summaries = config.summaries_enabled(),
        state_file = %config.state_file.display(),
        output_dir = %config.output_dir.display(),
        "Starting Florida opinion feed run"
    );

    let pipeline = Pipeline::from_config(&config)?;

    // Corrupt state aborts here, before anything is mutated.
    let mut store = StateStore::load(&config.state_file)
        .await
        .context("Failed to load state")?;

    let report = pipeline.run(&mut store, RunClock::now()).await?;
    print_report(&report);
    Ok(report.status())
}

fn print_report(report: &RunReport) {
    println!();
    println!("{}", "Courts".bold());
    for outcome in &report.courts {
        match &outcome.result {
            Ok(summary) => println!(
                "  {} {:<8} {} via {} ({} listed, {} recent, {} new)",
                "●".green(),
                outcome.court.short_name(),
                summary.listing_label,
                summary.strategy,
                summary.listed,
                summary.in_lookback,
                summary.new_records
            ),
            Err(failure) => println!(
                "  {} {:<8} {}",
                "○".red(),
                outcome.court.short_name(),
                failure.to_string().red()
            ),
        }
    }

    println!();
    println!("  New opinions:      {}", report.new_records);
    if report.summaries_enabled {
        println!("  Summarized:        {}", report.summarized);
        println!("  Summary failures:  {}", report.summary_failures.len());
    } else {
        println!("  Summaries:         {}", "skipped".yellow());
    }
    println!("  Feed entries:      {}", report.feed_entries);

    let status = report.status();
    let line = format!("Run finished: {}", status);
    match status {
        RunStatus::Success => println!("\n{}", line.bright_green().bold()),
        RunStatus::PartialSuccess => println!("\n{}", line.bright_yellow().bold()),
        RunStatus::Failed => println!("\n{}", line.bright_red().bold()),
    }
}

async fn inspect(args: InspectArgs) -> Result<()> {
    let mut config = Config::from_env()?;
    args.apply(&mut config)?;
    let source = listing_source(&config, http_ingestor(&config)?)?;
    let pacer = Pacer::new(config.court_delay);
    let today = Utc::now().date_naive();

    let courts: Vec<_> = config
        .courts
        .iter()
        .filter(|c| args.court.map_or(true, |id| c.id == id))
        .collect();
    if courts.is_empty() {
        anyhow::bail!("No configured court matches the filter");
    }

    for court in courts {
        println!(
            "\n{}",
            format!("=== {} ({}) ===", court.name(), court.id).bright_blue().bold()
        );

        let inspections = inspect_court(source.as_ref(), &pacer, court, today).await;
        for inspection in &inspections {
            println!("\n{} {}", inspection.label.bold(), inspection.url);
            match &inspection.result {
                Ok(page) => {
                    println!("{}", page.report);
                    if page.report.strategy.is_none() && page.report.looks_dynamic() {
                        println!(
                            "  {}",
                            "Listing appears to load its results with JavaScript (try --fetcher browser)".yellow()
                        );
                    }
                }
                Err(error) => println!("  {} {}", "fetch failed:".red(), error),
            }
        }

        if let Some(dir) = &args.dump_dir {
            let written = match dump_pages(dir, &inspections).await {
                Ok(written) => written,
                Err(e) => {
                    source.shutdown().await;
                    return Err(e)
                        .with_context(|| format!("Failed to write pages to {}", dir.display()));
                }
            };
            for path in written {
                println!("  saved {}", path.display());
            }
        }
    }

    source.shutdown().await;
    Ok(())
}
