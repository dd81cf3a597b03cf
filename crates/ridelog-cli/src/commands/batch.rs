//! Batch command - parse, route, store and export a set of receipts.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};

use ridelog_core::enrich::{DirectionsClient, Enricher, RetryPolicy};
use ridelog_core::export::{export_coordinates, write_aggregate_report};
use ridelog_core::mail::load_receipts;
use ridelog_core::models::config::RidelogConfig;
use ridelog_core::{EnrichedRide, EnrichmentStatus, ParsedRide, ReceiptParser, RideParser, RideStore};

use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching receipt messages (e.g. "mail/*.eml")
    #[arg(required = true)]
    input: String,

    /// Output directory for aggregate files (default: from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Database file (default: from config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Skip the routing service; distances stay unknown
    #[arg(long)]
    no_routing: bool,

    /// Only keep messages whose subject contains this text
    #[arg(long)]
    subject: Option<String>,

    /// Continue when a message cannot be read
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} messages to process",
        style("ℹ").blue(),
        files.len()
    );

    let subject_filter = args.subject.clone().or_else(|| config.extraction.subject_filter.clone());

    let pb = progress_bar(files.len(), "messages")?;
    let loaded = load_receipts(&files, subject_filter.as_deref(), |_| pb.inc(1));
    pb.finish_and_clear();

    if let Some((path, e)) = loaded.failures.first() {
        if !args.continue_on_error {
            error!("Failed to read {}: {}", path.display(), e);
            anyhow::bail!("Processing failed: {}: {}", path.display(), e);
        }
    }
    if loaded.filtered > 0 {
        debug!("{} messages left out by the subject filter", loaded.filtered);
    }
    let receipts = loaded.receipts;
    let failures = loaded.failures;

    let parser = ReceiptParser::from_overrides_file(config.extraction.overrides_path.as_deref())?;
    let rides = parser.parse_all(&receipts);
    let complete = rides.iter().filter(|r| r.missing_fields().is_empty()).count();

    let enriched = if config.routing.enabled && !args.no_routing {
        route_rides(rides, &config).await?
    } else {
        debug!("Routing disabled");
        rides.into_iter().map(EnrichedRide::unrouted).collect()
    };

    let database = args.database.unwrap_or_else(|| config.storage.database_path.clone());
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut store = RideStore::open(&database)?;
    store.rebuild(&enriched)?;

    let output_dir = args.output_dir.unwrap_or_else(|| config.export.output_dir.clone());
    let written = write_aggregate_report(&store, &output_dir)?;
    let coordinates = export_coordinates(
        &enriched,
        &output_dir.join(&config.export.coordinates_file),
    )?;

    let routed = enriched
        .iter()
        .filter(|r| r.enrichment == EnrichmentStatus::Routed)
        .count();
    let route_failures = enriched
        .iter()
        .filter(|r| matches!(r.enrichment, EnrichmentStatus::Failed(_)))
        .count();

    println!();
    println!(
        "{} Processed {} receipts in {:?}",
        style("✓").green(),
        enriched.len(),
        start.elapsed()
    );
    println!(
        "   {} fully parsed, {} routed, {} routing failures",
        style(complete).green(),
        style(routed).green(),
        style(route_failures).red()
    );
    println!(
        "   Database: {}, {} report files, {} coordinate pairs",
        database.display(),
        written.len(),
        coordinates
    );

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, error) in &failures {
            println!("  - {}: {}", path.display(), error);
        }
    }

    Ok(())
}

fn progress_bar(len: usize, unit: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}",
                unit
            ))?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

async fn route_rides(
    rides: Vec<ParsedRide>,
    config: &RidelogConfig,
) -> anyhow::Result<Vec<EnrichedRide>> {
    let client = DirectionsClient::from_config(&config.routing)?;
    let enricher = Enricher::with_policy(client, RetryPolicy::from(&config.routing));

    let pb = progress_bar(rides.len(), "routed")?;
    let enriched = enricher.enrich_all(rides, |_| pb.inc(1)).await;
    pb.finish_and_clear();

    Ok(enriched)
}
