//! Stats command - print aggregates from an existing ride database.

use std::path::PathBuf;

use clap::Args;
use console::style;

use ridelog_core::storage::{BucketStats, Totals};
use ridelog_core::{RideStore, TimeBucket};

use super::load_config;

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Database file (default: from config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Only print this bucket table
    #[arg(short, long, value_enum)]
    bucket: Option<BucketArg>,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum BucketArg {
    Month,
    Day,
    Hour,
    DayOfWeek,
}

impl From<BucketArg> for TimeBucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Month => TimeBucket::Month,
            BucketArg::Day => TimeBucket::Day,
            BucketArg::Hour => TimeBucket::Hour,
            BucketArg::DayOfWeek => TimeBucket::DayOfWeek,
        }
    }
}

pub async fn run(args: StatsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let database = args.database.unwrap_or_else(|| config.storage.database_path.clone());

    if !database.exists() {
        anyhow::bail!(
            "Database not found: {}. Run 'ridelog batch' first.",
            database.display()
        );
    }

    let store = RideStore::open(&database)?;
    let buckets: Vec<TimeBucket> = match args.bucket {
        Some(bucket) => vec![bucket.into()],
        None => TimeBucket::ALL.to_vec(),
    };

    let totals = store.totals()?;

    if args.json {
        let mut report = serde_json::Map::new();
        report.insert("totals".to_string(), serde_json::to_value(&totals)?);
        for bucket in &buckets {
            report.insert(bucket.name().to_string(), serde_json::to_value(store.by_bucket(*bucket)?)?);
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", format_totals(&totals));
    for bucket in buckets {
        println!();
        println!("{}", style(format!("By {}", bucket.name().replace('_', " "))).bold());
        print!("{}", format_buckets(&store.by_bucket(bucket)?));
    }

    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_totals(totals: &Totals) -> String {
    let mut output = String::new();

    output.push_str(&format!("Rides:          {}\n", totals.num_rides));
    output.push_str(&format!("Total cost:     {}\n", opt(totals.total_cost)));
    output.push_str(&format!("Total distance: {} m\n", opt(totals.total_distance)));
    output.push_str(&format!("Average cost:   {}\n", opt(totals.avg_cost.map(|c| format!("{:.2}", c)))));
    output.push_str(&format!(
        "Average dist.:  {} m\n",
        opt(totals.avg_distance.map(|d| format!("{:.0}", d)))
    ));
    output.push_str(&format!(
        "Cost per km:    {}\n",
        opt(totals.cost_per_meter.map(|c| format!("{:.3}", c * 1000.0)))
    ));

    output
}

fn format_buckets(stats: &[BucketStats]) -> String {
    let mut output = format!(
        "{:<12} {:>6} {:>10} {:>12} {:>10}\n",
        "bucket", "rides", "cost", "distance", "per km"
    );

    for row in stats {
        output.push_str(&format!(
            "{:<12} {:>6} {:>10} {:>12} {:>10}\n",
            row.bucket,
            row.num_rides,
            opt(row.total_cost),
            opt(row.total_distance),
            opt(row.cost_per_meter.map(|c| format!("{:.3}", c * 1000.0))),
        ));
    }

    output
}
