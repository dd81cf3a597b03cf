//! Parse command - extract one receipt without routing.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use ridelog_core::mail::read_message;
use ridelog_core::receipt::{ExtractionResult, ReceiptParser};
use ridelog_core::{Field, ParsedRide};

use super::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Receipt message (.eml)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Report fields that could not be extracted
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Parsing message: {}", args.input.display());

    let message = read_message(&args.input)?;
    let parser = ReceiptParser::from_overrides_file(config.extraction.overrides_path.as_deref())?;
    let result = parser.parse_detailed(&message.receipt);

    let output = format_ride(&result.ride, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings {
        print_warnings(&result);
        eprintln!(
            "{} Extracted in {}µs ({} timestamp overrides loaded)",
            style("ℹ").blue(),
            result.processing_time_us,
            parser.overrides().len()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_warnings(result: &ExtractionResult) {
    if result.warnings.is_empty() {
        eprintln!("{} All fields extracted", style("✓").green());
        return;
    }

    eprintln!("{}", style("Extraction warnings:").yellow());
    for warning in &result.warnings {
        eprintln!("  - {}", warning);
    }
}

pub(crate) fn format_ride(ride: &ParsedRide, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(ride)?),
        OutputFormat::Csv => format_csv(ride),
        OutputFormat::Text => Ok(format_text(ride)),
    }
}

fn field_text<T: ToString>(field: &Field<T>) -> String {
    match field {
        Field::Parsed(value) => value.to_string(),
        Field::Unparseable => String::new(),
    }
}

fn format_csv(ride: &ParsedRide) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["start_location", "end_location", "timestamp", "price", "bonus_credit"])?;
    wtr.write_record([
        field_text(ride.start_location()),
        field_text(ride.end_location()),
        field_text(ride.timestamp()),
        ride.price().map(|p| p.to_string()).unwrap_or_default(),
        ride.bonus_credit().to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(ride: &ParsedRide) -> String {
    fn or_unknown(value: String) -> String {
        if value.is_empty() {
            "(unparseable)".to_string()
        } else {
            value
        }
    }

    let mut output = String::new();

    output.push_str(&format!("From:  {}\n", or_unknown(field_text(ride.start_location()))));
    output.push_str(&format!("To:    {}\n", or_unknown(field_text(ride.end_location()))));
    output.push_str(&format!("When:  {}\n", or_unknown(field_text(ride.timestamp()))));
    match ride.price() {
        Some(price) => output.push_str(&format!("Price: ${}\n", price)),
        None => output.push_str("Price: (unparseable)\n"),
    }
    if ride.bonus_credit() > 0 {
        output.push_str(&format!("Credit applied: ${}\n", ride.bonus_credit()));
    }

    output
}
