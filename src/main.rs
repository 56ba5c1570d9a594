//! Ordertally CLI - analyze e-commerce order exports
//!
//! # Main Commands
//!
//! ```bash
//! ordertally totals orders.csv              # Flat product tally
//! ordertally recipients orders.csv          # Per-recipient tallies
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! ordertally parse-option "olive chiabata,120g 3ea"   # Parse one option
//! ```
//!
//! Set `RUST_LOG=ordertally=debug` to watch the cascade decide per row.

use clap::{Parser, Subcommand};
use ordertally::{
    analyze, AnalysisOptions, AnalysisReport, BundlePolicy, CsvRowSource, CsvSink, OptionParser,
    ParseMode, ResultSink,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ordertally")]
#[command(about = "Analyze order-sheet option strings into product tallies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flat product tally across all rows
    Totals {
        /// Input CSV export
        input: PathBuf,

        /// Output CSV file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scale the 5-flavor-set bundle by the descriptor quantity
        #[arg(long)]
        scaled_bundles: bool,
    },

    /// Per-recipient tallies with recipient metadata
    Recipients {
        /// Input CSV export
        input: PathBuf,

        /// Output CSV file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scale the 5-flavor-set bundle by the descriptor quantity
        #[arg(long)]
        scaled_bundles: bool,
    },

    /// Parse a single option string and print the pairs as JSON
    ParseOption {
        /// Raw option string ("label,descriptor")
        option: String,

        /// Purchase multiplier
        #[arg(short, long, default_value = "1")]
        multiplier: u32,

        /// Parse in per-recipient mode
        #[arg(long)]
        per_recipient: bool,

        /// Scale the 5-flavor-set bundle by the descriptor quantity
        #[arg(long)]
        scaled_bundles: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Totals { input, output, scaled_bundles } => cmd_analyze(
            &input,
            output.as_deref(),
            ParseMode::Aggregate,
            bundle_policy(scaled_bundles),
        ),
        Commands::Recipients { input, output, scaled_bundles } => cmd_analyze(
            &input,
            output.as_deref(),
            ParseMode::PerRecipient,
            bundle_policy(scaled_bundles),
        ),
        Commands::ParseOption { option, multiplier, per_recipient, scaled_bundles } => {
            cmd_parse_option(&option, multiplier, per_recipient, bundle_policy(scaled_bundles))
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn bundle_policy(scaled: bool) -> BundlePolicy {
    if scaled {
        BundlePolicy::DescriptorScaled
    } else {
        BundlePolicy::FixedPerSet
    }
}

fn cmd_analyze(
    input: &Path,
    output: Option<&Path>,
    mode: ParseMode,
    policy: BundlePolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading: {}", input.display());

    let source = CsvRowSource::open(input)?;
    eprintln!("   Encoding: {}", source.encoding());
    eprintln!(
        "   Delimiter: '{}'",
        match source.delimiter() {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        }
    );
    eprintln!("   Rows: {}", source.row_count());

    let options = AnalysisOptions { mode, bundle_policy: policy };
    let report = analyze(&source, options)?;
    eprintln!(
        "✅ Analyzed {} rows ({} skipped)",
        report.rows_processed, report.rows_skipped
    );

    match output {
        Some(path) => {
            let mut sink = CsvSink::create(path)?;
            write_report(&mut sink, &report)?;
            eprintln!("   Wrote {}", path.display());
        }
        None => {
            let mut sink = CsvSink::new(std::io::stdout());
            write_report(&mut sink, &report)?;
        }
    }

    Ok(())
}

fn write_report<W: std::io::Write>(
    sink: &mut CsvSink<W>,
    report: &AnalysisReport,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(totals) = report.totals() {
        sink.write_totals(totals)?;
    }
    if let Some(ledger) = report.ledger() {
        sink.write_recipients(ledger)?;
    }
    Ok(())
}

fn cmd_parse_option(
    option: &str,
    multiplier: u32,
    per_recipient: bool,
    policy: BundlePolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if per_recipient {
        ParseMode::PerRecipient
    } else {
        ParseMode::Aggregate
    };

    let parser = OptionParser::new(policy);
    let items = parser.parse(option, multiplier, mode);

    if items.is_empty() {
        eprintln!("(ignored: no comma-separated descriptor)");
    }
    println!("{}", serde_json::to_string_pretty(&items)?);

    Ok(())
}
