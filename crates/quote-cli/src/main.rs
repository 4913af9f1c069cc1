//! Quote Table CLI
//!
//! Command-line tool for converting tagged quote CSV tables into runtime
//! assets and inspecting the results.

use clap::{Args, Parser, Subcommand};
use quote_core::{
    filter_tags, run_config, source::read_source, ConversionSummary, ConvertConfig, Converter,
    DecoderKind, HeaderNames, JsonAssetStore, TAG_SLOTS,
};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "quote-cli")]
#[command(about = "Tagged quote table converter", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options selecting the decoder and expected header names
#[derive(Args)]
struct DecodeOptions {
    /// Decoder backend (headers or typed)
    #[arg(long, default_value = "headers")]
    decoder: DecoderKind,

    /// Name of the quote column
    #[arg(long)]
    quote_header: Option<String>,

    /// Names of tag columns, in slot order (repeatable, up to 8)
    #[arg(long)]
    tag_header: Vec<String>,
}

impl DecodeOptions {
    fn header_names(&self) -> quote_core::Result<HeaderNames> {
        if self.tag_header.len() > TAG_SLOTS {
            return Err(quote_core::Error::Config(format!(
                "at most {} tag headers can be given, got {}",
                TAG_SLOTS,
                self.tag_header.len()
            )));
        }

        let mut names = HeaderNames::default();
        if let Some(quote) = &self.quote_header {
            names.quote = quote.clone();
        }
        for (slot, name) in names.tags.iter_mut().zip(&self.tag_header) {
            *slot = name.clone();
        }
        Ok(names)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert CSV files into a quote table asset
    Convert {
        /// CSV files, converted in the order given
        #[arg(short, long)]
        source: Vec<PathBuf>,

        /// Directories whose CSV files follow the listed files
        #[arg(short, long)]
        dir: Vec<PathBuf>,

        /// Asset file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        decode: DecodeOptions,
    },

    /// Run a conversion described by a manifest file
    Run {
        /// Path to manifest file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a single CSV file and show its records
    Inspect {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[command(flatten)]
        decode: DecodeOptions,
    },

    /// List the tag index of a written asset
    Tags {
        /// Path to asset file (JSON)
        #[arg(short, long)]
        asset: PathBuf,

        /// Show how many quotes carry each tag
        #[arg(short, long)]
        counts: bool,
    },

    /// Create a manifest file template
    CreateConfig {
        /// Output path for the manifest
        #[arg(short, long)]
        output: PathBuf,

        /// CSV files to include
        #[arg(short, long)]
        source: Vec<PathBuf>,

        /// Asset file the manifest writes
        #[arg(long, default_value = "quotes.json")]
        destination: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Set up tracing on stderr; `RUST_LOG` overrides the flag-derived level
fn init_logging(verbose: bool, quiet: bool) {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quote_core={},quote_cli={}", level, level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run(command: Commands) -> quote_core::Result<()> {
    match command {
        Commands::Convert {
            source,
            dir,
            output,
            json,
            decode,
        } => cmd_convert(source, dir, output, json, &decode),
        Commands::Run { config, json } => cmd_run(&config, json),
        Commands::Inspect {
            file,
            limit,
            decode,
        } => cmd_inspect(&file, limit, &decode),
        Commands::Tags { asset, counts } => cmd_tags(&asset, counts),
        Commands::CreateConfig {
            output,
            source,
            destination,
        } => cmd_create_config(&output, source, destination),
    }
}

fn cmd_convert(
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
    output: PathBuf,
    json: bool,
    decode: &DecodeOptions,
) -> quote_core::Result<()> {
    let mut config = ConvertConfig::new(output);
    config.sources = files.into_iter().map(Some).collect();
    config.dirs = dirs;
    config.decoder = decode.decoder;
    config.headers = decode.header_names()?;

    let summary = run_config(&config)?;
    print_summary(&summary, &config.destination, json)
}

fn cmd_run(config_path: &PathBuf, json: bool) -> quote_core::Result<()> {
    let config = ConvertConfig::load(config_path)?;
    debug!(
        sources = config.sources.len(),
        dirs = config.dirs.len(),
        decoder = %config.decoder,
        "loaded manifest"
    );

    let summary = run_config(&config)?;
    print_summary(&summary, &config.destination, json)
}

fn print_summary(
    summary: &ConversionSummary,
    destination: &PathBuf,
    json: bool,
) -> quote_core::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Converted {} quotes with {} tags from {} source(s)",
        summary.records, summary.tags, summary.sources
    );
    println!("Wrote {}", destination.display());
    Ok(())
}

fn cmd_inspect(file: &PathBuf, limit: usize, decode: &DecodeOptions) -> quote_core::Result<()> {
    let converter = Converter::with_kind(decode.decoder, decode.header_names()?);
    let text = read_source(file)?;
    let rows = converter.decode_all(std::slice::from_ref(&text))?;

    println!("File: {}", file.display());
    println!("Rows: {}", rows.len());
    println!();

    println!("quote\ttags");
    println!("{}", "-".repeat(24));

    for row in rows.iter().take(limit) {
        println!("{}\t{}", row.quote, filter_tags(row).join(", "));
    }

    if rows.len() > limit {
        println!("... ({} more rows)", rows.len() - limit);
    }

    Ok(())
}

fn cmd_tags(asset_path: &PathBuf, counts: bool) -> quote_core::Result<()> {
    let result = JsonAssetStore::load(asset_path)?.into_result();

    println!("Tags ({}):", result.tag_count());
    for tag in &result.tag_index {
        if counts {
            println!("  {} ({})", tag, result.records_with_tag(tag).count());
        } else {
            println!("  {}", tag);
        }
    }

    Ok(())
}

fn cmd_create_config(
    output: &PathBuf,
    sources: Vec<PathBuf>,
    destination: PathBuf,
) -> quote_core::Result<()> {
    let mut config = ConvertConfig::new(destination);
    config.sources = if sources.is_empty() {
        vec![Some(PathBuf::from("quotes.csv")), None]
    } else {
        sources.into_iter().map(Some).collect()
    };

    config.save(output)?;
    println!("Created manifest: {}", output.display());
    println!("Sources: {}", config.source_list().len());
    println!();
    println!("Edit the file to list your CSV files, then run:");
    println!("  quote-cli run --config {}", output.display());

    Ok(())
}
