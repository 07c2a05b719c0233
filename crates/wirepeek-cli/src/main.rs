//! wirepeek - Inspect Protocol Buffer wire data without a schema
//!
//! This tool decodes a protobuf buffer given as hex or as a file, prints the
//! recovered field tree, and re-encodes it to show the round trip.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;
use wirepeek_core::{encode, Classifier, Decoder, DecoderConfig, DisplayMapping, Rendering};

/// Inspect Protocol Buffer wire data without a schema
#[derive(Parser, Debug)]
#[command(name = "wirepeek")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format for the decoded fields
    #[arg(long, value_enum, default_value = "typed")]
    format: OutputFormat,

    /// Do not try to skip a leading gRPC message header
    #[arg(long)]
    no_grpc_frame: bool,

    /// Fail on payloads that are neither nested messages nor UTF-8
    #[arg(long)]
    strict_text: bool,

    /// Deepest nesting level at which nested messages are still tried
    #[arg(long, default_value_t = wirepeek_core::decoder::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Hex-encoded buffer (whitespace and a leading 0x are ignored)
    #[arg(short = 'x', long)]
    hex: Option<String>,

    /// Path to a file holding the raw buffer
    #[arg(short, long)]
    file: Option<PathBuf>,
}

/// Output format for decoded fields
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// JSON with each value tagged by its classification
    Typed,
    /// JSON with bare values
    Plain,
    /// Rust debug representation
    Debug,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let data = read_input(&cli.input)?;
    let config = DecoderConfig::new()
        .peel_grpc_frame(!cli.no_grpc_frame)
        .max_depth(cli.max_depth)
        .strict_text(cli.strict_text);

    let mapping = inspect(&data, config)?;
    println!("{}", render(&mapping, cli.format));

    let encoded = encode(&mapping).context("Failed to re-encode decoded fields")?;
    println!("{}", hex::encode(&encoded));

    if encoded == data {
        info!("Re-encoded bytes match the input");
    } else {
        info!(
            "Re-encoded bytes differ from the input ({} vs {} bytes)",
            encoded.len(),
            data.len()
        );
    }

    Ok(())
}

/// Load the buffer from the selected input
fn read_input(input: &InputMode) -> Result<Vec<u8>> {
    if let Some(ref hex) = input.hex {
        parse_hex(hex)
    } else if let Some(ref file) = input.file {
        read_file(file)
    } else {
        bail!("Either --hex or --file must be specified")
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        bail!("Input path is not a file: {}", path.display());
    }
    let data = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Decode the buffer, reporting anything the decoder could not consume
fn inspect(data: &[u8], config: DecoderConfig) -> Result<DisplayMapping> {
    let decoder = Decoder::with_config(config);

    let result = decoder.decode(data);
    if let Some(len) = result.frame_len {
        info!("Skipped gRPC header announcing {} bytes", len);
    }
    if !result.is_complete() {
        warn!(
            "{} trailing bytes could not be decoded: {}",
            result.leftover.len(),
            hex::encode(result.leftover)
        );
    }

    let mapping = Classifier::new(decoder.config()).aggregate(&result.records);
    if decoder.config().strict_text {
        mapping
            .ensure_text()
            .context("Failed to classify decoded fields")?;
    }
    Ok(mapping)
}

fn render(mapping: &DisplayMapping, format: OutputFormat) -> String {
    match format {
        OutputFormat::Typed => format!("{:#}", mapping.to_json(Rendering::Typed)),
        OutputFormat::Plain => format!("{:#}", mapping.to_json(Rendering::Plain)),
        OutputFormat::Debug => format!("{:#?}", mapping),
    }
}

/// Parse a hex string into bytes, ignoring whitespace and a leading 0x
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input.split_whitespace().collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    hex::decode(digits).context("Invalid hex input")
}
