//! # Uniconv CLI - Character Encoding Converter
//!
//! Command-line interface for converting files between Unicode
//! transformation formats and single-byte Latin encodings.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use uniconv::{convert_to_vec, Decoder, Encoding, ErrorPolicy};

/// Uniconv: streaming character encoding converter
#[derive(Parser)]
#[command(name = "uniconv")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert data between character encodings
    Convert(ConvertArgs),

    /// Validate that a file conforms to an encoding
    Validate(ValidateArgs),

    /// List all supported encodings
    List,

    /// Display detailed information about an encoding
    Info(InfoArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Source encoding
    #[arg(short = 'f', long = "from", value_parser = Encoding::from_name)]
    from: Encoding,

    /// Target encoding
    #[arg(short = 't', long = "to", value_parser = Encoding::from_name)]
    to: Encoding,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Error policy for malformed or unrepresentable data
    #[arg(long, default_value = "replace")]
    policy: PolicyArg,
}

#[derive(Args)]
struct ValidateArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Expected encoding
    #[arg(short, long, value_parser = Encoding::from_name)]
    encoding: Encoding,
}

#[derive(Args)]
struct InfoArgs {
    /// Encoding to describe
    #[arg(value_parser = Encoding::from_name)]
    encoding: Encoding,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Substitute the replacement character and continue
    Replace,
    /// Drop malformed or unrepresentable data and continue
    Skip,
    /// Halt at the first fault
    Stop,
}

impl From<PolicyArg> for ErrorPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Replace => ErrorPolicy::Replace,
            PolicyArg::Skip => ErrorPolicy::Skip,
            PolicyArg::Stop => ErrorPolicy::Stop,
        }
    }
}

#[derive(Serialize)]
struct ValidationReport {
    encoding: &'static str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_invalid_offset: Option<usize>,
    bytes_checked: usize,
}

#[derive(Serialize)]
struct EncodingReport {
    name: &'static str,
    unit_size: usize,
    max_encoded_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    endianness: Option<String>,
    single_byte: bool,
}

impl EncodingReport {
    fn new(encoding: Encoding) -> Self {
        Self {
            name: encoding.name(),
            unit_size: encoding.unit_size(),
            max_encoded_len: encoding.max_encoded_len(),
            endianness: encoding.endianness().map(|e| e.to_string()),
            single_byte: encoding.is_single_byte(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Convert(args) => cmd_convert(cli, args),
        Commands::Validate(args) => cmd_validate(cli, args),
        Commands::List => cmd_list(cli),
        Commands::Info(args) => cmd_info(cli, args),
    }
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(path) => fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut data = Vec::new();
            io::stdin()
                .read_to_end(&mut data)
                .context("reading stdin")?;
            Ok(data)
        }
    }
}

fn write_output(output: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    match output {
        Some(path) => fs::write(path, data).with_context(|| format!("writing {}", path.display())),
        None => io::stdout().write_all(data).context("writing stdout"),
    }
}

fn cmd_convert(cli: &Cli, args: &ConvertArgs) -> Result<ExitCode> {
    let data = read_input(args.input.as_ref())?;
    let converted = convert_to_vec(&data, args.from, args.to, args.policy.into())
        .with_context(|| format!("converting {} to {}", args.from, args.to))?;
    write_output(args.output.as_ref(), &converted)?;
    if cli.verbose {
        eprintln!(
            "{} -> {}: {} bytes in, {} bytes out (policy: {:?})",
            args.from,
            args.to,
            data.len(),
            converted.len(),
            args.policy,
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(cli: &Cli, args: &ValidateArgs) -> Result<ExitCode> {
    let data = read_input(args.input.as_ref())?;
    let first_invalid_offset = Decoder::new(args.encoding).check(&data);
    let report = ValidationReport {
        encoding: args.encoding.name(),
        valid: first_invalid_offset.is_none(),
        first_invalid_offset,
        bytes_checked: data.len(),
    };
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => match first_invalid_offset {
            None => println!("valid {} ({} bytes)", report.encoding, report.bytes_checked),
            Some(offset) => println!("invalid {} at byte offset {offset}", report.encoding),
        },
    }
    if report.valid {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_list(cli: &Cli) -> Result<ExitCode> {
    let reports: Vec<EncodingReport> =
        Encoding::ALL.iter().map(|&e| EncodingReport::new(e)).collect();
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                if cli.verbose {
                    println!(
                        "{:<12} unit {} byte(s), up to {} byte(s) per code point",
                        report.name, report.unit_size, report.max_encoded_len
                    );
                } else {
                    println!("{}", report.name);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_info(cli: &Cli, args: &InfoArgs) -> Result<ExitCode> {
    let report = EncodingReport::new(args.encoding);
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("Name:            {}", report.name);
            println!("Code unit size:  {} byte(s)", report.unit_size);
            println!("Max code point:  {} byte(s)", report.max_encoded_len);
            match &report.endianness {
                Some(endianness) => println!("Byte order:      {endianness}"),
                None => println!("Byte order:      n/a"),
            }
            println!("Single byte:     {}", report.single_byte);
        }
    }
    Ok(ExitCode::SUCCESS)
}
