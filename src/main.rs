use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser, Subcommand};

use wavlsb::{ExtractError, ExtractOptions, LsbWidth};

/// Exit status for malformed command lines; matches `ExtractError::InvalidArgument`.
const USAGE_ERROR: u8 = 1;

/// Exit status for failures outside the typed taxonomy; matches `ExtractError::Io`.
const OTHER_ERROR: u8 = 6;

#[derive(Parser)]
#[command(
    name = "wavlsb",
    version,
    about = "Recover text hidden in the least-significant bits of a PCM WAV file.",
    long_about = None
)]
struct Cli {
    /// Log chunk walking and decode progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the hidden message from a WAV file into a text file
    Extract {
        /// LSBs per sample carrying message bits: 1, 2, or 4
        #[arg(short = 'b', long = "bits", value_parser = parse_lsb_width)]
        bits: LsbWidth,

        /// WAV file to read
        wav: PathBuf,

        /// Text file to write (previous contents are replaced)
        text: PathBuf,

        /// Create the text file readable by the owner only
        #[arg(long, default_value_t = false)]
        private: bool,

        /// Print the run report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show a WAV file's format and hidden-message capacity without decoding
    Scan {
        /// WAV file to read
        wav: PathBuf,

        /// Print the scan report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn parse_lsb_width(s: &str) -> std::result::Result<LsbWidth, String> {
    let n: u8 = s
        .trim()
        .parse()
        .map_err(|_| format!("{s:?} is not a bit count (expected 1, 2, or 4)"))?;
    LsbWidth::try_from(n).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            let _ = err.print();
            return ExitCode::from(USAGE_ERROR);
        }
    };

    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Exit status of the first typed error in the chain.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ExtractError>())
        .map(ExtractError::exit_code)
        .unwrap_or(OTHER_ERROR)
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Extract {
            bits,
            wav,
            text,
            private,
            json,
        } => cmd_extract(bits, &wav, &text, private, json),
        Commands::Scan { wav, json } => cmd_scan(&wav, json),
    }
}

fn cmd_extract(bits: LsbWidth, wav: &Path, text: &Path, private: bool, json: bool) -> Result<()> {
    let opts = ExtractOptions {
        lsb_width: bits,
        private_output: private,
    };

    let report = wavlsb::extract_file(wav, text, &opts).context("extract failed")?;
    log::info!(
        "decoded {} bytes from {} ({} Hz, {} ch, {} bit)",
        report.chars_decoded,
        report.wav_path,
        report.format.sample_rate,
        report.format.channels,
        report.format.bits_per_sample
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} samples are read", report.samples_read);
    println!("{} characters are deciphered", report.chars_decoded);
    if !report.sentinel_found {
        println!("Note: no end-of-message marker found; output stops at the end of the samples");
    }
    println!("Wrote: {}", report.text_path);
    Ok(())
}

fn cmd_scan(wav: &Path, json: bool) -> Result<()> {
    let report = wavlsb::scan_file(wav).context("scan failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let fmt = &report.format;
    println!("Scan results for: {}", report.wav_path);
    println!("  Audio format:  {} (PCM)", fmt.audio_format);
    println!("  Channels:      {}", fmt.channels);
    println!("  Sample rate:   {} Hz", fmt.sample_rate);
    println!("  Bits/sample:   {}", fmt.bits_per_sample);
    println!("  Data chunk:    {} bytes", report.data_size);
    println!(
        "  Samples:       {} per channel, {} usable",
        report.samples_per_channel, report.sample_budget
    );
    println!();
    println!("  Capacity (bytes, including the 2-byte end marker):");
    for cap in &report.capacity {
        println!("    -b {}: {}", cap.lsb_width, cap.max_bytes);
    }
    Ok(())
}
