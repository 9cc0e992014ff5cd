//! wavlsb core library.
//!
//! Recovers a text message hidden in the least-significant bits of PCM WAV
//! samples:
//! - RIFF chunk walking that skips unknown chunks (`LIST`, `fact`, ...)
//! - `fmt ` parsing and sample budgeting for 8/16/24/32-bit mono or stereo PCM
//! - 1, 2, or 4-bit LSB reassembly, terminated by the `:)` marker
//! - Atomic output writing and a serialisable run report

pub mod config;
pub mod error;
pub mod format;
pub mod lsb;
pub mod output;
pub mod riff;

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use serde::Serialize;

pub use config::ExtractOptions;
pub use error::{ExtractError, ExtractResult};
pub use format::{WavFormat, WavHeader};
pub use lsb::{Decoded, LsbDecoder, LsbWidth, SENTINEL};

use riff::ChunkReader;

/// Parsed header plus decoded message from one WAV stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub header: WavHeader,
    pub decoded: Decoded,
}

/// Summary of a completed `extract_file` run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub wav_path: String,
    pub text_path: String,
    pub format: WavFormat,
    pub lsb_width: LsbWidth,
    pub samples_read: u64,
    pub chars_decoded: usize,
    pub sentinel_found: bool,
}

/// Hidden-message capacity at one LSB width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WidthCapacity {
    pub lsb_width: LsbWidth,
    pub max_bytes: u64,
}

/// Header-only view of a WAV file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub wav_path: String,
    pub format: WavFormat,
    pub data_size: u32,
    pub samples_per_channel: u64,
    pub sample_budget: u64,
    pub capacity: Vec<WidthCapacity>,
}

/// Decode the hidden message from a seekable WAV stream.
///
/// This function:
/// 1) Walks `RIFF` → `fmt ` → `data`, rejecting unsupported formats
/// 2) Hands the `data` payload to an [`LsbDecoder`] bounded by the sample budget
pub fn extract<R: Read + Seek>(reader: R, width: LsbWidth) -> ExtractResult<Extraction> {
    let mut chunks = ChunkReader::new(reader)?;
    let header = format::read_header(&mut chunks)?;

    let decoder = LsbDecoder::new(
        width,
        header.format.bytes_per_sample(),
        header.sample_budget(),
    )?;
    let mut body = chunks.into_body(header.data_size);
    let decoded = decoder.decode(&mut body)?;

    Ok(Extraction { header, decoded })
}

/// [`extract`] over an in-memory WAV image.
pub fn extract_bytes(wav: &[u8], width: LsbWidth) -> ExtractResult<Extraction> {
    extract(Cursor::new(wav), width)
}

fn open_wav(path: &Path) -> ExtractResult<BufReader<File>> {
    let file = File::open(path).map_err(|source| ExtractError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Decode `wav_path` and write the recovered bytes to `text_path`.
///
/// The output file is only created once decoding has succeeded, and any
/// previous content is replaced.
pub fn extract_file(
    wav_path: &Path,
    text_path: &Path,
    opts: &ExtractOptions,
) -> ExtractResult<ExtractReport> {
    let extraction = extract(open_wav(wav_path)?, opts.lsb_width)?;
    let Extraction { header, decoded } = extraction;

    output::write_message(text_path, &decoded.message, opts.private_output)?;

    Ok(ExtractReport {
        wav_path: wav_path.display().to_string(),
        text_path: text_path.display().to_string(),
        format: header.format,
        lsb_width: opts.lsb_width,
        samples_read: decoded.samples_read,
        chars_decoded: decoded.message.len(),
        sentinel_found: decoded.sentinel_found,
    })
}

/// Parse the headers of `wav_path` without decoding any samples.
pub fn scan_file(wav_path: &Path) -> ExtractResult<ScanReport> {
    let mut chunks = ChunkReader::new(open_wav(wav_path)?)?;
    let header = format::read_header(&mut chunks)?;
    let sample_budget = header.sample_budget();

    Ok(ScanReport {
        wav_path: wav_path.display().to_string(),
        format: header.format,
        data_size: header.data_size,
        samples_per_channel: header.samples_per_channel,
        sample_budget,
        capacity: LsbWidth::ALL
            .iter()
            .map(|&lsb_width| WidthCapacity {
                lsb_width,
                max_bytes: lsb_width.capacity(sample_budget),
            })
            .collect(),
    })
}
