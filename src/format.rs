//! `fmt ` chunk parsing and the sample budget of the `data` chunk.

use std::io::{Read, Seek};

use log::debug;
use serde::Serialize;

use crate::error::{ExtractError, ExtractResult};
use crate::riff::{ChunkReader, DATA_TAG, FMT_TAG};

/// WAVE format code for uncompressed PCM.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// Bytes of standard fields at the start of every `fmt ` body.
pub const STANDARD_FMT_LEN: u32 = 16;

/// Audio parameters from the `fmt ` chunk.
///
/// Byte rate and block align are present on the wire but not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavFormat {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Parse a `fmt ` body of `chunk_size` bytes at the reader's cursor.
    ///
    /// Bytes beyond the 16 standard ones (e.g. a `cbSize` extension) are
    /// skipped so the cursor lands on the next chunk header.
    pub fn read_from<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        chunk_size: u32,
    ) -> ExtractResult<Self> {
        if chunk_size < STANDARD_FMT_LEN {
            return Err(ExtractError::InvalidFmtChunk { size: chunk_size });
        }

        let audio_format = reader.read_u16_le("fmt audio format")?;
        let channels = reader.read_u16_le("fmt channel count")?;
        let sample_rate = reader.read_u32_le("fmt sample rate")?;
        // byte rate (4) + block align (2)
        reader.skip(6, "fmt byte rate and block align")?;
        let bits_per_sample = reader.read_u16_le("fmt bits per sample")?;

        let extension = chunk_size - STANDARD_FMT_LEN;
        if extension > 0 {
            debug!("skipping {extension} bytes of fmt extension");
            reader.skip(u64::from(extension), "fmt extension")?;
        }

        Ok(Self {
            audio_format,
            channels,
            sample_rate,
            bits_per_sample,
        })
    }

    pub fn is_pcm(&self) -> bool {
        self.audio_format == WAVE_FORMAT_PCM
    }

    /// Reject anything other than 8/16/24/32-bit mono or stereo PCM.
    pub fn validate(&self) -> ExtractResult<()> {
        let channels_ok = matches!(self.channels, 1 | 2);
        let bits_ok = matches!(self.bits_per_sample, 8 | 16 | 24 | 32);
        if self.is_pcm() && channels_ok && bits_ok {
            Ok(())
        } else {
            Err(ExtractError::UnsupportedFormat {
                audio_format: self.audio_format,
                channels: self.channels,
                bits_per_sample: self.bits_per_sample,
            })
        }
    }

    /// Width of one sample frame for one channel.
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }

    /// Per-channel sample count for a `data` chunk of `data_size` bytes.
    pub fn samples_per_channel(&self, data_size: u32) -> u64 {
        let total = u64::from(data_size) * 8 / u64::from(self.bits_per_sample.max(1));
        if self.is_stereo() {
            total / 2
        } else {
            total
        }
    }
}

/// Everything the decoder needs to know before touching sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavHeader {
    pub format: WavFormat,
    /// Declared byte length of the `data` chunk.
    pub data_size: u32,
    pub samples_per_channel: u64,
}

impl WavHeader {
    /// Number of samples the decoder may consume.
    ///
    /// Stereo files feed both channels into the same bit stream, so the
    /// per-channel count is doubled back.
    pub fn sample_budget(&self) -> u64 {
        if self.format.is_stereo() {
            self.samples_per_channel * 2
        } else {
            self.samples_per_channel
        }
    }
}

/// Walk `RIFF` → `fmt ` → `data`, leaving the cursor at the start of the
/// sample payload.
///
/// Non-PCM or otherwise unsupported formats are rejected as soon as the
/// `fmt ` chunk is parsed, before the `data` chunk is searched for.
pub fn read_header<R: Read + Seek>(reader: &mut ChunkReader<R>) -> ExtractResult<WavHeader> {
    reader.read_riff_header()?;

    let fmt = reader.find_chunk(&FMT_TAG)?;
    let format = WavFormat::read_from(reader, fmt.size)?;
    debug!(
        "format {}: {} ch, {} Hz, {} bits",
        format.audio_format, format.channels, format.sample_rate, format.bits_per_sample
    );
    format.validate()?;

    let data = reader.find_chunk(&DATA_TAG)?;
    let samples_per_channel = format.samples_per_channel(data.size);

    Ok(WavHeader {
        format,
        data_size: data.size,
        samples_per_channel,
    })
}
