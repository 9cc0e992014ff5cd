//! Synthetic WAV construction for the integration suites.

#![allow(dead_code)]

use wavlsb::LsbWidth;

/// Builds RIFF/WAVE images with optional extra chunks and a hand-picked
/// declared `data` size.
#[derive(Debug, Clone)]
pub struct WavBuilder {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    fmt_extension: Vec<u8>,
    before_fmt: Vec<u8>,
    before_data: Vec<u8>,
    after_data: Vec<u8>,
    data: Vec<u8>,
    declared_data_size: Option<u32>,
}

impl WavBuilder {
    pub fn pcm(channels: u16, bits_per_sample: u16) -> Self {
        Self {
            audio_format: 1,
            channels,
            sample_rate: 8_000,
            bits_per_sample,
            fmt_extension: Vec::new(),
            before_fmt: Vec::new(),
            before_data: Vec::new(),
            after_data: Vec::new(),
            data: Vec::new(),
            declared_data_size: None,
        }
    }

    pub fn audio_format(mut self, code: u16) -> Self {
        self.audio_format = code;
        self
    }

    pub fn fmt_extension(mut self, bytes: &[u8]) -> Self {
        self.fmt_extension = bytes.to_vec();
        self
    }

    pub fn chunk_before_fmt(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        self.before_fmt.extend(chunk(tag, body));
        self
    }

    pub fn chunk_before_data(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        self.before_data.extend(chunk(tag, body));
        self
    }

    pub fn chunk_after_data(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        self.after_data.extend(chunk(tag, body));
        self
    }

    pub fn data(mut self, payload: Vec<u8>) -> Self {
        self.data = payload;
        self
    }

    pub fn declared_data_size(mut self, size: u32) -> Self {
        self.declared_data_size = Some(size);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let block_align = self.channels * (self.bits_per_sample / 8);
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&self.audio_format.to_le_bytes());
        fmt.extend_from_slice(&self.channels.to_le_bytes());
        fmt.extend_from_slice(&self.sample_rate.to_le_bytes());
        fmt.extend_from_slice(&(self.sample_rate * u32::from(block_align)).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        fmt.extend_from_slice(&self.fmt_extension);

        let mut body = b"WAVE".to_vec();
        body.extend_from_slice(&self.before_fmt);
        body.extend(chunk(b"fmt ", &fmt));
        body.extend_from_slice(&self.before_data);
        body.extend_from_slice(b"data");
        let declared = self.declared_data_size.unwrap_or(self.data.len() as u32);
        body.extend_from_slice(&declared.to_le_bytes());
        body.extend_from_slice(&self.data);
        body.extend_from_slice(&self.after_data);

        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend(body);
        out
    }
}

pub fn chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Split `message` into `width`-bit fragments, most significant first.
pub fn fragments(message: &[u8], width: LsbWidth) -> Vec<u8> {
    let per_byte = width.fragments_per_byte() as u32;
    let mut out = Vec::with_capacity(message.len() * per_byte as usize);
    for &b in message {
        for i in (0..per_byte).rev() {
            out.push((b >> (i * width.bits())) & width.mask());
        }
    }
    out
}

/// Little-endian sample payload whose LSBs carry `fragments`; every other
/// bit is deterministic noise.
pub fn samples_from_fragments(fragments: &[u8], width: LsbWidth, bits_per_sample: u16) -> Vec<u8> {
    let frame = usize::from(bits_per_sample / 8);
    let mut out = Vec::with_capacity(fragments.len() * frame);
    for (i, &fragment) in fragments.iter().enumerate() {
        let noise = (i as u8).wrapping_mul(37).wrapping_add(11);
        out.push((noise & !width.mask()) | fragment);
        for k in 1..frame {
            out.push(noise.wrapping_add(k as u8).rotate_left(3));
        }
    }
    out
}

/// Sample payload hiding `message` at `width` bits per sample.
pub fn embed(message: &[u8], width: LsbWidth, bits_per_sample: u16) -> Vec<u8> {
    samples_from_fragments(&fragments(message, width), width, bits_per_sample)
}
