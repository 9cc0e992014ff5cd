//! LSB message recovery.
//!
//! Each sample contributes its low `width` bits as one fragment. Fragments are
//! combined most-significant first, `8 / width` of them per output byte:
//!
//! ```text
//! width = 2:  s0 & 3 | s1 & 3 | s2 & 3 | s3 & 3   ->  one byte (s0 in bits 7..6)
//! ```
//!
//! Stereo files are read as one interleaved stream; left and right samples
//! feed the same accumulator. Decoding stops after the byte pair `:)` or when
//! the sample budget cannot hold another full byte.

use std::fmt;
use std::io::{ErrorKind, Read};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// End-of-message marker. Both bytes are part of the recovered output.
pub const SENTINEL: [u8; 2] = *b":)";

/// Widest sample frame supported (32-bit PCM).
const MAX_FRAME_BYTES: usize = 4;

/// Number of least-significant bits taken from each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LsbWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl LsbWidth {
    pub const ALL: [LsbWidth; 3] = [LsbWidth::One, LsbWidth::Two, LsbWidth::Four];

    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn mask(self) -> u8 {
        match self {
            LsbWidth::One => 0x1,
            LsbWidth::Two => 0x3,
            LsbWidth::Four => 0xF,
        }
    }

    pub fn fragments_per_byte(self) -> u64 {
        8 / u64::from(self.bits())
    }

    /// Whole message bytes that fit in `samples` samples.
    pub fn capacity(self, samples: u64) -> u64 {
        samples / self.fragments_per_byte()
    }
}

impl TryFrom<u8> for LsbWidth {
    type Error = ExtractError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LsbWidth::One),
            2 => Ok(LsbWidth::Two),
            4 => Ok(LsbWidth::Four),
            other => Err(ExtractError::InvalidArgument(format!(
                "LSB width must be 1, 2, or 4 (got {other})"
            ))),
        }
    }
}

impl From<LsbWidth> for u8 {
    fn from(width: LsbWidth) -> Self {
        width as u8
    }
}

impl fmt::Display for LsbWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Outcome of one decode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Recovered bytes, sentinel included when it was found.
    pub message: Vec<u8>,
    pub samples_read: u64,
    /// False when decoding ended by exhausting the sample budget.
    pub sentinel_found: bool,
}

/// Mutable state of a single decode call.
#[derive(Debug)]
struct DecodeState {
    width: LsbWidth,
    accumulator: u8,
    pending: u64,
    previous: Option<u8>,
    samples_consumed: u64,
    output: Vec<u8>,
}

impl DecodeState {
    fn new(width: LsbWidth) -> Self {
        Self {
            width,
            accumulator: 0,
            pending: 0,
            previous: None,
            samples_consumed: 0,
            output: Vec::new(),
        }
    }

    /// Fold one sample's low bits in; returns the byte once it is complete.
    fn push_fragment(&mut self, low_byte: u8) -> Option<u8> {
        let fragment = low_byte & self.width.mask();
        self.accumulator = if self.pending == 0 {
            fragment
        } else {
            (self.accumulator << self.width.bits()) | fragment
        };
        self.samples_consumed += 1;
        self.pending += 1;

        if self.pending == self.width.fragments_per_byte() {
            self.pending = 0;
            Some(self.accumulator)
        } else {
            None
        }
    }

    /// Append a completed byte; true once the sentinel pair is complete.
    fn emit(&mut self, byte: u8) -> bool {
        self.output.push(byte);
        let done = self.previous == Some(SENTINEL[0]) && byte == SENTINEL[1];
        self.previous = Some(byte);
        done
    }
}

/// Reads sample frames from a `data` payload and reassembles the hidden bytes.
#[derive(Debug, Clone, Copy)]
pub struct LsbDecoder {
    width: LsbWidth,
    frame_bytes: usize,
    budget: u64,
}

impl LsbDecoder {
    /// `frame_bytes` is the width of one sample for one channel (1..=4);
    /// `budget` is the total number of samples that may be consumed.
    pub fn new(width: LsbWidth, frame_bytes: usize, budget: u64) -> ExtractResult<Self> {
        if !(1..=MAX_FRAME_BYTES).contains(&frame_bytes) {
            return Err(ExtractError::InvalidArgument(format!(
                "sample frame must be 1 to {MAX_FRAME_BYTES} bytes (got {frame_bytes})"
            )));
        }
        Ok(Self {
            width,
            frame_bytes,
            budget,
        })
    }

    /// Consume samples from `reader` until the sentinel or the budget ends the message.
    ///
    /// Only full bytes are assembled: trailing samples that cannot complete one
    /// are left unread. A payload that stops mid-frame is
    /// [`ExtractError::TruncatedData`]; one that stops on a frame boundary short
    /// of the budget is [`ExtractError::TruncatedFile`].
    pub fn decode<R: Read>(&self, reader: &mut R) -> ExtractResult<Decoded> {
        let mut state = DecodeState::new(self.width);
        let usable = self.budget - self.budget % self.width.fragments_per_byte();
        let mut frame = [0u8; MAX_FRAME_BYTES];
        let frame = &mut frame[..self.frame_bytes];
        let mut sentinel_found = false;

        while state.samples_consumed < usable {
            read_frame(reader, frame, state.samples_consumed)?;
            // Little-endian: the low-order bits live in the first byte.
            if let Some(byte) = state.push_fragment(frame[0]) {
                if state.emit(byte) {
                    sentinel_found = true;
                    break;
                }
            }
        }

        if sentinel_found {
            debug!(
                "sentinel found after {} samples, {} bytes",
                state.samples_consumed,
                state.output.len()
            );
        } else {
            warn!(
                "sample budget of {} exhausted without end-of-message marker",
                self.budget
            );
        }

        Ok(Decoded {
            message: state.output,
            samples_read: state.samples_consumed,
            sentinel_found,
        })
    }
}

fn read_frame<R: Read>(reader: &mut R, frame: &mut [u8], samples_read: u64) -> ExtractResult<()> {
    let mut got = 0;
    while got < frame.len() {
        match reader.read(&mut frame[got..]) {
            // Clean frame boundary: the file is shorter than the declared chunk.
            Ok(0) if got == 0 => {
                return Err(ExtractError::TruncatedFile {
                    context: "data chunk",
                    needed: frame.len() as u64,
                    available: 0,
                })
            }
            Ok(0) => {
                return Err(ExtractError::TruncatedData {
                    samples_read,
                    frame_bytes: frame.len(),
                    got,
                })
            }
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One sample byte per fragment, MSB-first, with noise in the high bits.
    fn carrier(message: &[u8], width: LsbWidth) -> Vec<u8> {
        let per_byte = width.fragments_per_byte() as u32;
        let mut samples = Vec::new();
        for &b in message {
            for i in (0..per_byte).rev() {
                let fragment = (b >> (i * width.bits())) & width.mask();
                samples.push(0xA0 | fragment);
            }
        }
        samples
    }

    fn decode(
        samples: &[u8],
        width: LsbWidth,
        frame_bytes: usize,
        budget: u64,
    ) -> ExtractResult<Decoded> {
        LsbDecoder::new(width, frame_bytes, budget)?.decode(&mut &samples[..])
    }

    #[test]
    fn width_parameters() {
        assert_eq!(LsbWidth::One.mask(), 0x1);
        assert_eq!(LsbWidth::Two.mask(), 0x3);
        assert_eq!(LsbWidth::Four.mask(), 0xF);
        assert_eq!(LsbWidth::One.fragments_per_byte(), 8);
        assert_eq!(LsbWidth::Two.fragments_per_byte(), 4);
        assert_eq!(LsbWidth::Four.fragments_per_byte(), 2);
        assert_eq!(LsbWidth::Two.capacity(11), 2);
    }

    #[test]
    fn width_rejects_other_values() {
        for bad in [0u8, 3, 5, 8] {
            let err = LsbWidth::try_from(bad).unwrap_err();
            assert!(matches!(err, ExtractError::InvalidArgument(_)));
        }
    }

    #[test]
    fn width_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&LsbWidth::Four).unwrap(), "4");
        assert_eq!(serde_json::from_str::<LsbWidth>("2").unwrap(), LsbWidth::Two);
        assert!(serde_json::from_str::<LsbWidth>("3").is_err());
    }

    #[test]
    fn single_bit_scenario_a_colon_paren() {
        // 'A' = 0100_0001, ':' = 0011_1010, ')' = 0010_1001
        let samples = carrier(b"A:)", LsbWidth::One);
        assert_eq!(samples.len(), 24);

        let out = decode(&samples, LsbWidth::One, 1, 24).unwrap();
        assert_eq!(out.message, b"A:)");
        assert_eq!(out.samples_read, 24);
        assert!(out.sentinel_found);
    }

    #[test]
    fn stops_at_sentinel_and_ignores_trailing_samples() {
        let mut samples = carrier(b"hi:)", LsbWidth::Four);
        samples.extend(carrier(b"garbage", LsbWidth::Four));
        let budget = samples.len() as u64;

        let out = decode(&samples, LsbWidth::Four, 1, budget).unwrap();
        assert_eq!(out.message, b"hi:)");
        assert_eq!(out.samples_read, 8);
    }

    #[test]
    fn colon_without_paren_does_not_terminate() {
        let samples = carrier(b"a:b:)", LsbWidth::Two);
        let out = decode(&samples, LsbWidth::Two, 1, samples.len() as u64).unwrap();
        assert_eq!(out.message, b"a:b:)");
    }

    #[test]
    fn budget_exhaustion_returns_partial_message() {
        let samples = carrier(b"abc", LsbWidth::Two);
        let out = decode(&samples, LsbWidth::Two, 1, samples.len() as u64).unwrap();
        assert_eq!(out.message, b"abc");
        assert_eq!(out.samples_read, 12);
        assert!(!out.sentinel_found);
    }

    #[test]
    fn incomplete_trailing_group_is_not_read() {
        let mut samples = carrier(b"ab", LsbWidth::One);
        samples.extend([1, 1, 1]);
        let out = decode(&samples, LsbWidth::One, 1, samples.len() as u64).unwrap();
        assert_eq!(out.message, b"ab");
        assert_eq!(out.samples_read, 16);
    }

    #[test]
    fn uses_low_byte_of_wide_frames() {
        // 16-bit little-endian frames: low byte carries the fragment.
        let narrow = carrier(b"Z:)", LsbWidth::Four);
        let wide: Vec<u8> = narrow.iter().flat_map(|&s| [s, 0x7F]).collect();
        let out = decode(&wide, LsbWidth::Four, 2, narrow.len() as u64).unwrap();
        assert_eq!(out.message, b"Z:)");
    }

    #[test]
    fn short_payload_is_truncated_data() {
        let samples = carrier(b"ok", LsbWidth::One);
        // Claim more 16-bit samples than the payload holds, ending mid-frame.
        let mut wide: Vec<u8> = samples.iter().flat_map(|&s| [s, 0]).collect();
        wide.pop();
        let err = decode(&wide, LsbWidth::One, 2, 16).unwrap_err();
        match err {
            ExtractError::TruncatedData {
                samples_read,
                frame_bytes,
                got,
            } => {
                assert_eq!(samples_read, 15);
                assert_eq!(frame_bytes, 2);
                assert_eq!(got, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn payload_short_on_frame_boundary_is_truncated_file() {
        let narrow = carrier(b"ok", LsbWidth::Four);
        let wide: Vec<u8> = narrow.iter().flat_map(|&s| [s, 0]).collect();
        let err = decode(&wide, LsbWidth::Four, 2, 8).unwrap_err();
        assert!(
            matches!(
                err,
                ExtractError::TruncatedFile {
                    context: "data chunk",
                    needed: 2,
                    available: 0,
                }
            ),
            "got {err:?}"
        );
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn rejects_impossible_frame_width() {
        assert!(LsbDecoder::new(LsbWidth::One, 0, 8).is_err());
        assert!(LsbDecoder::new(LsbWidth::One, 5, 8).is_err());
    }

    #[test]
    fn empty_budget_yields_nothing() {
        let out = decode(&[], LsbWidth::Four, 3, 0).unwrap();
        assert!(out.message.is_empty());
        assert_eq!(out.samples_read, 0);
        assert!(!out.sentinel_found);
    }
}
