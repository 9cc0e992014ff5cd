#![no_main]
use libfuzzer_sys::fuzz_target;
use wavlsb::{LsbDecoder, LsbWidth};

/// Fuzz the decoder with raw sample payloads and arbitrary budgets.
///
/// The first two bytes pick the frame width and budget; a budget larger than
/// the payload must surface as an error, never a panic.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let frame_bytes = usize::from(data[0] % 4) + 1;
    let budget = u64::from(data[1]) * 4;
    for width in LsbWidth::ALL {
        if let Ok(decoder) = LsbDecoder::new(width, frame_bytes, budget) {
            let _ = decoder.decode(&mut &data[2..]);
        }
    }
});
