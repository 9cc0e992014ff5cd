#![no_main]
use libfuzzer_sys::fuzz_target;
use wavlsb::LsbWidth;

/// Fuzz the full extraction pipeline with arbitrary WAV images.
///
/// Hostile files may declare chunk sizes past the end of the stream, omit
/// required chunks, or cut the sample payload mid-frame. Every input must
/// yield a message or a typed error, never a panic.
fuzz_target!(|data: &[u8]| {
    for width in LsbWidth::ALL {
        let _ = wavlsb::extract_bytes(data, width);
    }
});
