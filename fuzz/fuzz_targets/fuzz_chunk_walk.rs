#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use wavlsb::riff::{ChunkReader, DATA_TAG};

/// Fuzz the chunk walker on its own: arbitrary bytes after a RIFF header.
fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = ChunkReader::new(Cursor::new(data)) {
        let _ = reader.find_chunk(&DATA_TAG);
    }
});
