//! Writing the recovered message.
//!
//! The message is written to a temp file beside the destination and renamed
//! into place, so a failed run never leaves a half-written output file and a
//! successful one replaces any previous content.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, ExtractResult};

/// Atomically write `data` to `path`, replacing any existing file.
///
/// When `private` is true on Unix the temp file is created with mode 0o600,
/// so the message is never readable by others at any point.
pub fn write_message(path: &Path, data: &[u8], private: bool) -> ExtractResult<()> {
    let wrap = |source: io::Error| ExtractError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let temp = temp_path(path).map_err(wrap)?;

    if let Err(e) = write_new(&temp, data, private) {
        let _ = std::fs::remove_file(&temp);
        return Err(wrap(e));
    }

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(wrap(e));
    }

    Ok(())
}

/// Sibling of `path` with a random, unpredictable suffix.
fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf)
        .map_err(|e| io::Error::other(format!("getrandom for temp suffix: {e}")))?;
    let suffix: String = buf.iter().map(|b| format!("{b:02x}")).collect();

    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name")
    })?;
    let mut temp_name = name.to_os_string();
    temp_name.push(format!(".tmp.{suffix}"));
    Ok(path.with_file_name(temp_name))
}

fn write_new(temp: &Path, data: &[u8], private: bool) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(temp)?;
    file.write_all(data)?;
    file.flush()
}
