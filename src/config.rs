use serde::{Deserialize, Serialize};

use crate::lsb::LsbWidth;

/// Options that control one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Low-order bits read from each sample (1, 2, or 4).
    pub lsb_width: LsbWidth,

    /// If true, the recovered message file is created owner-read/write only
    /// (0o600 on Unix).
    #[serde(default)]
    pub private_output: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            lsb_width: LsbWidth::One,
            private_output: false,
        }
    }
}

impl ExtractOptions {
    pub fn with_width(lsb_width: LsbWidth) -> Self {
        Self {
            lsb_width,
            ..Self::default()
        }
    }
}
