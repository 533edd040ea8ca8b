//! Stream transfer modes.

use std::fmt;

/// How a stream is opened for a codec: binary or text, read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferMode {
    BinaryRead,
    BinaryWrite,
    TextRead,
    TextWrite,
}

impl TransferMode {
    pub fn is_text(self) -> bool {
        matches!(self, TransferMode::TextRead | TransferMode::TextWrite)
    }

    pub fn is_read(self) -> bool {
        matches!(self, TransferMode::BinaryRead | TransferMode::TextRead)
    }

    /// Short `open()`-style flag: `rb`, `wb`, `rt` or `wt`
    pub fn as_str(self) -> &'static str {
        match self {
            TransferMode::BinaryRead => "rb",
            TransferMode::BinaryWrite => "wb",
            TransferMode::TextRead => "rt",
            TransferMode::TextWrite => "wt",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
