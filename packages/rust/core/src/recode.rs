//! 8-bit → UTF-8 recoding of the Smalltalk dump.
//!
//! Squeak sources are raw 8-bit bytes, but the JS shell only reads UTF-8.
//! Every byte is taken as the Latin-1 code point of the same value and
//! re-encoded. This is not a real charset decode: byte `n` always becomes
//! U+00nn, whatever the file was meant to contain.

use std::path::Path;

use tracing::{debug, info, instrument};

use webscratch_shared::{Result, WebscratchError};

/// Line-ending handling while recoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewlineMode {
    /// Keep every byte, CR included.
    #[default]
    Preserve,
    /// Turn CRLF and lone CR into LF.
    Unix,
}

/// Byte counts for one recoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecodeStats {
    pub bytes_read: usize,
    pub bytes_written: usize,
}

/// Map each byte to the code point of the same value.
pub fn latin1_to_utf8(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// [`latin1_to_utf8`] with optional line-ending normalization.
pub fn recode_bytes(bytes: &[u8], mode: NewlineMode) -> String {
    if mode == NewlineMode::Preserve {
        return latin1_to_utf8(bytes);
    }

    let mut out = String::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b == b'\r' {
            if iter.peek() == Some(&b'\n') {
                iter.next();
            }
            out.push('\n');
        } else {
            out.push(char::from(b));
        }
    }
    out
}

/// Recode `src` into `dest`, replacing any existing `dest`.
#[instrument(skip_all, fields(src = %src.display(), dest = %dest.display()))]
pub async fn recode_file(src: &Path, dest: &Path, mode: NewlineMode) -> Result<RecodeStats> {
    let raw = tokio::fs::read(src)
        .await
        .map_err(|e| WebscratchError::io(src, e))?;
    let text = recode_bytes(&raw, mode);

    tokio::fs::write(dest, text.as_bytes())
        .await
        .map_err(|e| WebscratchError::io(dest, e))?;

    let stats = RecodeStats {
        bytes_read: raw.len(),
        bytes_written: text.len(),
    };
    debug!(?mode, read = stats.bytes_read, written = stats.bytes_written, "recoded");
    info!(dest = %dest.display(), "wrote UTF-8 source");
    Ok(stats)
}
