//! Format readers and writers for kilosynth.
//!
//! Reads 4klang patch (`.4kp`) and instrument (`.4ki`) files into the IR
//! and writes rendered audio as WAVE or raw sample data.

mod fourklang;
mod wav_format;

pub use fourklang::{read_4klang_instrument, read_4klang_patch};
pub use wav_format::{raw_bytes, wav_bytes, write_raw, write_wav, WavFormat};

/// Error type for format parsing.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Version tag not one of 4k11..4k14
    #[error("unknown 4klang version tag: {0:#010x}")]
    UnsupportedVersion(u32),
    /// Unexpected end of file
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Any other read failure
    #[error("malformed data: {0}")]
    Parse(#[source] binrw::Error),
}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            FormatError::UnexpectedEof
        } else {
            FormatError::Parse(err)
        }
    }
}
