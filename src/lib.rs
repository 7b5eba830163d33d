//! # LZW decoder and encoder with 12-bit packed codes
//!
//! This crate provides an [`Encoder`] and a [`Decoder`] for a fixed width LZW format. Every
//! code occupies exactly 12 bits and two codes are packed big-endian into three bytes. The
//! stream has no header. An odd trailing code is padded with the sentinel code `4095`, so a
//! compressed stream is always a multiple of three bytes long.
//!
//! The dictionary holds 4096 codes. Codes `0..256` are the literal bytes, codes `256..4095`
//! are learned while processing and code `4095` is reserved as the sentinel. Once the last
//! slot has been handed out both sides discard all learned phrases and start over at `256`.
//! Learned phrases are never longer than [`MAX_PHRASE`] bytes.
//!
//! Exemplary use of the encoder:
//!
//! ```
//! use lzw12::{encode::Encoder, decode::Decoder};
//! let data = b"TOBEORNOTTOBEORTOBEORNOT";
//! let mut compressed = vec![];
//!
//! let mut enc = Encoder::new();
//! let result = enc.into_stream(&mut compressed).encode_all(&data[..]);
//! result.status.unwrap();
//! assert_eq!(compressed.len() % 3, 0);
//!
//! let mut decompressed = vec![];
//! let mut dec = Decoder::new();
//! dec.into_vec(&mut decompressed).decode_all(&compressed).status.unwrap();
//! assert_eq!(decompressed, data);
//! ```
//!
//! [`Encoder`]: encode/struct.Encoder.html
//! [`Decoder`]: decode/struct.Decoder.html
//! [`MAX_PHRASE`]: constant.MAX_PHRASE.html
#![forbid(unsafe_code)]

/// The width of every code in bits.
pub const MAX_CODESIZE: u8 = 12;
/// The number of addressable codes.
pub const MAX_ENTRIES: usize = 1 << MAX_CODESIZE as usize;
/// The first code assigned to a learned phrase.
pub const FIRST_DYNAMIC: Code = 256;
/// The end-of-stream and padding marker. Never a live dictionary entry.
pub const SENTINEL: Code = (MAX_ENTRIES - 1) as Code;
/// The maximum length of any dictionary phrase in bytes.
pub const MAX_PHRASE: usize = 31;

/// Alias for a LZW code point
pub type Code = u16;

pub mod decode;
pub mod dictionary;
pub mod encode;
mod error;
pub mod pack;

pub use crate::error::{LzwError, Result};

/// The status after a successful buffer-to-buffer call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LzwStatus {
    /// Everything went well.
    Ok,
    /// No bytes were read or written and no internal state advanced.
    ///
    /// The caller should provide more input or more output space, or call `finish` when the
    /// input has been exhausted.
    NoProgress,
    /// The end of the stream has been reached and all output has been written.
    Done,
}

/// The result of a coding operation on a pair of buffers.
#[must_use = "Contains a status with potential error information"]
#[derive(Debug)]
pub struct StreamResult {
    /// The number of bytes consumed from the input buffer.
    pub consumed_in: usize,
    /// The number of bytes written into the output buffer.
    pub consumed_out: usize,
    /// The status after returning from the call.
    pub status: Result<LzwStatus>,
}

/// The result of coding a whole reader or slice into a sink.
#[must_use = "Contains a status with potential error information"]
#[derive(Debug)]
pub struct AllResult {
    /// The total number of bytes consumed from the reader.
    pub bytes_read: usize,
    /// The total number of bytes written into the writer.
    pub bytes_written: usize,
    /// The final status of the operation.
    pub status: Result<()>,
}

/// Encode a complete slice.
///
/// Convenience wrapper around [`encode::Encoder::into_vec`].
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 3);
    let result = encode::Encoder::new().into_vec(&mut out).encode_all(data);
    // Writing into a vector and reading from a slice can not fail.
    debug_assert!(result.status.is_ok());
    out
}

/// Decode a complete slice.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    decode::Decoder::new()
        .into_vec(&mut out)
        .decode_all(data)
        .status?;
    Ok(out)
}
