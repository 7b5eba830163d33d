//! Packing of 12-bit codes into bytes.
//!
//! Two codes form one 24-bit big-endian group: the first code occupies the upper twelve bits and
//! the second the lower twelve. A code without partner is padded with the sentinel.
use crate::{Code, LzwError, Result, SENTINEL};

/// The number of bytes in one packed group.
pub const GROUP_LEN: usize = 3;

const CODE_MASK: u32 = 0xfff;

/// Packs a sequence of codes, pairwise.
#[derive(Debug, Default)]
pub struct CodeWriter {
    /// The first code of an incomplete pair.
    waiting: Option<Code>,
}

/// Unpacks a sequence of codes from byte chunks of arbitrary length.
#[derive(Debug, Default)]
pub struct CodeReader {
    /// The bytes of the group being collected.
    group: [u8; GROUP_LEN],
    /// The number of valid bytes in `group`.
    filled: u8,
    /// The second code of the last complete group.
    cached: Option<Code>,
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter::default()
    }

    /// Buffer a code, returning a group once it completes a pair.
    pub fn push(&mut self, code: Code) -> Option<[u8; GROUP_LEN]> {
        debug_assert!(code <= SENTINEL);
        match self.waiting.take() {
            None => {
                self.waiting = Some(code);
                None
            }
            Some(first) => Some(pack_pair(first, code)),
        }
    }

    /// Pad a waiting code with the sentinel.
    pub fn flush(&mut self) -> Option<[u8; GROUP_LEN]> {
        self.waiting.take().map(|first| pack_pair(first, SENTINEL))
    }
}

impl CodeReader {
    pub fn new() -> Self {
        CodeReader::default()
    }

    /// Read the next code, consuming bytes from the front of `inp` as required.
    ///
    /// The second code of a group is returned by the following call without consuming any
    /// input. Returns `None` if `inp` ran out before a group was complete; the partial group is
    /// kept for the next call.
    pub fn read_code(&mut self, inp: &mut &[u8]) -> Option<Code> {
        if let Some(code) = self.cached.take() {
            return Some(code);
        }

        while usize::from(self.filled) < GROUP_LEN {
            let (&byte, rest) = inp.split_first()?;
            self.group[usize::from(self.filled)] = byte;
            self.filled += 1;
            *inp = rest;
        }

        self.filled = 0;
        let (first, second) = unpack_pair(self.group);
        self.cached = Some(second);
        Some(first)
    }

    /// The number of bytes of an incomplete group.
    pub fn pending_bytes(&self) -> usize {
        usize::from(self.filled)
    }

    /// Check that the input ended on a group boundary.
    pub fn finish(&self) -> Result<()> {
        match self.pending_bytes() {
            0 => Ok(()),
            trailing => Err(LzwError::TruncatedStream { trailing }),
        }
    }
}

/// Combine two codes into one group.
pub fn pack_pair(first: Code, second: Code) -> [u8; GROUP_LEN] {
    let value = (u32::from(first) & CODE_MASK) << 12 | (u32::from(second) & CODE_MASK);
    let [_, hi, mid, lo] = value.to_be_bytes();
    [hi, mid, lo]
}

/// Split one group into its two codes.
pub fn unpack_pair(group: [u8; GROUP_LEN]) -> (Code, Code) {
    let [hi, mid, lo] = group;
    let value = u32::from_be_bytes([0, hi, mid, lo]);
    ((value >> 12) as Code, (value & CODE_MASK) as Code)
}

/// Pack a complete code sequence, padding an odd count with the sentinel.
pub fn pack(codes: &[Code]) -> Vec<u8> {
    let mut writer = CodeWriter::new();
    let mut out = Vec::with_capacity((codes.len() + 1) / 2 * GROUP_LEN);
    for &code in codes {
        if let Some(group) = writer.push(code) {
            out.extend_from_slice(&group);
        }
    }
    if let Some(group) = writer.flush() {
        out.extend_from_slice(&group);
    }
    out
}

/// Unpack all codes before the first sentinel.
///
/// Bytes after a sentinel are ignored. A stream ending inside a group without a sentinel is
/// reported as truncated.
pub fn unpack(mut bytes: &[u8]) -> Result<Vec<Code>> {
    let mut reader = CodeReader::new();
    let mut codes = Vec::with_capacity(bytes.len() / GROUP_LEN * 2);
    while let Some(code) = reader.read_code(&mut bytes) {
        if code == SENTINEL {
            return Ok(codes);
        }
        codes.push(code);
    }
    reader.finish()?;
    Ok(codes)
}
