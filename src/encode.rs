//! A module for all encoding needs.
use crate::dictionary::Dictionary;
use crate::pack::{CodeWriter, GROUP_LEN};
use crate::{AllResult, Code, LzwError, LzwStatus, StreamResult};

use std::io::{BufRead, Write};

/// The size of the intermediate buffer used by the stream adapters.
const STREAM_BUF_SIZE: usize = 1 << 16;

/// Turns bytes into codes.
///
/// This is the dictionary half of the encoder without any packing. Every byte either extends the
/// current phrase or emits its code and starts a new phrase with that byte.
pub struct CodeEncoder {
    /// The dictionary of this session.
    dictionary: Dictionary,
    /// The code corresponding to the currently read characters.
    current: Option<Code>,
}

/// A byte encoder producing the packed 12-bit format.
pub struct Encoder {
    state: EncodeState,
}

/// A encoding stream sink.
///
/// See [`Encoder::into_stream`] on how to create this type and more information.
///
/// [`Encoder::into_stream`]: struct.Encoder.html#method.into_stream
pub struct IntoStream<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
}

/// An encoding sink into a vector.
///
/// See [`Encoder::into_vec`] on how to create this type and more information.
///
/// [`Encoder::into_vec`]: struct.Encoder.html#method.into_vec
pub struct IntoVec<'d> {
    encoder: &'d mut Encoder,
    vector: &'d mut Vec<u8>,
}

/// An async encoding sink.
///
/// See [`Encoder::into_async`] on how to create this type and more information.
///
/// [`Encoder::into_async`]: struct.Encoder.html#method.into_async
#[cfg(feature = "async")]
pub struct IntoAsync<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
}

struct EncodeState {
    /// The code producing half.
    codes: CodeEncoder,
    /// Pairs codes into groups.
    writer: CodeWriter,
    /// Packed bytes not yet handed out.
    buffer: Buffer,
    /// If the input has been marked as complete.
    has_ended: bool,
    /// If the last code and its padding have been buffered.
    flushed: bool,
    /// The number of codes produced so far.
    emitted: u64,
}

struct Buffer {
    bytes: [u8; 2 * GROUP_LEN],
    read_mark: usize,
    write_mark: usize,
}

impl CodeEncoder {
    pub fn new() -> Self {
        CodeEncoder {
            dictionary: Dictionary::new(),
            current: None,
        }
    }

    /// Feed one byte, returning a code if the current phrase could not be extended.
    pub fn push(&mut self, byte: u8) -> Option<Code> {
        let prefix = match self.current {
            Some(prefix) => prefix,
            None => {
                self.current = Some(Code::from(byte));
                return None;
            }
        };

        if let Some(code) = self.dictionary.find_extension(prefix, byte) {
            self.current = Some(code);
            return None;
        }

        // The extension is unknown, so the only refusal is an overlong phrase. The decoder skips
        // the very same entry.
        if let Err(err) = self.dictionary.insert(prefix, byte) {
            log::trace!("code {} not extended: {}", prefix, err);
        }

        self.current = Some(Code::from(byte));
        Some(prefix)
    }

    /// Emit the code of the pending phrase, if any.
    pub fn finish(&mut self) -> Option<Code> {
        self.current.take()
    }

    /// Encode a complete slice into its codes.
    pub fn encode_all(&mut self, data: &[u8]) -> Vec<Code> {
        let mut codes: Vec<Code> = data.iter().filter_map(|&byte| self.push(byte)).collect();
        codes.extend(self.finish());
        codes
    }

    /// The dictionary of this session.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}

impl Default for CodeEncoder {
    fn default() -> Self {
        CodeEncoder::new()
    }
}

impl Encoder {
    /// Create a new encoder with a fresh dictionary.
    pub fn new() -> Self {
        Encoder {
            state: EncodeState::new(),
        }
    }

    /// Encode some bytes from `inp` into `out`.
    ///
    /// See [`into_stream`] for high-level functions and [`finish`] for marking the input data as
    /// complete.
    ///
    /// [`into_stream`]: #method.into_stream
    /// [`finish`]: #method.finish
    pub fn encode_bytes(&mut self, inp: &[u8], out: &mut [u8]) -> StreamResult {
        self.state.advance(inp, out)
    }

    /// Construct an encoder into a writer.
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            encoder: self,
            writer,
        }
    }

    /// Construct an encoder into a vector.
    ///
    /// All encoded data is appended and the vector is __not__ cleared.
    pub fn into_vec<'lt>(&'lt mut self, vec: &'lt mut Vec<u8>) -> IntoVec<'lt> {
        IntoVec {
            encoder: self,
            vector: vec,
        }
    }

    /// Construct an encoder into an async writer.
    #[cfg(feature = "async")]
    pub fn into_async<W: futures::io::AsyncWrite>(&mut self, writer: W) -> IntoAsync<'_, W> {
        IntoAsync {
            encoder: self,
            writer,
        }
    }

    /// Mark the encoding as finished.
    ///
    /// In following calls to `encode_bytes` the encoder will emit the code of the pending phrase
    /// and pad an incomplete group after encoding all of `inp`. Input passed after the final
    /// group has been produced is ignored.
    pub fn finish(&mut self) {
        self.state.has_ended = true;
    }

    /// Check if the final group has been produced and handed out.
    pub fn has_ended(&self) -> bool {
        self.state.flushed && self.state.buffer.is_empty()
    }

    /// The number of codes produced so far.
    pub fn codes_emitted(&self) -> u64 {
        self.state.emitted
    }

    /// The dictionary of this session.
    pub fn dictionary(&self) -> &Dictionary {
        self.state.codes.dictionary()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}

impl<W: Write> IntoStream<'_, W> {
    /// Encode data from a reader.
    ///
    /// This will drain the supplied reader. It will not flush the pending phrase after all data
    /// has been processed.
    pub fn encode(&mut self, read: impl BufRead) -> AllResult {
        self.encode_part(read, false)
    }

    /// Encode data from a reader and terminate the stream.
    pub fn encode_all(mut self, read: impl BufRead) -> AllResult {
        self.encode_part(read, true)
    }

    fn encode_part(&mut self, mut read: impl BufRead, finish: bool) -> AllResult {
        let IntoStream { encoder, writer } = self;
        enum Progress {
            Ok,
            Done,
        }

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let read_bytes = &mut bytes_read;
        let write_bytes = &mut bytes_written;

        let mut outbuf = vec![0; STREAM_BUF_SIZE];
        let sink = &mut *writer;
        let once = move || -> Result<Progress, LzwError> {
            let data = read.fill_buf().map_err(LzwError::InputUnavailable)?;

            if data.is_empty() {
                if finish {
                    encoder.finish();
                } else {
                    return Ok(Progress::Done);
                }
            }

            let result = encoder.encode_bytes(data, &mut outbuf[..]);
            *read_bytes += result.consumed_in;
            *write_bytes += result.consumed_out;
            read.consume(result.consumed_in);

            sink.write_all(&outbuf[..result.consumed_out])
                .map_err(LzwError::OutputUnavailable)?;
            let done = result.status?;

            match done {
                LzwStatus::Ok => Ok(Progress::Ok),
                // Nothing more can happen with the data at hand.
                LzwStatus::Done | LzwStatus::NoProgress => Ok(Progress::Done),
            }
        };

        let status = core::iter::repeat_with(once)
            // scan+fuse can be replaced with map_while
            .scan((), |(), result| match result {
                Ok(Progress::Ok) => Some(Ok(())),
                Err(err) => Some(Err(err)),
                Ok(Progress::Done) => None,
            })
            .fuse()
            .collect::<Result<(), LzwError>>();
        let status = status.and_then(|()| writer.flush().map_err(LzwError::OutputUnavailable));

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

impl IntoVec<'_> {
    /// Encode data from a slice.
    ///
    /// The pending phrase stays inside the encoder.
    pub fn encode(&mut self, read: &[u8]) -> AllResult {
        self.encode_part(read, false)
    }

    /// Encode data from a slice and terminate the stream.
    pub fn encode_all(mut self, read: &[u8]) -> AllResult {
        self.encode_part(read, true)
    }

    fn encode_part(&mut self, mut read: &[u8], finish: bool) -> AllResult {
        if finish {
            self.encoder.finish();
        }

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let status = loop {
            let start = self.vector.len();
            self.vector.resize(start + STREAM_BUF_SIZE, 0);
            let result = self.encoder.encode_bytes(read, &mut self.vector[start..]);
            self.vector.truncate(start + result.consumed_out);

            read = &read[result.consumed_in..];
            bytes_read += result.consumed_in;
            bytes_written += result.consumed_out;

            match result.status {
                Err(err) => break Err(err),
                Ok(LzwStatus::Done) | Ok(LzwStatus::NoProgress) => break Ok(()),
                Ok(LzwStatus::Ok) => {
                    // The output was not the limit, so the input has been drained.
                    if read.is_empty() && !finish && result.consumed_out < STREAM_BUF_SIZE {
                        break Ok(());
                    }
                }
            }
        };

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

#[cfg(feature = "async")]
impl<W: futures::io::AsyncWrite + core::marker::Unpin> IntoAsync<'_, W> {
    /// Encode data from a reader.
    ///
    /// This will drain the supplied reader. It will not flush the pending phrase after all data
    /// has been processed.
    pub async fn encode(
        &mut self,
        read: impl futures::io::AsyncBufRead + core::marker::Unpin,
    ) -> AllResult {
        self.encode_part(read, false).await
    }

    /// Encode data from a reader and terminate the stream.
    pub async fn encode_all(
        mut self,
        read: impl futures::io::AsyncBufRead + core::marker::Unpin,
    ) -> AllResult {
        self.encode_part(read, true).await
    }

    async fn encode_part(
        &mut self,
        mut read: impl futures::io::AsyncBufRead + core::marker::Unpin,
        finish: bool,
    ) -> AllResult {
        use futures::io::{AsyncBufReadExt, AsyncWriteExt};

        let IntoAsync { encoder, writer } = self;
        let mut bytes_read = 0;
        let mut bytes_written = 0;
        let mut outbuf = vec![0; STREAM_BUF_SIZE];

        let status = loop {
            let data = match read.fill_buf().await {
                Ok(data) => data,
                Err(err) => break Err(LzwError::InputUnavailable(err)),
            };

            if data.is_empty() {
                if finish {
                    encoder.finish();
                } else {
                    break Ok(());
                }
            }

            let result = encoder.encode_bytes(data, &mut outbuf[..]);
            bytes_read += result.consumed_in;
            bytes_written += result.consumed_out;
            read.consume_unpin(result.consumed_in);

            if let Err(err) = writer.write_all(&outbuf[..result.consumed_out]).await {
                break Err(LzwError::OutputUnavailable(err));
            }

            let done = match result.status {
                Ok(done) => done,
                Err(err) => break Err(err),
            };

            if let LzwStatus::Done | LzwStatus::NoProgress = done {
                break Ok(());
            }
        };

        let status = match status {
            Ok(()) => writer.flush().await.map_err(LzwError::OutputUnavailable),
            Err(err) => Err(err),
        };

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

impl EncodeState {
    fn new() -> Self {
        EncodeState {
            codes: CodeEncoder::new(),
            writer: CodeWriter::new(),
            buffer: Buffer::new(),
            has_ended: false,
            flushed: false,
            emitted: 0,
        }
    }

    fn advance(&mut self, mut inp: &[u8], mut out: &mut [u8]) -> StreamResult {
        let c_in = inp.len();
        let c_out = out.len();

        loop {
            self.buffer.push_out(&mut out);
            if !self.buffer.is_empty() || self.flushed {
                break;
            }

            match inp.split_first() {
                Some((&byte, rest)) => {
                    inp = rest;
                    if let Some(code) = self.codes.push(byte) {
                        self.buffer_code(code);
                    }
                }
                None if self.has_ended => {
                    if let Some(code) = self.codes.finish() {
                        self.buffer_code(code);
                    }
                    if let Some(group) = self.writer.flush() {
                        self.buffer.fill(&group);
                    }
                    self.flushed = true;
                    log::debug!(
                        "encoding finished after {} codes, dictionary generation {}",
                        self.emitted,
                        self.codes.dictionary().generation()
                    );
                }
                None => break,
            }
        }

        let consumed_in = c_in - inp.len();
        let consumed_out = c_out - out.len();
        let status = if self.flushed && self.buffer.is_empty() {
            Ok(LzwStatus::Done)
        } else if consumed_in == 0 && consumed_out == 0 {
            Ok(LzwStatus::NoProgress)
        } else {
            Ok(LzwStatus::Ok)
        };

        StreamResult {
            consumed_in,
            consumed_out,
            status,
        }
    }

    fn buffer_code(&mut self, code: Code) {
        self.emitted += 1;
        if let Some(group) = self.writer.push(code) {
            self.buffer.fill(&group);
        }
    }
}

impl Buffer {
    fn new() -> Self {
        Buffer {
            bytes: [0; 2 * GROUP_LEN],
            read_mark: 0,
            write_mark: 0,
        }
    }

    fn fill(&mut self, group: &[u8; GROUP_LEN]) {
        if self.read_mark == self.write_mark {
            self.read_mark = 0;
            self.write_mark = 0;
        }
        self.bytes[self.write_mark..self.write_mark + GROUP_LEN].copy_from_slice(group);
        self.write_mark += GROUP_LEN;
    }

    fn push_out(&mut self, out: &mut &mut [u8]) {
        let pending = &self.bytes[self.read_mark..self.write_mark];
        let count = pending.len().min(out.len());
        let (bytes, tail) = core::mem::replace(out, &mut []).split_at_mut(count);
        bytes.copy_from_slice(&pending[..count]);
        *out = tail;
        self.read_mark += count;
    }

    fn is_empty(&self) -> bool {
        self.read_mark == self.write_mark
    }
}
