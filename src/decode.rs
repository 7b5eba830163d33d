//! A module for all decoding needs.
use crate::dictionary::Dictionary;
use crate::pack::CodeReader;
use crate::{AllResult, Code, LzwError, LzwStatus, Result, StreamResult, MAX_PHRASE, SENTINEL};

use std::io::{BufRead, Write};

/// The size of the intermediate buffer used by the stream adapters.
const STREAM_BUF_SIZE: usize = 1 << 16;

/// Turns codes back into bytes.
///
/// The dictionary trails the encoder by one entry: the phrase learned while encoding a code is
/// only completed by the first byte of the code that follows it.
pub struct CodeDecoder {
    /// The dictionary of this session.
    dictionary: Dictionary,
    /// The last successfully decoded code.
    previous: Option<Code>,
    /// If the sentinel has been read.
    has_ended: bool,
    /// The offending code and cursor once the stream was found to be corrupt.
    failed: Option<(Code, Code)>,
    /// The phrase of the last decoded code.
    phrase: [u8; MAX_PHRASE],
}

/// A byte decoder for the packed 12-bit format.
pub struct Decoder {
    state: Box<DecodeState>,
}

/// A decoding stream sink.
///
/// See [`Decoder::into_stream`] on how to create this type and more information.
///
/// [`Decoder::into_stream`]: struct.Decoder.html#method.into_stream
pub struct IntoStream<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
}

/// A decoding sink into a vector.
///
/// See [`Decoder::into_vec`] on how to create this type and more information.
///
/// [`Decoder::into_vec`]: struct.Decoder.html#method.into_vec
pub struct IntoVec<'d> {
    decoder: &'d mut Decoder,
    vector: &'d mut Vec<u8>,
}

/// An async decoding sink.
///
/// See [`Decoder::into_async`] on how to create this type and more information.
///
/// [`Decoder::into_async`]: struct.Decoder.html#method.into_async
#[cfg(feature = "async")]
pub struct IntoAsync<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
}

struct DecodeState {
    /// The dictionary half.
    codes: CodeDecoder,
    /// Splits groups into codes.
    reader: CodeReader,
    /// The buffer of decoded data.
    buffer: Buffer,
    /// If no more input will follow.
    has_ended: bool,
    /// If the end of the code stream has been reached.
    done: bool,
}

struct Buffer {
    bytes: [u8; MAX_PHRASE],
    read_mark: usize,
    write_mark: usize,
}

impl CodeDecoder {
    pub fn new() -> Self {
        CodeDecoder {
            dictionary: Dictionary::new(),
            previous: None,
            has_ended: false,
            failed: None,
            phrase: [0; MAX_PHRASE],
        }
    }

    /// Decode one code into its phrase.
    ///
    /// Returns `Ok(None)` once the sentinel has been read. A code that the dictionary can not
    /// hold yet fails the session and every following call reports the same error.
    pub fn next_phrase(&mut self, code: Code) -> Result<Option<&[u8]>> {
        if let Some((code, cursor)) = self.failed {
            return Err(LzwError::CorruptStream { code, cursor });
        }

        if self.has_ended || code == SENTINEL {
            self.has_ended = true;
            return Ok(None);
        }

        match self.decode(code) {
            Ok(len) => {
                self.previous = Some(code);
                Ok(Some(&self.phrase[..len]))
            }
            Err(cursor) => {
                log::debug!("corrupt code {} with next free code {}", code, cursor);
                self.failed = Some((code, cursor));
                Err(LzwError::CorruptStream { code, cursor })
            }
        }
    }

    /// Decode a complete code sequence.
    pub fn decode_all(&mut self, codes: &[Code]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(codes.len() * 2);
        for &code in codes {
            match self.next_phrase(code)? {
                Some(phrase) => out.extend_from_slice(phrase),
                None => break,
            }
        }
        Ok(out)
    }

    /// Check if the sentinel has been read.
    pub fn is_done(&self) -> bool {
        self.has_ended
    }

    /// The dictionary of this session.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Reconstruct `code` into the phrase buffer, learning the entry it completes.
    ///
    /// On error returns the cursor at the time the code was read.
    fn decode(&mut self, code: Code) -> core::result::Result<usize, Code> {
        let cursor = self.dictionary.cursor();
        let previous = match self.previous {
            Some(previous) => previous,
            None => return self.dictionary.reconstruct(code, &mut self.phrase).ok_or(cursor),
        };

        if self.dictionary.contains(code) {
            // Reconstruct first, learning may discard the code with all other learned phrases.
            let len = self
                .dictionary
                .reconstruct(code, &mut self.phrase)
                .ok_or(cursor)?;
            match self.dictionary.insert(previous, self.phrase[0]) {
                Ok(_) => {}
                Err(LzwError::PhraseTooLong { len }) => {
                    log::trace!("code {} not extended to {} bytes", previous, len);
                }
                Err(_) => return Err(cursor),
            }
            Ok(len)
        } else if code == cursor {
            // The encoder used the entry right after creating it. Its phrase is the previous one
            // extended by its own first byte.
            let first = self.dictionary.first_byte(previous).ok_or(cursor)?;
            let learned = self.dictionary.insert(previous, first).map_err(|_| cursor)?;
            self.dictionary
                .reconstruct(learned, &mut self.phrase)
                .ok_or(cursor)
        } else {
            Err(cursor)
        }
    }
}

impl Default for CodeDecoder {
    fn default() -> Self {
        CodeDecoder::new()
    }
}

impl Decoder {
    /// Create a new decoder with a fresh dictionary.
    pub fn new() -> Self {
        Decoder {
            state: Box::new(DecodeState::new()),
        }
    }

    /// Decode some bytes from `inp` and write result to `out`.
    ///
    /// This will consume a prefix of the input buffer and write decoded output into a prefix of
    /// the output buffer. See the respective fields of the return value for the count of consumed
    /// and written bytes. For the next call you should have adjusted the inputs accordingly.
    ///
    /// The status indicates whether the end of the stream has been reached. Call [`finish`] once
    /// the input is exhausted so that the end of the data is accepted as the end of the stream.
    ///
    /// [`finish`]: #method.finish
    pub fn decode_bytes(&mut self, inp: &[u8], out: &mut [u8]) -> StreamResult {
        self.state.advance(inp, out)
    }

    /// Construct a decoder into a writer.
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            decoder: self,
            writer,
        }
    }

    /// Construct a decoder into a vector.
    ///
    /// All decoded data is appended and the vector is __not__ cleared.
    pub fn into_vec<'lt>(&'lt mut self, vec: &'lt mut Vec<u8>) -> IntoVec<'lt> {
        IntoVec {
            decoder: self,
            vector: vec,
        }
    }

    /// Construct a decoder into an async writer.
    #[cfg(feature = "async")]
    pub fn into_async<W: futures::io::AsyncWrite>(&mut self, writer: W) -> IntoAsync<'_, W> {
        IntoAsync {
            decoder: self,
            writer,
        }
    }

    /// Mark the input as complete.
    ///
    /// Running out of input afterwards ends the stream, provided it stopped on a group boundary.
    pub fn finish(&mut self) {
        self.state.has_ended = true;
    }

    /// Check if the end of the stream has been reached and all output has been handed out.
    pub fn has_ended(&self) -> bool {
        self.state.done && self.state.buffer.is_empty()
    }

    /// The dictionary of this session.
    pub fn dictionary(&self) -> &Dictionary {
        self.state.codes.dictionary()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

impl<W: Write> IntoStream<'_, W> {
    /// Decode data from a reader.
    ///
    /// This will read data until the stream is empty or the sentinel is encountered. Running out
    /// of data is not treated as the end of the stream.
    pub fn decode(&mut self, read: impl BufRead) -> AllResult {
        self.decode_part(read, false)
    }

    /// Decode data from a reader until its end.
    pub fn decode_all(mut self, read: impl BufRead) -> AllResult {
        self.decode_part(read, true)
    }

    fn decode_part(&mut self, mut read: impl BufRead, finish: bool) -> AllResult {
        let IntoStream { decoder, writer } = self;
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
        let once = move || -> Result<Progress> {
            let data = read.fill_buf().map_err(LzwError::InputUnavailable)?;

            if data.is_empty() {
                if finish {
                    decoder.finish();
                } else {
                    return Ok(Progress::Done);
                }
            }

            let result = decoder.decode_bytes(data, &mut outbuf[..]);
            *read_bytes += result.consumed_in;
            *write_bytes += result.consumed_out;
            read.consume(result.consumed_in);

            // Output decoded ahead of an error is still handed out.
            sink.write_all(&outbuf[..result.consumed_out])
                .map_err(LzwError::OutputUnavailable)?;
            let done = result.status?;

            match done {
                LzwStatus::Ok => Ok(Progress::Ok),
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
            .collect::<Result<()>>();
        let flushed = writer.flush().map_err(LzwError::OutputUnavailable);
        let status = status.and(flushed);

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

impl IntoVec<'_> {
    /// Decode data from a slice.
    ///
    /// The end of the slice is not treated as the end of the stream.
    pub fn decode(&mut self, read: &[u8]) -> AllResult {
        self.decode_part(read, false)
    }

    /// Decode data from a slice holding the rest of the stream.
    pub fn decode_all(mut self, read: &[u8]) -> AllResult {
        self.decode_part(read, true)
    }

    fn decode_part(&mut self, mut read: &[u8], finish: bool) -> AllResult {
        if finish {
            self.decoder.finish();
        }

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let status = loop {
            let start = self.vector.len();
            self.vector.resize(start + STREAM_BUF_SIZE, 0);
            let result = self.decoder.decode_bytes(read, &mut self.vector[start..]);
            self.vector.truncate(start + result.consumed_out);

            read = &read[result.consumed_in..];
            bytes_read += result.consumed_in;
            bytes_written += result.consumed_out;

            match result.status {
                Err(err) => break Err(err),
                Ok(LzwStatus::Done) | Ok(LzwStatus::NoProgress) => break Ok(()),
                Ok(LzwStatus::Ok) => {
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
    /// Decode data from a reader.
    ///
    /// Running out of data is not treated as the end of the stream.
    pub async fn decode(
        &mut self,
        read: impl futures::io::AsyncBufRead + core::marker::Unpin,
    ) -> AllResult {
        self.decode_part(read, false).await
    }

    /// Decode data from a reader until its end.
    pub async fn decode_all(
        mut self,
        read: impl futures::io::AsyncBufRead + core::marker::Unpin,
    ) -> AllResult {
        self.decode_part(read, true).await
    }

    async fn decode_part(
        &mut self,
        mut read: impl futures::io::AsyncBufRead + core::marker::Unpin,
        finish: bool,
    ) -> AllResult {
        use futures::io::{AsyncBufReadExt, AsyncWriteExt};

        let IntoAsync { decoder, writer } = self;
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
                    decoder.finish();
                } else {
                    break Ok(());
                }
            }

            let result = decoder.decode_bytes(data, &mut outbuf[..]);
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

        let flushed = writer.flush().await.map_err(LzwError::OutputUnavailable);
        let status = status.and(flushed);

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

impl DecodeState {
    fn new() -> Self {
        DecodeState {
            codes: CodeDecoder::new(),
            reader: CodeReader::new(),
            buffer: Buffer::new(),
            has_ended: false,
            done: false,
        }
    }

    fn advance(&mut self, mut inp: &[u8], mut out: &mut [u8]) -> StreamResult {
        let o_in = inp.len();
        let o_out = out.len();
        let mut status = Ok(LzwStatus::Ok);

        loop {
            self.buffer.push_out(&mut out);
            if !self.buffer.is_empty() || self.done {
                break;
            }

            let code = match self.reader.read_code(&mut inp) {
                Some(code) => code,
                None if self.has_ended => {
                    match self.reader.finish() {
                        Ok(()) => self.end(),
                        Err(err) => status = Err(err),
                    }
                    break;
                }
                None => break,
            };

            let sentinel = match self.codes.next_phrase(code) {
                Ok(Some(phrase)) => {
                    self.buffer.fill(phrase);
                    false
                }
                Ok(None) => true,
                Err(err) => {
                    status = Err(err);
                    break;
                }
            };

            if sentinel {
                self.end();
            }
        }

        let consumed_in = o_in - inp.len();
        let consumed_out = o_out - out.len();
        if status.is_ok() {
            status = if self.done && self.buffer.is_empty() {
                Ok(LzwStatus::Done)
            } else if consumed_in == 0 && consumed_out == 0 {
                Ok(LzwStatus::NoProgress)
            } else {
                Ok(LzwStatus::Ok)
            };
        }

        StreamResult {
            consumed_in,
            consumed_out,
            status,
        }
    }

    fn end(&mut self) {
        if !self.done {
            self.done = true;
            log::debug!(
                "decoding finished, dictionary generation {} at code {}",
                self.codes.dictionary().generation(),
                self.codes.dictionary().cursor()
            );
        }
    }
}

impl Buffer {
    fn new() -> Self {
        Buffer {
            bytes: [0; MAX_PHRASE],
            read_mark: 0,
            write_mark: 0,
        }
    }

    fn fill(&mut self, phrase: &[u8]) {
        debug_assert!(self.is_empty());
        self.bytes[..phrase.len()].copy_from_slice(phrase);
        self.read_mark = 0;
        self.write_mark = phrase.len();
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
