//! Sink and source over `std::io` streams.

use crate::sink::{DataSink, DataSource, TransactionHandle, TransactionStack};
use spool_core::{
    DeserializationErrorCode, DeserializationErrors, SerializationErrorCode, SerializationErrors,
};
use std::io::{self, Read, Write};
use tracing::{debug, warn};

/// Default read granularity of [`StreamSource`] in bytes.
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

fn map_write_error(err: &io::Error) -> SerializationErrors {
    if err.kind() == io::ErrorKind::WriteZero {
        debug!(error = %err, "Stream sink reached end of stream");
        SerializationErrorCode::TooMuchData.into()
    } else {
        warn!(error = %err, "Stream sink write failed");
        SerializationErrorCode::DataSinkError.into()
    }
}

/// Sink writing to any [`Write`] implementation.
///
/// Writes inside a transaction are staged in memory. Committing the
/// outermost transaction forwards the staged bytes to the stream; rolling
/// back drops them. The stream itself is never rewound.
pub struct StreamSink<W: Write> {
    out: W,
    staged: TransactionStack<Vec<u8>>,
}

impl<W: Write> StreamSink<W> {
    /// Create a sink writing to `out`.
    pub fn new(out: W) -> Self {
        StreamSink {
            out,
            staged: TransactionStack::new(),
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Consume the sink and return the stream. Staged bytes are dropped.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Number of open transactions.
    pub fn open_transactions(&self) -> usize {
        self.staged.len()
    }

    fn write_through(&mut self, data: &[u8]) -> SerializationErrors {
        match self.staged.innermost_mut() {
            Some(stage) => {
                stage.extend_from_slice(data);
                SerializationErrors::none()
            }
            None => match self.out.write_all(data) {
                Ok(()) => SerializationErrors::none(),
                Err(err) => map_write_error(&err),
            },
        }
    }

}

impl<W: Write> DataSink for StreamSink<W> {
    fn write(&mut self, data: &[u8]) -> SerializationErrors {
        self.write_through(data)
    }

    fn remaining_size(&self) -> usize {
        usize::MAX
    }

    fn begin_work(&mut self) -> TransactionHandle {
        self.staged.begin(Vec::new())
    }

    fn commit(&mut self, handle: TransactionHandle) -> SerializationErrors {
        match self.staged.close(handle) {
            Some(stage) => self.write_through(&stage),
            None => SerializationErrorCode::InvalidTransaction.into(),
        }
    }

    fn rollback(&mut self, handle: TransactionHandle) -> SerializationErrors {
        match self.staged.close(handle) {
            Some(_) => SerializationErrors::none(),
            None => SerializationErrorCode::InvalidTransaction.into(),
        }
    }

    fn finalize(&mut self) -> SerializationErrors {
        match self.out.flush() {
            Ok(()) => SerializationErrors::none(),
            Err(err) => map_write_error(&err),
        }
    }
}

/// Source reading from any [`Read`] implementation.
///
/// Lookahead requested through `top` is buffered; the buffer grows by at
/// most one read chunk per read and shrinks back to one chunk once fully
/// consumed. Never reads more from the stream than a `top` request needs.
pub struct StreamSource<R: Read> {
    input: R,
    buffer: Vec<u8>,
    read_chunk: usize,
    eof: bool,
    status: DeserializationErrors,
}

impl<R: Read> StreamSource<R> {
    /// Create a source with the default read chunk.
    pub fn new(input: R) -> Self {
        Self::with_read_chunk(input, DEFAULT_READ_CHUNK)
    }

    /// Create a source growing its buffer by `read_chunk` bytes at a time.
    pub fn with_read_chunk(input: R, read_chunk: usize) -> Self {
        let read_chunk = read_chunk.max(1);
        StreamSource {
            input,
            buffer: Vec::with_capacity(read_chunk),
            read_chunk,
            eof: false,
            status: DeserializationErrors::none(),
        }
    }

    /// Bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// True once the stream reported end of input.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Consume the source and return the stream. Buffered bytes are dropped.
    pub fn into_inner(self) -> R {
        self.input
    }

    fn fill_to(&mut self, n: usize) {
        while self.buffer.len() < n && !self.eof && self.status.is_empty() {
            let start = self.buffer.len();
            let end = start + (n - start).min(self.read_chunk);
            self.buffer.resize(end, 0);
            match self.input.read(&mut self.buffer[start..]) {
                Ok(0) => {
                    self.buffer.truncate(start);
                    self.eof = true;
                }
                Ok(read) => self.buffer.truncate(start + read),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    self.buffer.truncate(start);
                }
                Err(err) => {
                    self.buffer.truncate(start);
                    warn!(error = %err, "Stream source read failed");
                    self.status |= DeserializationErrorCode::DataSourceError;
                }
            }
        }
    }
}

impl<R: Read> DataSource for StreamSource<R> {
    fn top(&mut self, n: usize) -> &[u8] {
        if self.buffer.len() < n {
            self.fill_to(n);
        }
        &self.buffer[..n.min(self.buffer.len())]
    }

    fn pop(&mut self, n: usize) {
        if n >= self.buffer.len() {
            self.buffer.clear();
            self.buffer.shrink_to(self.read_chunk);
        } else {
            self.buffer.drain(..n);
        }
    }

    fn status(&self) -> DeserializationErrors {
        self.status
    }
}
