//! Test doubles for sinks, sources and streams.
//!
//! - [`FailingWriter`]: accepts a fixed number of bytes, then errors
//! - [`TrickleReader`]: returns data a few bytes per read, optionally failing
//! - [`LimitedSink`]: owned bounded sink with failure injection
//!
//! These are used by unit and integration tests across the workspace.

use crate::sink::{DataSink, TransactionHandle, TransactionStack};
use spool_core::{SerializationErrorCode, SerializationErrors};
use std::io::{self, Read, Write};

/// Writer that accepts `limit` bytes and then fails with a chosen error kind.
#[derive(Debug)]
pub struct FailingWriter {
    written: Vec<u8>,
    limit: usize,
    kind: io::ErrorKind,
}

impl FailingWriter {
    /// Create a writer failing with `kind` once `limit` bytes went in.
    pub fn new(limit: usize, kind: io::ErrorKind) -> Self {
        FailingWriter {
            written: Vec::new(),
            limit,
            kind,
        }
    }

    /// Bytes accepted so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit - self.written.len();
        if room == 0 && !buf.is_empty() {
            return Err(io::Error::new(self.kind, "injected write failure"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader handing out at most `step` bytes per call.
#[derive(Debug)]
pub struct TrickleReader {
    data: Vec<u8>,
    pos: usize,
    step: usize,
    fail_at: Option<usize>,
}

impl TrickleReader {
    /// Create a reader over `data` delivering `step` bytes per read.
    pub fn new(data: Vec<u8>, step: usize) -> Self {
        TrickleReader {
            data,
            pos: 0,
            step: step.max(1),
            fail_at: None,
        }
    }

    /// Fail every read once `offset` bytes have been delivered.
    pub fn failing_after(mut self, offset: usize) -> Self {
        self.fail_at = Some(offset);
        self
    }

    /// Bytes delivered so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Read for TrickleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut end = self.data.len();
        if let Some(fail_at) = self.fail_at {
            if self.pos >= fail_at {
                return Err(io::Error::new(io::ErrorKind::Other, "injected read failure"));
            }
            end = end.min(fail_at);
        }
        let n = buf.len().min(self.step).min(end - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Owned sink holding at most `limit` bytes.
///
/// Behaves like a block sink over its own buffer. After
/// [`fail_after_writes`](Self::fail_after_writes) successful writes, every
/// further write reports `DataSinkError` without storing anything.
#[derive(Debug, Clone, Default)]
pub struct LimitedSink {
    data: Vec<u8>,
    limit: usize,
    transactions: TransactionStack<usize>,
    writes: usize,
    fail_after: Option<usize>,
}

impl LimitedSink {
    /// Create an empty sink accepting up to `limit` bytes.
    pub fn new(limit: usize) -> Self {
        LimitedSink {
            limit,
            ..Default::default()
        }
    }

    /// Inject a medium failure after `writes` calls to `write`.
    pub fn fail_after_writes(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Bytes held.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the held bytes, leaving the sink empty.
    pub fn take(&mut self) -> Vec<u8> {
        self.transactions.clear();
        std::mem::take(&mut self.data)
    }

    /// Number of `write` calls seen.
    pub fn write_calls(&self) -> usize {
        self.writes
    }
}

impl DataSink for LimitedSink {
    fn write(&mut self, data: &[u8]) -> SerializationErrors {
        self.writes += 1;
        if self.fail_after.is_some_and(|n| self.writes > n) {
            return SerializationErrorCode::DataSinkError.into();
        }
        let n = data.len().min(self.remaining_size());
        self.data.extend_from_slice(&data[..n]);
        if n < data.len() {
            SerializationErrorCode::IncompleteWrite.into()
        } else {
            SerializationErrors::none()
        }
    }

    fn remaining_size(&self) -> usize {
        self.limit - self.data.len()
    }

    fn begin_work(&mut self) -> TransactionHandle {
        self.transactions.begin(self.data.len())
    }

    fn commit(&mut self, handle: TransactionHandle) -> SerializationErrors {
        match self.transactions.close(handle) {
            Some(_) => SerializationErrors::none(),
            None => SerializationErrorCode::InvalidTransaction.into(),
        }
    }

    fn rollback(&mut self, handle: TransactionHandle) -> SerializationErrors {
        match self.transactions.close(handle) {
            Some(saved) => {
                self.data.truncate(saved);
                SerializationErrors::none()
            }
            None => SerializationErrorCode::InvalidTransaction.into(),
        }
    }
}
