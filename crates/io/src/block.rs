//! Sink and source over a fixed memory block.
//!
//! [`BlockSink`] fills a caller-provided `&mut [u8]` front to back and never
//! grows it; [`BlockSource`] walks a `&[u8]` with a consumption cursor.
//! Both are allocation-free apart from the sink's save-point stack, which
//! stays inline for shallow nesting.

use crate::sink::{DataSink, DataSource, TransactionHandle, TransactionStack};
use spool_core::{SerializationErrorCode, SerializationErrors};

/// Sink writing into a fixed block.
///
/// The block splits into a `done` prefix and a `free` suffix; their lengths
/// always add up to [`capacity`](Self::capacity).
#[derive(Debug)]
pub struct BlockSink<'a> {
    dst: &'a mut [u8],
    done: usize,
    transactions: TransactionStack<usize>,
}

impl<'a> BlockSink<'a> {
    /// Create a sink over `dst`, initially empty.
    pub fn new(dst: &'a mut [u8]) -> Self {
        BlockSink {
            dst,
            done: 0,
            transactions: TransactionStack::new(),
        }
    }

    /// Replaces the backing block and forgets all progress and transactions.
    pub fn reset(&mut self, dst: &'a mut [u8]) {
        self.dst = dst;
        self.clear();
    }

    /// Forgets all progress and transactions, keeping the backing block.
    pub fn clear(&mut self) {
        self.done = 0;
        self.transactions.clear();
    }

    /// Total size of the backing block.
    pub fn capacity(&self) -> usize {
        self.dst.len()
    }

    /// Bytes written so far.
    pub fn done(&self) -> &[u8] {
        &self.dst[..self.done]
    }

    /// Unwritten remainder of the block.
    pub fn free(&mut self) -> &mut [u8] {
        &mut self.dst[self.done..]
    }

    /// Marks `size` bytes of the free region as written, after the caller
    /// filled them through [`free`](Self::free). Clamped to the free size.
    pub fn mark_used(&mut self, size: usize) -> &mut Self {
        self.done += size.min(self.dst.len() - self.done);
        self
    }

    /// Replaces the whole content with `data`.
    ///
    /// Fails with `TooMuchData`, leaving the sink untouched, when `data` is
    /// larger than the block.
    pub fn replace_with(&mut self, data: &[u8]) -> SerializationErrors {
        if data.len() > self.dst.len() {
            return SerializationErrorCode::TooMuchData.into();
        }
        self.dst[..data.len()].copy_from_slice(data);
        self.done = data.len();
        SerializationErrors::none()
    }

    /// Number of open transactions.
    pub fn open_transactions(&self) -> usize {
        self.transactions.len()
    }
}

impl DataSink for BlockSink<'_> {
    fn write(&mut self, data: &[u8]) -> SerializationErrors {
        let free = self.free();
        if free.len() < data.len() {
            let n = free.len();
            free.copy_from_slice(&data[..n]);
            self.done += n;
            return SerializationErrorCode::IncompleteWrite.into();
        }
        free[..data.len()].copy_from_slice(data);
        self.done += data.len();
        SerializationErrors::none()
    }

    fn remaining_size(&self) -> usize {
        self.dst.len() - self.done
    }

    fn begin_work(&mut self) -> TransactionHandle {
        self.transactions.begin(self.done)
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
                self.done = saved;
                SerializationErrors::none()
            }
            None => SerializationErrorCode::InvalidTransaction.into(),
        }
    }
}

/// Source reading from a fixed block.
#[derive(Debug, Clone, Default)]
pub struct BlockSource<'a> {
    src: &'a [u8],
    done: usize,
}

impl<'a> BlockSource<'a> {
    /// Create a source over `src`.
    pub fn new(src: &'a [u8]) -> Self {
        BlockSource { src, done: 0 }
    }

    /// Replaces the backing block and rewinds.
    pub fn reset(&mut self, src: &'a [u8]) {
        self.src = src;
        self.done = 0;
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.src[self.done..]
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.done
    }
}

impl DataSource for BlockSource<'_> {
    fn top(&mut self, n: usize) -> &[u8] {
        let rest = self.remaining();
        &rest[..n.min(rest.len())]
    }

    fn pop(&mut self, n: usize) {
        self.done += n.min(self.src.len() - self.done);
    }
}
