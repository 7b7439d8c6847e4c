//! Byte sink and source abstractions.
//!
//! Every serializer writes through a [`DataSink`] and every deserializer
//! reads through a [`DataSource`]. Neither trait returns `Result`: steps
//! report an error bitset instead, and callers OR those together as they go.

use smallvec::SmallVec;
use spool_core::{DeserializationErrors, SerializationErrorCode, SerializationErrors};
use tracing::debug;

/// Default number of bytes fetched per iteration by the scanning helpers.
pub const DEFAULT_SCAN_STEP: usize = 256;

/// Token for one open transaction on a sink.
///
/// Holds the nesting depth the transaction was opened at and a serial
/// number no other transaction of the same sink ever gets. Transactions must
/// be closed innermost first; a sink rejects any other handle, including one
/// whose transaction is already closed, with `InvalidTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    depth: usize,
    serial: u64,
}

impl TransactionHandle {
    /// Create a handle for nesting depth `depth` (1 = outermost).
    pub const fn new(depth: usize, serial: u64) -> Self {
        TransactionHandle { depth, serial }
    }

    /// Nesting depth of this transaction.
    pub const fn depth(self) -> usize {
        self.depth
    }

    /// Serial number of this transaction within its sink.
    pub const fn serial(self) -> u64 {
        self.serial
    }
}

/// Open transactions of a sink, innermost last.
///
/// Each entry keeps whatever state closing it needs: a save point for
/// block-like sinks, staged bytes for streams. Serials start at 1 and are
/// never reused, not even after [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct TransactionStack<T> {
    open: SmallVec<[(u64, T); 4]>,
    next_serial: u64,
}

impl<T> Default for TransactionStack<T> {
    fn default() -> Self {
        TransactionStack {
            open: SmallVec::new(),
            next_serial: 1,
        }
    }
}

impl<T> TransactionStack<T> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open transactions.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// True when no transaction is open.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Opens a transaction holding `state`.
    pub fn begin(&mut self, state: T) -> TransactionHandle {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1).max(1);
        self.open.push((serial, state));
        TransactionHandle::new(self.open.len(), serial)
    }

    /// State of the innermost open transaction.
    pub fn innermost_mut(&mut self) -> Option<&mut T> {
        self.open.last_mut().map(|(_, state)| state)
    }

    /// Closes the innermost transaction if `handle` is its handle.
    ///
    /// Returns `None`, leaving the stack untouched, for any other handle.
    pub fn close(&mut self, handle: TransactionHandle) -> Option<T> {
        match self.open.last() {
            Some((serial, _))
                if *serial == handle.serial() && self.open.len() == handle.depth() =>
            {
                self.open.pop().map(|(_, state)| state)
            }
            _ => {
                debug!(
                    depth = handle.depth(),
                    serial = handle.serial(),
                    open = self.open.len(),
                    "Rejected transaction handle"
                );
                None
            }
        }
    }

    /// Drops every open transaction; their handles become stale.
    pub fn clear(&mut self) {
        self.open.clear();
    }
}

/// Destination of serialized bytes.
pub trait DataSink {
    /// Writes as much of `data` as fits.
    ///
    /// Accepting only a prefix reports `IncompleteWrite`; the accepted
    /// prefix is `min(remaining_size(), data.len())` bytes.
    fn write(&mut self, data: &[u8]) -> SerializationErrors;

    /// Bytes the sink can still accept.
    fn remaining_size(&self) -> usize;

    /// Writes as much of `data` as fits and reports how many bytes went in.
    ///
    /// The count is zero when any error other than `IncompleteWrite` is set.
    fn write_some(&mut self, data: &[u8]) -> (usize, SerializationErrors) {
        let before = self.remaining_size();
        let errors = self.write(data);
        if errors.is_empty() {
            (data.len(), errors)
        } else if errors.has_at_most(SerializationErrorCode::IncompleteWrite) {
            (before.min(data.len()), errors)
        } else {
            (0, errors)
        }
    }

    /// Opens a transaction; writes after this point can be rolled back.
    fn begin_work(&mut self) -> TransactionHandle;

    /// Keeps the writes of the innermost transaction.
    fn commit(&mut self, handle: TransactionHandle) -> SerializationErrors;

    /// Discards the writes of the innermost transaction.
    fn rollback(&mut self, handle: TransactionHandle) -> SerializationErrors;

    /// Completes the output, e.g. by flushing an underlying stream.
    fn finalize(&mut self) -> SerializationErrors {
        SerializationErrors::none()
    }
}

/// Origin of bytes to deserialize.
pub trait DataSource {
    /// Returns up to `n` bytes from the front without consuming them.
    ///
    /// A shorter slice means no more data is available right now.
    fn top(&mut self, n: usize) -> &[u8];

    /// Consumes `n` bytes from the front.
    fn pop(&mut self, n: usize);

    /// Failures of the underlying medium seen so far.
    fn status(&self) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Position of the first byte, within `max` bytes of the front, for
    /// which `predicate` holds. Fetches `step` more bytes per iteration.
    fn scan_until<P>(&mut self, mut predicate: P, max: usize, step: usize) -> Option<usize>
    where
        P: FnMut(u8) -> bool,
        Self: Sized,
    {
        let step = step.max(1);
        let mut start = 0;
        let mut total = step;
        loop {
            let block = self.top(total);
            if let Some(found) = block.iter().skip(start).position(|b| predicate(*b)) {
                let pos = start + found;
                return (pos < max).then_some(pos);
            }
            if block.len() < total || total >= max {
                return None;
            }
            start = total;
            total += step;
        }
    }

    /// Position of the first occurrence of `what` within `max` bytes.
    fn scan_for(&mut self, what: u8, max: usize, step: usize) -> Option<usize>
    where
        Self: Sized,
    {
        self.scan_until(|b| b == what, max, step)
    }

    /// Moves every remaining byte into `dst`, `step` bytes at a time.
    fn fetch_all(&mut self, dst: &mut Vec<u8>, step: usize) {
        let step = step.max(1);
        loop {
            let block = self.top(step);
            if block.is_empty() {
                break;
            }
            let len = block.len();
            dst.extend_from_slice(block);
            self.pop(len);
        }
    }
}

impl<S: DataSink + ?Sized> DataSink for &mut S {
    fn write(&mut self, data: &[u8]) -> SerializationErrors {
        (**self).write(data)
    }

    fn remaining_size(&self) -> usize {
        (**self).remaining_size()
    }

    fn write_some(&mut self, data: &[u8]) -> (usize, SerializationErrors) {
        (**self).write_some(data)
    }

    fn begin_work(&mut self) -> TransactionHandle {
        (**self).begin_work()
    }

    fn commit(&mut self, handle: TransactionHandle) -> SerializationErrors {
        (**self).commit(handle)
    }

    fn rollback(&mut self, handle: TransactionHandle) -> SerializationErrors {
        (**self).rollback(handle)
    }

    fn finalize(&mut self) -> SerializationErrors {
        (**self).finalize()
    }
}

impl<S: DataSource + ?Sized> DataSource for &mut S {
    fn top(&mut self, n: usize) -> &[u8] {
        (**self).top(n)
    }

    fn pop(&mut self, n: usize) {
        (**self).pop(n)
    }

    fn status(&self) -> DeserializationErrors {
        (**self).status()
    }
}
