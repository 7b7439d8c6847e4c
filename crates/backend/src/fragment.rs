//! Fragmented transfer of large element slices.
//!
//! A payload too big for one sink cycle goes out as a series of fragments.
//! Each fragment is self-describing:
//!
//! ```text
//! +--------------+-----------------+------------------------+
//! | offset (u64) | remaining (u64) | elements (as many fit) |
//! +--------------+-----------------+------------------------+
//! ```
//!
//! `offset` is the index of the first element in the fragment, `remaining`
//! the number of elements the sender still had left. The receiver reads
//! elements until its source runs dry, so a fragment always ends where the
//! sink cycle ended.

use crate::backend::{DeserializerBackend, SerializerBackend};
use crate::element::{Element, SIZE_WIRE_SIZE};
use spool_core::{
    DeserializationErrorCode, DeserializationErrors, SerializationErrorCode, SerializationErrors,
};
use spool_io::{DataSink, DataSource};

/// Encoded size of a fragment header.
pub const FRAGMENT_HEADER_SIZE: usize = 2 * SIZE_WIRE_SIZE;

/// Sending cursor over a slice of elements.
#[derive(Debug, Clone)]
pub struct FragmentSerializer<'a, T> {
    src: &'a [T],
    offset: usize,
}

impl<'a, T: Element> FragmentSerializer<'a, T> {
    /// Create a cursor at the start of `src`.
    pub fn new(src: &'a [T]) -> Self {
        FragmentSerializer { src, offset: 0 }
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// True when there is nothing to send at all.
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// Index of the next element to send.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Elements not sent yet.
    pub fn remaining(&self) -> &'a [T] {
        &self.src[self.offset..]
    }

    /// Moves the cursor forward by `count` elements.
    pub fn advance(&mut self, count: usize) {
        self.offset += count.min(self.src.len() - self.offset);
    }

    /// True once every element was sent.
    pub fn is_done(&self) -> bool {
        self.offset == self.src.len()
    }

    /// Writes one fragment.
    ///
    /// The cursor moves only when the result is empty or holds just
    /// `IncompleteWrite`. A header that fits without room for a single
    /// element is rolled back and reported as `TooMuchData`; flush the
    /// sink and call again.
    pub fn write<B: SerializerBackend>(&mut self, backend: &mut B) -> SerializationErrors {
        if self.is_done() {
            return SerializationErrors::none();
        }
        let todo = self.remaining();

        let handle = backend.sink_mut().begin_work();
        let mut errors = backend.write_value(self.offset as u64);
        if errors.is_empty() {
            errors |= backend.write_value(todo.len() as u64);
        }
        if !errors.is_empty() {
            errors |= backend.sink_mut().rollback(handle);
            return errors;
        }

        let progress = backend.write(todo);
        if progress.done == 0 || !progress.errors.has_at_most(SerializationErrorCode::IncompleteWrite)
        {
            let mut errors = if progress.errors.has_at_most(SerializationErrorCode::IncompleteWrite) {
                SerializationErrors::from(SerializationErrorCode::TooMuchData)
            } else {
                progress.errors
            };
            errors |= backend.sink_mut().rollback(handle);
            return errors;
        }

        let errors = progress.errors | backend.sink_mut().commit(handle);
        if errors.has_at_most(SerializationErrorCode::IncompleteWrite) {
            self.advance(progress.done);
        }
        errors
    }
}

/// Progress through the header of the fragment being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum HeaderState {
    #[default]
    Empty,
    Offset(u64),
    Ready { offset: usize, count: usize },
}

/// Receiving side: fills a target buffer from fragments in any order.
#[derive(Debug, Clone, Default)]
pub struct FragmentDeserializer<T> {
    target: Vec<T>,
    filled: Vec<bool>,
    done_count: usize,
    header: HeaderState,
}

impl<T: Element> FragmentDeserializer<T> {
    /// Create a deserializer with an empty target.
    pub fn new() -> Self {
        FragmentDeserializer {
            target: Vec::new(),
            filled: Vec::new(),
            done_count: 0,
            header: HeaderState::Empty,
        }
    }

    /// Create a deserializer expecting `len` elements.
    pub fn with_len(len: usize) -> Self {
        let mut frag = Self::new();
        frag.set_len(len);
        frag
    }

    /// Binds `target` as the buffer to fill and forgets earlier progress.
    pub fn set_target(&mut self, target: Vec<T>) {
        self.filled = vec![false; target.len()];
        self.target = target;
        self.done_count = 0;
        self.header = HeaderState::Empty;
    }

    /// Binds a default-initialized target of `len` elements.
    pub fn set_len(&mut self, len: usize) {
        self.set_target(vec![T::default(); len]);
    }

    /// Expected number of elements.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// True when the target holds no elements.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Number of distinct elements filled so far.
    ///
    /// Never decreases while the same target stays bound; `set_target` and
    /// `set_len` start it over at zero.
    pub fn done_count(&self) -> usize {
        self.done_count
    }

    /// True once every element was filled.
    pub fn is_done(&self) -> bool {
        self.done_count >= self.target.len()
    }

    /// The target buffer, filled or not.
    pub fn target(&self) -> &[T] {
        &self.target
    }

    /// Consume the deserializer and return the target buffer.
    pub fn into_target(self) -> Vec<T> {
        self.target
    }

    /// Marks `count` elements starting at `offset` as filled.
    pub fn mark_done(&mut self, offset: usize, count: usize) {
        let start = offset.min(self.filled.len());
        let end = start.saturating_add(count).min(self.filled.len());
        for flag in &mut self.filled[start..end] {
            if !*flag {
                *flag = true;
                self.done_count += 1;
            }
        }
    }

    /// True while a fragment is partly read: some of its header, or all of
    /// it but none of its elements.
    pub fn has_pending_header(&self) -> bool {
        self.header != HeaderState::Empty
    }

    /// Reads one fragment into the target.
    ///
    /// Reports `UnexpectedData` when the header points outside the target.
    /// `IncompleteRead` is the normal outcome for every fragment but the
    /// last.
    ///
    /// `NotEnoughData` is always resumable: the part of the header already
    /// read is kept, and the next call, after the source was refilled,
    /// continues where this one stopped.
    pub fn read<B: DeserializerBackend>(&mut self, backend: &mut B) -> DeserializationErrors {
        if self.header == HeaderState::Empty {
            match backend.read_value::<u64>() {
                Ok(offset) => self.header = HeaderState::Offset(offset),
                Err(errors) => return errors,
            }
        }
        if let HeaderState::Offset(offset) = self.header {
            let size = match backend.read_value::<u64>() {
                Ok(size) => size,
                Err(errors) => return errors,
            };
            let len = self.target.len() as u64;
            if offset > len || (offset == len && size > 0) {
                self.header = HeaderState::Empty;
                return DeserializationErrorCode::UnexpectedData.into();
            }
            // Both fit in usize now: offset <= len and count <= len - offset.
            self.header = HeaderState::Ready {
                offset: offset as usize,
                count: size.min(len - offset) as usize,
            };
        }

        let (offset, count) = match std::mem::take(&mut self.header) {
            HeaderState::Ready { offset, count } => (offset, count),
            _ => return DeserializationErrors::none(),
        };
        if count == 0 {
            return DeserializationErrors::none();
        }
        let progress = backend.read(&mut self.target[offset..offset + count]);
        if progress.done == 0 && progress.errors.has(DeserializationErrorCode::NotEnoughData) {
            self.header = HeaderState::Ready { offset, count };
        }
        self.mark_done(offset, progress.done);
        progress.errors
    }
}
