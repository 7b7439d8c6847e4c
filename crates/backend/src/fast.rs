//! Fast backend: native-layout elements, `u64` length and count prefixes.
//!
//! Meant for peers on the same kind of host. Integers keep their native
//! byte order; floats are decomposed (see [`crate::element`]).

use crate::backend::{DeserializerBackend, ReadProgress, SerializerBackend, WriteProgress};
use crate::element::{self, Element, SIZE_WIRE_SIZE};
use spool_core::{
    DeserializationErrorCode, DeserializationErrors, SerializationErrorCode, SerializationErrors,
};
use spool_io::{DataSink, DataSource};

/// Identifier reported by both halves of the fast backend.
pub const FAST_BACKEND_ID: &str = "FastLocal";

/// Serializer half of the fast backend.
#[derive(Debug)]
pub struct FastSerializer<S: DataSink> {
    sink: S,
    scratch: Vec<u8>,
}

impl<S: DataSink> FastSerializer<S> {
    /// Create a serializer writing to `sink`.
    pub fn new(sink: S) -> Self {
        FastSerializer {
            sink,
            scratch: Vec::new(),
        }
    }

    /// Swap in a new sink, returning the previous one.
    pub fn replace_sink(&mut self, sink: S) -> S {
        std::mem::replace(&mut self.sink, sink)
    }

    /// Consume the serializer and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn write_size(&mut self, size: usize) -> SerializationErrors {
        self.write_value(size as u64)
    }
}

impl<S: DataSink> SerializerBackend for FastSerializer<S> {
    type Sink = S;

    fn type_id(&self) -> &'static str {
        FAST_BACKEND_ID
    }

    fn sink(&self) -> &S {
        &self.sink
    }

    fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn write<T: Element>(&mut self, values: &[T]) -> WriteProgress {
        let can_do = self.sink.remaining_size() / T::WIRE_SIZE;
        let (todo, mut errors) = if can_do < values.len() {
            (
                &values[..can_do],
                SerializationErrors::from(SerializationErrorCode::IncompleteWrite),
            )
        } else {
            (values, SerializationErrors::none())
        };

        self.scratch.clear();
        self.scratch.resize(todo.len() * T::WIRE_SIZE, 0);
        element::encode_into(todo, &mut self.scratch);

        let (accepted, sink_errors) = self.sink.write_some(&self.scratch);
        errors |= sink_errors;
        WriteProgress::new(accepted / T::WIRE_SIZE, errors)
    }

    fn write_strings<T: AsRef<str>>(&mut self, values: &[T]) -> WriteProgress {
        let mut done = 0;
        for value in values {
            let bytes = value.as_ref().as_bytes();
            if self.sink.remaining_size() < SIZE_WIRE_SIZE + bytes.len() {
                return WriteProgress::new(done, SerializationErrorCode::IncompleteWrite.into());
            }
            let errors = self.write_size(bytes.len());
            if !errors.is_empty() {
                return WriteProgress::new(done, errors);
            }
            let errors = self.sink.write(bytes);
            if !errors.is_empty() {
                return WriteProgress::new(done, errors);
            }
            done += 1;
        }
        WriteProgress::new(done, SerializationErrors::none())
    }

    fn begin_struct(&mut self, member_count: usize) -> SerializationErrors {
        self.write_size(member_count)
    }

    fn begin_list(&mut self, element_count: usize) -> SerializationErrors {
        self.write_size(element_count)
    }
}

/// Deserializer half of the fast backend.
#[derive(Debug)]
pub struct FastDeserializer<S: DataSource> {
    source: S,
}

impl<S: DataSource> FastDeserializer<S> {
    /// Create a deserializer reading from `source`.
    pub fn new(source: S) -> Self {
        FastDeserializer { source }
    }

    /// Swap in a new source, returning the previous one.
    pub fn replace_source(&mut self, source: S) -> S {
        std::mem::replace(&mut self.source, source)
    }

    /// Consume the deserializer and return its source.
    pub fn into_source(self) -> S {
        self.source
    }

    fn not_enough_data(&self) -> DeserializationErrors {
        self.source.status() | DeserializationErrorCode::NotEnoughData
    }

    fn read_size(&mut self) -> Result<usize, DeserializationErrors> {
        let size: u64 = self.read_value()?;
        usize::try_from(size).map_err(|_| DeserializationErrorCode::InvalidFormat.into())
    }
}

impl<S: DataSource> DeserializerBackend for FastDeserializer<S> {
    type Source = S;

    fn type_id(&self) -> &'static str {
        FAST_BACKEND_ID
    }

    fn source(&self) -> &S {
        &self.source
    }

    fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn read<T: Element>(&mut self, values: &mut [T]) -> ReadProgress {
        if values.is_empty() {
            return ReadProgress::new(0, DeserializationErrors::none());
        }
        let available = self.source.top(values.len() * T::WIRE_SIZE);
        if available.len() < T::WIRE_SIZE {
            return ReadProgress::new(0, self.not_enough_data());
        }

        let count = available.len() / T::WIRE_SIZE;
        let mut errors = DeserializationErrors::none();
        if count < values.len() {
            errors |= DeserializationErrorCode::IncompleteRead;
        }

        let mut done = 0;
        for (slot, bytes) in values
            .iter_mut()
            .zip(available.chunks_exact(T::WIRE_SIZE))
            .take(count)
        {
            match T::decode(bytes) {
                Some(value) => *slot = value,
                None => {
                    errors |= DeserializationErrorCode::InvalidFormat;
                    break;
                }
            }
            done += 1;
        }
        self.source.pop(done * T::WIRE_SIZE);
        ReadProgress::new(done, errors)
    }

    fn read_strings(&mut self, values: &mut [String]) -> ReadProgress {
        let mut done = 0;
        for value in values.iter_mut() {
            let head = self.source.top(SIZE_WIRE_SIZE);
            if head.len() < SIZE_WIRE_SIZE {
                return ReadProgress::new(done, self.not_enough_data());
            }
            let len = match u64::decode(head).and_then(|len| usize::try_from(len).ok()) {
                Some(len) => len,
                None => {
                    return ReadProgress::new(done, DeserializationErrorCode::InvalidFormat.into())
                }
            };
            let total = match len.checked_add(SIZE_WIRE_SIZE) {
                Some(total) => total,
                None => {
                    return ReadProgress::new(done, DeserializationErrorCode::InvalidFormat.into())
                }
            };

            let block = self.source.top(total);
            if block.len() < total {
                return ReadProgress::new(done, self.not_enough_data());
            }
            match std::str::from_utf8(&block[SIZE_WIRE_SIZE..]) {
                Ok(text) => {
                    value.clear();
                    value.push_str(text);
                }
                Err(_) => {
                    return ReadProgress::new(done, DeserializationErrorCode::InvalidFormat.into())
                }
            }
            self.source.pop(total);
            done += 1;
        }
        ReadProgress::new(done, DeserializationErrors::none())
    }

    fn begin_struct(&mut self) -> Result<usize, DeserializationErrors> {
        self.read_size()
    }

    fn begin_list(&mut self) -> Result<usize, DeserializationErrors> {
        self.read_size()
    }
}
