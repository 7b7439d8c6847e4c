//! Serializer and deserializer backend traits.
//!
//! A backend turns typed values into bytes on a [`DataSink`] (or back from a
//! [`DataSource`]). Element operations report partial progress through
//! [`Progress`]; structural operations (`begin_struct`, `begin_list`, ...)
//! report only an error set, since they either happen or they don't.

use crate::element::Element;
use spool_core::{
    DeserializationErrorCode, DeserializationErrors, SerializationErrorCode, SerializationErrors,
};
use spool_io::{DataSink, DataSource};

/// Outcome of an element-level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<E> {
    /// Number of whole elements written or read.
    pub done: usize,
    /// Errors raised along the way; empty on full success.
    pub errors: E,
}

impl<E> Progress<E> {
    /// Create a progress report.
    pub fn new(done: usize, errors: E) -> Self {
        Progress { done, errors }
    }
}

/// Progress of a write.
pub type WriteProgress = Progress<SerializationErrors>;

/// Progress of a read.
pub type ReadProgress = Progress<DeserializationErrors>;

/// Encodes typed values into a sink.
pub trait SerializerBackend {
    /// Sink the backend writes to.
    type Sink: DataSink;

    /// Short identifier of the wire format.
    fn type_id(&self) -> &'static str;

    /// Borrow the sink.
    fn sink(&self) -> &Self::Sink;

    /// Mutably borrow the sink.
    fn sink_mut(&mut self) -> &mut Self::Sink;

    /// Bytes the sink can still accept.
    fn remaining_size(&self) -> usize {
        self.sink().remaining_size()
    }

    /// Starts a top-level value.
    fn begin(&mut self) -> SerializationErrors {
        SerializationErrors::none()
    }

    /// Writes as many whole elements of `values` as fit.
    fn write<T: Element>(&mut self, values: &[T]) -> WriteProgress;

    /// Writes whole strings, each with its length prefix.
    fn write_strings<S: AsRef<str>>(&mut self, values: &[S]) -> WriteProgress;

    /// Writes exactly one element.
    ///
    /// A value that does not fit at all reports `TooMuchData`.
    fn write_value<T: Element>(&mut self, value: T) -> SerializationErrors {
        let progress = self.write(std::slice::from_ref(&value));
        if progress.done == 0 && progress.errors.has_at_most(SerializationErrorCode::IncompleteWrite)
        {
            return SerializationErrorCode::TooMuchData.into();
        }
        progress.errors
    }

    /// Starts a struct with `member_count` members.
    fn begin_struct(&mut self, member_count: usize) -> SerializationErrors;

    /// Starts the member called `name`.
    fn begin_member(&mut self, _name: &str) -> SerializationErrors {
        SerializationErrors::none()
    }

    /// Finishes the member called `name`.
    fn finish_member(&mut self, _name: &str) -> SerializationErrors {
        SerializationErrors::none()
    }

    /// Finishes the current struct.
    fn finish_struct(&mut self) -> SerializationErrors {
        SerializationErrors::none()
    }

    /// Starts a list of `element_count` elements.
    fn begin_list(&mut self, element_count: usize) -> SerializationErrors;

    /// Starts the list element at `index`.
    fn begin_element(&mut self, _index: usize) -> SerializationErrors {
        SerializationErrors::none()
    }

    /// Finishes the list element at `index`.
    fn finish_element(&mut self, _index: usize) -> SerializationErrors {
        SerializationErrors::none()
    }

    /// Finishes the current list.
    fn finish_list(&mut self) -> SerializationErrors {
        SerializationErrors::none()
    }

    /// Finishes the top-level value and finalizes the sink.
    fn finish(&mut self) -> SerializationErrors {
        self.sink_mut().finalize()
    }
}

/// Decodes typed values from a source.
pub trait DeserializerBackend {
    /// Source the backend reads from.
    type Source: DataSource;

    /// Short identifier of the wire format.
    fn type_id(&self) -> &'static str;

    /// Borrow the source.
    fn source(&self) -> &Self::Source;

    /// Mutably borrow the source.
    fn source_mut(&mut self) -> &mut Self::Source;

    /// Starts a top-level value.
    fn begin(&mut self) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Reads as many whole elements into `values` as are available.
    fn read<T: Element>(&mut self, values: &mut [T]) -> ReadProgress;

    /// Reads whole strings, each with its length prefix.
    fn read_strings(&mut self, values: &mut [String]) -> ReadProgress;

    /// Reads exactly one element.
    fn read_value<T: Element>(&mut self) -> Result<T, DeserializationErrors> {
        let mut value = T::default();
        let progress = self.read(std::slice::from_mut(&mut value));
        if progress.done == 1 && progress.errors.is_empty() {
            Ok(value)
        } else {
            Err(progress.errors)
        }
    }

    /// Starts a struct and returns its announced member count.
    fn begin_struct(&mut self) -> Result<usize, DeserializationErrors>;

    /// Starts the member called `name`.
    fn begin_member(&mut self, _name: &str) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Finishes the member called `name`.
    fn finish_member(&mut self, _name: &str) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Finishes the current struct.
    fn finish_struct(&mut self) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Starts a list and returns its announced element count.
    fn begin_list(&mut self) -> Result<usize, DeserializationErrors>;

    /// Starts the list element at `index`.
    fn begin_element(&mut self, _index: usize) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Finishes the list element at `index`.
    fn finish_element(&mut self, _index: usize) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Finishes the current list.
    fn finish_list(&mut self) -> DeserializationErrors {
        DeserializationErrors::none()
    }

    /// Finishes the top-level value.
    fn finish(&mut self) -> DeserializationErrors {
        DeserializationErrors::none()
    }
}

/// Writes `values` as a list: count, then every element.
pub fn write_list<B, T>(backend: &mut B, values: &[T]) -> SerializationErrors
where
    B: SerializerBackend,
    T: Element,
{
    let mut errors = backend.begin_list(values.len());
    if errors.is_empty() {
        let progress = backend.write(values);
        errors |= progress.errors;
        errors |= backend.finish_list();
    }
    errors
}

/// Reads a list into a fixed-size slot.
///
/// A shorter announced list reports `MissingElement` and reads nothing.
/// A longer one reports `ExcessElement` but still fills `values`.
pub fn read_list_into<B, T>(backend: &mut B, values: &mut [T]) -> DeserializationErrors
where
    B: DeserializerBackend,
    T: Element,
{
    let count = match backend.begin_list() {
        Ok(count) => count,
        Err(errors) => return errors,
    };
    let mut errors = DeserializationErrors::none();
    if count < values.len() {
        errors |= DeserializationErrorCode::MissingElement;
    } else if count > values.len() {
        errors |= DeserializationErrorCode::ExcessElement;
    }
    if errors.has_at_most(DeserializationErrorCode::ExcessElement) {
        errors |= backend.read(values).errors;
        errors |= backend.finish_list();
    }
    errors
}

/// Reads a list of any announced length, up to `max_len` elements.
pub fn read_list<B, T>(backend: &mut B, max_len: usize) -> Result<Vec<T>, DeserializationErrors>
where
    B: DeserializerBackend,
    T: Element,
{
    let count = backend.begin_list()?;
    if count > max_len {
        return Err(DeserializationErrorCode::ExcessElement.into());
    }
    let mut values = vec![T::default(); count];
    let progress = backend.read(&mut values);
    progress.errors.into_result()?;
    backend.finish_list().into_result()?;
    Ok(values)
}
