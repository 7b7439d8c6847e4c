//! Size-prefixed data blocks.
//!
//! A frame is a multi-byte size code (see [`spool_core::multi_byte`])
//! followed by that many bytes of payload. Frames can be packed back to back
//! and walked with [`for_each_data_with_size`]. [`write_frame`] and
//! [`read_frame`] move whole frames through a sink or source, which keeps
//! chunk boundaries intact on a byte stream.

use spool_core::{
    multi_byte, DeserializationErrorCode, DeserializationErrors, SerializationErrorCode,
    SerializationErrors,
};
use spool_io::{DataSink, DataSource};

/// Writes `src` with its size prefix to the start of `dst`.
///
/// Returns the total frame length, or `None` when `dst` is too short or
/// `src` is too large for a size code. `dst` is untouched on failure.
pub fn store_data_with_size(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    let size = u32::try_from(src.len()).ok()?;
    let prefix_len = multi_byte::required_sequence_length(size)?;
    let total = prefix_len + src.len();
    if total > dst.len() {
        return None;
    }
    let written = multi_byte::encode_code_point(size, dst)?;
    dst[written..total].copy_from_slice(src);
    Some(total)
}

fn frame_bounds(src: &[u8]) -> Option<(usize, usize)> {
    let (size, prefix_len) = multi_byte::decode_code_point(src)?;
    let size = usize::try_from(size).ok()?;
    let end = prefix_len.checked_add(size)?;
    (end <= src.len()).then_some((prefix_len, end))
}

/// Payload of the frame at the start of `src`.
pub fn get_data_with_size(src: &[u8]) -> Option<&[u8]> {
    frame_bounds(src).map(|(start, end)| &src[start..end])
}

/// Mutable payload of the frame at the start of `src`.
pub fn get_data_with_size_mut(src: &mut [u8]) -> Option<&mut [u8]> {
    let (start, end) = frame_bounds(src)?;
    Some(&mut src[start..end])
}

/// Length of the whole frame at the start of `src`, or 0 if there is none.
pub fn skip_data_with_size(src: &[u8]) -> usize {
    frame_bounds(src).map_or(0, |(_, end)| end)
}

/// Iterator over the payloads of back-to-back frames.
///
/// Stops at the end of input, at the first malformed or truncated frame,
/// and at the first empty payload.
#[derive(Debug, Clone)]
pub struct DataWithSizeIter<'a> {
    rest: &'a [u8],
}

impl<'a> DataWithSizeIter<'a> {
    /// Bytes not yet walked over.
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for DataWithSizeIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let (start, end) = frame_bounds(self.rest)?;
        if start == end {
            return None;
        }
        let data = &self.rest[start..end];
        self.rest = &self.rest[end..];
        Some(data)
    }
}

/// Walks the frames packed in `src`.
pub fn for_each_data_with_size(src: &[u8]) -> DataWithSizeIter<'_> {
    DataWithSizeIter { rest: src }
}

/// Writes `data` as one frame, or nothing at all.
///
/// A frame that does not fit reports `TooMuchData`; a failing sink has the
/// partial frame rolled back.
pub fn write_frame<S: DataSink>(sink: &mut S, data: &[u8]) -> SerializationErrors {
    let mut head = [0u8; multi_byte::MAX_SEQUENCE_LENGTH];
    let prefix_len = match u32::try_from(data.len())
        .ok()
        .and_then(|size| multi_byte::encode_code_point(size, &mut head))
    {
        Some(len) => len,
        None => return SerializationErrorCode::TooMuchData.into(),
    };
    if sink.remaining_size() < prefix_len + data.len() {
        return SerializationErrorCode::TooMuchData.into();
    }

    let handle = sink.begin_work();
    let mut errors = sink.write(&head[..prefix_len]);
    if errors.is_empty() {
        errors |= sink.write(data);
    }
    if errors.is_empty() {
        sink.commit(handle)
    } else {
        errors | sink.rollback(handle)
    }
}

/// Reads the next whole frame from `source`.
///
/// Returns `Ok(None)` at a clean end of input. A frame longer than
/// `max_len` reports `ExcessElement` and a truncated one `NotEnoughData`;
/// nothing is consumed in either case.
pub fn read_frame<S: DataSource>(
    source: &mut S,
    max_len: usize,
) -> Result<Option<Vec<u8>>, DeserializationErrors> {
    let head = source.top(multi_byte::MAX_SEQUENCE_LENGTH);
    if head.is_empty() {
        return source.status().into_result().map(|()| None);
    }
    let prefix_len = multi_byte::decode_sequence_length(head)
        .ok_or(DeserializationErrorCode::InvalidFormat)?;
    if head.len() < prefix_len {
        return Err(source.status() | DeserializationErrorCode::NotEnoughData);
    }
    let (size, _) =
        multi_byte::decode_code_point(head).ok_or(DeserializationErrorCode::InvalidFormat)?;
    let size = usize::try_from(size).map_err(|_| DeserializationErrorCode::InvalidFormat)?;
    if size > max_len {
        return Err(DeserializationErrorCode::ExcessElement.into());
    }

    let total = prefix_len + size;
    let block = source.top(total);
    if block.len() < total {
        return Err(source.status() | DeserializationErrorCode::NotEnoughData);
    }
    let data = block[prefix_len..].to_vec();
    source.pop(total);
    Ok(Some(data))
}
