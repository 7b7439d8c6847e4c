//! Portable backend: plain ASCII text, independent of the host.
//!
//! Peers with different byte orders and float layouts can exchange data in
//! this format. Elements go through [`PortableValue`]:
//!
//! | item            | text                                          |
//! |-----------------|-----------------------------------------------|
//! | top-level value | `<` ... `>`                                   |
//! | `bool`          | `T` or `U`                                    |
//! | unsigned        | hex digits, least significant first           |
//! | signed          | `+` or `-`, then the magnitude                |
//! | float           | fraction `` ` `` exponent (decomposed pair)   |
//! | string          | `"` length `\|` UTF-8 bytes `"`               |
//! | struct          | `{` count `\|` then `name:` before each member, `}` |
//! | list            | `[` count `\|` elements `]`                   |
//!
//! Every element and string ends with `;`. Each one is written or read
//! whole, so a bounded sink or a short source never splits it.

use crate::backend::{DeserializerBackend, ReadProgress, SerializerBackend, WriteProgress};
use crate::element::{Element, PortableKind, PortableValue};
use spool_core::{
    DeserializationErrorCode, DeserializationErrors, SerializationErrorCode, SerializationErrors,
};
use spool_io::{DataSink, DataSource, DEFAULT_SCAN_STEP};

/// Identifier reported by both halves of the portable backend.
pub const PORTABLE_BACKEND_ID: &str = "Portable";

/// Longest element or count token accepted before its delimiter.
pub const MAX_TOKEN_LEN: usize = 48;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";
const ELEMENT_END: u8 = b';';
const COUNT_END: u8 = b'|';
const FLOAT_SPLIT: u8 = b'`';

fn push_unsigned(out: &mut Vec<u8>, mut value: u128) {
    loop {
        out.push(HEX_DIGITS[(value & 0xF) as usize]);
        value >>= 4;
        if value == 0 {
            break;
        }
    }
}

fn push_signed(out: &mut Vec<u8>, value: i128) {
    out.push(if value < 0 { b'-' } else { b'+' });
    push_unsigned(out, value.unsigned_abs());
}

fn push_value(out: &mut Vec<u8>, value: PortableValue) {
    match value {
        PortableValue::Bool(value) => out.push(if value { b'T' } else { b'U' }),
        PortableValue::Unsigned(value) => push_unsigned(out, value),
        PortableValue::Signed(value) => push_signed(out, value),
        PortableValue::Float { fraction, exponent } => {
            push_unsigned(out, u128::from(fraction));
            out.push(FLOAT_SPLIT);
            push_signed(out, i128::from(exponent));
        }
    }
}

fn parse_unsigned(digits: &[u8]) -> Option<u128> {
    if digits.is_empty() || digits.len() > 32 {
        return None;
    }
    let mut value = 0u128;
    for (idx, &digit) in digits.iter().enumerate() {
        let nibble = match digit {
            b'0'..=b'9' => digit - b'0',
            b'A'..=b'F' => digit - b'A' + 10,
            _ => return None,
        };
        value |= u128::from(nibble) << (4 * idx);
    }
    Some(value)
}

fn parse_signed(text: &[u8]) -> Option<i128> {
    let (&sign, digits) = text.split_first()?;
    let magnitude = parse_unsigned(digits)?;
    match sign {
        b'+' => i128::try_from(magnitude).ok(),
        b'-' if magnitude == i128::MIN.unsigned_abs() => Some(i128::MIN),
        b'-' => i128::try_from(magnitude).ok().map(|value| -value),
        _ => None,
    }
}

fn parse_value(kind: PortableKind, text: &[u8]) -> Option<PortableValue> {
    match kind {
        PortableKind::Bool => match text {
            b"T" => Some(PortableValue::Bool(true)),
            b"U" => Some(PortableValue::Bool(false)),
            _ => None,
        },
        PortableKind::Unsigned => parse_unsigned(text).map(PortableValue::Unsigned),
        PortableKind::Signed => parse_signed(text).map(PortableValue::Signed),
        PortableKind::Float => {
            let split = text.iter().position(|&b| b == FLOAT_SPLIT)?;
            let fraction = u64::try_from(parse_unsigned(&text[..split])?).ok()?;
            let exponent = i32::try_from(parse_signed(&text[split + 1..])?).ok()?;
            Some(PortableValue::Float { fraction, exponent })
        }
    }
}

/// Serializer half of the portable backend.
#[derive(Debug)]
pub struct PortableSerializer<S: DataSink> {
    sink: S,
    scratch: Vec<u8>,
}

impl<S: DataSink> PortableSerializer<S> {
    /// Create a serializer writing to `sink`.
    pub fn new(sink: S) -> Self {
        PortableSerializer {
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

    /// Writes the scratch text whole, or reports `TooMuchData`.
    fn put_scratch(&mut self) -> SerializationErrors {
        if self.sink.remaining_size() < self.scratch.len() {
            return SerializationErrorCode::TooMuchData.into();
        }
        self.sink.write(&self.scratch)
    }

    fn put(&mut self, text: &[u8]) -> SerializationErrors {
        self.scratch.clear();
        self.scratch.extend_from_slice(text);
        self.put_scratch()
    }

    fn put_count(&mut self, open: u8, count: usize) -> SerializationErrors {
        self.scratch.clear();
        self.scratch.push(open);
        push_unsigned(&mut self.scratch, count as u128);
        self.scratch.push(COUNT_END);
        self.put_scratch()
    }
}

impl<S: DataSink> SerializerBackend for PortableSerializer<S> {
    type Sink = S;

    fn type_id(&self) -> &'static str {
        PORTABLE_BACKEND_ID
    }

    fn sink(&self) -> &S {
        &self.sink
    }

    fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn begin(&mut self) -> SerializationErrors {
        self.put(b"<")
    }

    fn write<T: Element>(&mut self, values: &[T]) -> WriteProgress {
        let mut done = 0;
        for value in values {
            self.scratch.clear();
            push_value(&mut self.scratch, value.to_portable());
            self.scratch.push(ELEMENT_END);
            if self.sink.remaining_size() < self.scratch.len() {
                return WriteProgress::new(done, SerializationErrorCode::IncompleteWrite.into());
            }
            let errors = self.sink.write(&self.scratch);
            if !errors.is_empty() {
                return WriteProgress::new(done, errors);
            }
            done += 1;
        }
        WriteProgress::new(done, SerializationErrors::none())
    }

    fn write_strings<T: AsRef<str>>(&mut self, values: &[T]) -> WriteProgress {
        let mut done = 0;
        for value in values {
            let bytes = value.as_ref().as_bytes();
            self.scratch.clear();
            self.scratch.push(b'"');
            push_unsigned(&mut self.scratch, bytes.len() as u128);
            self.scratch.push(COUNT_END);
            self.scratch.extend_from_slice(bytes);
            self.scratch.extend_from_slice(b"\";");
            if self.sink.remaining_size() < self.scratch.len() {
                return WriteProgress::new(done, SerializationErrorCode::IncompleteWrite.into());
            }
            let errors = self.sink.write(&self.scratch);
            if !errors.is_empty() {
                return WriteProgress::new(done, errors);
            }
            done += 1;
        }
        WriteProgress::new(done, SerializationErrors::none())
    }

    fn begin_struct(&mut self, member_count: usize) -> SerializationErrors {
        self.put_count(b'{', member_count)
    }

    fn begin_member(&mut self, name: &str) -> SerializationErrors {
        self.scratch.clear();
        self.scratch.extend_from_slice(name.as_bytes());
        self.scratch.push(b':');
        self.put_scratch()
    }

    fn finish_struct(&mut self) -> SerializationErrors {
        self.put(b"}")
    }

    fn begin_list(&mut self, element_count: usize) -> SerializationErrors {
        self.put_count(b'[', element_count)
    }

    fn finish_list(&mut self) -> SerializationErrors {
        self.put(b"]")
    }

    fn finish(&mut self) -> SerializationErrors {
        let errors = self.put(b">");
        if !errors.is_empty() {
            return errors;
        }
        self.sink.finalize()
    }
}

/// Deserializer half of the portable backend.
#[derive(Debug)]
pub struct PortableDeserializer<S: DataSource> {
    source: S,
}

impl<S: DataSource> PortableDeserializer<S> {
    /// Create a deserializer reading from `source`.
    pub fn new(source: S) -> Self {
        PortableDeserializer { source }
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

    fn skip_whitespace(&mut self) {
        loop {
            let step = DEFAULT_SCAN_STEP;
            match self
                .source
                .scan_until(|b| !b.is_ascii_whitespace(), step, step)
            {
                Some(pos) => {
                    self.source.pop(pos);
                    return;
                }
                None => {
                    let blank = self.source.top(step).len();
                    if blank == 0 {
                        return;
                    }
                    self.source.pop(blank);
                }
            }
        }
    }

    /// Consumes `token` if the source starts with it.
    fn require(&mut self, token: &[u8]) -> DeserializationErrors {
        let head = self.source.top(token.len());
        let complete = head.len() == token.len();
        let matches = token.starts_with(head);
        if !matches {
            return DeserializationErrorCode::InvalidFormat.into();
        }
        if !complete {
            return self.not_enough_data();
        }
        self.source.pop(token.len());
        DeserializationErrors::none()
    }

    /// Length of the text before `delimiter`, `skip` bytes into the source.
    fn token_len(&mut self, skip: usize, delimiter: u8) -> Result<usize, DeserializationErrors> {
        let head = self.source.top(skip + MAX_TOKEN_LEN + 1);
        let available = head.len().saturating_sub(skip);
        let found = head
            .get(skip..)
            .and_then(|rest| rest.iter().position(|&b| b == delimiter));
        match found {
            Some(len) => Ok(len),
            None if available > MAX_TOKEN_LEN => Err(DeserializationErrorCode::InvalidFormat.into()),
            None => Err(self.not_enough_data()),
        }
    }

    /// Peeks `open`, a hex count and `|`; returns the count and the length
    /// of that prefix. Nothing is consumed.
    fn peek_count(&mut self, open: u8) -> Result<(usize, usize), DeserializationErrors> {
        match self.source.top(1).first().copied() {
            None => return Err(self.not_enough_data()),
            Some(first) if first != open => {
                return Err(DeserializationErrorCode::InvalidFormat.into())
            }
            Some(_) => {}
        }
        let digits = self.token_len(1, COUNT_END)?;
        let count = parse_unsigned(&self.source.top(1 + digits)[1..])
            .and_then(|count| usize::try_from(count).ok())
            .ok_or(DeserializationErrorCode::InvalidFormat)?;
        Ok((count, digits + 2))
    }

    fn read_count(&mut self, open: u8) -> Result<usize, DeserializationErrors> {
        let (count, prefix_len) = self.peek_count(open)?;
        self.source.pop(prefix_len);
        Ok(count)
    }

    fn read_one<T: Element>(&mut self) -> Result<T, DeserializationErrors> {
        let len = self.token_len(0, ELEMENT_END)?;
        let value = parse_value(T::PORTABLE_KIND, self.source.top(len))
            .and_then(T::from_portable)
            .ok_or(DeserializationErrorCode::InvalidFormat)?;
        self.source.pop(len + 1);
        Ok(value)
    }

    fn read_string(&mut self, value: &mut String) -> Result<(), DeserializationErrors> {
        let (len, prefix_len) = self.peek_count(b'"')?;
        let total = len
            .checked_add(prefix_len + 2)
            .ok_or(DeserializationErrorCode::InvalidFormat)?;
        let block = self.source.top(total);
        if block.len() < total {
            return Err(self.not_enough_data());
        }
        if &block[total - 2..] != b"\";" {
            return Err(DeserializationErrorCode::InvalidFormat.into());
        }
        let text = std::str::from_utf8(&block[prefix_len..total - 2])
            .map_err(|_| DeserializationErrorCode::InvalidFormat)?;
        value.clear();
        value.push_str(text);
        self.source.pop(total);
        Ok(())
    }
}

impl<S: DataSource> DeserializerBackend for PortableDeserializer<S> {
    type Source = S;

    fn type_id(&self) -> &'static str {
        PORTABLE_BACKEND_ID
    }

    fn source(&self) -> &S {
        &self.source
    }

    fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn begin(&mut self) -> DeserializationErrors {
        self.skip_whitespace();
        self.require(b"<")
    }

    fn read<T: Element>(&mut self, values: &mut [T]) -> ReadProgress {
        let mut done = 0;
        for slot in values.iter_mut() {
            match self.read_one::<T>() {
                Ok(value) => *slot = value,
                Err(errors) if done > 0 && errors.has(DeserializationErrorCode::NotEnoughData) => {
                    let errors = errors.without(DeserializationErrorCode::NotEnoughData)
                        | DeserializationErrorCode::IncompleteRead;
                    return ReadProgress::new(done, errors);
                }
                Err(errors) => return ReadProgress::new(done, errors),
            }
            done += 1;
        }
        ReadProgress::new(done, DeserializationErrors::none())
    }

    fn read_strings(&mut self, values: &mut [String]) -> ReadProgress {
        let mut done = 0;
        for value in values.iter_mut() {
            if let Err(errors) = self.read_string(value) {
                return ReadProgress::new(done, errors);
            }
            done += 1;
        }
        ReadProgress::new(done, DeserializationErrors::none())
    }

    fn begin_struct(&mut self) -> Result<usize, DeserializationErrors> {
        self.read_count(b'{')
    }

    fn begin_member(&mut self, name: &str) -> DeserializationErrors {
        let mut token = Vec::with_capacity(name.len() + 1);
        token.extend_from_slice(name.as_bytes());
        token.push(b':');
        self.require(&token)
    }

    fn finish_struct(&mut self) -> DeserializationErrors {
        self.require(b"}")
    }

    fn begin_list(&mut self) -> Result<usize, DeserializationErrors> {
        self.read_count(b'[')
    }

    fn finish_list(&mut self) -> DeserializationErrors {
        self.require(b"]")
    }

    fn finish(&mut self) -> DeserializationErrors {
        self.require(b">")
    }
}
