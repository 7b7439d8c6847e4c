//! Chunked transfer driver.
//!
//! Moves a slice of elements through fixed-size chunks:
//!
//! ```text
//! chunk 0: [begin][count: u64][fragment ...]
//! chunk k: [fragment ...]
//! ```
//!
//! Every fragment is decodable on its own, but a fragment ends where its
//! chunk ends, so chunk boundaries must survive the medium. On a byte
//! stream, [`send_to_sink`] and [`receive_from_source`] wrap each chunk in
//! a size-prefixed frame for that; [`receive_from_reader`] is the same over
//! a plain `Read`, buffered as the config says.

use crate::backend::{DeserializerBackend, SerializerBackend};
use crate::config::TransferConfig;
use crate::element::Element;
use crate::fast::{FastDeserializer, FastSerializer};
use crate::fragment::{FragmentDeserializer, FragmentSerializer};
use crate::framing::{read_frame, write_frame};
use spool_core::{
    DeserializationErrorCode, DeserializationErrors, Error, Result, SerializationErrorCode,
};
use spool_io::{BlockSink, BlockSource, DataSink, DataSource};
use std::io::Read;
use tracing::{debug, trace, warn};

/// Counters kept by both ends of a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Chunks emitted or consumed.
    pub chunks: u64,
    /// Bytes in those chunks.
    pub bytes: u64,
    /// Fragments written or read.
    pub fragments: u64,
    /// Fragments retried after their chunk was flushed.
    pub retries: u64,
}

/// Sending end: serializes a slice into chunks.
#[derive(Debug)]
pub struct ChunkedSender<'a, T> {
    frag: FragmentSerializer<'a, T>,
    config: TransferConfig,
    started: bool,
    stats: TransferStats,
}

impl<'a, T: Element> ChunkedSender<'a, T> {
    /// Create a sender for `values`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `config` does not validate.
    pub fn new(values: &'a [T], config: TransferConfig) -> Result<Self> {
        config.validate()?;
        Ok(ChunkedSender {
            frag: FragmentSerializer::new(values),
            config,
            started: false,
            stats: TransferStats::default(),
        })
    }

    /// Counters so far.
    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// True once every element went out.
    pub fn is_done(&self) -> bool {
        self.frag.is_done()
    }

    /// Runs the whole transfer, handing each finished chunk to `emit`.
    ///
    /// The first chunk is emitted even when there are no elements, since it
    /// carries the element count. A sender runs once: after a failed run the
    /// receiver has to start over with a fresh sender.
    ///
    /// # Errors
    ///
    /// Returns `Error::ChunkTooSmall` when an empty chunk cannot hold a
    /// fragment, `Error::Serialization` on any other write failure, and
    /// whatever `emit` returns. Returns `Error::InvalidOperation` when the
    /// sender already ran, whether or not that run succeeded.
    pub fn run<F>(&mut self, mut emit: F) -> Result<TransferStats>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        if self.started {
            return Err(Error::InvalidOperation(
                "sender already ran its transfer".to_string(),
            ));
        }
        self.started = true;
        let chunk_size = self.config.chunk_size;
        let mut chunk = vec![0u8; chunk_size];
        let mut ser = FastSerializer::new(BlockSink::new(&mut chunk));

        let mut errors = ser.begin();
        if errors.is_empty() {
            errors |= ser.begin_list(self.frag.len());
        }
        if !errors.is_empty() {
            warn!(target: "spool::transfer", errors = %errors, "Transfer aborted");
            return Err(Error::Serialization(errors));
        }
        debug!(
            target: "spool::transfer",
            elements = self.frag.len(),
            chunk_size,
            "Transfer started"
        );

        while !self.frag.is_done() {
            let errors = self.frag.write(&mut ser);
            if errors.has_at_most(SerializationErrorCode::IncompleteWrite) {
                self.stats.fragments += 1;
                if !errors.is_empty() {
                    emit_chunk(ser.sink_mut(), &mut self.stats, &mut emit)?;
                }
            } else if errors.has_at_most(SerializationErrorCode::TooMuchData) {
                if ser.sink().done().is_empty() {
                    warn!(target: "spool::transfer", chunk_size, "Chunk cannot hold a fragment");
                    return Err(Error::ChunkTooSmall { chunk_size });
                }
                self.stats.retries += 1;
                trace!(
                    target: "spool::transfer",
                    offset = self.frag.offset(),
                    "Fragment did not fit, flushing chunk"
                );
                emit_chunk(ser.sink_mut(), &mut self.stats, &mut emit)?;
            } else {
                warn!(
                    target: "spool::transfer",
                    offset = self.frag.offset(),
                    errors = %errors,
                    "Transfer aborted"
                );
                return Err(Error::Serialization(errors));
            }
        }

        let errors = ser.finish();
        if !errors.is_empty() {
            warn!(target: "spool::transfer", errors = %errors, "Transfer aborted");
            return Err(Error::Serialization(errors));
        }
        if !ser.sink().done().is_empty() {
            emit_chunk(ser.sink_mut(), &mut self.stats, &mut emit)?;
        }
        debug!(
            target: "spool::transfer",
            chunks = self.stats.chunks,
            bytes = self.stats.bytes,
            "Transfer sent"
        );
        Ok(self.stats)
    }
}

fn emit_chunk<F>(sink: &mut BlockSink<'_>, stats: &mut TransferStats, emit: &mut F) -> Result<()>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    let chunk = sink.done();
    emit(chunk)?;
    stats.chunks += 1;
    stats.bytes += chunk.len() as u64;
    debug!(target: "spool::transfer", chunk = stats.chunks, bytes = chunk.len(), "Chunk emitted");
    sink.clear();
    Ok(())
}

/// Receiving end: rebuilds the element vector from chunks.
#[derive(Debug)]
pub struct ChunkedReceiver<T> {
    defrag: FragmentDeserializer<T>,
    config: TransferConfig,
    started: bool,
    stats: TransferStats,
}

impl<T: Element> ChunkedReceiver<T> {
    /// Create a receiver.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `config` does not validate.
    pub fn new(config: TransferConfig) -> Result<Self> {
        config.validate()?;
        Ok(ChunkedReceiver {
            defrag: FragmentDeserializer::new(),
            config,
            started: false,
            stats: TransferStats::default(),
        })
    }

    /// Consumes one chunk.
    ///
    /// The first chunk must start with the element count. Leftover bytes
    /// that do not form a whole fragment are rejected.
    ///
    /// # Errors
    ///
    /// Returns `Error::Deserialization` on malformed input, including an
    /// element count above `max_elements`.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<()> {
        let mut de = FastDeserializer::new(BlockSource::new(chunk));

        if !self.started {
            let count = de
                .begin()
                .into_result()
                .and_then(|()| de.begin_list())
                .map_err(abort)?;
            if count > self.config.max_elements {
                warn!(
                    target: "spool::transfer",
                    count,
                    max = self.config.max_elements,
                    "Announced element count over limit"
                );
                return Err(Error::Deserialization(
                    DeserializationErrorCode::ExcessElement.into(),
                ));
            }
            self.defrag.set_len(count);
            self.started = true;
            debug!(target: "spool::transfer", elements = count, "Transfer started");
        }

        while !de.source_mut().top(1).is_empty() {
            let errors = self.defrag.read(&mut de);
            if !errors.has_at_most(DeserializationErrorCode::IncompleteRead) {
                return Err(abort(errors));
            }
            self.stats.fragments += 1;
        }

        self.stats.chunks += 1;
        self.stats.bytes += chunk.len() as u64;
        debug!(
            target: "spool::transfer",
            chunk = self.stats.chunks,
            filled = self.defrag.done_count(),
            "Chunk consumed"
        );
        Ok(())
    }

    /// True once the count arrived and every element was filled.
    pub fn is_done(&self) -> bool {
        self.started && self.defrag.is_done()
    }

    /// Element count announced by the sender, once known.
    pub fn expected_len(&self) -> Option<usize> {
        self.started.then(|| self.defrag.len())
    }

    /// Elements received so far; unfilled slots hold the default value.
    pub fn values(&self) -> &[T] {
        self.defrag.target()
    }

    /// Counters so far.
    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// Finishes the transfer and returns the elements.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` if elements are still missing.
    pub fn into_values(self) -> Result<Vec<T>> {
        if !self.is_done() {
            return Err(Error::InvalidOperation(format!(
                "transfer incomplete: {} of {} elements received",
                self.defrag.done_count(),
                self.defrag.len()
            )));
        }
        Ok(self.defrag.into_target())
    }
}

fn abort(errors: DeserializationErrors) -> Error {
    warn!(target: "spool::transfer", errors = %errors, "Transfer aborted");
    Error::Deserialization(errors)
}

/// Sends `values` chunk by chunk through `emit`.
pub fn send_all<T, F>(values: &[T], config: TransferConfig, emit: F) -> Result<TransferStats>
where
    T: Element,
    F: FnMut(&[u8]) -> Result<()>,
{
    ChunkedSender::new(values, config)?.run(emit)
}

/// Rebuilds a vector from a complete sequence of chunks.
pub fn receive_all<T, I>(chunks: I, config: TransferConfig) -> Result<Vec<T>>
where
    T: Element,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut receiver = ChunkedReceiver::new(config)?;
    for chunk in chunks {
        receiver.receive(chunk.as_ref())?;
    }
    receiver.into_values()
}

/// Sends `values` into `sink`, one size-prefixed frame per chunk, then
/// finalizes the sink.
pub fn send_to_sink<T, S>(values: &[T], config: TransferConfig, sink: &mut S) -> Result<TransferStats>
where
    T: Element,
    S: DataSink,
{
    let stats = send_all(values, config, |chunk| {
        write_frame(&mut *sink, chunk)
            .into_result()
            .map_err(Error::Serialization)
    })?;
    sink.finalize().into_result().map_err(Error::Serialization)?;
    Ok(stats)
}

/// Reads frames from `source` until a whole transfer has arrived.
///
/// Frames longer than `config.chunk_size` are rejected, so the receiving
/// side needs a chunk size at least as large as the sender's. Nothing past
/// the last frame of the transfer is consumed.
pub fn receive_from_source<T, S>(source: &mut S, config: TransferConfig) -> Result<Vec<T>>
where
    T: Element,
    S: DataSource,
{
    let max_frame = config.chunk_size;
    let mut receiver = ChunkedReceiver::new(config)?;
    while !receiver.is_done() {
        match read_frame(source, max_frame) {
            Ok(Some(chunk)) => receiver.receive(&chunk)?,
            Ok(None) => {
                return Err(abort(
                    source.status() | DeserializationErrorCode::NotEnoughData,
                ))
            }
            Err(errors) => return Err(abort(errors)),
        }
    }
    receiver.into_values()
}

/// Receives one framed transfer from `input`.
///
/// Wraps `input` in a stream source sized by `config.stream_read_chunk`.
/// Bytes buffered past the end of the transfer are dropped with the source;
/// use [`receive_from_source`] with [`TransferConfig::stream_source`] to
/// read several transfers off one stream.
pub fn receive_from_reader<T, R>(input: R, config: TransferConfig) -> Result<Vec<T>>
where
    T: Element,
    R: Read,
{
    let mut source = config.stream_source(input);
    receive_from_source(&mut source, config)
}
