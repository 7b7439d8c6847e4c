//! Transfers over `std::io` streams.

use crate::common::{chunked, seeded_rng};
use rand::Rng;
use spool::testing::{FailingWriter, TrickleReader};
use spool::{
    read_list, receive_from_reader, receive_from_source, send_to_sink, write_list, DataSource,
    DeserializationErrorCode, DeserializerBackend, Error, FastDeserializer, FastSerializer,
    SerializationErrorCode, SerializerBackend, StreamSink, StreamSource, TransferConfig,
};
use std::io::{self, Cursor};

#[test]
fn test_8192_i32_over_a_trickling_stream() {
    let values: Vec<i32> = (0..8192).map(|i| -i * 5).collect();
    let config = chunked(256).with_stream_read_chunk(64);

    let mut sink = StreamSink::new(Vec::new());
    let stats = send_to_sink(&values, config.clone(), &mut sink).unwrap();
    let bytes = sink.into_inner();
    assert!(stats.chunks > 100);

    let back: Vec<i32> = receive_from_reader(TrickleReader::new(bytes, 7), config).unwrap();
    assert_eq!(back, values);
}

#[test]
fn test_two_transfers_back_to_back() {
    let mut rng = seeded_rng(7);
    let first: Vec<u16> = (0..700).map(|_| rng.gen()).collect();
    let second: Vec<u16> = (0..300).map(|_| rng.gen()).collect();
    let config = TransferConfig::for_testing();

    let mut sink = StreamSink::new(Vec::new());
    send_to_sink(&first, config.clone(), &mut sink).unwrap();
    send_to_sink(&second, config.clone(), &mut sink).unwrap();

    let mut source = config.stream_source(Cursor::new(sink.into_inner()));
    let a: Vec<u16> = receive_from_source(&mut source, config.clone()).unwrap();
    let b: Vec<u16> = receive_from_source(&mut source, config).unwrap();
    assert_eq!(a, first);
    assert_eq!(b, second);
    assert!(source.top(1).is_empty());
}

#[test]
fn test_broken_pipe_aborts_transfer() {
    let values: Vec<u64> = (0..1000).collect();
    let mut sink = StreamSink::new(FailingWriter::new(1000, io::ErrorKind::BrokenPipe));
    let err = send_to_sink(&values, TransferConfig::default(), &mut sink).unwrap_err();
    assert!(matches!(
        err,
        Error::Serialization(e) if e.has(SerializationErrorCode::DataSinkError)
    ));
    assert!(sink.get_ref().written().len() <= 1000);
}

#[test]
fn test_read_failure_is_reported() {
    let values: Vec<u32> = (0..2000).collect();
    let mut sink = StreamSink::new(Vec::new());
    send_to_sink(&values, TransferConfig::default(), &mut sink).unwrap();
    let bytes = sink.into_inner();

    let reader = TrickleReader::new(bytes, 100).failing_after(3000);
    let mut source = StreamSource::with_read_chunk(reader, 100);
    let err = receive_from_source::<u32, _>(&mut source, TransferConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Deserialization(e) if e.has(DeserializationErrorCode::DataSourceError)
    ));
}

#[test]
fn test_receiver_chunk_size_bounds_frames() {
    let values: Vec<u8> = vec![9; 1000];
    let mut sink = StreamSink::new(Vec::new());
    send_to_sink(&values, chunked(512), &mut sink).unwrap();

    let mut source = StreamSource::new(Cursor::new(sink.into_inner()));
    let err = receive_from_source::<u8, _>(&mut source, chunked(256)).unwrap_err();
    assert!(matches!(
        err,
        Error::Deserialization(e) if e.has(DeserializationErrorCode::ExcessElement)
    ));
}

#[test]
fn test_backend_directly_on_stream() {
    let mut ser = FastSerializer::new(StreamSink::new(Vec::new()));
    assert!(ser.begin_struct(2).is_empty());
    assert!(write_list(&mut ser, &[1.5f64, -0.25, 1e300]).is_empty());
    assert!(ser.write_strings(&["spool", "über"]).errors.is_empty());
    assert!(ser.finish().is_empty());
    let bytes = ser.into_sink().into_inner();

    let mut de = FastDeserializer::new(StreamSource::with_read_chunk(Cursor::new(bytes), 3));
    assert_eq!(de.begin_struct(), Ok(2));
    let floats: Vec<f64> = read_list(&mut de, 16).unwrap();
    assert_eq!(floats, vec![1.5, -0.25, 1e300]);
    let mut strings = vec![String::new(); 2];
    assert_eq!(de.read_strings(&mut strings).done, 2);
    assert_eq!(strings, ["spool", "über"]);
}
