//! Fragment cursors driven by hand across many bounded sink cycles.

use proptest::prelude::*;
use spool::testing::LimitedSink;
use spool::{
    BlockSink, BlockSource, DataSink, DataSource, DeserializationErrorCode, DeserializerBackend,
    FastDeserializer, FastSerializer, FragmentDeserializer, FragmentSerializer,
    SerializationErrorCode, SerializerBackend, FRAGMENT_HEADER_SIZE,
};

/// Pushes `values` through a sink holding `per_cycle` elements at a time
/// and returns the reassembled vector plus the cycle count.
fn cycle_u32(values: &[u32], per_cycle: usize) -> (Vec<u32>, usize) {
    let mut buf = vec![0u8; FRAGMENT_HEADER_SIZE + per_cycle * 4];
    let mut frag = FragmentSerializer::new(values);
    let mut defrag = FragmentDeserializer::<u32>::with_len(values.len());
    let mut cycles = 0;

    while !frag.is_done() {
        let before = frag.offset();
        let mut ser = FastSerializer::new(BlockSink::new(&mut buf));
        let errors = frag.write(&mut ser);
        assert!(errors.has_at_most(SerializationErrorCode::IncompleteWrite));
        assert_eq!(frag.offset() - before, per_cycle.min(values.len() - before));

        let bytes = ser.sink().done().to_vec();
        let mut de = FastDeserializer::new(BlockSource::new(&bytes));
        let errors = defrag.read(&mut de);
        assert!(errors.has_at_most(DeserializationErrorCode::IncompleteRead));
        assert!(de.source_mut().top(1).is_empty());
        assert_eq!(defrag.done_count(), frag.offset());
        cycles += 1;
    }
    assert!(defrag.is_done());
    (defrag.into_target(), cycles)
}

#[test]
fn test_k_smaller_than_n_reassembles_in_order() {
    let values: Vec<u32> = (0..1000u32).map(|i| i.wrapping_mul(2_654_435_761)).collect();
    for per_cycle in [1, 3, 7, 64, 999] {
        let (back, cycles) = cycle_u32(&values, per_cycle);
        assert_eq!(back, values);
        assert_eq!(cycles, (values.len() + per_cycle - 1) / per_cycle);
    }
}

#[test]
fn test_flush_and_retry_after_too_much_data() {
    let values: Vec<u64> = (0..50).collect();
    let mut frag = FragmentSerializer::new(&values);
    let mut defrag = FragmentDeserializer::<u64>::with_len(values.len());
    let mut ser = FastSerializer::new(LimitedSink::new(64));
    let mut flushed = Vec::new();

    // A 44-byte prefix leaves room for the header but no element.
    ser.sink_mut().write(&[0; 44]);
    let errors = frag.write(&mut ser);
    assert!(errors.has(SerializationErrorCode::TooMuchData));
    assert_eq!(frag.offset(), 0);
    assert_eq!(ser.sink().bytes().len(), 44);
    ser.sink_mut().take();

    while !frag.is_done() {
        frag.write(&mut ser);
        flushed.push(ser.sink_mut().take());
    }
    assert_eq!(flushed.len(), 9);
    for bytes in flushed.iter().rev() {
        let mut de = FastDeserializer::new(BlockSource::new(bytes));
        defrag.read(&mut de);
    }
    assert!(defrag.is_done());
    assert_eq!(defrag.target(), &values[..]);
}

#[test]
fn test_sink_failure_is_not_retried() {
    let values: Vec<u8> = vec![1; 10];
    let mut frag = FragmentSerializer::new(&values);
    let mut ser = FastSerializer::new(LimitedSink::new(64).fail_after_writes(0));
    let errors = frag.write(&mut ser);
    assert!(errors.has(SerializationErrorCode::DataSinkError));
    assert_eq!(frag.offset(), 0);
    assert!(!frag.is_done());
}

proptest! {
    #[test]
    fn prop_any_cycle_size_reproduces_input(
        values in prop::collection::vec(any::<u32>(), 1..400),
        per_cycle in 1usize..50,
    ) {
        let (back, _) = cycle_u32(&values, per_cycle);
        prop_assert_eq!(back, values);
    }
}
