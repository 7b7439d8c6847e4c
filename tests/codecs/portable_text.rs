//! Portable text backend through the public API.

use proptest::prelude::*;
use spool::testing::LimitedSink;
use spool::{
    read_list, write_list, BlockSource, DeserializationErrorCode, DeserializerBackend,
    FastDeserializer, FastSerializer, PortableDeserializer, PortableSerializer, SerializerBackend,
};

fn portable_bytes<F>(write: F) -> Vec<u8>
where
    F: FnOnce(&mut PortableSerializer<LimitedSink>),
{
    let mut ser = PortableSerializer::new(LimitedSink::new(1 << 16));
    ser.begin();
    write(&mut ser);
    assert!(ser.finish().is_empty());
    ser.into_sink().take()
}

#[test]
fn test_record_reads_back_like_fast_backend() {
    let ids = [3u32, 0xBEEF, u32::MAX];
    let weights = [0.25f64, -1e300, 7.0];

    let text = portable_bytes(|ser| {
        ser.begin_struct(2);
        ser.begin_member("ids");
        write_list(ser, &ids);
        ser.begin_member("weights");
        write_list(ser, &weights);
        ser.finish_struct();
    });
    assert!(text.is_ascii());

    let mut fast = FastSerializer::new(LimitedSink::new(1 << 16));
    fast.begin_struct(2);
    write_list(&mut fast, &ids);
    write_list(&mut fast, &weights);
    let binary = fast.into_sink().take();

    let mut de = PortableDeserializer::new(BlockSource::new(&text));
    assert!(de.begin().is_empty());
    assert_eq!(de.begin_struct(), Ok(2));
    assert!(de.begin_member("ids").is_empty());
    let text_ids: Vec<u32> = read_list(&mut de, 8).unwrap();
    assert!(de.begin_member("weights").is_empty());
    let text_weights: Vec<f64> = read_list(&mut de, 8).unwrap();
    assert!(de.finish_struct().is_empty());
    assert!(de.finish().is_empty());

    let mut de = FastDeserializer::new(BlockSource::new(&binary));
    assert_eq!(de.begin_struct(), Ok(2));
    assert_eq!(read_list::<_, u32>(&mut de, 8).unwrap(), text_ids);
    assert_eq!(read_list::<_, f64>(&mut de, 8).unwrap(), text_weights);
}

#[test]
fn test_value_out_of_range_for_target_type() {
    let text = portable_bytes(|ser| {
        ser.write_value(300u16);
    });
    let mut de = PortableDeserializer::new(BlockSource::new(&text));
    assert!(de.begin().is_empty());
    let errors = de.read_value::<u8>().unwrap_err();
    assert!(errors.has(DeserializationErrorCode::InvalidFormat));
    assert_eq!(de.read_value::<u16>(), Ok(300));
}

proptest! {
    #[test]
    fn prop_f64_bits_survive_text(bits in any::<u64>()) {
        let x = f64::from_bits(bits);
        let text = portable_bytes(|ser| { ser.write_value(x); });
        let mut de = PortableDeserializer::new(BlockSource::new(&text));
        prop_assert!(de.begin().is_empty());
        let back: f64 = de.read_value().unwrap();
        if x.is_nan() {
            prop_assert!(back.is_nan());
            prop_assert_eq!(back.is_sign_negative(), x.is_sign_negative());
        } else {
            prop_assert_eq!(back.to_bits(), x.to_bits());
        }
    }

    #[test]
    fn prop_i128_survives_text(x in any::<i128>(), s in ".{0,20}") {
        let text = portable_bytes(|ser| {
            ser.write_value(x);
            ser.write_strings(&[s.as_str()]);
        });
        let mut de = PortableDeserializer::new(BlockSource::new(&text));
        prop_assert!(de.begin().is_empty());
        prop_assert_eq!(de.read_value::<i128>(), Ok(x));
        let mut out = [String::new()];
        prop_assert_eq!(de.read_strings(&mut out).done, 1);
        prop_assert_eq!(&out[0], &s);
        prop_assert!(de.finish().is_empty());
    }
}
