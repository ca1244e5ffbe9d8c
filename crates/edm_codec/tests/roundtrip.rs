//! End-to-end tests: events written through the codec and read back.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use edm_codec::{CodecConfig, CodecError, FrameReader, FrameWriter, HEADER_SIZE};
use edm_core::{CoreError, Frame, TypeRegistry};
use edm_testkit::prelude::*;
use proptest::prelude::*;
use tempfile::TempDir;

#[test]
fn sample_frame_survives_a_file() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("event.edm");

    let frame = sample_frame();
    {
        let mut writer = BufWriter::new(File::create(&path).unwrap());
        FrameWriter::new().write_frame(&frame, &mut writer).unwrap();
        writer.flush().unwrap();
    }

    let reader = BufReader::new(File::open(&path).unwrap());
    let read = FrameReader::new().read_frame(reader, &registry()).unwrap();

    assert_eq!(EventSpec::from_frame(&read).unwrap(), sample_event());
    assert_eq!(read.parameters().get::<i32>("run_number"), Some(42));
    assert_eq!(
        read.parameters().get_vec::<f64>("energy_scale"),
        Some(vec![1.0, 0.98])
    );
    assert_eq!(
        read.parameters().get::<String>("detector").as_deref(),
        Some("test-stand")
    );
    assert_eq!(read.names(), frame.names());
}

#[test]
fn several_frames_share_one_stream() {
    let first = sample_frame();
    let second = EventSpec::default().build_frame().unwrap();

    let mut stream = Vec::new();
    let writer = FrameWriter::new();
    writer.write_frame(&first, &mut stream).unwrap();
    writer.write_frame(&second, &mut stream).unwrap();

    let mut cursor = stream.as_slice();
    let reader = FrameReader::new();
    let registry = registry();
    let read_first = reader.read_frame(&mut cursor, &registry).unwrap();
    let read_second = reader.read_frame(&mut cursor, &registry).unwrap();

    assert_eq!(EventSpec::from_frame(&read_first).unwrap(), sample_event());
    assert_eq!(
        EventSpec::from_frame(&read_second).unwrap(),
        EventSpec::default()
    );
    assert!(cursor.is_empty());
}

#[test]
fn rewriting_a_read_frame_is_byte_identical() {
    let writer = FrameWriter::new();
    let bytes = writer.encode(&sample_frame().write_data().unwrap()).unwrap();

    let read = FrameReader::new()
        .read_frame(bytes.as_slice(), &registry())
        .unwrap();
    let rewritten = writer.encode(&read.write_data().unwrap()).unwrap();

    assert_eq!(bytes, rewritten);
}

#[test]
fn unknown_type_is_reported_through_the_codec() {
    let bytes = FrameWriter::new()
        .encode(&sample_frame().write_data().unwrap())
        .unwrap();

    let only_hits = TypeRegistry::new().with::<Hit>();
    let err = FrameReader::new()
        .read_frame(bytes.as_slice(), &only_hits)
        .unwrap_err();

    assert!(matches!(
        err,
        CodecError::Core(CoreError::UnknownDataType { .. })
    ));
}

#[test]
fn header_only_stream_fails_to_decode() {
    let bytes = FrameWriter::new()
        .encode(&sample_frame().write_data().unwrap())
        .unwrap();

    let err = FrameReader::new().decode(&bytes[..HEADER_SIZE]).unwrap_err();
    assert!(matches!(err, CodecError::DecodingFailed { .. }));
}

#[test]
fn reader_without_verification_still_reads_valid_frames() {
    let bytes = FrameWriter::new()
        .encode(&sample_frame().write_data().unwrap())
        .unwrap();

    let reader = FrameReader::with_config(CodecConfig::new().verify_on_read(false));
    let read: Frame = reader.read_frame(bytes.as_slice(), &registry()).unwrap();

    assert_eq!(EventSpec::from_frame(&read).unwrap(), sample_event());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn generated_events_roundtrip(spec in event_strategy(12)) {
        let frame = spec.build_frame().unwrap();
        let bytes = FrameWriter::new().encode(&frame.write_data().unwrap()).unwrap();

        let read = FrameReader::new().read_frame(bytes.as_slice(), &registry()).unwrap();
        prop_assert_eq!(EventSpec::from_frame(&read).unwrap(), spec);
    }
}
