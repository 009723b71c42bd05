use std::sync::Arc;

use bblog_frame::{encode_frame, FrameError};
use bblog_schema::{FieldRegistry, LogEntry};
use bblog_stream::{
    MemorySink, NoDiagnostics, SensorStreamSession, SessionConfig, SessionState, StreamError, Value,
};
use bytes::{Bytes, BytesMut};
use proptest::prelude::*;

fn arb_entry() -> impl Strategy<Value = LogEntry> {
    (
        any::<u32>(),
        0u32..200_000,
        proptest::option::of(any::<i32>()),
        proptest::collection::vec(-32_768i32..32_768, 0..=3),
    )
        .prop_map(|(timestamp, pressure, temperature, accelerometer)| LogEntry {
            timestamp: Some(timestamp),
            pressure: Some(pressure),
            temperature,
            accelerometer,
            ..LogEntry::default()
        })
}

fn encode(entries: &[LogEntry]) -> BytesMut {
    let mut dst = BytesMut::new();
    for entry in entries {
        encode_frame(&entry.encode_to_bytes(), &mut dst).unwrap();
    }
    dst
}

fn with_end(entries: &[LogEntry]) -> Bytes {
    let mut dst = encode(entries);
    encode_frame(&LogEntry::end_of_log(u32::MAX).encode_to_bytes(), &mut dst).unwrap();
    dst.freeze()
}

fn chunks(bytes: &Bytes, sizes: &[usize]) -> Vec<Bytes> {
    let mut out = Vec::new();
    let mut start = 0;
    for size in sizes.iter().cycle() {
        if start >= bytes.len() {
            break;
        }
        let end = (start + size).min(bytes.len());
        out.push(bytes.slice(start..end));
        start = end;
    }
    out
}

fn session() -> SensorStreamSession<MemorySink> {
    let config = SessionConfig {
        raw: true,
        ..SessionConfig::default()
    };
    SensorStreamSession::new(config, Arc::new(FieldRegistry::new()), MemorySink::new())
        .with_diagnostics(NoDiagnostics)
}

fn raw_values(entry: &LogEntry) -> Vec<Value> {
    let mut values = vec![
        Value::Int(i64::from(entry.timestamp.unwrap_or_default())),
        Value::Int(i64::from(entry.pressure.unwrap_or_default())),
    ];
    values.extend(entry.temperature.map(|t| Value::Int(i64::from(t))));
    values.extend(entry.accelerometer.iter().map(|a| Value::Int(i64::from(*a))));
    values
}

proptest! {
    #[test]
    fn any_chunking_yields_every_entry_then_complete(
        entries in proptest::collection::vec(arb_entry(), 0..20),
        sizes in proptest::collection::vec(1usize..40, 1..16),
    ) {
        let wire = with_end(&entries);
        let mut session = session();
        let mut states = Vec::new();
        for chunk in chunks(&wire, &sizes) {
            states.push(session.feed(chunk).unwrap());
        }

        let (last, rest) = states.split_last().unwrap();
        prop_assert_eq!(*last, SessionState::Complete { entries: entries.len() });
        prop_assert!(rest.iter().all(|s| *s == SessionState::Continue));

        let rows = session.sink().rows();
        prop_assert_eq!(rows.len(), entries.len());
        for (row, entry) in rows.iter().zip(&entries) {
            prop_assert_eq!(&row.values, &raw_values(entry));
        }
    }

    #[test]
    fn chunk_size_does_not_change_output(
        entries in proptest::collection::vec(arb_entry(), 1..12),
        sizes in proptest::collection::vec(1usize..24, 1..8),
    ) {
        let wire = with_end(&entries);

        let mut whole = session();
        whole.feed(wire.clone()).unwrap();

        let mut split = session();
        for chunk in chunks(&wire, &sizes) {
            split.feed(chunk).unwrap();
        }

        prop_assert_eq!(whole.sink().rows(), split.sink().rows());
    }

    #[test]
    fn zero_length_frame_is_always_rejected(
        before in proptest::collection::vec(arb_entry(), 0..6),
        after in proptest::collection::vec(arb_entry(), 0..6),
        sizes in proptest::collection::vec(1usize..16, 1..8),
    ) {
        let mut dst = encode(&before);
        dst.extend_from_slice(&[0x00]);
        dst.extend_from_slice(&encode(&after));
        let wire = dst.freeze();

        let mut session = session();
        let mut outcome = Ok(SessionState::Continue);
        for chunk in chunks(&wire, &sizes) {
            outcome = session.feed(chunk);
            if outcome.is_err() {
                break;
            }
        }

        prop_assert!(matches!(
            outcome,
            Err(StreamError::Frame(FrameError::ZeroLengthFrame))
        ));
        prop_assert_eq!(session.entry_count(), before.len());
    }

    #[test]
    fn partial_frame_waits_for_the_rest(
        entries in proptest::collection::vec(arb_entry(), 1..8),
        cut in 1usize..8,
    ) {
        let wire = with_end(&entries);
        let cut = cut.min(wire.len() - 1);
        let split_at = wire.len() - cut;

        let mut session = session();
        prop_assert_eq!(session.feed(wire.slice(..split_at)).unwrap(), SessionState::Continue);
        prop_assert_eq!(
            session.feed(wire.slice(split_at..)).unwrap(),
            SessionState::Complete { entries: entries.len() }
        );
    }
}

#[test]
fn entry_limit_leaves_remaining_frames_unprocessed() {
    let entries: Vec<_> = (0..10)
        .map(|ts| LogEntry {
            timestamp: Some(ts),
            pressure: Some(100_000 + ts),
            ..LogEntry::default()
        })
        .collect();
    let config = SessionConfig {
        max_entries: Some(3),
        ..SessionConfig::default()
    };
    let mut session =
        SensorStreamSession::new(config, Arc::new(FieldRegistry::new()), MemorySink::new());

    let state = session.feed(with_end(&entries)).unwrap();
    assert_eq!(state, SessionState::Complete { entries: 3 });
    assert_eq!(session.entry_count(), 3);
    let last = &session.sink().rows()[2];
    assert_eq!(last.get("p"), Some(Value::Float(1000.02)));
}
