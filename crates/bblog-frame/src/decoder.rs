use bblog_schema::{RecordCodec, SchemaError, SensorRecord};
use bytes::Bytes;
use tracing::{debug, trace};

use crate::buffer::{PacketBuffer, PacketOrder};
use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::history::{HistoryEntry, MessageHistory};

/// Result of one decode step.
#[derive(Debug)]
pub enum DecodeOutcome {
    /// The next frame is not fully buffered yet. Nothing was lost.
    NeedMoreData,
    /// A decoded record.
    Frame(SensorRecord),
    /// The end-of-log record was decoded and consumed.
    EndOfStream,
    /// The payload window did not decode. Nothing was consumed, so the same
    /// window can be retried with another packet order.
    Corrupt(SchemaError),
}

/// Pulls length-prefixed frames out of a [`PacketBuffer`].
///
/// The length byte is consumed as soon as it is available; the payload is
/// only consumed once it decodes.
#[derive(Debug)]
pub struct FrameDecoder<C> {
    buffer: PacketBuffer,
    codec: C,
    pending_length: Option<usize>,
    history: MessageHistory,
    seq: u64,
}

impl<C: RecordCodec> FrameDecoder<C> {
    pub fn new(codec: C) -> Self {
        Self::with_config(codec, FrameConfig::default())
    }

    pub fn with_config(codec: C, config: FrameConfig) -> Self {
        Self {
            buffer: PacketBuffer::with_capacity(config.buffer_capacity),
            codec,
            pending_length: None,
            history: MessageHistory::new(config.history_len),
            seq: 0,
        }
    }

    /// Queue one transport packet.
    pub fn write(&mut self, packet: Bytes) -> Result<()> {
        self.buffer.write(packet)
    }

    /// Decode the next frame, reading packets in `order`.
    pub fn decode_next(&mut self, order: Option<&PacketOrder>) -> Result<DecodeOutcome> {
        let size = match self.pending_length {
            Some(size) => size,
            None => {
                if self.buffer.is_empty() {
                    return Ok(DecodeOutcome::NeedMoreData);
                }
                let size = usize::from(self.buffer.get_byte()?);
                if size == 0 {
                    return Err(FrameError::ZeroLengthFrame);
                }
                self.pending_length = Some(size);
                size
            }
        };

        let payload = self.buffer.peek(size, order);
        if payload.len() < size {
            trace!(size, buffered = payload.len(), "partial frame");
            return Ok(DecodeOutcome::NeedMoreData);
        }

        match self.codec.decode(&payload) {
            Ok(record) => {
                self.buffer.seek_forward(size, order)?;
                self.pending_length = None;
                self.remember(size, payload, None);
                self.seq += 1;
                if record.is_end_of_stream(self.codec.timestamp_column()) {
                    debug!(frames = self.seq, "end of log");
                    return Ok(DecodeOutcome::EndOfStream);
                }
                Ok(DecodeOutcome::Frame(record))
            }
            Err(err) if err.is_schema_mismatch() => {
                self.remember(size, payload, Some(&err));
                Err(FrameError::Schema(err))
            }
            Err(err) => {
                debug!(seq = self.seq, size, error = %err, "frame failed to decode");
                self.remember(size, payload, Some(&err));
                Ok(DecodeOutcome::Corrupt(err))
            }
        }
    }

    /// Length of the frame whose payload is awaited, if its length byte has
    /// been consumed.
    pub fn pending_length(&self) -> Option<usize> {
        self.pending_length
    }

    /// Frames decoded so far, end-of-log record included.
    pub fn frames_decoded(&self) -> u64 {
        self.seq
    }

    pub fn buffer(&self) -> &PacketBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PacketBuffer {
        &mut self.buffer
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn remember(&mut self, size: usize, raw: Bytes, error: Option<&SchemaError>) {
        self.history.record(HistoryEntry {
            seq: self.seq,
            size,
            raw,
            error: error.map(ToString::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    use crate::codec::encode_frame;

    /// Accepts payloads whose bytes count up by one. A one-byte payload is
    /// the end-of-log record; a leading `0xFF` is a field it does not know.
    struct CountingCodec;

    impl RecordCodec for CountingCodec {
        fn decode(&self, payload: &[u8]) -> bblog_schema::Result<SensorRecord> {
            if payload.first() == Some(&0xFF) {
                return Err(SchemaError::UnknownField("ff".into()));
            }
            let mut record = SensorRecord::new();
            if payload.len() == 1 {
                record.push("TS", i64::from(payload[0]));
                return Ok(record);
            }
            for (i, pair) in payload.windows(2).enumerate() {
                if pair[1] != pair[0].wrapping_add(1) {
                    return Err(SchemaError::InvalidLength {
                        expected: payload.len(),
                        actual: i + 1,
                    });
                }
            }
            for (i, byte) in payload.iter().enumerate() {
                record.push(format!("c{i}"), i64::from(*byte));
            }
            Ok(record)
        }

        fn timestamp_column(&self) -> &str {
            "TS"
        }
    }

    fn frames(payloads: &[&[u8]]) -> Bytes {
        let mut dst = BytesMut::new();
        for payload in payloads {
            encode_frame(payload, &mut dst).unwrap();
        }
        dst.freeze()
    }

    fn decoder() -> FrameDecoder<CountingCodec> {
        FrameDecoder::new(CountingCodec)
    }

    fn values(outcome: DecodeOutcome) -> Vec<i64> {
        match outcome {
            DecodeOutcome::Frame(record) => record.values().to_vec(),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn decodes_frames_then_end_of_stream() {
        let mut decoder = decoder();
        decoder.write(frames(&[&[1, 2, 3], &[7, 8], &[0]])).unwrap();

        assert_eq!(values(decoder.decode_next(None).unwrap()), [1, 2, 3]);
        assert_eq!(values(decoder.decode_next(None).unwrap()), [7, 8]);
        assert!(matches!(decoder.decode_next(None).unwrap(), DecodeOutcome::EndOfStream));
        assert!(matches!(decoder.decode_next(None).unwrap(), DecodeOutcome::NeedMoreData));
        assert_eq!(decoder.frames_decoded(), 3);
        assert_eq!(decoder.history().len(), 3);
    }

    #[test]
    fn partial_frame_waits_without_loss() {
        let mut decoder = decoder();
        let wire = frames(&[&[4, 5, 6, 7]]);
        decoder.write(wire.slice(..3)).unwrap();

        assert!(matches!(decoder.decode_next(None).unwrap(), DecodeOutcome::NeedMoreData));
        assert_eq!(decoder.pending_length(), Some(4));
        assert!(matches!(decoder.decode_next(None).unwrap(), DecodeOutcome::NeedMoreData));
        assert_eq!(decoder.buffer().len(), 2);

        decoder.write(wire.slice(3..)).unwrap();
        assert_eq!(values(decoder.decode_next(None).unwrap()), [4, 5, 6, 7]);
        assert_eq!(decoder.pending_length(), None);
        assert!(decoder.buffer().is_empty());
    }

    #[test]
    fn zero_length_is_fatal() {
        let mut decoder = decoder();
        let mut wire = BytesMut::new();
        encode_frame(&[1, 2], &mut wire).unwrap();
        wire.extend_from_slice(&[0, 1, 2]);
        decoder.write(wire.freeze()).unwrap();

        assert_eq!(values(decoder.decode_next(None).unwrap()), [1, 2]);
        assert!(matches!(
            decoder.decode_next(None),
            Err(FrameError::ZeroLengthFrame)
        ));
    }

    #[test]
    fn corrupt_frame_is_not_consumed() {
        let mut decoder = decoder();
        decoder.write(frames(&[&[1, 3, 2]])).unwrap();

        let outcome = decoder.decode_next(None).unwrap();
        assert!(matches!(outcome, DecodeOutcome::Corrupt(SchemaError::InvalidLength { .. })));
        assert_eq!(decoder.buffer().len(), 3);
        assert_eq!(decoder.pending_length(), Some(3));

        let last = decoder.history().last().unwrap();
        assert_eq!(last.raw.as_ref(), [1, 3, 2]);
        assert!(last.error.is_some());
    }

    #[test]
    fn reordered_packets_decode_under_alternate_order() {
        let mut decoder = decoder();
        // Length byte and first payload byte, then the tail sent before the middle.
        decoder.write(Bytes::from_static(&[6, 1, 2])).unwrap();
        decoder.write(Bytes::from_static(&[5, 6])).unwrap();
        decoder.write(Bytes::from_static(&[3, 4])).unwrap();

        assert!(matches!(
            decoder.decode_next(None).unwrap(),
            DecodeOutcome::Corrupt(_)
        ));
        let order = PacketOrder::identity(3).swapped(1, 2);
        assert_eq!(
            values(decoder.decode_next(Some(&order)).unwrap()),
            [1, 2, 3, 4, 5, 6]
        );
        assert!(decoder.buffer().is_empty());
    }

    #[test]
    fn unknown_field_is_schema_error() {
        let mut decoder = decoder();
        decoder.write(frames(&[&[0xFF, 0x00]])).unwrap();
        assert!(matches!(
            decoder.decode_next(None),
            Err(FrameError::Schema(SchemaError::UnknownField(_)))
        ));
    }

    #[test]
    fn overflow_is_buffer_full() {
        let mut decoder = FrameDecoder::with_config(
            CountingCodec,
            FrameConfig {
                buffer_capacity: 1,
                ..FrameConfig::default()
            },
        );
        decoder.write(Bytes::from_static(&[3])).unwrap();
        assert!(matches!(
            decoder.write(Bytes::from_static(&[1])),
            Err(FrameError::BufferFull { capacity: 1 })
        ));
    }
}
