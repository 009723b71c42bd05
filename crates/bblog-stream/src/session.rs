use std::sync::Arc;

use bblog_frame::{
    DecodeOutcome, FrameDecoder, FrameError, RecoveryAction, ReorderRecovery,
};
use bblog_schema::{EntryCodec, FieldRegistry, RecordCodec, SensorRecord};
use bytes::Bytes;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::diagnostics::{DiagnosticReport, Diagnostics, TracingDiagnostics};
use crate::error::{Result, StreamError};
use crate::sink::{OutputSink, Value};

/// Progress reported by [`SensorStreamSession::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Keep feeding packets.
    Continue,
    /// The transfer is over: end-of-log record seen or entry limit reached.
    Complete { entries: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Complete,
    Failed,
}

/// One log fetch: packets in, rows out.
///
/// The session never blocks and does no I/O besides writing to its sink.
/// The transport calls [`feed`](Self::feed) once per notification and stops
/// on `Complete` or an error.
pub struct SensorStreamSession<S, C = EntryCodec> {
    config: SessionConfig,
    registry: Arc<FieldRegistry>,
    decoder: FrameDecoder<C>,
    recovery: ReorderRecovery,
    sink: S,
    diagnostics: Box<dyn Diagnostics + Send>,
    entries: usize,
    last_columns: Option<Vec<String>>,
    phase: Phase,
}

impl<S: OutputSink> SensorStreamSession<S, EntryCodec> {
    /// Session decoding `bb_log_entry` frames against `registry`.
    pub fn new(config: SessionConfig, registry: Arc<FieldRegistry>, sink: S) -> Self {
        let codec = EntryCodec::new(Arc::clone(&registry));
        Self::with_codec(config, registry, codec, sink)
    }
}

impl<S: OutputSink, C: RecordCodec> SensorStreamSession<S, C> {
    pub fn with_codec(config: SessionConfig, registry: Arc<FieldRegistry>, codec: C, sink: S) -> Self {
        Self {
            decoder: FrameDecoder::with_config(codec, config.frame_config()),
            recovery: ReorderRecovery::new(config.recovery.clone()),
            config,
            registry,
            sink,
            diagnostics: Box::new(TracingDiagnostics),
            entries: 0,
            last_columns: None,
            phase: Phase::Running,
        }
    }

    /// Replace the default [`TracingDiagnostics`].
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + Send + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Process one transport packet.
    ///
    /// Decodes as many frames as the buffered bytes allow. A frame that
    /// fails to decode is retried under the next packet order on the next
    /// call; an empty packet triggers the retry without adding data.
    pub fn feed(&mut self, packet: Bytes) -> Result<SessionState> {
        match self.phase {
            Phase::Running => {}
            Phase::Complete => return Ok(self.complete_state()),
            Phase::Failed => return Err(StreamError::Closed),
        }

        if let Err(err) = self.decoder.write(packet) {
            return Err(self.fail(err.into()));
        }

        loop {
            if self.limit_reached() {
                debug!(entries = self.entries, "entry limit reached");
                return self.finish();
            }

            let order = self.recovery.current_order().cloned();
            let outcome = match self.decoder.decode_next(order.as_ref()) {
                Ok(outcome) => outcome,
                Err(err) => return Err(self.fail(err.into())),
            };

            match outcome {
                DecodeOutcome::NeedMoreData => return Ok(SessionState::Continue),
                DecodeOutcome::EndOfStream => {
                    self.recovery.record_success();
                    return self.finish();
                }
                DecodeOutcome::Frame(record) => {
                    self.recovery.record_success();
                    if let Err(err) = self.emit(&record) {
                        return Err(self.fail(err));
                    }
                    self.entries += 1;
                }
                DecodeOutcome::Corrupt(source) => match self.recovery.record_failure() {
                    RecoveryAction::Retry { .. } => return Ok(SessionState::Continue),
                    RecoveryAction::Exhausted { attempts } => {
                        let err = FrameError::Unrecoverable { attempts, source };
                        return Err(self.fail(err.into()));
                    }
                },
            }
        }
    }

    /// Run the remaining recovery attempts for a pending corrupt frame now.
    ///
    /// For sources that ended or went quiet while a frame is awaiting its
    /// retry. Returns `Continue` when nothing was pending or the recovered
    /// data still needs more packets.
    pub fn retry_pending(&mut self) -> Result<SessionState> {
        let mut state = SessionState::Continue;
        while self.phase == Phase::Running && self.recovery.fail_count() > 0 {
            debug!(fail_count = self.recovery.fail_count(), "retrying pending frame");
            state = self.feed(Bytes::new())?;
        }
        match self.phase {
            Phase::Running => Ok(state),
            Phase::Complete => Ok(self.complete_state()),
            Phase::Failed => Err(StreamError::Closed),
        }
    }

    /// Copying variant of [`feed`](Self::feed).
    pub fn feed_slice(&mut self, packet: &[u8]) -> Result<SessionState> {
        self.feed(Bytes::copy_from_slice(packet))
    }

    /// Entries written to the sink so far.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Failed decode attempts on the current frame.
    pub fn fail_count(&self) -> usize {
        self.recovery.fail_count()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.phase == Phase::Failed
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<FieldRegistry> {
        &self.registry
    }

    pub fn decoder(&self) -> &FrameDecoder<C> {
        &self.decoder
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn limit_reached(&self) -> bool {
        self.config
            .max_entries
            .is_some_and(|max| self.entries >= max)
    }

    fn complete_state(&self) -> SessionState {
        SessionState::Complete {
            entries: self.entries,
        }
    }

    fn finish(&mut self) -> Result<SessionState> {
        if let Err(err) = self.sink.flush() {
            return Err(self.fail(StreamError::Sink(err)));
        }
        self.phase = Phase::Complete;
        info!(entries = self.entries, "log transfer complete");
        Ok(self.complete_state())
    }

    fn emit(&mut self, record: &SensorRecord) -> Result<()> {
        let values = record
            .iter()
            .map(|(column, raw)| self.convert(column, raw))
            .collect::<Result<Vec<_>>>()?;

        let header_changed = self.last_columns.as_deref() != Some(record.columns());
        if header_changed {
            debug!(columns = ?record.columns(), "new header");
            self.last_columns = Some(record.columns().to_vec());
        }

        self.sink
            .write(record.columns(), &values, header_changed)
            .map_err(StreamError::Sink)
    }

    fn convert(&self, column: &str, raw: i64) -> Result<Value> {
        if self.config.raw {
            return Ok(Value::Int(raw));
        }
        let field = self
            .registry
            .field_for_column(column)
            .map_err(FrameError::Schema)?;
        Ok(Value::Float(field.to_physical_unit(raw as f64)))
    }

    fn fail(&mut self, err: StreamError) -> StreamError {
        let report = DiagnosticReport {
            error: &err,
            entries: self.entries,
            fail_count: self.recovery.fail_count(),
            history: self.decoder.history(),
            buffer: self.decoder.buffer(),
        };
        self.diagnostics.dump(&report);
        self.phase = Phase::Failed;
        err
    }
}
