use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use bblog_frame::RecoveryConfig;
use bblog_schema::FieldRegistry;
use bblog_stream::{OutputSink, SensorStreamSession, SessionConfig, SessionState};
use bytes::Bytes;
use tracing::{info, warn};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{io_error, stream_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS};

pub fn run(args: DecodeArgs) -> CliResult<i32> {
    let registry = Arc::new(FieldRegistry::new());
    let mut config = SessionConfig {
        raw: args.raw,
        max_entries: args.num,
        ..SessionConfig::default()
    };
    if args.no_recovery {
        config.recovery = RecoveryConfig::disabled();
    }
    if let Some(capacity) = args.buffer_capacity {
        config.buffer_capacity = capacity;
    }

    let out: Box<dyn Write + Send> = match &args.file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("create {}", path.display()), err))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let sink = args.fmt.writer(Arc::clone(&registry), out);
    let mut session = SensorStreamSession::new(config, registry, sink);

    let reader = open_capture(&args.capture)?;
    let mut packets = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| io_error("read capture", err))?;
        let Some(packet) = parse_line(&line).map_err(|msg| {
            CliError::new(DATA_INVALID, format!("capture line {}: {msg}", index + 1))
        })?
        else {
            continue;
        };
        packets += 1;

        match session.feed(packet).map_err(|err| stream_error("decode", err))? {
            SessionState::Continue => {}
            SessionState::Complete { entries } => {
                info!(entries, packets, "decode complete");
                return Ok(SUCCESS);
            }
        }
    }

    if session.fail_count() > 0 {
        let state = session
            .retry_pending()
            .map_err(|err| stream_error("decode", err))?;
        if let SessionState::Complete { entries } = state {
            info!(entries, packets, "decode complete after recovery");
            return Ok(SUCCESS);
        }
    }

    let entries = session.entry_count();
    session
        .sink_mut()
        .flush()
        .map_err(|err| io_error("write rows", err))?;
    warn!(entries, packets, "capture ended before the end of the log");
    Err(CliError::new(
        FAILURE,
        format!("capture ended before the end of the log ({entries} entries decoded)"),
    ))
}

fn open_capture(path: &Path) -> CliResult<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|err| io_error(&format!("open {}", path.display()), err))?;
    Ok(Box::new(BufReader::new(file)))
}

/// One notification payload per line, hex encoded. Whitespace between bytes
/// is allowed, `#` starts a comment. Returns `None` for lines without data.
fn parse_line(line: &str) -> Result<Option<Bytes>, String> {
    let data = line.split('#').next().unwrap_or_default();
    if data.trim().is_empty() {
        return Ok(None);
    }
    parse_hex(data).map(|packet| Some(Bytes::from(packet)))
}
