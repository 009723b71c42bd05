//! Feeding a session from an async notification source.

use std::time::Duration;

use bblog_schema::RecordCodec;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Result, StreamError};
use crate::session::{SensorStreamSession, SessionState};
use crate::sink::OutputSink;

/// Drive `session` with packets from `rx` until the log transfer ends.
///
/// Transport callbacks push notification payloads into the channel's
/// sender; this is the single consumer. Returns the number of entries on
/// completion. Stops with [`StreamError::Disconnected`] when every sender
/// is dropped first, [`StreamError::Cancelled`] on `cancel` and
/// [`StreamError::Timeout`] when no packet arrives within `idle_timeout`.
/// Before reporting a disconnect or timeout, a frame still awaiting
/// recovery is retried under the remaining packet orders.
pub async fn drive<S, C>(
    session: &mut SensorStreamSession<S, C>,
    rx: &mut mpsc::Receiver<Bytes>,
    cancel: &CancellationToken,
    idle_timeout: Option<Duration>,
) -> Result<usize>
where
    S: OutputSink,
    C: RecordCodec,
{
    let mut packets = 0u64;
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                info!(packets, entries = session.entry_count(), "log transfer cancelled");
                return Err(StreamError::Cancelled);
            }
            next = recv(rx, idle_timeout) => next,
        };

        let packet = match next {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                debug!(packets, "notification channel closed");
                return settle(session, StreamError::Disconnected);
            }
            Err(err) => return settle(session, err),
        };
        packets += 1;

        if let SessionState::Complete { entries } = session.feed(packet)? {
            return Ok(entries);
        }
    }
}

/// Give a pending corrupt frame its last chance once no more packets come.
fn settle<S, C>(session: &mut SensorStreamSession<S, C>, err: StreamError) -> Result<usize>
where
    S: OutputSink,
    C: RecordCodec,
{
    if session.fail_count() > 0 {
        if let SessionState::Complete { entries } = session.retry_pending()? {
            return Ok(entries);
        }
    }
    Err(err)
}

async fn recv(rx: &mut mpsc::Receiver<Bytes>, idle_timeout: Option<Duration>) -> Result<Option<Bytes>> {
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, rx.recv())
            .await
            .map_err(|_| StreamError::Timeout(limit)),
        None => Ok(rx.recv().await),
    }
}
