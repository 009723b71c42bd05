use std::fmt::Write as _;

use bblog_frame::{HistoryEntry, MessageHistory, PacketBuffer};
use bytes::Bytes;
use tracing::error;

/// State of a session at the moment it failed.
#[derive(Debug)]
pub struct DiagnosticReport<'a> {
    pub error: &'a (dyn std::error::Error + 'static),
    pub entries: usize,
    pub fail_count: usize,
    pub history: &'a MessageHistory,
    pub buffer: &'a PacketBuffer,
}

impl DiagnosticReport<'_> {
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.entries()
    }

    pub fn buffered_packets(&self) -> impl Iterator<Item = &Bytes> {
        self.buffer.packets()
    }
}

/// Receives a report before a fatal session error is returned.
pub trait Diagnostics {
    fn dump(&mut self, report: &DiagnosticReport<'_>);
}

impl<D: Diagnostics + ?Sized> Diagnostics for Box<D> {
    fn dump(&mut self, report: &DiagnosticReport<'_>) {
        (**self).dump(report)
    }
}

/// Logs the report at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn dump(&mut self, report: &DiagnosticReport<'_>) {
        error!(
            error = %report.error,
            entries = report.entries,
            fail_count = report.fail_count,
            "log transfer failed, dumping recent frames"
        );
        for entry in report.history() {
            error!(
                seq = entry.seq,
                size = entry.size,
                raw = %hex(&entry.raw),
                error = entry.error.as_deref().unwrap_or(""),
                "frame"
            );
        }
        for (index, packet) in report.buffered_packets().enumerate() {
            error!(index, len = packet.len(), raw = %hex(packet), "buffered packet");
        }
    }
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn dump(&mut self, _report: &DiagnosticReport<'_>) {}
}

/// Lowercase hex without separators.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_pairs() {
        assert_eq!(hex(&[0x00, 0xAB, 0x7f]), "00ab7f");
        assert_eq!(hex(&[]), "");
    }
}
