use std::collections::VecDeque;

use bytes::Bytes;

/// Default number of frames remembered for diagnostics.
pub const DEFAULT_HISTORY_LEN: usize = 32;

/// One remembered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Frame sequence number, counted from the start of the transfer.
    pub seq: u64,
    /// Announced payload length.
    pub size: usize,
    /// Payload bytes as they were decoded (or failed to decode).
    pub raw: Bytes,
    /// Decode error, if the frame failed.
    pub error: Option<String>,
}

/// Ring of the most recent frames.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl MessageHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        if self.limit == 0 {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seq: u64) -> HistoryEntry {
        HistoryEntry {
            seq,
            size: 1,
            raw: Bytes::from(vec![seq as u8]),
            error: None,
        }
    }

    #[test]
    fn keeps_only_the_newest_entries() {
        let mut history = MessageHistory::new(3);
        for seq in 0..5 {
            history.record(entry(seq));
        }
        let seqs: Vec<_> = history.entries().map(|e| e.seq).collect();
        assert_eq!(seqs, [2, 3, 4]);
        assert_eq!(history.last().map(|e| e.seq), Some(4));
    }

    #[test]
    fn zero_limit_records_nothing() {
        let mut history = MessageHistory::new(0);
        history.record(entry(0));
        assert!(history.is_empty());
    }
}
