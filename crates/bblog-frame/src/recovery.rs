//! Retrying a corrupt frame under alternate packet orders.
//!
//! Some BLE stacks deliver notifications out of order. When a frame fails to
//! decode, the same byte window is replayed with the oldest packets
//! permuted. The budget is bounded: a window that fails under every
//! candidate ends the transfer.

use tracing::{info, warn};

use crate::buffer::PacketOrder;

/// Candidate packet orders tried after a decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    pub permutations: Vec<PacketOrder>,
}

impl RecoveryConfig {
    pub fn new(permutations: Vec<PacketOrder>) -> Self {
        Self { permutations }
    }

    /// No retries: the first corrupt frame is fatal.
    pub fn disabled() -> Self {
        Self {
            permutations: Vec::new(),
        }
    }

    /// Decode attempts allowed per window before giving up.
    pub fn max_attempts(&self) -> usize {
        self.permutations.len() + 1
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            permutations: vec![
                PacketOrder::identity(3),
                PacketOrder::identity(3).swapped(1, 2),
                PacketOrder::identity(3).swapped(0, 1),
            ],
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Decode the window again with [`ReorderRecovery::current_order`].
    Retry { attempt: usize },
    /// Every candidate has failed.
    Exhausted { attempts: usize },
}

/// Failure counter over one byte window.
#[derive(Debug, Clone)]
pub struct ReorderRecovery {
    config: RecoveryConfig,
    fail_count: usize,
}

impl ReorderRecovery {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            config,
            fail_count: 0,
        }
    }

    pub fn fail_count(&self) -> usize {
        self.fail_count
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Order for the next decode attempt. `None` means arrival order.
    ///
    /// After `k` failures the candidate at `k % len` is used, so the first
    /// retry skips the leading candidate (already covered by the natural
    /// attempt) and the last retry wraps around to it.
    pub fn current_order(&self) -> Option<&PacketOrder> {
        if self.fail_count == 0 {
            return None;
        }
        let candidates = &self.config.permutations;
        candidates.get(self.fail_count % candidates.len().max(1))
    }

    pub fn record_failure(&mut self) -> RecoveryAction {
        self.fail_count += 1;
        if self.fail_count > self.config.permutations.len() {
            return RecoveryAction::Exhausted {
                attempts: self.fail_count,
            };
        }
        let order = self.current_order().map(PacketOrder::indices);
        warn!(attempt = self.fail_count, ?order, "corrupt frame, retrying with reordered packets");
        RecoveryAction::Retry {
            attempt: self.fail_count,
        }
    }

    /// Reset after a good frame. Returns the number of failed attempts that
    /// preceded it, if any.
    pub fn record_success(&mut self) -> Option<usize> {
        if self.fail_count == 0 {
            return None;
        }
        let failures = std::mem::take(&mut self.fail_count);
        info!(failures, "recovered from corrupt frame");
        Some(failures)
    }

    pub fn reset(&mut self) {
        self.fail_count = 0;
    }
}

impl Default for ReorderRecovery {
    fn default() -> Self {
        Self::new(RecoveryConfig::default())
    }
}
