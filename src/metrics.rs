//! Playback counters for diagnostics.

use serde::Serialize;

/// Counters accumulated over the lifetime of a sequencer instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SequencerMetrics {
    /// Ticks that fired (including deferred ones).
    pub ticks: u64,
    /// Ticks skipped because a viewer had not finished loading.
    pub ticks_deferred: u64,
    /// Visibility updates performed.
    pub frames_shown: u64,
    /// In-between frames synthesized and cached.
    pub interpolations_synthesized: u64,
    /// Steps whose data could not be loaded (slot left blank).
    pub load_failures: u64,
    /// Asynchronous completions discarded because their session went stale.
    pub stale_results_discarded: u64,
    /// Completed cycles (sample swaps).
    pub cycles_completed: u64,
}

impl SequencerMetrics {
    /// Create new metrics.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counters.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
