//! Sequencer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SequencerError;

/// Configuration for a [`Sequencer`](crate::Sequencer) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Number of frame slots per sample (`F`). Every sample of a subject carries
    /// exactly this many animation steps.
    pub frame_count: usize,
    /// Number of viewer positions driven in lockstep (e.g. 2 for a left/right pair).
    pub viewer_positions: usize,
    /// Delay between two ticks within a cycle.
    pub frame_interval: Duration,
    /// Pause at the end of a cycle before the next samples are swapped in.
    pub cycle_pause: Duration,
    /// Retry delay when a tick fires before every viewer finished loading.
    pub retry_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            frame_count: 16,
            viewer_positions: 2,
            frame_interval: Duration::from_millis(40),
            cycle_pause: Duration::from_secs(3),
            retry_delay: Duration::from_millis(10),
        }
    }
}

impl SequencerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SequencerError> {
        if self.frame_count == 0 {
            return Err(SequencerError::InvalidConfig {
                reason: "frame_count must be nonzero".to_string(),
            });
        }
        if self.viewer_positions == 0 {
            return Err(SequencerError::InvalidConfig {
                reason: "viewer_positions must be nonzero".to_string(),
            });
        }
        if self.frame_interval.is_zero() {
            return Err(SequencerError::InvalidConfig {
                reason: "frame_interval must be nonzero".to_string(),
            });
        }
        Ok(())
    }
}
