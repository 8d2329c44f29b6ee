//! Error types for the sequencer.
//!
//! Only caller mistakes surface as errors. Runtime mishaps (a step that fails to
//! load, a stale completion after a reset) are recovered in place and logged,
//! never propagated.

use serde::{Deserialize, Serialize};

/// Error type for sequencer operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SequencerError {
    /// A playback control call that the current state does not allow
    #[error("invalid playback transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The sequencer has been torn down and accepts no further playback
    #[error("sequencer has been torn down")]
    TornDown,

    /// A sample policy was constructed over an empty roster
    #[error("sample roster is empty")]
    EmptyRoster,

    /// Invalid configuration
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SequencerError {
    /// Get error category for logging/metrics.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } | Self::TornDown => "playback",
            Self::EmptyRoster => "policy",
            Self::InvalidConfig { .. } => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let playback = SequencerError::InvalidTransition {
            from: "idle".to_string(),
            to: "paused".to_string(),
        };
        assert_eq!(playback.category(), "playback");
        assert_eq!(SequencerError::TornDown.category(), "playback");
        assert_eq!(SequencerError::EmptyRoster.category(), "policy");
    }

    #[test]
    fn test_serialization() {
        let error = SequencerError::InvalidConfig {
            reason: "frame_count must be nonzero".to_string(),
        };
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: SequencerError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
