//! Frame-index mapping between the global counter and per-sample frame slots.
//!
//! The mapping is pure and stateless; the driver recomputes it on every tick
//! instead of caching results across mode changes.

use serde::{Deserialize, Serialize};

/// Playback speed mode. Slow mode interleaves synthesized in-between frames,
/// stretching a cycle from `F` to `2F - 1` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlaybackMode {
    /// One global step per frame slot.
    #[default]
    Normal,
    /// Odd global steps map to the midpoint between two adjacent slots.
    Slow,
}

impl PlaybackMode {
    /// Get the name of this playback mode.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Slow => "slow",
        }
    }

    /// Whether in-between frames are synthesized in this mode.
    #[inline]
    pub fn is_slow(&self) -> bool {
        matches!(self, Self::Slow)
    }
}

/// What a global frame index resolves to for one viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRef {
    /// One of the sample's original frame slots.
    Original { index: usize },
    /// A synthesized in-between frame. `upper` is clamped to the last valid slot,
    /// so the final half-step of a cycle interpolates the last frame with itself.
    Interpolated {
        lower: usize,
        upper: usize,
        alpha: f32,
    },
}

/// Number of global steps in one cycle: `F` in normal mode, `2F - 1` in slow mode.
#[inline]
pub fn cycle_length(frame_count: usize, mode: PlaybackMode) -> usize {
    match mode {
        PlaybackMode::Normal => frame_count,
        PlaybackMode::Slow => {
            if frame_count == 0 {
                0
            } else {
                2 * frame_count - 1
            }
        }
    }
}

/// Map a global frame index `g` in `[0, cycle_length)` to a frame reference.
///
/// In normal mode every index is an original slot. In slow mode even indices are
/// originals at `g / 2` and odd indices are the fixed midpoint between `g / 2`
/// and the following slot.
#[inline]
pub fn map_global_index(g: usize, frame_count: usize, mode: PlaybackMode) -> FrameRef {
    match mode {
        PlaybackMode::Normal => FrameRef::Original { index: g },
        PlaybackMode::Slow => {
            if g % 2 == 0 {
                FrameRef::Original { index: g / 2 }
            } else {
                let lower = g / 2;
                let upper = (lower + 1).min(frame_count.saturating_sub(1));
                FrameRef::Interpolated {
                    lower,
                    upper,
                    alpha: 0.5,
                }
            }
        }
    }
}
