//! Session tokens: invalidation stamps for timers and asynchronous loads.
//!
//! Exactly one token is live at a time. Every scheduled timer and in-flight load
//! captures the token it was started under and compares it against the current one
//! before touching any state; a mismatch means the operation silently discards its
//! result.

use serde::{Deserialize, Serialize};

/// A playback session stamp captured by timers and loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct SessionToken(u64);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing counter issuing session tokens.
#[derive(Debug, Default)]
pub struct SessionCounter {
    current: u64,
}

impl SessionCounter {
    /// Create a counter starting at session zero.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently live token.
    #[inline]
    pub fn current(&self) -> SessionToken {
        SessionToken(self.current)
    }

    /// Invalidate the current session and return the new live token.
    #[inline]
    pub fn bump(&mut self) -> SessionToken {
        self.current += 1;
        SessionToken(self.current)
    }

    /// Whether `token` is still the live session.
    #[inline]
    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current() == token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_invalidates_previous_token() {
        let mut sessions = SessionCounter::new();
        let first = sessions.current();
        assert!(sessions.is_current(first));

        let second = sessions.bump();
        assert!(!sessions.is_current(first));
        assert!(sessions.is_current(second));
        assert!(first < second);
    }
}
