//! Dev server liveness cache.
//!
//! # States
//! - Unknown: never probed (or probed by a previous instance, which is discarded)
//! - Up: last probe got 200 or 404
//! - Down: last probe failed
//!
//! # Design Decisions
//! - Unknown and Down are distinct so a failed probe is never mistaken for
//!   "not checked yet"
//! - An observation is only trusted inside its validity window

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Unknown,
    Up,
    Down,
}

/// Last probe outcome and when it was observed.
#[derive(Debug, Clone, Copy)]
pub struct ProbeCache {
    state: ProbeState,
    observed_at: Option<Instant>,
}

impl ProbeCache {
    pub const fn new() -> Self {
        Self {
            state: ProbeState::Unknown,
            observed_at: None,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// The cached result if it is younger than `window`.
    pub fn fresh(&self, window: Duration, now: Instant) -> Option<bool> {
        let observed_at = self.observed_at?;
        if now.saturating_duration_since(observed_at) >= window {
            return None;
        }
        match self.state {
            ProbeState::Up => Some(true),
            ProbeState::Down => Some(false),
            ProbeState::Unknown => None,
        }
    }

    pub fn record(&mut self, up: bool, now: Instant) {
        self.state = if up { ProbeState::Up } else { ProbeState::Down };
        self.observed_at = Some(now);
    }
}

impl Default for ProbeCache {
    fn default() -> Self {
        Self::new()
    }
}
