//! Atomic session lifecycle.
//!
//! `Idle -> Recording -> Stopping -> Stopped`. Shared between the caller
//! threads and the capture thread; every transition is a single atomic
//! operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Recording session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SessionState {
    /// Created, or `start()` failed before capture began.
    Idle = 0,
    /// Capture loop running.
    Recording = 1,
    /// Stop requested or loop failed; sink closed, loop winding down.
    Stopping = 2,
    /// Loop exited and capture source released. Terminal.
    Stopped = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Recording,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Recording => write!(f, "recording"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(SessionState::Idle as u8))
    }

    pub(crate) fn load(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.load() == SessionState::Recording
    }

    /// Idle -> Recording. Fails if a stop was requested in the meantime.
    pub(crate) fn begin_recording(&self) -> bool {
        self.0
            .compare_exchange(
                SessionState::Idle as u8,
                SessionState::Recording as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Idle | Recording -> Stopping. Returns true if this call made the
    /// transition.
    pub(crate) fn begin_stopping(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                match SessionState::from_u8(v) {
                    SessionState::Idle | SessionState::Recording => Some(SessionState::Stopping as u8),
                    SessionState::Stopping | SessionState::Stopped => None,
                }
            })
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.0.store(SessionState::Stopped as u8, Ordering::Release);
    }
}
