//! Recording session management
//!
//! This module provides the `RecordingSession` abstraction that manages:
//! - Buffer sizing and capture source setup
//! - The capture loop thread (read, write to sink, amplitude, listener)
//! - Lifecycle state shared with callers
//! - Session statistics

mod config;
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use session::{Listener, RecordingSession};
pub use state::SessionState;
pub use stats::SessionStats;
