use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::SessionState;

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Lifecycle state when the snapshot was taken
    pub state: SessionState,

    /// When capture began, if it ever did
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since capture began (0 if it never did)
    pub duration_secs: f64,

    /// Chunks written to the sink
    pub chunks_written: u64,

    /// Bytes written to the sink
    pub bytes_written: u64,

    /// Reads skipped because the source reported an error or a bad length
    pub skipped_reads: u64,

    /// Latest amplitude value
    pub amplitude: u32,

    /// Resolved capture buffer size, if resolution has happened
    pub buffer_size_bytes: Option<usize>,
}
