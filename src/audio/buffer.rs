use tracing::{debug, info};

use super::backend::{ChannelConfig, Encoding};
use crate::error::BufferSizeError;

/// Generic failure sentinel returned by a minimum-buffer-size query
pub const ERROR: i32 = -1;

/// Sentinel for parameters the platform does not support
pub const ERROR_BAD_VALUE: i32 = -2;

/// Platform query for the smallest usable capture buffer
///
/// Returns a size in bytes, or one of the `ERROR` / `ERROR_BAD_VALUE` sentinels.
pub trait MinBufferSize: Send + Sync {
    fn min_buffer_size(&self, sample_rate: u32, channels: ChannelConfig, encoding: Encoding) -> i32;
}

impl<F> MinBufferSize for F
where
    F: Fn(u32, ChannelConfig, Encoding) -> i32 + Send + Sync,
{
    fn min_buffer_size(&self, sample_rate: u32, channels: ChannelConfig, encoding: Encoding) -> i32 {
        self(sample_rate, channels, encoding)
    }
}

/// Sizes buffers to hold a fixed duration of audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyBufferSize {
    /// Buffer duration in milliseconds
    pub latency_ms: u32,
}

impl LatencyBufferSize {
    pub const MIN_SAMPLE_RATE: u32 = 4_000;
    pub const MAX_SAMPLE_RATE: u32 = 192_000;

    pub fn new(latency_ms: u32) -> Self {
        Self { latency_ms }
    }
}

impl Default for LatencyBufferSize {
    fn default() -> Self {
        Self { latency_ms: 100 } // 100ms buffers
    }
}

impl MinBufferSize for LatencyBufferSize {
    fn min_buffer_size(&self, sample_rate: u32, channels: ChannelConfig, encoding: Encoding) -> i32 {
        if !(Self::MIN_SAMPLE_RATE..=Self::MAX_SAMPLE_RATE).contains(&sample_rate) {
            return ERROR_BAD_VALUE;
        }
        if self.latency_ms == 0 {
            return ERROR;
        }

        let bytes = u64::from(sample_rate)
            * u64::from(channels.channel_count())
            * u64::from(encoding.bytes_per_sample())
            * u64::from(self.latency_ms)
            / 1000;

        i32::try_from(bytes).unwrap_or(i32::MAX)
    }
}

/// Capture buffer size resolved for one recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    sample_rate: u32,
    size_bytes: usize,
}

impl BufferConfig {
    /// Resolve the buffer size for `sample_rate` via the platform query.
    ///
    /// The query is asked about mono 16-bit PCM even though capture uses 8-bit
    /// samples; the result is a sizing heuristic. Any positive size that is not
    /// a sentinel is accepted as-is, however large. There is no retry and no
    /// fallback rate.
    pub fn resolve(sample_rate: u32, query: &dyn MinBufferSize) -> Result<Self, BufferSizeError> {
        if sample_rate == 0 {
            return Err(BufferSizeError::InvalidSampleRate);
        }

        let size = query.min_buffer_size(sample_rate, ChannelConfig::Mono, Encoding::Pcm16Bit);
        debug!("Minimum buffer size query for {}Hz returned {}", sample_rate, size);

        if !Self::valid_size(size) {
            return Err(BufferSizeError::InvalidBufferSize(size));
        }
        let size_bytes = usize::try_from(size).map_err(|_| BufferSizeError::InvalidBufferSize(size))?;

        info!("Capture buffer: {} bytes at {}Hz", size_bytes, sample_rate);

        Ok(Self {
            sample_rate,
            size_bytes,
        })
    }

    fn valid_size(size: i32) -> bool {
        size != ERROR && size != ERROR_BAD_VALUE && size > 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}
