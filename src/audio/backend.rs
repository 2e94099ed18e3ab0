use std::fmt;

use crate::error::CaptureError;

/// Channel layout requested from the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelConfig {
    /// Single channel (the only layout this crate records)
    Mono,
}

impl ChannelConfig {
    pub fn channel_count(self) -> u16 {
        match self {
            ChannelConfig::Mono => 1,
        }
    }
}

/// PCM sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Unsigned 8-bit PCM (the capture payload)
    Pcm8Bit,
    /// Signed 16-bit PCM (used only for buffer sizing queries)
    Pcm16Bit,
}

impl Encoding {
    pub fn bytes_per_sample(self) -> u32 {
        match self {
            Encoding::Pcm8Bit => 1,
            Encoding::Pcm16Bit => 2,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Pcm8Bit => write!(f, "pcm8"),
            Encoding::Pcm16Bit => write!(f, "pcm16"),
        }
    }
}

/// Parameters a capture source is opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureParams {
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub channels: ChannelConfig,
    pub encoding: Encoding,
    /// Size of the read buffer the session will use
    pub buffer_size_bytes: usize,
}

/// A platform audio input producing fixed-rate mono samples
///
/// Implementations:
/// - `WavCaptureSource`: replays a WAV file (testing / offline runs)
///
/// All methods are called from the capture thread. `read` may block until a
/// chunk is available.
pub trait CaptureSource: Send {
    /// Begin producing samples
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Read up to `buf.len()` bytes, returning the number of bytes filled
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError>;

    /// Stop producing samples. Returns `NotStarted` if the source never started.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Release device resources
    fn release(self: Box<Self>);
}

/// Opens capture sources for a recording session
pub trait CaptureSourceOpener: Send + Sync {
    /// Open a source, or report `CaptureError::Uninitialized` if the device
    /// cannot be set up with `params`
    fn open(&self, params: &CaptureParams) -> Result<Box<dyn CaptureSource>, CaptureError>;

    /// Opener name for logging
    fn name(&self) -> &str;
}
