pub mod backend;
pub mod buffer;
pub mod file;
pub mod level;
pub mod sink;

pub use backend::{CaptureParams, CaptureSource, CaptureSourceOpener, ChannelConfig, Encoding};
pub use buffer::{BufferConfig, LatencyBufferSize, MinBufferSize, ERROR, ERROR_BAD_VALUE};
pub use file::{AudioFile, WavCaptureSource, WavSourceOpener};
pub use level::signal_amplitude;
pub use sink::{FileSink, Sink, WriterSink};
