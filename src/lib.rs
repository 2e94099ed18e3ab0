pub mod audio;
pub mod config;
pub mod error;
pub mod session;

pub use audio::{
    AudioFile, BufferConfig, CaptureParams, CaptureSource, CaptureSourceOpener, ChannelConfig,
    Encoding, FileSink, LatencyBufferSize, MinBufferSize, Sink, WavCaptureSource,
    WavSourceOpener, WriterSink,
};
pub use config::Config;
pub use error::{BufferSizeError, CaptureError};
pub use session::{Listener, RecordingSession, SessionConfig, SessionState, SessionStats};
