use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Writable destination for raw captured bytes
///
/// The recording session owns the sink once it is handed over and closes it
/// exactly once. Every method may fail with an I/O error.
pub trait Sink: Send {
    /// Write all of `bytes`
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Flush and release the destination
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Sink over any `io::Write`
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.writer.flush()?;
        debug!("Writer sink closed");
        Ok(())
    }
}

/// Sink writing raw PCM to a file on disk
pub type FileSink = WriterSink<File>;

impl WriterSink<File> {
    /// Create (or truncate) the file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {:?}", path))?;

        info!("Writing raw audio to {}", path.display());

        Ok(Self::new(file))
    }
}
