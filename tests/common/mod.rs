// Scripted collaborators for driving a RecordingSession in tests

#![allow(dead_code)]

use mic_recorder::{CaptureError, CaptureParams, CaptureSource, CaptureSourceOpener, Sink};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// One scripted read result
pub enum Read {
    Chunk(Vec<u8>),
    /// Report more bytes than the buffer holds
    Oversized,
    Error(i32),
    EndOfStream,
}

/// Counters shared between a test and the source it hands to the session
#[derive(Default)]
pub struct SourceCounters {
    pub opened: AtomicUsize,
    pub started: AtomicUsize,
    pub reads: AtomicUsize,
    pub stopped: AtomicUsize,
    pub released: AtomicUsize,
    pub params: Mutex<Option<CaptureParams>>,
}

pub struct ScriptedOpener {
    script: Mutex<Option<VecDeque<Read>>>,
    fail_open: bool,
    /// Delay for reads once the script is exhausted
    idle_read: Duration,
    pub counters: Arc<SourceCounters>,
}

impl ScriptedOpener {
    pub fn new(script: Vec<Read>) -> Self {
        Self {
            script: Mutex::new(Some(script.into())),
            fail_open: false,
            idle_read: Duration::from_millis(1),
            counters: Arc::new(SourceCounters::default()),
        }
    }

    /// Source that reports an uninitialized device on open
    pub fn uninitialized() -> Self {
        let mut opener = Self::new(Vec::new());
        opener.fail_open = true;
        opener
    }

    pub fn with_idle_read(mut self, delay: Duration) -> Self {
        self.idle_read = delay;
        self
    }
}

impl CaptureSourceOpener for ScriptedOpener {
    fn open(&self, params: &CaptureParams) -> Result<Box<dyn CaptureSource>, CaptureError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        *self.counters.params.lock().unwrap() = Some(params.clone());

        if self.fail_open {
            return Err(CaptureError::Uninitialized("scripted failure".to_string()));
        }

        let script = self.script.lock().unwrap().take().unwrap_or_default();
        Ok(Box::new(ScriptedSource {
            script,
            idle_read: self.idle_read,
            started: false,
            counters: Arc::clone(&self.counters),
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedSource {
    script: VecDeque<Read>,
    idle_read: Duration,
    started: bool,
    counters: Arc<SourceCounters>,
}

impl CaptureSource for ScriptedSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.started = true;
        self.counters.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(Read::Chunk(bytes)) => {
                let len = bytes.len().min(buf.len());
                buf[..len].copy_from_slice(&bytes[..len]);
                Ok(len)
            }
            Some(Read::Oversized) => Ok(buf.len() + 1),
            Some(Read::Error(code)) => Err(CaptureError::Read(code)),
            Some(Read::EndOfStream) => Err(CaptureError::EndOfStream),
            None => {
                // Nothing scripted: behave like a device with no data yet
                thread::sleep(self.idle_read);
                Err(CaptureError::Read(-3))
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        if !self.started {
            return Err(CaptureError::NotStarted);
        }
        self.started = false;
        Ok(())
    }

    fn release(self: Box<Self>) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a sink saw, shared with the test
#[derive(Default)]
pub struct SinkLog {
    pub writes: Mutex<Vec<Vec<u8>>>,
    pub flushes: AtomicUsize,
    pub closes: AtomicUsize,
}

impl SinkLog {
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

pub struct MemorySink {
    log: Arc<SinkLog>,
    /// 1-based write number that fails
    fail_on_write: Option<usize>,
    fail_on_close: bool,
}

impl MemorySink {
    pub fn new() -> (Self, Arc<SinkLog>) {
        let log = Arc::new(SinkLog::default());
        (
            Self {
                log: Arc::clone(&log),
                fail_on_write: None,
                fail_on_close: false,
            },
            log,
        )
    }

    pub fn failing_on_write(n: usize) -> (Self, Arc<SinkLog>) {
        let (mut sink, log) = Self::new();
        sink.fail_on_write = Some(n);
        (sink, log)
    }

    pub fn failing_on_close() -> (Self, Arc<SinkLog>) {
        let (mut sink, log) = Self::new();
        sink.fail_on_close = true;
        (sink, log)
    }
}

impl Sink for MemorySink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut writes = self.log.writes.lock().unwrap();
        if self.fail_on_write == Some(writes.len() + 1) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        writes.push(bytes.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.log.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_close {
            return Err(io::Error::new(io::ErrorKind::Other, "close failed"));
        }
        Ok(())
    }
}

/// Listener recording every buffer it receives
#[derive(Default)]
pub struct CollectingListener {
    pub chunks: Mutex<Vec<Vec<u8>>>,
}

impl mic_recorder::Listener for CollectingListener {
    fn on_data_received(&self, bytes: &[u8]) {
        self.chunks.lock().unwrap().push(bytes.to_vec());
    }
}

impl CollectingListener {
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks.lock().unwrap().clone()
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Buffer-size query returning a fixed value
pub fn fixed_size(size: i32) -> impl Fn(u32, mic_recorder::ChannelConfig, mic_recorder::Encoding) -> i32 + Send + Sync {
    move |_, _, _| size
}
