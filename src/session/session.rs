use super::config::SessionConfig;
use super::state::{SessionState, StateCell};
use super::stats::SessionStats;
use crate::audio::{
    signal_amplitude, BufferConfig, CaptureParams, CaptureSource, CaptureSourceOpener,
    ChannelConfig, Encoding, LatencyBufferSize, MinBufferSize, Sink,
};
use chrono::{DateTime, Utc};
use std::io;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, error, info, warn};

/// Receives every captured chunk.
///
/// Runs synchronously on the capture thread, never on the caller's thread.
/// It must return promptly; slow consumers should forward the data through a
/// channel. The slice is the session's whole reusable read buffer: after a
/// short read its tail still holds bytes from earlier chunks.
pub trait Listener: Send + Sync {
    fn on_data_received(&self, bytes: &[u8]);
}

impl<F> Listener for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn on_data_received(&self, bytes: &[u8]) {
        self(bytes)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the session handle and the capture thread
struct Shared {
    session_id: String,
    state: StateCell,
    amplitude: AtomicU32,
    sink: Mutex<Option<Box<dyn Sink>>>,
    chunks_written: AtomicU64,
    bytes_written: AtomicU64,
    skipped_reads: AtomicU64,
    /// Set by the capture thread when it begins running
    capture_thread: OnceLock<ThreadId>,
}

impl Shared {
    /// Move to Stopping and close the sink. Both steps are no-ops when
    /// already done, so either thread may call this at any time.
    fn stop_internal(&self) {
        if self.state.begin_stopping() {
            info!(session_id = %self.session_id, "Stopping recording");
        }

        let sink = lock(&self.sink).take();
        if let Some(sink) = sink {
            if let Err(e) = sink.close() {
                error!("Failed to close sink: {}", e);
            }
        }
    }

    /// Write one chunk and flush it before returning
    fn write_chunk(&self, bytes: &[u8]) -> io::Result<()> {
        let mut slot = lock(&self.sink);
        let sink = slot
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "sink already closed"))?;

        sink.write(bytes)?;
        sink.flush()?;

        self.chunks_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

/// A single-use microphone recording
///
/// `start()` spawns a capture thread that reads fixed-size chunks from the
/// capture source, writes each one to the sink, updates the amplitude and
/// hands the buffer to the listener. `stop()` ends it and waits for the thread.
/// Failures never propagate out of these methods; they are logged and show up
/// as `is_recording()` returning false.
pub struct RecordingSession {
    config: SessionConfig,
    shared: Arc<Shared>,
    opener: Box<dyn CaptureSourceOpener>,
    buffer_query: Box<dyn MinBufferSize>,
    listener: Option<Weak<dyn Listener>>,
    buffer_size: OnceLock<usize>,
    started_at: OnceLock<DateTime<Utc>>,
    loop_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RecordingSession {
    /// Create an idle session that will record into `sink`
    pub fn new(
        config: SessionConfig,
        opener: Box<dyn CaptureSourceOpener>,
        sink: Box<dyn Sink>,
    ) -> Self {
        info!(
            "Creating recording session: {} ({}Hz, source: {})",
            config.session_id,
            config.sample_rate,
            opener.name()
        );

        let shared = Arc::new(Shared {
            session_id: config.session_id.clone(),
            state: StateCell::new(),
            amplitude: AtomicU32::new(0),
            sink: Mutex::new(Some(sink)),
            chunks_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            skipped_reads: AtomicU64::new(0),
            capture_thread: OnceLock::new(),
        });

        Self {
            config,
            shared,
            opener,
            buffer_query: Box::new(LatencyBufferSize::default()),
            listener: None,
            buffer_size: OnceLock::new(),
            started_at: OnceLock::new(),
            loop_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Notify `listener` of every chunk.
    ///
    /// Only a weak reference is kept: the caller owns the listener, and
    /// notifications stop once it is dropped.
    pub fn with_listener<L: Listener + 'static>(mut self, listener: &Arc<L>) -> Self {
        let weak: Weak<L> = Arc::downgrade(listener);
        self.listener = Some(weak);
        self
    }

    /// Replace the minimum-buffer-size query (default: 100ms of audio)
    pub fn with_buffer_query(mut self, query: impl MinBufferSize + 'static) -> Self {
        self.buffer_query = Box::new(query);
        self
    }

    /// Start recording.
    ///
    /// Does nothing (besides a warning) unless the session is idle. A buffer
    /// size that fails validation or a source that cannot be initialized
    /// leaves the session idle.
    pub fn start(&self) {
        // Held until the thread handle is stored so stop() always sees it
        let mut loop_handle = lock(&self.loop_handle);

        let state = self.shared.state.load();
        if state != SessionState::Idle {
            warn!(%state, "Recording already started");
            return;
        }

        let buffer = match BufferConfig::resolve(self.config.sample_rate, self.buffer_query.as_ref()) {
            Ok(buffer) => buffer,
            Err(e) => {
                error!("Failed to resolve capture buffer size: {}", e);
                return;
            }
        };
        let buffer_size = *self.buffer_size.get_or_init(|| buffer.size_bytes());

        let params = CaptureParams {
            sample_rate: buffer.sample_rate(),
            channels: ChannelConfig::Mono,
            encoding: Encoding::Pcm8Bit,
            buffer_size_bytes: buffer_size,
        };

        let mut source = match self.opener.open(&params) {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to start recording: {}", e);
                return;
            }
        };

        if let Err(e) = source.start() {
            warn!("Failed to start capture source: {}", e);
            source.release();
            return;
        }

        if !self.shared.state.begin_recording() {
            warn!("Session stopped while starting");
            if let Err(e) = source.stop() {
                debug!("Failed to stop capture source: {}", e);
            }
            source.release();
            return;
        }

        let _ = self.started_at.set(Utc::now());

        let capture = CaptureLoop {
            shared: Arc::clone(&self.shared),
            source: Some(source),
            buffer: vec![0; buffer_size],
            listener: self.listener.clone(),
        };

        // On failure the closure is dropped, and CaptureLoop's Drop finalizes
        match thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || capture.run())
        {
            Ok(handle) => {
                *loop_handle = Some(handle);
                info!(
                    "Recording session started: {} ({} byte chunks)",
                    self.config.session_id, buffer_size
                );
            }
            Err(e) => error!("Failed to spawn capture thread: {}", e),
        }
    }

    /// Stop recording and wait for the capture thread to exit.
    ///
    /// Idempotent. Also valid after the loop stopped on its own, or on a
    /// session that never started. Blocks for at most one in-flight read.
    pub fn stop(&self) {
        self.shared.stop_internal();
        join_loop(&self.loop_handle, &self.shared);
    }

    /// `stop()` for async callers. The join runs on the blocking pool; if
    /// this future is dropped early the capture thread still finalizes.
    pub async fn stop_async(&self) {
        self.shared.stop_internal();

        let loop_handle = Arc::clone(&self.loop_handle);
        let shared = Arc::clone(&self.shared);
        if let Err(e) = tokio::task::spawn_blocking(move || join_loop(&loop_handle, &shared)).await {
            error!("Capture join task failed: {}", e);
        }
    }

    /// True while the capture loop is running
    pub fn is_recording(&self) -> bool {
        self.shared.state.is_recording()
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.load()
    }

    /// Latest amplitude; may lag the capture thread by one chunk
    pub fn amplitude(&self) -> u32 {
        self.shared.amplitude.load(Ordering::Relaxed)
    }

    /// Resolved capture buffer size, `None` until a start resolved it
    pub fn buffer_size_bytes(&self) -> Option<usize> {
        self.buffer_size.get().copied()
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let started_at = self.started_at.get().copied();
        let duration_secs = started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            session_id: self.config.session_id.clone(),
            state: self.state(),
            started_at,
            duration_secs,
            chunks_written: self.shared.chunks_written.load(Ordering::Relaxed),
            bytes_written: self.shared.bytes_written.load(Ordering::Relaxed),
            skipped_reads: self.shared.skipped_reads.load(Ordering::Relaxed),
            amplitude: self.amplitude(),
            buffer_size_bytes: self.buffer_size_bytes(),
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.state() != SessionState::Stopped {
            self.stop();
        }
    }
}

/// Wait for the capture thread, then mark the session stopped.
///
/// The slot lock is held across the join so concurrent stops all return
/// after the thread has exited.
fn join_loop(loop_handle: &Mutex<Option<JoinHandle<()>>>, shared: &Shared) {
    // Stopped from a listener: a caller may already hold the slot while it
    // joins this thread, so never wait here. The loop finalizes on return.
    if shared.capture_thread.get() == Some(&thread::current().id()) {
        return;
    }

    let mut slot = lock(loop_handle);

    if let Some(handle) = slot.take() {
        if handle.join().is_err() {
            error!("Capture thread panicked");
        }
    }

    shared.state.finish();
}

/// The capture thread's work. Dropping it runs finalization, so the sink is
/// closed and the source released however the loop ends.
struct CaptureLoop {
    shared: Arc<Shared>,
    source: Option<Box<dyn CaptureSource>>,
    buffer: Vec<u8>,
    listener: Option<Weak<dyn Listener>>,
}

impl CaptureLoop {
    fn run(mut self) {
        let _ = self.shared.capture_thread.set(thread::current().id());
        raise_thread_priority();

        let Some(source) = self.source.as_mut() else {
            return;
        };

        while self.shared.state.is_recording() {
            let len = match source.read(&mut self.buffer) {
                Ok(len) if len <= self.buffer.len() => len,
                Ok(len) => {
                    warn!("Unexpected length returned: {}", len);
                    self.shared.skipped_reads.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Err(e) if e.is_terminal() => {
                    warn!("Capture source ended: {}", e);
                    break;
                }
                Err(e) => {
                    warn!("Unexpected read result: {}", e);
                    self.shared.skipped_reads.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            // A stop may have arrived during the blocking read
            if self.shared.state.is_recording() {
                if let Err(e) = self.shared.write_chunk(&self.buffer[..len]) {
                    if self.shared.state.is_recording() {
                        error!("Exception with recording stream: {}", e);
                    } else {
                        debug!("Sink closed by stop: {}", e);
                    }
                    break;
                }
            }

            self.shared
                .amplitude
                .store(signal_amplitude(&self.buffer), Ordering::Relaxed);

            if let Some(listener) = self.listener.as_ref().and_then(Weak::upgrade) {
                listener.on_data_received(&self.buffer);
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Capture loop panicked, finalizing recording");
        }

        self.shared.stop_internal();

        if let Some(mut source) = self.source.take() {
            if let Err(e) = source.stop() {
                error!("Failed to stop capture source: {}", e);
            }
            source.release();
        }

        self.shared.state.finish();
        info!(session_id = %self.shared.session_id, "Recording stopped");
    }
}

#[cfg(target_os = "linux")]
fn raise_thread_priority() {
    // Audio nice level; refused without CAP_SYS_NICE or a permissive RLIMIT_NICE
    const AUDIO_NICE: libc::c_int = -16;

    // SAFETY: setpriority has no memory-safety preconditions; who = 0 targets
    // the calling thread.
    let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, AUDIO_NICE) };
    if ret != 0 {
        debug!(
            "Could not raise capture thread priority: {}",
            io::Error::last_os_error()
        );
    }
}

#[cfg(not(target_os = "linux"))]
fn raise_thread_priority() {}
