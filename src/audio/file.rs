use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::backend::{CaptureParams, CaptureSource, CaptureSourceOpener, ChannelConfig, Encoding};
use crate::error::CaptureError;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Samples converted to unsigned 8-bit PCM
    pub fn to_pcm8(&self) -> Vec<u8> {
        self.samples
            .iter()
            .map(|&s| ((i32::from(s) + 32768) >> 8) as u8)
            .collect()
    }
}

/// Opens `WavCaptureSource`s over a mono WAV file
///
/// The file is decoded on every `open`, so one opener can serve several
/// sessions.
#[derive(Debug, Clone)]
pub struct WavSourceOpener {
    path: PathBuf,
    realtime: bool,
}

impl WavSourceOpener {
    /// `realtime` paces reads at the sample rate, like a live device
    pub fn new(path: impl Into<PathBuf>, realtime: bool) -> Self {
        Self {
            path: path.into(),
            realtime,
        }
    }
}

impl CaptureSourceOpener for WavSourceOpener {
    fn open(&self, params: &CaptureParams) -> Result<Box<dyn CaptureSource>, CaptureError> {
        if params.encoding != Encoding::Pcm8Bit || params.channels != ChannelConfig::Mono {
            return Err(CaptureError::Uninitialized(format!(
                "unsupported format: {:?} {}",
                params.channels, params.encoding
            )));
        }

        let audio = AudioFile::open(&self.path)
            .map_err(|e| CaptureError::Uninitialized(format!("{:#}", e)))?;

        if audio.channels != 1 {
            return Err(CaptureError::Uninitialized(format!(
                "expected mono input, {} has {} channels",
                audio.path, audio.channels
            )));
        }
        if audio.sample_rate != params.sample_rate {
            return Err(CaptureError::Uninitialized(format!(
                "expected {}Hz input, {} is {}Hz",
                params.sample_rate, audio.path, audio.sample_rate
            )));
        }

        Ok(Box::new(WavCaptureSource::new(
            audio.to_pcm8(),
            params.sample_rate,
            self.realtime,
        )))
    }

    fn name(&self) -> &str {
        "WAV replay"
    }
}

/// Capture source replaying in-memory 8-bit PCM
pub struct WavCaptureSource {
    data: Vec<u8>,
    position: usize,
    sample_rate: u32,
    realtime: bool,
    started: bool,
}

impl WavCaptureSource {
    pub fn new(data: Vec<u8>, sample_rate: u32, realtime: bool) -> Self {
        Self {
            data,
            position: 0,
            sample_rate,
            realtime,
            started: false,
        }
    }
}

impl CaptureSource for WavCaptureSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        debug!("WAV replay started ({} bytes)", self.data.len());
        self.started = true;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        if !self.started {
            return Err(CaptureError::NotStarted);
        }
        if self.position >= self.data.len() {
            return Err(CaptureError::EndOfStream);
        }

        let len = buf.len().min(self.data.len() - self.position);
        buf[..len].copy_from_slice(&self.data[self.position..self.position + len]);
        self.position += len;

        if self.realtime && self.sample_rate > 0 {
            // One byte per sample at 8-bit mono
            std::thread::sleep(Duration::from_secs_f64(len as f64 / self.sample_rate as f64));
        }

        Ok(len)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.started {
            return Err(CaptureError::NotStarted);
        }
        self.started = false;
        Ok(())
    }

    fn release(self: Box<Self>) {
        debug!("WAV replay released at byte {}", self.position);
    }
}
