use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub recorder: RecorderConfig,
    pub source: SourceConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct RecorderConfig {
    pub sample_rate: u32,
    /// Buffer duration used to size capture chunks
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u32,
    /// Where raw 8-bit PCM is written
    pub output_path: String,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// Mono WAV file replayed as the capture device
    pub wav_path: String,
    #[serde(default)]
    pub realtime: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_latency_ms() -> u32 {
    100
}

impl Config {
    /// Load `path` (any format the `config` crate understands, extension
    /// optional), then apply `MIC_RECORDER__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MIC_RECORDER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
