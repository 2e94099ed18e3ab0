use anyhow::{bail, Result};
use clap::Parser;
use mic_recorder::{
    Config, FileSink, LatencyBufferSize, RecordingSession, SessionConfig, WavSourceOpener,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Record mono audio to a raw 8-bit PCM file while showing a level meter
#[derive(Debug, Parser)]
#[command(name = "mic-recorder", version)]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/mic-recorder")]
    config: String,

    /// Mono 16-bit WAV file to replay as the capture device, recorded at the
    /// configured sample rate. Overrides `source.wav_path`; the default config
    /// points at the bundled `tests/fixtures/sample.wav`.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Raw PCM output file (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(short, long)]
    duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)),
        )
        .init();

    let input = args.input.unwrap_or_else(|| PathBuf::from(&cfg.source.wav_path));
    let output = args.output.unwrap_or_else(|| PathBuf::from(&cfg.recorder.output_path));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let sink = FileSink::create(&output)?;
    let opener = WavSourceOpener::new(&input, cfg.source.realtime);

    // Chunks arrive on the capture thread; forward their sizes to this task
    let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<usize>();
    let listener = Arc::new(move |bytes: &[u8]| {
        let _ = chunk_tx.send(bytes.len());
    });

    let session = RecordingSession::new(
        SessionConfig::new(cfg.recorder.sample_rate),
        Box::new(opener),
        Box::new(sink),
    )
    .with_buffer_query(LatencyBufferSize::new(cfg.recorder.latency_ms))
    .with_listener(&listener);

    session.start();
    if !session.is_recording() {
        bail!("Failed to start recording from {}", input.display());
    }

    info!("Recording {} -> {} (Ctrl-C to stop)", input.display(), output.display());

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut meter = tokio::time::interval(Duration::from_millis(500));
    let mut chunks = 0u64;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            _ = &mut deadline => {
                info!("Duration reached");
                break;
            }
            Some(_) = chunk_rx.recv() => {
                chunks += 1;
            }
            _ = meter.tick() => {
                if !session.is_recording() {
                    info!("Capture ended");
                    break;
                }
                info!("{} {:>5} ({} chunks)", meter_bar(session.amplitude()), session.amplitude(), chunks);
            }
        }
    }

    session.stop_async().await;

    println!("{}", serde_json::to_string_pretty(&session.stats())?);

    Ok(())
}

/// Twenty-cell bar for an amplitude in 0..=65535
fn meter_bar(amplitude: u32) -> String {
    let filled = (amplitude.min(65535) * 20 / 65535) as usize;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(20 - filled))
}
