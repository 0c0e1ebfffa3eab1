//! Interactive sender harness
//!
//! Streams a mono 16-bit WAV file to a playback device, paced by the
//! device's queue feedback. Playback is driven by lines on stdin:
//! `start`, `stop`, `quit`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamy::constants::DEFAULT_FRAME_SAMPLES;
use streamy::{AudioStream, StreamConfig, StreamEvent, WriteStatus};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let wav_path = std::env::args()
        .nth(1)
        .context("usage: sender <audio.wav> [config.toml]")?;
    let config = match std::env::args().nth(2) {
        Some(path) => StreamConfig::from_file(path)?,
        None => StreamConfig::default(),
    };

    let samples = Arc::new(load_samples(&wav_path, &config)?);
    tracing::info!(
        "loaded {} samples (~{:.1}s) from {}",
        samples.len(),
        samples.len() as f64 / config.sample_rate as f64,
        wav_path
    );

    let (stream, mut events) = AudioStream::new(config)?;
    let stream = Arc::new(stream);

    // Log stream events as they arrive
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                StreamEvent::Online => tracing::info!("==> online"),
                StreamEvent::Offline => tracing::warn!("==> offline"),
                StreamEvent::Error(message) => tracing::warn!("==> error: {message}"),
                StreamEvent::Queue(depth) => tracing::debug!("==> queue {depth}"),
            }
        }
    });

    stream.connect();

    let mut player: Option<(Arc<AtomicBool>, tokio::task::JoinHandle<()>)> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "start" => {
                if player.as_ref().is_some_and(|(_, task)| !task.is_finished()) {
                    continue;
                }
                tracing::info!("==> started");
                let stop = Arc::new(AtomicBool::new(false));
                let task = tokio::spawn(play(
                    Arc::clone(&stream),
                    Arc::clone(&samples),
                    Arc::clone(&stop),
                ));
                player = Some((stop, task));
            }
            "stop" => {
                if let Some((stop, task)) = player.take() {
                    stop.store(true, Ordering::Relaxed);
                    let _ = task.await;
                    tracing::info!("==> stopped");
                }
                stream.reset();
            }
            "quit" => break,
            other => tracing::warn!("==> unknown command: {other}"),
        }
    }

    if let Some((stop, task)) = player.take() {
        stop.store(true, Ordering::Relaxed);
        let _ = task.await;
    }
    stream.disconnect();
    Ok(())
}

/// Write frames until the file ends or the stop flag is raised, sleeping
/// the delay each write returns. Dropped frames (offline, saturated) are
/// lost by design; the loop just keeps pacing.
async fn play(stream: Arc<AudioStream>, samples: Arc<Vec<i16>>, stop: Arc<AtomicBool>) {
    for (i, frame) in samples.chunks(DEFAULT_FRAME_SAMPLES).enumerate() {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        match stream.write(frame) {
            Ok(outcome) => {
                let delay = match outcome.status {
                    WriteStatus::Sent => outcome.delay,
                    WriteStatus::Offline | WriteStatus::Saturated => {
                        Duration::from_millis(100)
                    }
                };
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                tracing::error!("write failed, stopping playback: {e}");
                return;
            }
        }

        // Periodic stats logging
        if (i + 1) % 512 == 0 {
            let stats = stream.stats();
            tracing::info!(
                "Stats: {} frames encoded, {:.1} KB sent, queue {}",
                stats.frames_encoded,
                stats.bytes_produced as f64 / 1024.0,
                stream.queue()
            );
        }
    }
    tracing::info!("==> end of file");
}

/// Load a mono 16-bit WAV file matching the stream's sample rate
fn load_samples(path: &str, config: &StreamConfig) -> Result<Vec<i16>> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {path}"))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        bail!("expected mono input, got {} channels", spec.channels);
    }
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        bail!("expected 16-bit integer samples");
    }
    if spec.sample_rate != config.sample_rate {
        bail!(
            "sample rate mismatch: file is {} Hz, stream expects {} Hz",
            spec.sample_rate,
            config.sample_rate
        );
    }
    reader
        .into_samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to decode samples")
}
