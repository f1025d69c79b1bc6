//! LED writes through the ALSA mixer
//!
//! snd-usb-caiaq exposes every controller LED as a mixer control. Writes go through a
//! single worker task so the MIDI input callback never waits on `amixer`, and a failed
//! write is logged and forgotten.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::feedback::LedCommand;

/// Sound card name as listed by `aplay -l`
pub const CARD_NAME: &str = "Traktor Kontrol S4";

/// Pending LED writes before new ones are dropped
const QUEUE_CAPACITY: usize = 1024;

/// Something that can set an LED brightness
#[async_trait]
pub trait IndicatorSink: Send + Sync {
    async fn set_brightness(&self, command: LedCommand) -> Result<()>;
}

/// Writes LEDs with `amixer -c <card> cset numid=<id> <brightness>`
pub struct AmixerSink {
    card: String,
}

impl AmixerSink {
    pub fn new(card: impl Into<String>) -> Self {
        Self { card: card.into() }
    }
}

#[async_trait]
impl IndicatorSink for AmixerSink {
    async fn set_brightness(&self, command: LedCommand) -> Result<()> {
        let status = Command::new("amixer")
            .args(["-c", self.card.as_str(), "cset"])
            .arg(format!("numid={}", command.indicator))
            .arg(command.brightness.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .context("Failed to run amixer")?;

        if !status.success() {
            anyhow::bail!("amixer exited with {} for numid={}", status, command.indicator);
        }

        Ok(())
    }
}

/// Non-blocking handle to the LED worker
#[derive(Clone)]
pub struct LedHandle {
    tx: mpsc::Sender<LedCommand>,
}

impl LedHandle {
    /// Queue LED writes without waiting. Safe to call from non-async threads.
    pub fn submit(&self, commands: impl IntoIterator<Item = LedCommand>) {
        for command in commands {
            if let Err(e) = self.tx.try_send(command) {
                trace!("Dropping LED write {:?}: {}", command, e);
            }
        }
    }
}

/// Spawn the worker that applies LED writes in order
pub fn spawn_led_worker(sink: Arc<dyn IndicatorSink>) -> LedHandle {
    let (tx, mut rx) = mpsc::channel::<LedCommand>(QUEUE_CAPACITY);

    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            if let Err(e) = sink.set_brightness(command).await {
                warn!("LED write failed: {:#}", e);
            }
        }
        debug!("LED worker stopped");
    });

    LedHandle { tx }
}

/// Card number of the first `aplay -l` line mentioning `name`
pub fn parse_card_number(aplay_output: &str, name: &str) -> Option<String> {
    aplay_output
        .lines()
        .find(|line| line.contains(name))
        .and_then(|line| line.split_whitespace().nth(1))
        .map(|field| field.trim_end_matches(':').to_string())
        .filter(|card| !card.is_empty())
}

/// Find the controller's ALSA card
pub async fn detect_alsa_card(name: &str) -> Result<String> {
    let output = Command::new("aplay")
        .arg("-l")
        .output()
        .await
        .context("Failed to run aplay")?;

    let listing = String::from_utf8_lossy(&output.stdout);
    let card = parse_card_number(&listing, name).with_context(|| {
        format!(
            "Couldn't find '{}' with aplay. Is snd-usb-caiaq installed and enabled?",
            name
        )
    })?;

    info!("Detected ALSA card {} for {}", card, name);
    Ok(card)
}
