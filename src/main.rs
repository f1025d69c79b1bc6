//! s4-midify - Traktor Kontrol S4 to MIDI bridge
//!
//! Reads the controller through evdev, sends MIDI control changes on a virtual port
//! and drives the controller LEDs from MIDI feedback.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s4_midify::bridge::{Bridge, ControlEvent, LoopExit};
use s4_midify::config::AppConfig;
use s4_midify::control_mapping::MappingTables;
use s4_midify::mixer::{detect_alsa_card, spawn_led_worker, AmixerSink};
use s4_midify::{device, ports};

/// Pending controller events between the reader thread and the translation loop
const EVENT_QUEUE_CAPACITY: usize = 1000;

/// Traktor Kontrol S4 to MIDI bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    debug: bool,

    /// Jog wheel debounce in milliseconds (1-100, larger is less sensitive)
    #[arg(short, long)]
    jog_sensitivity: Option<u64>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// List available MIDI ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Print controller events instead of bridging them
    #[arg(long)]
    print_events: bool,

    /// Choose the input device interactively
    #[arg(long)]
    select_device: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = if args.debug { "debug" } else { args.log_level.as_str() };
    init_logging(level)?;

    if args.list_ports {
        return ports::print_ports();
    }
    if args.list_devices {
        device::print_devices();
        return Ok(());
    }

    info!("Starting s4-midify...");
    info!("Configuration file: {}", args.config);

    let mut config = AppConfig::load(&args.config).await?;
    if let Some(ms) = args.jog_sensitivity {
        config.set_jog_sensitivity(ms);
    }

    let controller = if args.select_device {
        device::select_device()?
    } else if let Some(path) = &config.device.path {
        device::open_device(path)?
    } else {
        device::detect_device(&config.device.name_pattern)?
    };

    if args.print_events {
        return device::print_events(controller);
    }

    run(config, controller).await?;

    info!("s4-midify shutdown complete");
    Ok(())
}

async fn run(config: AppConfig, controller: evdev::Device) -> Result<()> {
    let tables = MappingTables::load(
        config.mappings.mixer_effect.as_deref(),
        config.mappings.deck.as_deref(),
        config.mappings.types.as_deref(),
    )
    .context("Failed to load mapping tables")?;

    let card = match &config.alsa.card {
        Some(card) => card.clone(),
        None => detect_alsa_card(&config.alsa.card_name).await?,
    };
    let leds = spawn_led_worker(Arc::new(AmixerSink::new(card)));

    // Kept alive for the lifetime of the bridge; dropping it closes the port
    let _feedback = ports::open_feedback_input(&config.midi, leds)?;
    let mut output = ports::open_output(&config.midi)?;

    let (tx, mut rx) = mpsc::channel::<ControlEvent>(EVENT_QUEUE_CAPACITY);
    let reader = device::spawn_reader(controller, tx);

    let mut bridge = Bridge::new(tables, config.jog_debounce());
    info!(
        "Bridge running (jog sensitivity {} ms), press Ctrl+C to stop",
        config.jog_sensitivity_ms
    );

    match bridge.run(&mut rx, &mut output, shutdown_signal()).await {
        Ok(LoopExit::Shutdown) => {}
        Ok(LoopExit::StreamEnded) => {
            let outcome = tokio::task::spawn_blocking(move || reader.join())
                .await
                .context("Failed to join device reader")?;
            match outcome {
                Ok(Ok(())) => anyhow::bail!("Device reader stopped"),
                Ok(Err(e)) => return Err(e).context("Lost the controller"),
                Err(_) => anyhow::bail!("Device reader panicked"),
            }
        }
        Err(e) => {
            error!("Stopping: {}", e);
            return Err(e.into());
        }
    }

    output.close();
    info!("MIDI ports closed");
    Ok(())
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
