//! Controller input through evdev
//!
//! snd-usb-caiaq registers the Kontrol S4 as an input device. Buttons arrive as
//! `EV_KEY` events and every analog control as `EV_ABS`; event codes are the control
//! identifiers used by the mapping tables.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::*;
use evdev::{Device, EventType, InputEvent};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::bridge::dedup::ValueDedup;
use crate::bridge::ControlEvent;
use crate::error::BridgeError;

/// Convert an evdev event, keeping only key and absolute-axis events
pub fn to_control_event(event: &InputEvent, timestamp: Instant) -> Option<ControlEvent> {
    let event_type = event.event_type();
    if event_type != EventType::KEY && event_type != EventType::ABSOLUTE {
        return None;
    }

    Some(ControlEvent::new(event.code(), event.value(), timestamp))
}

/// Open a device by path
pub fn open_device(path: &Path) -> Result<Device> {
    let device = Device::open(path)
        .with_context(|| format!("Failed to open input device {}", path.display()))?;
    info!(
        "Opened {} ({})",
        device.name().unwrap_or("unnamed device"),
        path.display()
    );
    Ok(device)
}

/// First device whose name contains `pattern`
pub fn detect_device(pattern: &str) -> Result<Device> {
    let (path, device) = evdev::enumerate()
        .find(|(_, device)| device.name().is_some_and(|name| name.contains(pattern)))
        .with_context(|| {
            format!(
                "Couldn't find '{}'. Do you see it in the output of lsusb?",
                pattern
            )
        })?;

    info!(
        "Detected evdev: {}\t{}\t{}",
        device.name().unwrap_or_default(),
        path.display(),
        device.physical_path().unwrap_or_default()
    );
    Ok(device)
}

fn sorted_devices() -> Vec<(PathBuf, Device)> {
    let mut devices: Vec<_> = evdev::enumerate().collect();
    devices.sort_by(|(a, _), (b, _)| a.cmp(b));
    devices
}

/// Print all input devices
pub fn print_devices() {
    println!("{}", "=== Input devices ===".bold().cyan());

    for (i, (path, device)) in sorted_devices().iter().enumerate() {
        println!(
            "[{}]\t{}\t{}\t{}",
            i.to_string().yellow(),
            path.display(),
            device.name().unwrap_or("unnamed").green(),
            device.physical_path().unwrap_or("").dimmed()
        );
    }
}

/// List devices and ask which one is the controller
pub fn select_device() -> Result<Device> {
    print_devices();

    print!("Which of these is the controller? ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let index: usize = answer
        .trim()
        .parse()
        .with_context(|| format!("Not a device number: '{}'", answer.trim()))?;

    let (path, device) = sorted_devices()
        .into_iter()
        .nth(index)
        .with_context(|| format!("No device with number {}", index))?;

    info!("Selected {}", path.display());
    Ok(device)
}

/// Read events on a dedicated thread and forward them to `tx`.
///
/// The thread ends when the device fails or the receiver is dropped; dropping `tx`
/// is what tells the translation loop the stream is over.
pub fn spawn_reader(
    mut device: Device,
    tx: mpsc::Sender<ControlEvent>,
) -> thread::JoinHandle<Result<(), BridgeError>> {
    thread::spawn(move || loop {
        let events = device.fetch_events()?;

        for event in events {
            let Some(event) = to_control_event(&event, Instant::now()) else {
                continue;
            };

            if tx.blocking_send(event).is_err() {
                debug!("Event receiver closed, stopping device reader");
                return Ok(());
            }
        }
    })
}

/// Dump changed control values, for building mapping tables
pub fn print_events(mut device: Device) -> Result<()> {
    println!("{}", "=== Controller events ===".bold().cyan());
    println!("{}", "Format: [time] TYPE code value".dimmed());

    let mut dedup = ValueDedup::new();
    let mut seen = HashSet::new();

    loop {
        for event in device.fetch_events().context("Failed to read device")? {
            let event_type = event.event_type();
            if event_type != EventType::KEY && event_type != EventType::ABSOLUTE {
                continue;
            }
            if !dedup.changed(event.code(), event.value()) {
                continue;
            }

            let time: chrono::DateTime<chrono::Local> = event.timestamp().into();
            let kind = if event_type == EventType::KEY { "KEY".green() } else { "ABS".yellow() };
            let code = event.code().to_string();
            let code = if seen.insert(event.code()) { code.bold() } else { code.normal() };

            println!(
                "[{}] {} {} {}",
                time.format("%H:%M:%S%.3f"),
                kind,
                code,
                event.value()
            );
        }
    }
}
