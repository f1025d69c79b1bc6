//! MIDI ports
//!
//! By default the bridge creates a virtual output (controls) and a virtual input
//! (feedback) that the music application connects to. When port patterns are
//! configured it connects to existing ports instead.

use anyhow::{anyhow, Context, Result};
use colored::*;
use midir::os::unix::{VirtualInput, VirtualOutput};
use midir::{
    MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputConnection,
    MidiOutputPort,
};
use tracing::{debug, info};

use crate::config::MidiConfig;
use crate::feedback;
use crate::midi::format_hex;
use crate::mixer::LedHandle;

/// Find an input port by substring match
fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
    let pattern = pattern.to_lowercase();
    midi_in.ports().into_iter().find_map(|port| {
        let name = midi_in.port_name(&port).ok()?;
        name.to_lowercase().contains(&pattern).then(|| {
            debug!("Found port '{}' matching pattern '{}'", name, pattern);
            (port, name)
        })
    })
}

/// Find an output port by substring match
fn find_output_port(midi_out: &MidiOutput, pattern: &str) -> Option<(MidiOutputPort, String)> {
    let pattern = pattern.to_lowercase();
    midi_out.ports().into_iter().find_map(|port| {
        let name = midi_out.port_name(&port).ok()?;
        name.to_lowercase().contains(&pattern).then(|| {
            debug!("Found port '{}' matching pattern '{}'", name, pattern);
            (port, name)
        })
    })
}

/// Open the port controls are sent to
pub fn open_output(config: &MidiConfig) -> Result<MidiOutputConnection> {
    let midi_out = MidiOutput::new(&config.client_name).context("Failed to create MIDI output")?;

    let connection = match &config.output_port {
        Some(pattern) => {
            let (port, name) = find_output_port(&midi_out, pattern)
                .ok_or_else(|| anyhow!("Output port '{}' not found", pattern))?;
            info!("Connecting to output port: {}", name);
            midi_out
                .connect(&port, &config.port_name)
                .map_err(|e| anyhow!("Failed to connect to output port '{}': {}", name, e))?
        }
        None => {
            info!("Creating virtual output port: {}", config.port_name);
            midi_out
                .create_virtual(&config.port_name)
                .map_err(|e| anyhow!("Failed to create virtual output port: {}", e))?
        }
    };

    Ok(connection)
}

/// Open the port feedback arrives on. LED writes are handed to `leds` from the
/// MIDI thread without blocking.
pub fn open_feedback_input(
    config: &MidiConfig,
    leds: LedHandle,
) -> Result<MidiInputConnection<()>> {
    let midi_in = MidiInput::new(&config.client_name).context("Failed to create MIDI input")?;

    let callback = move |_stamp: u64, data: &[u8], _: &mut ()| {
        let commands = feedback::on_feedback(data);
        if !commands.is_empty() {
            debug!("Feedback {} -> {} LED writes", format_hex(data), commands.len());
            leds.submit(commands);
        }
    };

    let connection = match &config.input_port {
        Some(pattern) => {
            let (port, name) = find_input_port(&midi_in, pattern)
                .ok_or_else(|| anyhow!("Input port '{}' not found", pattern))?;
            info!("Connecting to input port: {}", name);
            midi_in
                .connect(&port, &config.port_name, callback, ())
                .map_err(|e| anyhow!("Failed to connect to input port '{}': {}", name, e))?
        }
        None => {
            info!("Creating virtual input port: {}", config.port_name);
            midi_in
                .create_virtual(&config.port_name, callback, ())
                .map_err(|e| anyhow!("Failed to create virtual input port: {}", e))?
        }
    };

    Ok(connection)
}

/// Print available MIDI ports
pub fn print_ports() -> Result<()> {
    let midi_in = MidiInput::new("s4-midify-scanner")?;
    let midi_out = MidiOutput::new("s4-midify-scanner")?;

    println!("\n{}", "MIDI Input Ports:".bold());
    for (i, port) in midi_in.ports().iter().enumerate() {
        let name = midi_in.port_name(port).unwrap_or_else(|_| "?".to_string());
        println!("  [{}] {}", i.to_string().yellow(), name.green());
    }

    println!("\n{}", "MIDI Output Ports:".bold());
    for (i, port) in midi_out.ports().iter().enumerate() {
        let name = midi_out.port_name(port).unwrap_or_else(|_| "?".to_string());
        println!("  [{}] {}", i.to_string().yellow(), name.green());
    }

    Ok(())
}
