//! Outbound translation: controller events to MIDI
//!
//! `Bridge` owns all outbound state (last values, modifiers, encoder engines) and is
//! driven by a single loop, one event at a time. Stages run in a fixed order:
//!
//! 1. Deduplication against the last value of the same control
//! 2. Modifier handling (shift and deck toggles are consumed here)
//! 3. Destination lookup in the mapping tables
//! 4. Classification and value computation
//! 5. Dispatch

pub mod classifier;
pub mod dedup;
pub mod encoder;
pub mod modifiers;
pub mod quantize;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::control_mapping::MappingTables;
use crate::dispatch::{dispatch, MidiSink, OutgoingMessage};
use crate::error::BridgeError;

use classifier::{classify, ControlClass, Deck, EncoderKind};
use dedup::ValueDedup;
use encoder::{GainEngine, JogEngine, RotaryEngine};
use modifiers::ModifierState;

/// One input event from the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub code: u16,
    pub value: i32,
    /// Monotonic time the event was read
    pub timestamp: Instant,
}

impl ControlEvent {
    pub fn new(code: u16, value: i32, timestamp: Instant) -> Self {
        Self {
            code,
            value,
            timestamp,
        }
    }
}

/// Why `Bridge::run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The shutdown future resolved
    Shutdown,
    /// Every event sender is gone
    StreamEnded,
}

/// Stateful event translator
pub struct Bridge {
    tables: MappingTables,
    dedup: ValueDedup,
    modifiers: ModifierState,
    jog_debounce: Duration,
    jogs: HashMap<Deck, JogEngine>,
    rotaries: HashMap<(EncoderKind, Deck), RotaryEngine>,
    gains: HashMap<Deck, GainEngine>,
    browse: Option<RotaryEngine>,
}

impl Bridge {
    /// Create a bridge over `tables` with the given jog wheel debounce window
    pub fn new(tables: MappingTables, jog_debounce: Duration) -> Self {
        Self {
            tables,
            dedup: ValueDedup::new(),
            modifiers: ModifierState::default(),
            jog_debounce,
            jogs: HashMap::new(),
            rotaries: HashMap::new(),
            gains: HashMap::new(),
            browse: None,
        }
    }

    /// Current modifier combination
    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    /// Translate one event. `None` means the event produced no message (repeated
    /// value, modifier, unmapped control or an encoder still inside its window).
    pub fn translate(&mut self, event: &ControlEvent) -> Option<OutgoingMessage> {
        if !self.dedup.changed(event.code, event.value) {
            return None;
        }

        debug!(
            "Processing event: code={} value={} t={:?}",
            event.code, event.value, event.timestamp
        );

        if self.modifiers.apply(event.code, event.value) {
            debug!("Modifiers now {:?}", self.modifiers);
            return None;
        }

        let Some(destination) = self.tables.resolve(event.code, &self.modifiers) else {
            trace!("No destination for code {}", event.code);
            return None;
        };

        let Some(class) = self
            .tables
            .kind(event.code)
            .and_then(|kind| classify(kind, event.code, &self.modifiers))
        else {
            trace!("No control class for code {}", event.code);
            return None;
        };

        let value = self.value_for(class, event)?;
        Some(OutgoingMessage::new(destination, value))
    }

    /// Translate one event and send the result, if any, to `sink`
    pub fn step<S: MidiSink + ?Sized>(
        &mut self,
        event: &ControlEvent,
        sink: &mut S,
    ) -> Result<Option<OutgoingMessage>, BridgeError> {
        let Some(message) = self.translate(event) else {
            return Ok(None);
        };

        dispatch(sink, &message)?;
        Ok(Some(message))
    }

    /// Process `events` until `shutdown` resolves or the stream ends.
    ///
    /// `shutdown` is polled for the whole run, so a signal raised while an event is
    /// being processed is seen on the next turn of the loop.
    pub async fn run<S, F>(
        &mut self,
        events: &mut mpsc::Receiver<ControlEvent>,
        sink: &mut S,
        shutdown: F,
    ) -> Result<LoopExit, BridgeError>
    where
        S: MidiSink + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        return Ok(LoopExit::StreamEnded);
                    };
                    self.step(&event, sink)?;
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    return Ok(LoopExit::Shutdown);
                }
            }
        }
    }

    fn value_for(&mut self, class: ControlClass, event: &ControlEvent) -> Option<u8> {
        let (raw, now) = (event.value, event.timestamp);

        match class {
            ControlClass::Button => Some(quantize::button(raw)),
            ControlClass::Potentiometer => Some(quantize::potentiometer(raw)),
            ControlClass::JogTouch(_) => Some(quantize::touch(raw)),
            ControlClass::JogRotation(deck) => {
                let debounce = self.jog_debounce;
                self.jogs
                    .entry(deck)
                    .or_insert_with(|| JogEngine::new(debounce))
                    .update(raw, now)
            }
            ControlClass::RotaryEncoder(kind, deck) => {
                self.rotaries.entry((kind, deck)).or_default().update(raw, now)
            }
            ControlClass::GainEncoder(deck) => self.gains.entry(deck).or_default().update(raw, now),
            ControlClass::BrowseEncoder => {
                self.browse.get_or_insert_with(RotaryEngine::new).update(raw, now)
            }
        }
    }
}
