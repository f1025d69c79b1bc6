//! s4-midify
//!
//! Turns Traktor Kontrol S4 input events into MIDI control changes and turns MIDI
//! feedback from the music application into controller LED brightness.

pub mod bridge;
pub mod config;
pub mod control_mapping;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod feedback;
pub mod midi;
pub mod mixer;
pub mod ports;
