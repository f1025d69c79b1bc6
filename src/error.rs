//! Error types for the translation core
//!
//! The application layer wraps these in `anyhow` with context; the core returns them
//! directly so callers and tests can match on the variant.

use thiserror::Error;

/// Problems found while loading a mapping table
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read mapping table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: event code {code} is outside 0..{max}")]
    CodeOutOfRange { line: usize, code: u16, max: u16 },

    #[error("line {line}: status byte 0x{status:02X} is not a CC on channels 1-4")]
    InvalidStatus { line: usize, status: u8 },

    #[error("line {line}: control number 0x{code:02X} exceeds 0x7F")]
    InvalidControlNumber { line: usize, code: u8 },

    #[error("line {line}: unknown control kind '{kind}'")]
    UnknownKind { line: usize, kind: String },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures on the outbound path. Any of these ends the translation loop.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("MIDI output failed: {0}")]
    MidiSend(String),

    #[error("device read failed: {0}")]
    Device(#[from] std::io::Error),
}
