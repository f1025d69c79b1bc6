//! Outbound MIDI dispatch
//!
//! Every translated control ends up here as one Control Change message. A failed send
//! means the music application has lost the controller, so errors are returned to the
//! loop instead of being retried.

use std::fmt;

use midir::MidiOutputConnection;
use tracing::debug;

use crate::control_mapping::Destination;
use crate::error::BridgeError;
use crate::midi::{format_hex, CC_STATUS, MAX_VALUE};

/// A Control Change ready to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub channel: u8,
    pub code: u8,
    pub value: u8,
}

impl OutgoingMessage {
    /// Build a message for `destination`, clamping the value to 7 bits
    pub fn new(destination: Destination, value: u8) -> Self {
        Self {
            channel: destination.channel,
            code: destination.code,
            value: value.min(MAX_VALUE),
        }
    }

    /// Raw Control Change bytes
    pub fn encode(&self) -> [u8; 3] {
        [CC_STATUS | (self.channel & 0x0F), self.code & MAX_VALUE, self.value & MAX_VALUE]
    }
}

impl fmt::Display for OutgoingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CC ch:{} cc:0x{:02X} v:0x{:02X}", self.channel + 1, self.code, self.value)
    }
}

/// Anything raw MIDI bytes can be written to
pub trait MidiSink {
    fn send(&mut self, data: &[u8]) -> Result<(), BridgeError>;
}

impl MidiSink for MidiOutputConnection {
    fn send(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        MidiOutputConnection::send(self, data).map_err(|e| BridgeError::MidiSend(e.to_string()))
    }
}

/// Send one message to `sink`
pub fn dispatch<S: MidiSink + ?Sized>(
    sink: &mut S,
    message: &OutgoingMessage,
) -> Result<(), BridgeError> {
    let data = message.encode();
    sink.send(&data)?;

    debug!("Sent MIDI: {} | {}", format_hex(&data), message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl MidiSink for FailingSink {
        fn send(&mut self, _data: &[u8]) -> Result<(), BridgeError> {
            Err(BridgeError::MidiSend("port closed".to_string()))
        }
    }

    struct VecSink(Vec<Vec<u8>>);

    impl MidiSink for VecSink {
        fn send(&mut self, data: &[u8]) -> Result<(), BridgeError> {
            self.0.push(data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_encodes_cc() {
        let mut sink = VecSink(Vec::new());
        let message = OutgoingMessage::new(Destination::new(3, 0x0A), 0x7F);

        dispatch(&mut sink, &message).unwrap();

        assert_eq!(sink.0, vec![vec![0xB3, 0x0A, 0x7F]]);
    }

    #[test]
    fn test_display() {
        let message = OutgoingMessage::new(Destination::new(1, 0x0A), 0x40);
        assert_eq!(message.to_string(), "CC ch:2 cc:0x0A v:0x40");
    }

    #[test]
    fn test_value_is_clamped() {
        let message = OutgoingMessage::new(Destination::new(0, 1), 200);
        assert_eq!(message.value, 127);
    }

    #[test]
    fn test_send_failure_propagates() {
        let message = OutgoingMessage::new(Destination::new(0, 1), 1);
        let err = dispatch(&mut FailingSink, &message).unwrap_err();

        assert!(matches!(err, BridgeError::MidiSend(_)));
    }
}
