//! MIDI constants and helpers shared by both directions

/// Status nibble of a Control Change message
pub const CC_STATUS: u8 = 0xB0;

/// Largest 7-bit data value
pub const MAX_VALUE: u8 = 0x7F;

/// Channel of a feedback message.
///
/// Masking with 0x4F instead of 0x0F maps CC, Note On and Note Off framings on the
/// first channels onto the same small index; other message kinds land at 64 or above
/// and miss every lookup table.
pub fn feedback_channel(status: u8) -> u8 {
    status & 0x4F
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_channel_mask() {
        assert_eq!(feedback_channel(0xB0), 0);
        assert_eq!(feedback_channel(0xB3), 3);
        assert_eq!(feedback_channel(0x91), 1);
        assert_eq!(feedback_channel(0x82), 2);
        // Program change framing falls outside every table
        assert_eq!(feedback_channel(0xC0), 0x40);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xB1, 0x0A, 0x7F]), "B1 0A 7F");
    }
}
