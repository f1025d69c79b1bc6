//! Inbound translation: MIDI feedback to controller LEDs
//!
//! Mixxx echoes button states and channel volume back over MIDI. Each message is
//! mapped to one or more snd-usb-caiaq mixer controls (ALSA `numid`s) and a brightness.
//! Nothing here is shared with the outbound path.

pub mod vu_meter;

use tracing::trace;

use crate::midi::{feedback_channel, format_hex};

/// Brightest LED level the driver accepts
pub const MAX_BRIGHTNESS: u8 = 31;

/// Control number carrying channel volume
pub const VU_METER_CC: u8 = 0x46;

/// One mixer control write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedCommand {
    /// ALSA numeric control id
    pub indicator: u32,
    /// 0-31
    pub brightness: u8,
}

impl LedCommand {
    pub fn new(indicator: u32, brightness: u8) -> Self {
        Self {
            indicator,
            brightness: brightness.min(MAX_BRIGHTNESS),
        }
    }
}

/// What a feedback control number drives, indexed by MIDI channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedTarget {
    Button([u32; 4]),
    Meter([[u32; vu_meter::SEGMENTS]; 4]),
}

/// Seven consecutive numids starting at `first`
const fn meter(first: u32) -> [u32; vu_meter::SEGMENTS] {
    [first, first + 1, first + 2, first + 3, first + 4, first + 5, first + 6]
}

fn led_target(cc: u8) -> Option<LedTarget> {
    let target = match cc {
        0x01 => LedTarget::Button([74, 118, 74, 118]), // Load
        0x08 => LedTarget::Button([79, 123, 79, 123]), // Sync
        0x09 => LedTarget::Button([80, 124, 80, 124]), // Cue
        0x0A => LedTarget::Button([81, 125, 81, 125]), // Play
        0x0B => LedTarget::Button([66, 110, 66, 110]), // Cue 1
        0x0C => LedTarget::Button([68, 112, 68, 112]), // Cue 2
        0x0D => LedTarget::Button([70, 114, 70, 114]), // Cue 3
        0x0E => LedTarget::Button([72, 116, 72, 116]), // Cue 4
        VU_METER_CC => LedTarget::Meter([meter(16), meter(29), meter(42), meter(55)]),
        _ => return None,
    };

    Some(target)
}

/// Translate one feedback message. An empty result means the message is ignored.
pub fn on_feedback(data: &[u8]) -> Vec<LedCommand> {
    let [status, cc, value, ..] = *data else {
        trace!("Ignoring short feedback: {}", format_hex(data));
        return Vec::new();
    };

    let channel = feedback_channel(status) as usize;

    match led_target(cc) {
        Some(LedTarget::Button(indicators)) => match indicators.get(channel) {
            Some(&indicator) => {
                let brightness = if value != 0 { MAX_BRIGHTNESS } else { 0 };
                vec![LedCommand::new(indicator, brightness)]
            }
            None => Vec::new(),
        },
        Some(LedTarget::Meter(groups)) => match groups.get(channel) {
            Some(group) => group
                .iter()
                .zip(vu_meter::levels(value))
                .map(|(&indicator, brightness)| LedCommand::new(indicator, brightness))
                .collect(),
            None => Vec::new(),
        },
        None => {
            trace!("No LED for feedback {}", format_hex(data));
            Vec::new()
        }
    }
}
