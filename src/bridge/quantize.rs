//! Stateless value conversions from snd-usb-caiaq ranges to 7-bit MIDI

use super::encoder::clamp_value;

/// Analog jog touch reading at which the platter counts as touched
pub const TOUCH_THRESHOLD: i32 = 3050;

/// Buttons already report 0/1
pub fn button(raw: i32) -> u8 {
    clamp_value(raw)
}

/// Faders and knobs report 0-4095; integer division by 32 maps onto 0-127
pub fn potentiometer(raw: i32) -> u8 {
    clamp_value(raw / 32)
}

pub fn touch(raw: i32) -> u8 {
    if raw >= TOUCH_THRESHOLD {
        0x7F
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_potentiometer_scale() {
        assert_eq!(potentiometer(4095), 127);
        assert_eq!(potentiometer(31), 0);
        assert_eq!(potentiometer(32), 1);
        assert_eq!(potentiometer(2048), 64);
        assert_eq!(potentiometer(-10), 0);
    }

    #[test]
    fn test_touch_threshold() {
        assert_eq!(touch(3049), 0);
        assert_eq!(touch(3050), 127);
        assert_eq!(touch(4095), 127);
        assert_eq!(touch(0), 0);
    }

    #[test]
    fn test_button_passthrough() {
        assert_eq!(button(0), 0);
        assert_eq!(button(1), 1);
        assert_eq!(button(300), 127);
    }
}
