//! VU meter brightness curve
//!
//! Each deck has seven meter LEDs with 31 brightness steps. 18 usable steps per LED
//! times 7 LEDs gives 126 levels, one short of the 0-127 volume Mixxx sends, so the
//! value is offset by one before it is spread over the segments.

use super::MAX_BRIGHTNESS;

/// LEDs per meter
pub const SEGMENTS: usize = 7;

/// Levels one segment covers before the next one starts
pub const LEVELS_PER_SEGMENT: u8 = 18;

/// Brightness for a partially lit segment, skipping steps so perceived brightness
/// grows roughly linearly
pub const PARTIAL_BRIGHTNESS: [u8; LEVELS_PER_SEGMENT as usize] =
    [2, 4, 5, 7, 9, 10, 12, 14, 15, 17, 19, 21, 22, 24, 26, 28, 29, 31];

/// Brightness of each segment for a volume value
pub fn levels(value: u8) -> [u8; SEGMENTS] {
    let mut levels = [0; SEGMENTS];

    if value == 0 {
        return levels;
    }

    let light = (value - 1).min(126);
    let full = (light / LEVELS_PER_SEGMENT) as usize;
    let partial = light % LEVELS_PER_SEGMENT;

    for level in levels.iter_mut().take(full) {
        *level = MAX_BRIGHTNESS;
    }

    if partial > 0 && full < SEGMENTS {
        levels[full] = PARTIAL_BRIGHTNESS[partial as usize - 1];
    }

    levels
}
