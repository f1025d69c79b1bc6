//! Delta engines for jog wheels and rotary encoders
//!
//! The controller reports absolute positions in a cyclic range. Each engine turns
//! consecutive readings into motion, absorbs bursts shorter than its debounce window
//! and emits one 7-bit value per window.

use std::time::{Duration, Instant};

/// Debounce window used unless configured otherwise
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(5);

/// Mid-scale value rotary encoders are centred on
pub const CENTER: i32 = 0x3F;

/// Cyclic range of a raw position and the zones that detect a wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapDomain {
    /// Number of distinct raw positions
    pub size: i32,
    /// Readings at or below this are near the bottom of the range
    pub low: i32,
    /// Readings at or above this are near the top of the range
    pub high: i32,
}

impl WrapDomain {
    /// Jog wheel position, 10 bits
    pub const JOG: WrapDomain = WrapDomain {
        size: 1024,
        low: 255,
        high: 767,
    };

    /// Encoder detents, 4 bits
    pub const DETENT: WrapDomain = WrapDomain {
        size: 16,
        low: 3,
        high: 12,
    };

    /// Signed motion from `previous` to `current`, taking the short way through the
    /// wrap point when the readings sit at opposite ends of the range.
    pub fn diff(&self, previous: i32, current: i32) -> i32 {
        if current <= self.low && previous >= self.high {
            self.size - previous + current
        } else if current >= self.high && previous <= self.low {
            current - self.size - previous
        } else {
            current - previous
        }
    }
}

/// Per-control tracking shared by all engines
#[derive(Debug, Clone)]
pub struct EncoderState {
    previous_raw: Option<i32>,
    accumulated_delta: i32,
    last_emit: Option<Instant>,
    debounce: Duration,
}

impl EncoderState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            previous_raw: None,
            accumulated_delta: 0,
            last_emit: None,
            debounce,
        }
    }

    /// Motion not yet emitted
    #[cfg(test)]
    fn pending(&self) -> i32 {
        self.accumulated_delta
    }

    /// Feed one reading. Returns the motion accumulated since the last emission once
    /// the debounce window has elapsed, `None` otherwise. The first reading only
    /// establishes a reference position.
    pub fn advance(&mut self, domain: &WrapDomain, raw: i32, now: Instant) -> Option<i32> {
        let Some(previous) = self.previous_raw else {
            self.previous_raw = Some(raw);
            self.accumulated_delta = 0;
            self.last_emit = Some(now);
            return None;
        };

        let diff = domain.diff(previous, raw);
        self.previous_raw = Some(raw);

        let last_emit = self.last_emit.unwrap_or(now);
        if now.saturating_duration_since(last_emit) < self.debounce {
            self.accumulated_delta += diff;
            return None;
        }

        let motion = self.accumulated_delta + diff;
        self.accumulated_delta = 0;
        self.last_emit = Some(now);
        Some(motion)
    }
}

/// Jog wheel: relative motion in the signed 7-bit convention Mixxx expects
#[derive(Debug, Clone)]
pub struct JogEngine {
    state: EncoderState,
}

impl JogEngine {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: EncoderState::new(debounce),
        }
    }

    pub fn update(&mut self, raw: i32, now: Instant) -> Option<u8> {
        self.state
            .advance(&WrapDomain::JOG, raw, now)
            .map(jog_to_midi)
    }
}

/// Convert signed jog motion to an unsigned byte: 0..63 forward, 64..127 backward
pub fn jog_to_midi(delta: i32) -> u8 {
    match delta {
        d if d < -64 => 64,
        d if d < 0 => (128 + d) as u8,
        d if d >= 63 => 63,
        d => d as u8,
    }
}

/// Move, size and browse encoders: each emission is centred on `CENTER`
#[derive(Debug, Clone)]
pub struct RotaryEngine {
    state: EncoderState,
}

impl RotaryEngine {
    pub fn new() -> Self {
        Self {
            state: EncoderState::new(DEFAULT_DEBOUNCE),
        }
    }

    pub fn update(&mut self, raw: i32, now: Instant) -> Option<u8> {
        self.state
            .advance(&WrapDomain::DETENT, raw, now)
            .map(|motion| clamp_value(CENTER + motion))
    }
}

impl Default for RotaryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Gain encoders: an absolute level starting at mid-scale
#[derive(Debug, Clone)]
pub struct GainEngine {
    state: EncoderState,
    level: i32,
}

impl GainEngine {
    pub fn new() -> Self {
        Self {
            state: EncoderState::new(DEFAULT_DEBOUNCE),
            level: CENTER,
        }
    }

    pub fn update(&mut self, raw: i32, now: Instant) -> Option<u8> {
        let motion = self.state.advance(&WrapDomain::DETENT, raw, now)?;
        self.level = (self.level + motion).clamp(0, i32::from(crate::midi::MAX_VALUE));
        Some(self.level as u8)
    }
}

impl Default for GainEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp into the 7-bit MIDI range
pub fn clamp_value(value: i32) -> u8 {
    value.clamp(0, i32::from(crate::midi::MAX_VALUE)) as u8
}
