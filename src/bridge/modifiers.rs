//! Shift and deck-toggle tracking

/// snd-usb-caiaq button codes reserved for modifiers
pub const SHIFT_A: u16 = 257;
pub const TOGGLE_AC: u16 = 264;
pub const TOGGLE_BD: u16 = 304;
pub const SHIFT_B: u16 = 313;

/// Current modifier combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub shift_a: bool,
    pub shift_b: bool,
    pub toggle_ac: bool,
    pub toggle_bd: bool,
}

impl ModifierState {
    /// Apply an event to the modifier state.
    ///
    /// Returns `true` when the code is a modifier; such events produce no MIDI.
    /// Shift buttons flip on press and on release, deck toggles only on press.
    pub fn apply(&mut self, code: u16, value: i32) -> bool {
        match code {
            SHIFT_A => self.shift_a = !self.shift_a,
            SHIFT_B => self.shift_b = !self.shift_b,
            TOGGLE_AC => {
                if value != 0 {
                    self.toggle_ac = !self.toggle_ac;
                }
            }
            TOGGLE_BD => {
                if value != 0 {
                    self.toggle_bd = !self.toggle_bd;
                }
            }
            _ => return false,
        }

        true
    }
}
