//! Control classification
//!
//! Turns a type-table kind plus the event code into a closed `ControlClass`. Controls
//! of the same kind are numbered consecutively by snd-usb-caiaq, so the deck a control
//! belongs to follows from its offset in the range.

use crate::control_mapping::ControlKind;

use super::modifiers::ModifierState;

/// First jog touch sensor code (deck A side)
pub const JOG_TOUCH_BASE: u16 = 50;
/// First jog wheel code (deck A side)
pub const JOG_ROTATION_BASE: u16 = 52;
/// First move/size encoder code (move, size on the left; move, size on the right)
pub const ROTARY_BASE: u16 = 55;
/// First gain encoder code (decks A, B, C, D)
pub const GAIN_BASE: u16 = 59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deck {
    A,
    B,
    C,
    D,
}

impl Deck {
    const ALL: [Deck; 4] = [Deck::A, Deck::B, Deck::C, Deck::D];

    /// Deck controlled by the left (`A/C`) or right (`B/D`) side of the controller
    fn for_side(left: bool, modifiers: &ModifierState) -> Deck {
        match (left, modifiers.toggle_ac, modifiers.toggle_bd) {
            (true, false, _) => Deck::A,
            (true, true, _) => Deck::C,
            (false, _, false) => Deck::B,
            (false, _, true) => Deck::D,
        }
    }
}

/// Which loop encoder a rotary control is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderKind {
    Move,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlClass {
    Button,
    Potentiometer,
    /// Jog wheels are tracked per side, not per toggled deck
    JogRotation(Deck),
    JogTouch(Deck),
    RotaryEncoder(EncoderKind, Deck),
    GainEncoder(Deck),
    BrowseEncoder,
}

/// Classify an event code of a known kind. Codes outside their kind's range yield `None`.
pub fn classify(kind: ControlKind, code: u16, modifiers: &ModifierState) -> Option<ControlClass> {
    let class = match kind {
        ControlKind::Button => ControlClass::Button,
        ControlKind::Potentiometer => ControlClass::Potentiometer,
        ControlKind::BrowseRotary => ControlClass::BrowseEncoder,
        ControlKind::JogRotation => ControlClass::JogRotation(side_deck(code, JOG_ROTATION_BASE)?),
        ControlKind::JogTouch => ControlClass::JogTouch(side_deck(code, JOG_TOUCH_BASE)?),
        ControlKind::Rotary => {
            let offset = code.checked_sub(ROTARY_BASE).filter(|o| *o < 4)?;
            let encoder = if offset % 2 == 0 {
                EncoderKind::Move
            } else {
                EncoderKind::Size
            };
            ControlClass::RotaryEncoder(encoder, Deck::for_side(offset < 2, modifiers))
        }
        ControlKind::GainRotary => {
            let offset = code.checked_sub(GAIN_BASE)?;
            ControlClass::GainEncoder(*Deck::ALL.get(offset as usize)?)
        }
    };

    Some(class)
}

fn side_deck(code: u16, base: u16) -> Option<Deck> {
    match code.checked_sub(base)? {
        0 => Some(Deck::A),
        1 => Some(Deck::B),
        _ => None,
    }
}
