//! Drop events that repeat the previous value of their control
//!
//! snd-usb-caiaq reports every axis on every USB packet, so most events carry no
//! change. This runs before modifiers and classification.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ValueDedup {
    last: HashMap<u16, i32>,
}

impl ValueDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `code`. Returns `false` if it equals the stored value.
    pub fn changed(&mut self, code: u16, value: i32) -> bool {
        match self.last.insert(code, value) {
            Some(previous) => previous != value,
            None => true,
        }
    }
}
