//! Control mapping tables for the Kontrol S4
//!
//! Parses the three CSV tables that describe the controller layout:
//! - `midi-evcode-map-mixer-effect.csv`: `evcode,cc,status,cc_shift,status_shift`
//! - `midi-evcode-map-deck.csv`: `evcode,cc0,status0,cc1,status1,cc2,status2,cc3,status3`
//! - `evcode-type-map.csv`: `evcode,KIND`
//!
//! Event codes are decimal, MIDI fields are hex. Tables are indexed directly by event
//! code so a lookup is a bounds check and an array read.

use std::path::Path;
use std::sync::OnceLock;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::info;

use crate::bridge::modifiers::ModifierState;
use crate::error::MappingError;
use crate::midi::CC_STATUS;

/// Number of event codes covered by the tables (snd-usb-caiaq codes stay below this)
pub const TABLE_SIZE: usize = 350;

/// Highest MIDI channel index a destination may use
pub const MAX_CHANNEL: u8 = 3;

/// Where a control's messages go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Destination {
    /// MIDI channel, 0-3
    pub channel: u8,
    /// Control change number, 0-127
    pub code: u8,
}

impl Destination {
    pub const fn new(channel: u8, code: u8) -> Self {
        Self { channel, code }
    }

    /// Deck-pair parity: odd channels carry decks B and D
    pub fn is_bd_pair(&self) -> bool {
        self.channel & 1 == 1
    }
}

/// Control kind as written in the type table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Potentiometer,
    JogRotation,
    JogTouch,
    Rotary,
    GainRotary,
    BrowseRotary,
}

impl ControlKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "BTN" => Some(Self::Button),
            "POT" => Some(Self::Potentiometer),
            "JOG_ROT" => Some(Self::JogRotation),
            "JOG_TOUCH" => Some(Self::JogTouch),
            "ROT" => Some(Self::Rotary),
            "GAIN_ROT" => Some(Self::GainRotary),
            "BROWSE_ROT" => Some(Self::BrowseRotary),
            _ => None,
        }
    }
}

/// Mixer and effect controls: `[normal, shifted]`
pub type MixerEffectEntry = [Destination; 2];

/// Deck controls: `[deck, deck + shift, toggled deck, toggled deck + shift]`
pub type DeckEntry = [Destination; 4];

/// All lookup tables, loaded once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTables {
    mixer_effect: Vec<Option<MixerEffectEntry>>,
    deck: Vec<Option<DeckEntry>>,
    kinds: Vec<Option<ControlKind>>,
}

impl MappingTables {
    /// Parse the three tables from CSV text
    pub fn from_csv(mixer_effect: &str, deck: &str, kinds: &str) -> Result<Self, MappingError> {
        let tables = Self {
            mixer_effect: parse_mixer_effect(mixer_effect)?,
            deck: parse_deck(deck)?,
            kinds: parse_kinds(kinds)?,
        };

        info!(
            "Loaded mapping tables: {} mixer/effect, {} deck, {} typed controls",
            tables.mixer_effect.iter().flatten().count(),
            tables.deck.iter().flatten().count(),
            tables.kinds.iter().flatten().count()
        );

        Ok(tables)
    }

    /// Load tables from files, falling back to the embedded defaults for any path not given
    pub fn load(
        mixer_effect: Option<&Path>,
        deck: Option<&Path>,
        kinds: Option<&Path>,
    ) -> Result<Self, MappingError> {
        if mixer_effect.is_none() && deck.is_none() && kinds.is_none() {
            return load_default_tables();
        }

        let mixer_effect = read_or_default(mixer_effect, DEFAULT_MIXER_EFFECT_CSV)?;
        let deck = read_or_default(deck, DEFAULT_DECK_CSV)?;
        let kinds = read_or_default(kinds, DEFAULT_TYPES_CSV)?;

        Self::from_csv(&mixer_effect, &deck, &kinds)
    }

    /// Control kind for an event code, if it has one
    pub fn kind(&self, code: u16) -> Option<ControlKind> {
        self.kinds.get(code as usize).copied().flatten()
    }

    /// Resolve the destination of an event code under the current modifiers.
    ///
    /// Mixer/effect controls take the shifted destination while either shift is held.
    /// Deck controls pick one of four destinations from the toggle and shift of their
    /// own deck pair, which is identified by the parity of the shifted destination's
    /// channel.
    pub fn resolve(&self, code: u16, modifiers: &ModifierState) -> Option<Destination> {
        let index = code as usize;

        if let Some(Some(entry)) = self.mixer_effect.get(index) {
            let shifted = modifiers.shift_a || modifiers.shift_b;
            return Some(entry[shifted as usize]);
        }

        if let Some(Some(entry)) = self.deck.get(index) {
            let (toggled, shifted) = if entry[1].is_bd_pair() {
                (modifiers.toggle_bd, modifiers.shift_b)
            } else {
                (modifiers.toggle_ac, modifiers.shift_a)
            };
            return Some(entry[2 * toggled as usize + shifted as usize]);
        }

        None
    }
}

/// Embedded default tables
pub const DEFAULT_MIXER_EFFECT_CSV: &str =
    include_str!("../maps/midi-evcode-map-mixer-effect.csv");
pub const DEFAULT_DECK_CSV: &str = include_str!("../maps/midi-evcode-map-deck.csv");
pub const DEFAULT_TYPES_CSV: &str = include_str!("../maps/evcode-type-map.csv");

/// Global cache for the embedded default tables
static DEFAULT_TABLES: OnceLock<MappingTables> = OnceLock::new();

/// Load the default tables (cached after first parse)
pub fn load_default_tables() -> Result<MappingTables, MappingError> {
    if let Some(tables) = DEFAULT_TABLES.get() {
        return Ok(tables.clone());
    }

    let tables = MappingTables::from_csv(
        DEFAULT_MIXER_EFFECT_CSV,
        DEFAULT_DECK_CSV,
        DEFAULT_TYPES_CSV,
    )?;
    // Ignore error if another thread set it first
    let _ = DEFAULT_TABLES.set(tables.clone());
    Ok(tables)
}

fn read_or_default(path: Option<&Path>, default: &str) -> Result<String, MappingError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.display().to_string(),
            source,
        }),
        None => Ok(default.to_string()),
    }
}

fn records(content: &str, expected: usize) -> Result<Vec<(usize, StringRecord)>, MappingError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

        if record.len() != expected {
            return Err(MappingError::FieldCount {
                line,
                expected,
                found: record.len(),
            });
        }
        rows.push((line, record));
    }

    Ok(rows)
}

fn parse_code(line: usize, field: &str) -> Result<usize, MappingError> {
    let code: u16 = field.parse().map_err(|_| MappingError::InvalidNumber {
        line,
        value: field.to_string(),
    })?;

    if code as usize >= TABLE_SIZE {
        return Err(MappingError::CodeOutOfRange {
            line,
            code,
            max: TABLE_SIZE as u16,
        });
    }

    Ok(code as usize)
}

fn parse_hex(line: usize, field: &str) -> Result<u8, MappingError> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);

    u8::from_str_radix(digits, 16).map_err(|_| MappingError::InvalidNumber {
        line,
        value: field.to_string(),
    })
}

fn parse_destination(line: usize, cc: &str, status: &str) -> Result<Destination, MappingError> {
    let code = parse_hex(line, cc)?;
    let status = parse_hex(line, status)?;

    if code > 0x7F {
        return Err(MappingError::InvalidControlNumber { line, code });
    }
    if status & 0xF0 != CC_STATUS || status & 0x0F > MAX_CHANNEL {
        return Err(MappingError::InvalidStatus { line, status });
    }

    Ok(Destination::new(status & 0x0F, code))
}

fn parse_mixer_effect(content: &str) -> Result<Vec<Option<MixerEffectEntry>>, MappingError> {
    let mut table = vec![None; TABLE_SIZE];

    for (line, record) in records(content, 5)? {
        let code = parse_code(line, &record[0])?;
        table[code] = Some([
            parse_destination(line, &record[1], &record[2])?,
            parse_destination(line, &record[3], &record[4])?,
        ]);
    }

    Ok(table)
}

fn parse_deck(content: &str) -> Result<Vec<Option<DeckEntry>>, MappingError> {
    let mut table = vec![None; TABLE_SIZE];

    for (line, record) in records(content, 9)? {
        let code = parse_code(line, &record[0])?;
        table[code] = Some([
            parse_destination(line, &record[1], &record[2])?,
            parse_destination(line, &record[3], &record[4])?,
            parse_destination(line, &record[5], &record[6])?,
            parse_destination(line, &record[7], &record[8])?,
        ]);
    }

    Ok(table)
}

fn parse_kinds(content: &str) -> Result<Vec<Option<ControlKind>>, MappingError> {
    let mut table = vec![None; TABLE_SIZE];

    for (line, record) in records(content, 2)? {
        let code = parse_code(line, &record[0])?;
        let kind = ControlKind::parse(&record[1]).ok_or_else(|| MappingError::UnknownKind {
            line,
            kind: record[1].to_string(),
        })?;
        table[code] = Some(kind);
    }

    Ok(table)
}
