//! Gear shifter state mapping

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic gear state consumed by the control layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearShifter {
    #[default]
    Unknown,
    Park,
    Reverse,
    Neutral,
    Drive,
}

impl fmt::Display for GearShifter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GearShifter::Unknown => "unknown",
            GearShifter::Park => "park",
            GearShifter::Reverse => "reverse",
            GearShifter::Neutral => "neutral",
            GearShifter::Drive => "drive",
        };
        f.write_str(s)
    }
}

/// Raw `DI_gear` codes reported by the drive inverter
pub mod raw_gear {
    pub const INVALID: u32 = 0;
    pub const PARK: u32 = 1;
    pub const REVERSE: u32 = 2;
    pub const NEUTRAL: u32 = 3;
    pub const DRIVE: u32 = 4;
    /// Signal not available
    pub const SNA: u32 = 7;
}

/// Value labels of `DI_gear` in the party bus dialect
const GEAR_LABELS: &[(&str, GearShifter)] = &[
    ("DI_GEAR_INVALID", GearShifter::Unknown),
    ("DI_GEAR_P", GearShifter::Park),
    ("DI_GEAR_R", GearShifter::Reverse),
    ("DI_GEAR_N", GearShifter::Neutral),
    ("DI_GEAR_D", GearShifter::Drive),
    ("DI_GEAR_SNA", GearShifter::Unknown),
];

/// Map a raw gear code; anything outside the known set is `Unknown`
pub fn gear_from_raw(code: u32) -> GearShifter {
    match code {
        raw_gear::PARK => GearShifter::Park,
        raw_gear::REVERSE => GearShifter::Reverse,
        raw_gear::NEUTRAL => GearShifter::Neutral,
        raw_gear::DRIVE => GearShifter::Drive,
        _ => GearShifter::Unknown,
    }
}

/// Map a decoded value label; unrecognized labels are `Unknown`
pub fn gear_from_label(label: &str) -> GearShifter {
    GEAR_LABELS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, gear)| *gear)
        .unwrap_or_default()
}
