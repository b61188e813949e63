//! Gear command - map a drive inverter gear reading

use anyhow::Result;
use carid_core::{gear_from_label, gear_from_raw, GearShifter};
use serde::Serialize;

use crate::output::OutputContext;

#[derive(Debug, Serialize)]
struct GearReading<'a> {
    input: &'a str,
    gear: GearShifter,
}

/// Map a raw code or value label to a gear state
pub fn gear(value: &str, ctx: &OutputContext) -> Result<()> {
    let reading = GearReading {
        input: value,
        gear: parse_gear(value),
    };

    let pairs = vec![("Input", value.to_string()), ("Gear", reading.gear.to_string())];
    ctx.print_kv(&pairs, &reading);
    Ok(())
}

/// Numbers (decimal or 0x hex) are raw codes, anything else is a label
fn parse_gear(value: &str) -> GearShifter {
    let trimmed = value.trim();
    let code = match trimmed.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => trimmed.parse::<u32>().ok(),
    };

    match code {
        Some(code) => gear_from_raw(code),
        None => gear_from_label(trimmed),
    }
}
