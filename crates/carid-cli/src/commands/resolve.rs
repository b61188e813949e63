//! Resolve command - control parameters for a variant

use anyhow::Result;
use carid_core::{resolve_with, ControlParameters, ResolveOptions, VariantKey};
use carid_uds::CaridConfig;

use super::build_registry;
use crate::output::OutputContext;

/// Resolve and print control parameters for a known variant
pub fn resolve(
    config: &CaridConfig,
    variant: &str,
    experimental_long: bool,
    no_sdm1: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let (_, registry) = build_registry(config)?;
    let options = ResolveOptions {
        experimental_longitudinal: experimental_long || config.identify.experimental_longitudinal,
        sdm1_present: !no_sdm1,
    };

    let params = resolve_with(&VariantKey::from(variant), &registry, &options)?;
    print_parameters(&params, ctx);
    Ok(())
}

/// Render resolved parameters
pub fn print_parameters(params: &ControlParameters, ctx: &OutputContext) {
    let (accel_min, accel_max) = params.accel_bounds();
    let (jerk_min, jerk_max) = params.jerk_bounds();
    let safety = params
        .safety_configs
        .iter()
        .map(|c| format!("{:?}({}) [{}]", c.model, c.model.id(), c.param))
        .collect::<Vec<_>>()
        .join(", ");

    let pairs = vec![
        ("Variant", params.variant.to_string()),
        ("Angle ceiling (deg)", params.angle_ceiling().to_string()),
        ("Accel (m/s^2)", format!("{} .. {}", accel_min, accel_max)),
        ("Jerk (m/s^3)", format!("{} .. {}", jerk_min, jerk_max)),
        (
            "Steer command period (ms)",
            params.command_period.as_millis().to_string(),
        ),
        ("Flags", params.flags.to_string()),
        ("Longitudinal available", yes_no(params.longitudinal_available)),
        ("Longitudinal enabled", yes_no(params.longitudinal_enabled)),
        ("Radar unavailable", yes_no(params.radar_unavailable)),
        ("Safety", safety),
    ];

    ctx.print_kv(&pairs, params);
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}
