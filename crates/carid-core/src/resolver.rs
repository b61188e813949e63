//! Control parameter resolution
//!
//! Turns a confirmed variant into the immutable [`ControlParameters`] the
//! control layer must respect. Resolution is a pure function of the
//! variant's static spec and the options; it performs no probing.

use tracing::debug;

use crate::error::RegistryResult;
use crate::models::{
    CarFlags, ControlLimits, ControlParameters, LegacyHardware, SafetyConfig, SafetyModel,
    SafetyParam, VariantKey, VariantSpec,
};
use crate::registry::PlatformRegistry;

/// Inputs to resolution that do not come from the variant table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Opt in to our own longitudinal control on standard variants
    pub experimental_longitudinal: bool,
    /// Whether the SDM1 message (0x201) was seen on the bus
    pub sdm1_present: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            experimental_longitudinal: false,
            sdm1_present: true,
        }
    }
}

/// Resolve control parameters with default options
pub fn resolve(key: &VariantKey, registry: &PlatformRegistry) -> RegistryResult<ControlParameters> {
    resolve_with(key, registry, &ResolveOptions::default())
}

/// Resolve control parameters for a registered variant
pub fn resolve_with(
    key: &VariantKey,
    registry: &PlatformRegistry,
    options: &ResolveOptions,
) -> RegistryResult<ControlParameters> {
    let spec = registry.get(key)?;
    let limits = ControlLimits::from_overrides(&spec.control);

    let params = match spec.legacy {
        Some(hardware) => resolve_legacy(spec, limits, hardware, options),
        None => resolve_standard(spec, limits, options),
    };

    debug!(
        variant = %key,
        flags = %params.flags,
        longitudinal = params.longitudinal_enabled,
        "Resolved control parameters"
    );
    Ok(params)
}

fn resolve_standard(
    spec: &VariantSpec,
    limits: ControlLimits,
    options: &ResolveOptions,
) -> ControlParameters {
    let mut flags = CarFlags::empty();
    let mut safety_param = SafetyParam::empty();

    if options.experimental_longitudinal {
        flags |= CarFlags::LONG_CONTROL;
        safety_param |= SafetyParam::LONG_CONTROL;
    }

    ControlParameters {
        variant: spec.key.clone(),
        command_period: limits.command_period(),
        limits,
        flags,
        longitudinal_available: true,
        longitudinal_enabled: options.experimental_longitudinal,
        radar_unavailable: true,
        safety_configs: vec![SafetyConfig::new(SafetyModel::Tesla, safety_param)],
    }
}

fn resolve_legacy(
    spec: &VariantSpec,
    limits: ControlLimits,
    hardware: LegacyHardware,
    options: &ResolveOptions,
) -> ControlParameters {
    let mut flags = CarFlags::empty();
    if !options.sdm1_present {
        flags |= CarFlags::NO_SDM1;
    }

    // PreAP cars have neither radar nor a longitudinal interface
    let pre_ap = hardware == LegacyHardware::PreAp;
    if !pre_ap {
        flags |= CarFlags::LONG_CONTROL;
    }

    let param = hardware.safety_param();
    let mut safety_configs = vec![SafetyConfig::new(SafetyModel::TeslaLegacy, param)];
    if hardware.supports_external_panda() {
        safety_configs.push(SafetyConfig::new(
            SafetyModel::TeslaLegacy,
            param | SafetyParam::EXTERNAL_PANDA,
        ));
    }

    ControlParameters {
        variant: spec.key.clone(),
        command_period: limits.command_period(),
        limits,
        flags,
        longitudinal_available: !pre_ap,
        longitudinal_enabled: !pre_ap,
        radar_unavailable: pre_ap,
        safety_configs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::tesla;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn registry() -> PlatformRegistry {
        tesla::registry().unwrap()
    }

    #[test]
    fn test_standard_defaults() {
        let params = resolve(&VariantKey::from(tesla::MODEL_3), &registry()).unwrap();

        assert_eq!(params.angle_ceiling(), 360.0);
        assert_eq!(params.accel_bounds(), (-3.48, 2.0));
        assert_eq!(params.jerk_bounds(), (-4.9, 4.9));
        assert_eq!(params.command_period, Duration::from_millis(20));
        assert!(params.flags.is_empty());
        assert!(params.longitudinal_available);
        assert!(!params.longitudinal_enabled);
        assert!(params.radar_unavailable);
        assert_eq!(
            params.safety_configs,
            vec![SafetyConfig::new(SafetyModel::Tesla, SafetyParam::empty())]
        );
    }

    #[test]
    fn test_experimental_longitudinal_sets_safety_param() {
        let options = ResolveOptions {
            experimental_longitudinal: true,
            ..Default::default()
        };
        let params =
            resolve_with(&VariantKey::from(tesla::MODEL_Y), &registry(), &options).unwrap();

        assert!(params.longitudinal_enabled);
        assert!(params.flags.contains(CarFlags::LONG_CONTROL));
        assert!(params.safety_configs[0]
            .param
            .contains(SafetyParam::LONG_CONTROL));
    }

    #[test]
    fn test_resolve_is_pure() {
        let registry = registry();
        let key = VariantKey::from(tesla::MODEL_S_HW2);

        let first = resolve(&key, &registry).unwrap();
        for _ in 0..5 {
            assert_eq!(resolve(&key, &registry).unwrap(), first);
        }
    }

    #[test]
    fn test_unknown_variant() {
        let err = resolve(&VariantKey::from("TESLA_CYBERTRUCK"), &registry()).unwrap_err();
        assert_eq!(err, RegistryError::UnknownVariant(VariantKey::from("TESLA_CYBERTRUCK")));
    }

    #[test]
    fn test_legacy_safety_configs_per_generation() {
        let registry = registry();
        let configs = |key: &str| {
            resolve(&VariantKey::from(key), &registry)
                .unwrap()
                .safety_configs
                .into_iter()
                .map(|c| (c.model, c.param.bits()))
                .collect::<Vec<_>>()
        };

        assert_eq!(configs(tesla::MODEL_S_PREAP), vec![(SafetyModel::TeslaLegacy, 32)]);
        assert_eq!(configs(tesla::MODEL_S_HW1), vec![(SafetyModel::TeslaLegacy, 4)]);
        assert_eq!(
            configs(tesla::MODEL_S_HW2),
            vec![(SafetyModel::TeslaLegacy, 8), (SafetyModel::TeslaLegacy, 10)]
        );
        assert_eq!(
            configs(tesla::MODEL_S_HW3),
            vec![(SafetyModel::TeslaLegacy, 16), (SafetyModel::TeslaLegacy, 18)]
        );
    }

    #[test]
    fn test_preap_has_no_radar_or_longitudinal() {
        let registry = registry();
        let preap = resolve(&VariantKey::from(tesla::MODEL_S_PREAP), &registry).unwrap();
        let hw1 = resolve(&VariantKey::from(tesla::MODEL_S_HW1), &registry).unwrap();

        assert!(preap.radar_unavailable);
        assert!(!preap.longitudinal_available);
        assert!(!preap.flags.contains(CarFlags::LONG_CONTROL));

        assert!(!hw1.radar_unavailable);
        assert!(hw1.longitudinal_enabled);
        assert!(hw1.flags.contains(CarFlags::LONG_CONTROL));
    }

    #[test]
    fn test_missing_sdm1_flag_only_on_legacy() {
        let registry = registry();
        let options = ResolveOptions {
            sdm1_present: false,
            ..Default::default()
        };

        let legacy =
            resolve_with(&VariantKey::from(tesla::MODEL_S_HW3), &registry, &options).unwrap();
        let standard =
            resolve_with(&VariantKey::from(tesla::MODEL_3), &registry, &options).unwrap();

        assert!(legacy.flags.contains(CarFlags::NO_SDM1));
        assert!(!standard.flags.contains(CarFlags::NO_SDM1));
    }
}
