//! Built-in Tesla platform table
//!
//! Every supported Tesla variant, built from the platform defaults plus
//! the per-variant deviations. The firmware database is not part of the
//! static table; it is merged in from configuration before the registry is
//! built.

use crate::error::RegistryResult;
use crate::models::{
    BusRole, DialectName, DocColumn, DocEntry, Footnote, HarnessTag, LegacyHardware,
    PhysicalParams, VariantSpec,
};
use crate::registry::PlatformRegistry;

pub const MODEL_3: &str = "TESLA_MODEL_3";
pub const MODEL_Y: &str = "TESLA_MODEL_Y";
pub const MODEL_Y_JUNIPER: &str = "TESLA_MODEL_Y_JUNIPER";
pub const MODEL_X: &str = "TESLA_MODEL_X";
pub const MODEL_S: &str = "TESLA_MODEL_S";
pub const MODEL_S_PREAP: &str = "TESLA_MODEL_S_PREAP";
pub const MODEL_S_HW1: &str = "TESLA_MODEL_S_HW1";
pub const MODEL_S_HW2: &str = "TESLA_MODEL_S_HW2";
pub const MODEL_S_HW3: &str = "TESLA_MODEL_S_HW3";

/// Variants using the pre-standardized diagnostic addressing
pub const LEGACY: [&str; 4] = [MODEL_S_PREAP, MODEL_S_HW1, MODEL_S_HW2, MODEL_S_HW3];

/// Party bus dialect shared by every current model
pub const DEFAULT_PARTY_DIALECT: &str = "tesla_model3_party";

/// Physical CAN bus numbers as wired by the harness
pub mod can_bus {
    use crate::models::BusRole;

    pub const PARTY: u8 = 0;
    pub const RADAR: u8 = 1;
    pub const AUTOPILOT_PARTY: u8 = 2;

    // Raven only
    pub const POWERTRAIN: u8 = 4;
    pub const CHASSIS: u8 = 5;
    pub const AUTOPILOT_POWERTRAIN: u8 = 6;

    /// Physical bus carrying a logical role, if the harness exposes it
    pub fn for_role(role: BusRole) -> Option<u8> {
        match role {
            BusRole::Party => Some(PARTY),
            BusRole::Radar => Some(RADAR),
            BusRole::ApParty => Some(AUTOPILOT_PARTY),
            BusRole::Pt => Some(POWERTRAIN),
            BusRole::Chassis => Some(CHASSIS),
            _ => None,
        }
    }
}

fn hw_type_footnote() -> Footnote {
    Footnote {
        id: "HW_TYPE".to_string(),
        text: "Some 2023 model years have HW4. To check which hardware type your vehicle has, \
               look for <b>Autopilot computer</b> under <b>Software -> Additional Vehicle \
               Information</b> on your vehicle's touchscreen. </br></br>See \
               <a href=\"https://www.notateslaapp.com/news/2173/how-to-check-if-your-tesla-has-hardware-4-ai4-or-hardware-3\">this page</a> \
               for more information."
            .to_string(),
        column: DocColumn::Model,
        setup_note: false,
    }
}

fn setup_footnote() -> Footnote {
    Footnote {
        id: "SETUP".to_string(),
        text: "See more setup details for \
               <a href=\"https://github.com/commaai/openpilot/wiki/tesla\" target=\"_blank\">Tesla</a>."
            .to_string(),
        column: DocColumn::Make,
        setup_note: true,
    }
}

/// Documentation entry for a car shipped with HW3 (Tesla A harness)
pub fn hw3_doc(name: &str) -> DocEntry {
    DocEntry::new(name, "All")
        .with_harness(HarnessTag::TeslaA)
        .with_footnotes(vec![hw_type_footnote(), setup_footnote()])
}

/// Documentation entry for a car shipped with HW4 (Tesla B harness)
pub fn hw4_doc(name: &str) -> DocEntry {
    DocEntry::new(name, "All")
        .with_harness(HarnessTag::TeslaB)
        .with_footnotes(vec![hw_type_footnote(), setup_footnote()])
}

fn standard(key: &str, physical: PhysicalParams, docs: Vec<DocEntry>) -> VariantSpec {
    VariantSpec::new(key, physical)
        .with_dialect(BusRole::Party, DEFAULT_PARTY_DIALECT)
        .with_docs(docs)
}

fn legacy(
    key: &str,
    hardware: LegacyHardware,
    doc_name: &str,
    dialects: [(BusRole, &str); 4],
) -> VariantSpec {
    VariantSpec::new(key, PhysicalParams::new(2100.0, 2.959, 15.0))
        .with_dialects(dialects)
        .with_docs(vec![DocEntry::new(doc_name, "All")])
        .with_legacy(hardware)
}

/// The full variant table in registration order
pub fn platforms() -> Vec<VariantSpec> {
    vec![
        standard(
            MODEL_3,
            PhysicalParams::new(1899.0, 2.875, 12.0),
            vec![
                hw3_doc("Tesla Model 3 (with HW3) 2019-23"),
                hw4_doc("Tesla Model 3 (with HW4) 2024-25"),
            ],
        ),
        standard(
            MODEL_Y,
            PhysicalParams::new(2072.0, 2.890, 12.0),
            vec![
                hw3_doc("Tesla Model Y (with HW3) 2020-23"),
                hw4_doc("Tesla Model Y (with HW4) 2024"),
            ],
        ),
        standard(
            MODEL_Y_JUNIPER,
            PhysicalParams::new(2072.0, 2.890, 12.0),
            // Listed with the Tesla A harness although the car ships with HW4
            vec![hw3_doc("Tesla Model Y JUNIPER (with HW4) 2025-26")],
        ),
        standard(
            MODEL_X,
            PhysicalParams::new(2495.0, 2.960, 12.0),
            vec![hw4_doc("Tesla Model X (with HW4) 2024")],
        ),
        standard(
            MODEL_S,
            PhysicalParams::new(2166.0, 2.960, 12.0),
            vec![hw4_doc("Tesla Model S (with HW4) 2024")],
        ),
        legacy(
            MODEL_S_PREAP,
            LegacyHardware::PreAp,
            "Tesla Model PreAP",
            [
                (BusRole::Chassis, "tesla_can"),
                (BusRole::Party, "tesla_can"),
                (BusRole::Pt, "tesla_can"),
                (BusRole::Radar, "tesla_radar_bosch_generated"),
            ],
        ),
        legacy(
            MODEL_S_HW1,
            LegacyHardware::Hw1,
            "Tesla Model S HW1",
            [
                (BusRole::Chassis, "tesla_can"),
                (BusRole::Party, "tesla_can"),
                (BusRole::Pt, "tesla_can"),
                (BusRole::Radar, "tesla_radar_bosch_generated"),
            ],
        ),
        legacy(
            MODEL_S_HW2,
            LegacyHardware::Hw2,
            "Tesla Model S HW2",
            [
                (BusRole::Chassis, "tesla_can"),
                (BusRole::Party, "tesla_can"),
                (BusRole::Pt, "tesla_powertrain"),
                (BusRole::Radar, "tesla_radar_bosch_generated"),
            ],
        ),
        legacy(
            MODEL_S_HW3,
            LegacyHardware::Hw3,
            "Tesla Model S HW3",
            [
                (BusRole::Chassis, "tesla_can"),
                (BusRole::Party, "tesla_raven_party"),
                (BusRole::Pt, "tesla_powertrain"),
                (BusRole::Radar, "tesla_radar_continental_generated"),
            ],
        ),
    ]
}

/// Build the Tesla registry from the static table
pub fn registry() -> RegistryResult<PlatformRegistry> {
    registry_from(platforms())
}

/// Build the Tesla registry from an externally enriched table
pub fn registry_from(variants: Vec<VariantSpec>) -> RegistryResult<PlatformRegistry> {
    PlatformRegistry::register_with_default(variants, Some(DialectName::from(DEFAULT_PARTY_DIALECT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariantKey;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn test_every_variant_registers() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 9);

        let legacy: BTreeSet<_> = registry
            .variants()
            .filter(|spec| spec.is_legacy())
            .map(|spec| spec.key.as_str())
            .collect();
        assert_eq!(legacy, BTreeSet::from(LEGACY));
    }

    #[test]
    fn test_party_dialect_reverse_lookup() {
        let registry = registry().unwrap();
        let users = registry.variants_using_dialect(&DialectName::from(DEFAULT_PARTY_DIALECT));

        let expected: BTreeSet<_> = [MODEL_3, MODEL_Y, MODEL_Y_JUNIPER, MODEL_X, MODEL_S]
            .into_iter()
            .map(VariantKey::from)
            .collect();
        assert_eq!(users, expected);
    }

    #[test]
    fn test_legacy_dialects() {
        let registry = registry().unwrap();
        let hw3 = VariantKey::from(MODEL_S_HW3);

        assert_eq!(
            registry.dialect_for(&hw3, BusRole::Party).unwrap().as_str(),
            "tesla_raven_party"
        );
        assert_eq!(
            registry.dialect_for(&hw3, BusRole::Radar).unwrap().as_str(),
            "tesla_radar_continental_generated"
        );
        // Unmapped roles fall back to the platform party dialect
        assert_eq!(
            registry.dialect_for(&hw3, BusRole::Cam).unwrap().as_str(),
            DEFAULT_PARTY_DIALECT
        );
    }

    #[test]
    fn test_every_role_resolves() {
        assert!(registry().unwrap().require_roles(&BusRole::ALL).is_ok());
    }

    #[test]
    fn test_docs_carry_harness_and_footnotes() {
        let registry = registry().unwrap();
        let model_3 = registry.get(&VariantKey::from(MODEL_3)).unwrap();

        assert_eq!(model_3.docs.len(), 2);
        assert_eq!(model_3.docs[0].harness, Some(HarnessTag::TeslaA));
        assert_eq!(model_3.docs[1].harness, Some(HarnessTag::TeslaB));
        assert!(model_3.docs[0].footnotes.iter().any(|f| f.setup_note));

        let preap = registry.get(&VariantKey::from(MODEL_S_PREAP)).unwrap();
        assert_eq!(preap.docs[0].harness, None);
        assert_eq!(registry.documentation().len(), 11);
    }

    #[test]
    fn test_can_bus_roles() {
        assert_eq!(can_bus::for_role(BusRole::Party), Some(can_bus::PARTY));
        assert_eq!(can_bus::for_role(BusRole::Chassis), Some(5));
        assert_eq!(can_bus::for_role(BusRole::Body), None);
    }
}
