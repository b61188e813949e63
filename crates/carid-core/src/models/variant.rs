//! Variant models
//!
//! A [`VariantSpec`] is one row of the platform table: everything that is
//! known statically about a model/trim/hardware revision. Specs are plain
//! data built from documented defaults plus explicit overrides.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use super::control::ControlOverrides;
use super::flags::SafetyParam;

/// Stable identifier of a hardware variant (e.g. `TESLA_MODEL_3`)
///
/// Keys are referenced by persisted per-vehicle configuration, so a key is
/// never renamed or reused for a different variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(String);

impl VariantKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for VariantKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Name of a signal/message definition set handed to the dialect decoder
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialectName(String);

impl DialectName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DialectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DialectName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identifier of a fingerprint probe (e.g. `eps_supplier_sw`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(String);

impl ProbeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProbeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProbeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Expected payload of a probe response (response prefix stripped)
pub type Signature = Vec<u8>;

/// Logical bus roles
///
/// Role names are part of the persisted configuration contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusRole {
    /// Primary vehicle bus
    Main,
    /// Party (infotainment/gateway) bus
    Party,
    /// Autopilot side of the party bus
    ApParty,
    /// Powertrain
    Pt,
    Chassis,
    Radar,
    Cam,
    Adas,
    Body,
}

impl BusRole {
    pub const ALL: [BusRole; 9] = [
        BusRole::Main,
        BusRole::Party,
        BusRole::ApParty,
        BusRole::Pt,
        BusRole::Chassis,
        BusRole::Radar,
        BusRole::Cam,
        BusRole::Adas,
        BusRole::Body,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusRole::Main => "main",
            BusRole::Party => "party",
            BusRole::ApParty => "ap_party",
            BusRole::Pt => "pt",
            BusRole::Chassis => "chassis",
            BusRole::Radar => "radar",
            BusRole::Cam => "cam",
            BusRole::Adas => "adas",
            BusRole::Body => "body",
        }
    }
}

impl fmt::Display for BusRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BusRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown bus role '{}'", s))
    }
}

/// Physical parameters used by downstream vehicle models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParams {
    /// Curb weight plus standard passenger (kg)
    pub mass: f64,
    /// Wheelbase (m)
    pub wheelbase: f64,
    /// Steering wheel angle to road wheel angle ratio
    pub steer_ratio: f64,
}

impl PhysicalParams {
    pub const fn new(mass: f64, wheelbase: f64, steer_ratio: f64) -> Self {
        Self {
            mass,
            wheelbase,
            steer_ratio,
        }
    }
}

/// Pre-standardized hardware generations
///
/// Variants carrying one of these use the old diagnostic addressing and
/// are only reachable through the legacy probe list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyHardware {
    /// Before Autopilot hardware
    PreAp,
    Hw1,
    Hw2,
    Hw3,
}

impl LegacyHardware {
    /// Safety parameter bit selecting this generation in the legacy safety model
    pub fn safety_param(&self) -> SafetyParam {
        match self {
            LegacyHardware::PreAp => SafetyParam::PREAP,
            LegacyHardware::Hw1 => SafetyParam::HW1,
            LegacyHardware::Hw2 => SafetyParam::HW2,
            LegacyHardware::Hw3 => SafetyParam::HW3,
        }
    }

    /// Whether an external panda may be attached alongside the internal one
    pub fn supports_external_panda(&self) -> bool {
        matches!(self, LegacyHardware::Hw2 | LegacyHardware::Hw3)
    }
}

/// Wiring harness required to install on a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessTag {
    TeslaA,
    TeslaB,
}

impl fmt::Display for HarnessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HarnessTag::TeslaA => "Tesla A connector",
            HarnessTag::TeslaB => "Tesla B connector",
        };
        f.write_str(s)
    }
}

/// Documentation table column a footnote is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocColumn {
    Make,
    Model,
    Package,
}

/// Footnote rendered next to a documentation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub id: String,
    /// HTML text
    pub text: String,
    pub column: DocColumn,
    /// Rendered in the setup notes section instead of the table
    #[serde(default)]
    pub setup_note: bool,
}

/// One documentation line for a variant (presentation only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    /// Display name, e.g. "Tesla Model 3 (with HW3) 2019-23"
    pub name: String,
    /// Required trim/package
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harness: Option<HarnessTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<Footnote>,
}

impl DocEntry {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            harness: None,
            footnotes: Vec::new(),
        }
    }

    pub fn with_harness(mut self, harness: HarnessTag) -> Self {
        self.harness = Some(harness);
        self
    }

    pub fn with_footnotes(mut self, footnotes: Vec<Footnote>) -> Self {
        self.footnotes = footnotes;
        self
    }
}

/// Immutable description of one hardware variant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSpec {
    pub key: VariantKey,
    /// Bus role to dialect mapping; unmapped roles use the platform default
    pub dialects: BTreeMap<BusRole, DialectName>,
    pub physical: PhysicalParams,
    pub docs: Vec<DocEntry>,
    /// Set for variants using the pre-standardized diagnostic addressing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<LegacyHardware>,
    /// Deviations from the platform default control limits
    pub control: ControlOverrides,
    /// Expected response signatures per probe
    #[serde(serialize_with = "serialize_firmware")]
    pub firmware: BTreeMap<ProbeId, Vec<Signature>>,
}

impl VariantSpec {
    pub fn new(key: impl Into<VariantKey>, physical: PhysicalParams) -> Self {
        Self {
            key: key.into(),
            dialects: BTreeMap::new(),
            physical,
            docs: Vec::new(),
            legacy: None,
            control: ControlOverrides::default(),
            firmware: BTreeMap::new(),
        }
    }

    pub fn with_dialect(mut self, role: BusRole, dialect: impl Into<DialectName>) -> Self {
        self.dialects.insert(role, dialect.into());
        self
    }

    /// Replace the whole dialect map
    pub fn with_dialects<'a>(mut self, dialects: impl IntoIterator<Item = (BusRole, &'a str)>) -> Self {
        self.dialects = dialects
            .into_iter()
            .map(|(role, name)| (role, DialectName::new(name)))
            .collect();
        self
    }

    pub fn with_docs(mut self, docs: Vec<DocEntry>) -> Self {
        self.docs = docs;
        self
    }

    pub fn with_legacy(mut self, hardware: LegacyHardware) -> Self {
        self.legacy = Some(hardware);
        self
    }

    pub fn with_control(mut self, control: ControlOverrides) -> Self {
        self.control = control;
        self
    }

    pub fn with_firmware<S: Into<Signature>>(
        mut self,
        probe: impl Into<ProbeId>,
        versions: impl IntoIterator<Item = S>,
    ) -> Self {
        let probe = probe.into();
        for version in versions {
            self.add_firmware(probe.clone(), version.into());
        }
        self
    }

    /// Add one expected signature for a probe (duplicates are ignored)
    pub fn add_firmware(&mut self, probe: ProbeId, signature: Signature) {
        let known = self.firmware.entry(probe).or_default();
        if !known.contains(&signature) {
            known.push(signature);
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy.is_some()
    }

    /// Whether this variant is known to answer `probe` with `signature`
    pub fn accepts(&self, probe: &ProbeId, signature: &[u8]) -> bool {
        self.firmware
            .get(probe)
            .is_some_and(|known| known.iter().any(|s| s.as_slice() == signature))
    }
}

/// Firmware versions are mostly ASCII; render them as text for humans
fn serialize_firmware<S: Serializer>(
    firmware: &BTreeMap<ProbeId, Vec<Signature>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let readable: BTreeMap<&str, Vec<String>> = firmware
        .iter()
        .map(|(probe, versions)| {
            let versions = versions
                .iter()
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .collect();
            (probe.as_str(), versions)
        })
        .collect();
    readable.serialize(serializer)
}
