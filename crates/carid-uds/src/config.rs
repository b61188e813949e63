//! Identification configuration
//!
//! Loaded from TOML. Every section is optional; defaults match the
//! built-in probe timing and the mock transport.
//!
//! ```toml
//! [identify]
//! probe_timeout_ms = 100
//! bus_roles = ["party", "radar"]
//!
//! [transport]
//! type = "mock"
//!
//! [[transport.responses]]
//! tx_addr = "0x730"
//! request = "22F195"
//! response = "62F195 45303134"
//!
//! [[firmware]]
//! variant = "TESLA_MODEL_3"
//! probe = "eps_supplier_sw"
//! versions = ["E014"]
//! ```

use std::path::Path;
use std::time::Duration;

use carid_core::{BusRole, ProbeId, Signature, VariantKey, VariantSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::fingerprint::FingerprintProtocol;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaridConfig {
    #[serde(default)]
    pub identify: IdentifyConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Firmware database: expected probe answers per variant
    #[serde(default)]
    pub firmware: Vec<FirmwareEntry>,
}

impl CaridConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Merge the firmware database into the variant table
    ///
    /// Must run before the registry is built. Unknown variants or probes
    /// are rejected rather than skipped. Returns the number of signatures
    /// read from the database.
    pub fn apply_firmware(
        &self,
        variants: &mut [VariantSpec],
        protocol: &FingerprintProtocol,
    ) -> Result<usize, ConfigError> {
        let mut merged = 0;

        for entry in &self.firmware {
            if !protocol.contains(&entry.probe) {
                return Err(ConfigError::UnknownProbe(entry.probe.clone()));
            }
            let spec = variants
                .iter_mut()
                .find(|spec| spec.key == entry.variant)
                .ok_or_else(|| ConfigError::UnknownVariant(entry.variant.clone()))?;

            for signature in entry.signatures()? {
                spec.add_firmware(entry.probe.clone(), signature);
                merged += 1;
            }
        }

        debug!(entries = self.firmware.len(), signatures = merged, "Firmware database merged");
        Ok(merged)
    }
}

/// Identification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyConfig {
    /// Wait for each probe step
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
    /// Bus roles the transport layer will address; checked at startup
    #[serde(default = "default_bus_roles")]
    pub bus_roles: Vec<BusRole>,
    /// Enable our own longitudinal control on standard variants
    #[serde(default)]
    pub experimental_longitudinal: bool,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout(),
            bus_roles: default_bus_roles(),
            experimental_longitudinal: false,
        }
    }
}

impl IdentifyConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn default_probe_timeout() -> u64 {
    100
}

fn default_bus_roles() -> Vec<BusRole> {
    vec![BusRole::Party]
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Scripted mock transport
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// Mock transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Answer tester present on every scripted ECU address
    #[serde(default = "default_true")]
    pub answer_tester_present: bool,
    #[serde(default)]
    pub responses: Vec<MockResponseConfig>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            answer_tester_present: default_true(),
            responses: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One scripted ECU answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockResponseConfig {
    #[serde(default)]
    pub bus: u8,
    /// Request address (e.g. "0x730")
    pub tx_addr: String,
    /// Response address; defaults to `tx_addr + 0x08`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_addr: Option<String>,
    /// Request bytes in hex
    pub request: String,
    /// Final response bytes in hex
    pub response: String,
    /// Response-pending frames sent before the final response
    #[serde(default)]
    pub pending: u32,
}

// =============================================================================
// Firmware Database
// =============================================================================

/// Expected answers of one variant to one probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareEntry {
    pub variant: VariantKey,
    pub probe: ProbeId,
    /// Versions given as text (most firmware strings are ASCII)
    #[serde(default)]
    pub versions: Vec<String>,
    /// Versions given as raw hex bytes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions_hex: Vec<String>,
}

impl FirmwareEntry {
    pub fn signatures(&self) -> Result<Vec<Signature>, ConfigError> {
        let mut signatures: Vec<Signature> =
            self.versions.iter().map(|v| v.as_bytes().to_vec()).collect();
        for hex_version in &self.versions_hex {
            signatures.push(parse_hex_bytes("firmware version", hex_version)?);
        }
        Ok(signatures)
    }
}

/// Parse an address such as "0x730" or "730"
pub fn parse_addr(s: &str) -> Result<u32, ConfigError> {
    let cleaned = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(cleaned, 16).map_err(|_| ConfigError::InvalidHex {
        field: "address",
        value: s.to_string(),
    })
}

/// Parse hex bytes, ignoring whitespace and an optional 0x prefix
pub fn parse_hex_bytes(field: &'static str, s: &str) -> Result<Vec<u8>, ConfigError> {
    let trimmed = s.trim();
    let cleaned: String = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&cleaned).map_err(|_| ConfigError::InvalidHex {
        field,
        value: s.to_string(),
    })
}
