//! Probe definitions and the ordered probe list

use std::fmt;

use carid_core::{ProbeId, Signature, VariantSpec};
use serde::{Deserialize, Serialize};

use crate::transport::ProbeTarget;
use crate::uds::{standard_did, std_queries, DEFAULT_RX_OFFSET};

/// ECU a probe is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecu {
    /// Electric power steering
    Eps,
    /// Drive inverter
    Engine,
}

impl Ecu {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecu::Eps => "eps",
            Ecu::Engine => "engine",
        }
    }
}

impl fmt::Display for Ecu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic addressing class of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// Standard UDS addressing
    Standard,
    /// Pre-standardized addressing used by legacy hardware
    Legacy,
}

impl Addressing {
    /// Whether a variant can answer probes of this class at all
    pub fn admits(&self, spec: &VariantSpec) -> bool {
        match self {
            Addressing::Standard => !spec.is_legacy(),
            Addressing::Legacy => spec.is_legacy(),
        }
    }
}

/// One request and the response prefix that marks a valid answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStep {
    pub request: Vec<u8>,
    pub response_prefix: Vec<u8>,
}

impl ProbeStep {
    pub fn new(request: Vec<u8>, response_prefix: Vec<u8>) -> Self {
        Self {
            request,
            response_prefix,
        }
    }

    pub fn tester_present() -> Self {
        Self::new(
            std_queries::tester_present_request(),
            std_queries::tester_present_response(),
        )
    }

    pub fn read_did(did: u16) -> Self {
        Self::new(
            std_queries::read_did_request(did),
            std_queries::read_did_response(did),
        )
    }

    /// Payload of a valid response, or `None` if the prefix does not match
    pub fn payload<'a>(&self, response: &'a [u8]) -> Option<&'a [u8]> {
        response.strip_prefix(self.response_prefix.as_slice())
    }
}

/// A single identification query against one ECU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTemplate {
    pub id: ProbeId,
    pub ecu: Ecu,
    pub bus: u8,
    pub tx_addr: u32,
    /// The ECU answers on `tx_addr + rx_offset`
    pub rx_offset: u32,
    pub addressing: Addressing,
    /// Sent in order; the last step's payload is the signature
    pub steps: Vec<ProbeStep>,
}

impl ProbeTemplate {
    pub fn new(
        id: impl Into<ProbeId>,
        ecu: Ecu,
        bus: u8,
        tx_addr: u32,
        addressing: Addressing,
        steps: Vec<ProbeStep>,
    ) -> Self {
        Self {
            id: id.into(),
            ecu,
            bus,
            tx_addr,
            rx_offset: DEFAULT_RX_OFFSET,
            addressing,
            steps,
        }
    }

    pub fn with_rx_offset(mut self, rx_offset: u32) -> Self {
        self.rx_offset = rx_offset;
        self
    }

    pub fn rx_addr(&self) -> u32 {
        self.tx_addr + self.rx_offset
    }

    pub fn target(&self) -> ProbeTarget {
        ProbeTarget::new(self.bus, self.tx_addr, self.rx_addr())
    }

    /// Extract the signature from the final step's response
    pub fn signature(&self, response: &[u8]) -> Option<Signature> {
        self.steps
            .last()
            .and_then(|step| step.payload(response))
            .map(<[u8]>::to_vec)
    }
}

/// Ordered probe list
///
/// Standard-addressing probes always run before legacy ones, so legacy
/// hardware is only considered after the standard list is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintProtocol {
    probes: Vec<ProbeTemplate>,
}

impl FingerprintProtocol {
    /// Build a protocol; relative order within each addressing class is kept
    pub fn new(probes: Vec<ProbeTemplate>) -> Self {
        let (mut standard, legacy): (Vec<_>, Vec<_>) = probes
            .into_iter()
            .partition(|p| p.addressing == Addressing::Standard);
        standard.extend(legacy);
        Self { probes: standard }
    }

    pub fn probes(&self) -> &[ProbeTemplate] {
        &self.probes
    }

    pub fn probe(&self, id: &ProbeId) -> Option<&ProbeTemplate> {
        self.probes.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &ProbeId) -> bool {
        self.probe(id).is_some()
    }

    /// Tesla firmware queries: EPS and drive inverter on the party bus
    pub fn tesla() -> Self {
        const BUS: u8 = 0;
        let ecus = [(Ecu::Eps, 0x730), (Ecu::Engine, 0x606)];
        let queries = [
            ("supplier_sw", standard_did::SUPPLIER_SW_VERSION),
            ("uds_version", standard_did::UDS_VERSION),
            ("manufacturer_sw", standard_did::ECU_SOFTWARE_NUMBER),
        ];

        let mut probes = Vec::new();
        for (name, did) in queries {
            for (ecu, tx_addr) in ecus {
                probes.push(ProbeTemplate::new(
                    format!("{}_{}", ecu, name),
                    ecu,
                    BUS,
                    tx_addr,
                    Addressing::Standard,
                    vec![ProbeStep::tester_present(), ProbeStep::read_did(did)],
                ));
            }
        }

        probes.push(ProbeTemplate::new(
            "eps_kwp_sw",
            Ecu::Eps,
            BUS,
            0x730,
            Addressing::Legacy,
            vec![ProbeStep::new(
                std_queries::kwp_software_version_request(),
                std_queries::kwp_software_version_response(),
            )],
        ));

        Self::new(probes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carid_core::{LegacyHardware, PhysicalParams};

    fn step_probe(addressing: Addressing, id: &str) -> ProbeTemplate {
        ProbeTemplate::new(id, Ecu::Eps, 0, 0x730, addressing, vec![ProbeStep::read_did(0xF195)])
    }

    #[test]
    fn test_signature_strips_prefix() {
        let probe = step_probe(Addressing::Standard, "p");

        assert_eq!(
            probe.signature(&[0x62, 0xF1, 0x95, b'E', b'1']),
            Some(b"E1".to_vec())
        );
        assert_eq!(probe.signature(&[0x62, 0xF1, 0x88, b'E']), None);
    }

    #[test]
    fn test_rx_offset() {
        let probe = step_probe(Addressing::Standard, "p");
        assert_eq!(probe.target(), ProbeTarget::new(0, 0x730, 0x738));
        assert_eq!(probe.with_rx_offset(0x01).rx_addr(), 0x731);
    }

    #[test]
    fn test_legacy_probes_run_last() {
        let protocol = FingerprintProtocol::new(vec![
            step_probe(Addressing::Legacy, "legacy"),
            step_probe(Addressing::Standard, "first"),
            step_probe(Addressing::Standard, "second"),
        ]);
        let ids: Vec<_> = protocol.probes().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "legacy"]);
    }

    #[test]
    fn test_addressing_admits() {
        let standard = VariantSpec::new("S", PhysicalParams::new(1.0, 1.0, 1.0));
        let legacy = standard.clone().with_legacy(LegacyHardware::Hw1);

        assert!(Addressing::Standard.admits(&standard));
        assert!(!Addressing::Standard.admits(&legacy));
        assert!(Addressing::Legacy.admits(&legacy));
        assert!(!Addressing::Legacy.admits(&standard));
    }

    #[test]
    fn test_tesla_protocol() {
        let protocol = FingerprintProtocol::tesla();
        let probes = protocol.probes();

        assert_eq!(probes.len(), 7);
        assert_eq!(probes[0].id.as_str(), "eps_supplier_sw");
        assert_eq!(probes[0].steps[1].request, vec![0x22, 0xF1, 0x95]);
        assert_eq!(probes[1].target(), ProbeTarget::new(0, 0x606, 0x60E));
        assert!(protocol.contains(&ProbeId::from("engine_manufacturer_sw")));
        assert_eq!(probes[6].addressing, Addressing::Legacy);
        assert_eq!(probes[6].steps[0].request, vec![0x1A, 0x87]);
    }
}
