//! UDS and KWP2000 request building blocks used by the probes

mod nrc;

pub use nrc::NegativeResponseCode;

/// Default distance between an ECU's request and response addresses
pub const DEFAULT_RX_OFFSET: u32 = 0x08;

/// Positive responses echo the service id plus this offset
pub const POSITIVE_RESPONSE_OFFSET: u8 = 0x40;

/// Service ID constants
pub mod service_id {
    /// KWP2000 readEcuIdentification
    pub const READ_ECU_IDENTIFICATION: u8 = 0x1A;
    pub const READ_DATA_BY_ID: u8 = 0x22;
    pub const TESTER_PRESENT: u8 = 0x3E;
    pub const NEGATIVE_RESPONSE: u8 = 0x7F;
}

/// Data identifiers read by the fingerprint probes
pub mod standard_did {
    pub const ECU_SOFTWARE_NUMBER: u16 = 0xF188;
    pub const SUPPLIER_SW_VERSION: u16 = 0xF195;
    /// Manufacturer-specific UDS version record
    pub const UDS_VERSION: u16 = 0xFF00;
}

/// KWP2000 readEcuIdentification options
pub mod kwp_identification {
    pub const SOFTWARE_VERSION: u8 = 0x87;
}

/// Canned request/expected-response pairs
pub mod std_queries {
    use super::{kwp_identification, service_id, POSITIVE_RESPONSE_OFFSET};

    pub fn tester_present_request() -> Vec<u8> {
        vec![service_id::TESTER_PRESENT, 0x00]
    }

    pub fn tester_present_response() -> Vec<u8> {
        vec![service_id::TESTER_PRESENT + POSITIVE_RESPONSE_OFFSET, 0x00]
    }

    pub fn read_did_request(did: u16) -> Vec<u8> {
        let mut request = vec![service_id::READ_DATA_BY_ID];
        request.extend_from_slice(&did.to_be_bytes());
        request
    }

    /// Positive response prefix; the DID value follows it
    pub fn read_did_response(did: u16) -> Vec<u8> {
        let mut response = vec![service_id::READ_DATA_BY_ID + POSITIVE_RESPONSE_OFFSET];
        response.extend_from_slice(&did.to_be_bytes());
        response
    }

    pub fn kwp_software_version_request() -> Vec<u8> {
        vec![
            service_id::READ_ECU_IDENTIFICATION,
            kwp_identification::SOFTWARE_VERSION,
        ]
    }

    pub fn kwp_software_version_response() -> Vec<u8> {
        vec![
            service_id::READ_ECU_IDENTIFICATION + POSITIVE_RESPONSE_OFFSET,
            kwp_identification::SOFTWARE_VERSION,
        ]
    }
}

/// Decode `0x7F <sid> <nrc>`; anything else is not a negative response
pub fn parse_negative_response(response: &[u8]) -> Option<(u8, NegativeResponseCode)> {
    match response {
        [service_id::NEGATIVE_RESPONSE, sid, nrc, ..] => Some((*sid, NegativeResponseCode::from(*nrc))),
        _ => None,
    }
}
