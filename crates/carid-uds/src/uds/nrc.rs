//! Negative Response Codes seen while probing

use std::fmt;

/// UDS/KWP2000 Negative Response Codes (NRC)
///
/// Only the codes an ECU plausibly returns to an identification request
/// are named; everything else is carried as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegativeResponseCode {
    GeneralReject,
    ServiceNotSupported,
    SubFunctionNotSupported,
    IncorrectMessageLengthOrFormat,
    BusyRepeatRequest,
    ConditionsNotCorrect,
    RequestOutOfRange,
    SecurityAccessDenied,
    /// Request accepted, final answer follows
    ResponsePending,
    ServiceNotSupportedInActiveSession,
    Unknown(u8),
}

impl From<u8> for NegativeResponseCode {
    fn from(value: u8) -> Self {
        match value {
            0x10 => Self::GeneralReject,
            0x11 => Self::ServiceNotSupported,
            0x12 => Self::SubFunctionNotSupported,
            0x13 => Self::IncorrectMessageLengthOrFormat,
            0x21 => Self::BusyRepeatRequest,
            0x22 => Self::ConditionsNotCorrect,
            0x31 => Self::RequestOutOfRange,
            0x33 => Self::SecurityAccessDenied,
            0x78 => Self::ResponsePending,
            0x7F => Self::ServiceNotSupportedInActiveSession,
            other => Self::Unknown(other),
        }
    }
}

impl From<NegativeResponseCode> for u8 {
    fn from(nrc: NegativeResponseCode) -> Self {
        match nrc {
            NegativeResponseCode::GeneralReject => 0x10,
            NegativeResponseCode::ServiceNotSupported => 0x11,
            NegativeResponseCode::SubFunctionNotSupported => 0x12,
            NegativeResponseCode::IncorrectMessageLengthOrFormat => 0x13,
            NegativeResponseCode::BusyRepeatRequest => 0x21,
            NegativeResponseCode::ConditionsNotCorrect => 0x22,
            NegativeResponseCode::RequestOutOfRange => 0x31,
            NegativeResponseCode::SecurityAccessDenied => 0x33,
            NegativeResponseCode::ResponsePending => 0x78,
            NegativeResponseCode::ServiceNotSupportedInActiveSession => 0x7F,
            NegativeResponseCode::Unknown(v) => v,
        }
    }
}

impl fmt::Display for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GeneralReject => "GeneralReject",
            Self::ServiceNotSupported => "ServiceNotSupported",
            Self::SubFunctionNotSupported => "SubFunctionNotSupported",
            Self::IncorrectMessageLengthOrFormat => "IncorrectMessageLengthOrFormat",
            Self::BusyRepeatRequest => "BusyRepeatRequest",
            Self::ConditionsNotCorrect => "ConditionsNotCorrect",
            Self::RequestOutOfRange => "RequestOutOfRange",
            Self::SecurityAccessDenied => "SecurityAccessDenied",
            Self::ResponsePending => "ResponsePending",
            Self::ServiceNotSupportedInActiveSession => "ServiceNotSupportedInActiveSession",
            Self::Unknown(v) => return write!(f, "Unknown(0x{:02X})", v),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_conversion() {
        for byte in [0x10, 0x11, 0x31, 0x78, 0x7F, 0x99] {
            assert_eq!(u8::from(NegativeResponseCode::from(byte)), byte);
        }
        assert_eq!(NegativeResponseCode::from(0x78), NegativeResponseCode::ResponsePending);
        assert_eq!(NegativeResponseCode::from(0x99).to_string(), "Unknown(0x99)");
    }
}
