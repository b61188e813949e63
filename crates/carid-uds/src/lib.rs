//! carid-uds - ECU fingerprinting for platform identification
//!
//! This crate probes the ECUs attached to a vehicle bus and narrows the
//! registered variants down to the one actually present.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Identifier                           │
//! │  Runs the probe list once per attempt                       │
//! │                                                             │
//! │  ┌─────────────────────┐        ┌────────────────────────┐  │
//! │  │ FingerprintProtocol │        │ MatchState             │  │
//! │  │ (ordered probes)    │        │ (candidate narrowing)  │  │
//! │  └──────────┬──────────┘        └───────────┬────────────┘  │
//! │             │                               │               │
//! │      ┌──────┴────────┐            ┌─────────┴──────────┐    │
//! │      │ProbeTransport │            │ PlatformRegistry   │    │
//! │      │(mock/bus)     │            │ (carid-core)       │    │
//! │      └───────────────┘            └────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod transport;
pub mod uds;

pub use config::{CaridConfig, FirmwareEntry, IdentifyConfig, MockConfig, TransportConfig};
pub use error::{ConfigError, IdentifyError};
pub use fingerprint::{
    Addressing, CancelToken, Ecu, FingerprintProtocol, Identification, Identifier, MatchState,
    Observation, ProbeOutcome, ProbeStep, ProbeTemplate,
};
pub use transport::{create_transport, MockTransport, ProbeTarget, ProbeTransport, TransportError};
pub use uds::NegativeResponseCode;
