//! ECU fingerprinting
//!
//! A [`FingerprintProtocol`] lists the probes to send, an [`Identifier`]
//! sends them and a [`MatchState`] narrows the registered variants down
//! using each answer.

mod identify;
mod probe;
mod state;

pub use identify::{CancelToken, Identification, Identifier, DEFAULT_PROBE_TIMEOUT};
pub use probe::{Addressing, Ecu, FingerprintProtocol, ProbeStep, ProbeTemplate};
pub use state::{MatchState, Observation, ProbeOutcome};
