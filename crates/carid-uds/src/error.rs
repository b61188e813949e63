//! Identification and configuration errors

use std::collections::BTreeSet;

use carid_core::{ProbeId, RegistryError, VariantKey};
use thiserror::Error;

fn join_keys(keys: &BTreeSet<VariantKey>) -> String {
    if keys.is_empty() {
        return "<none>".to_string();
    }
    keys.iter()
        .map(VariantKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Terminal failures of an identification attempt
///
/// A probe timing out is never an error; these are only raised once the
/// attempt cannot produce exactly one variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    /// A response eliminated every remaining candidate
    #[error(
        "No registered variant answers probe {probe} with {} (candidates before: {})",
        hex::encode(.signature),
        join_keys(.candidates)
    )]
    NoMatch {
        probe: ProbeId,
        signature: Vec<u8>,
        /// Candidate set just before the eliminating response
        candidates: BTreeSet<VariantKey>,
    },

    /// Probes are exhausted and more than one candidate remains
    #[error("Ambiguous match: {}", join_keys(.candidates))]
    Ambiguous { candidates: BTreeSet<VariantKey> },

    /// Cancelled at a probe boundary
    #[error("Identification cancelled (candidates: {})", join_keys(.candidates))]
    Cancelled { candidates: BTreeSet<VariantKey> },

    /// Transport failed for a reason other than a timeout
    #[error("Transport error: {message} (candidates: {})", join_keys(.candidates))]
    Transport {
        message: String,
        candidates: BTreeSet<VariantKey>,
    },

    /// Nothing is registered, so nothing can be identified
    #[error("Registry has no variants to identify")]
    NoCandidates,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl IdentifyError {
    /// Candidate set attached to this failure, if any
    pub fn candidates(&self) -> Option<&BTreeSet<VariantKey>> {
        match self {
            IdentifyError::NoMatch { candidates, .. }
            | IdentifyError::Ambiguous { candidates }
            | IdentifyError::Cancelled { candidates }
            | IdentifyError::Transport { candidates, .. } => Some(candidates),
            IdentifyError::NoCandidates | IdentifyError::Registry(_) => None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {field} '{value}': expected hex")]
    InvalidHex { field: &'static str, value: String },

    #[error("Firmware entry references unknown variant: {0}")]
    UnknownVariant(VariantKey),

    #[error("Firmware entry references unknown probe: {0}")]
    UnknownProbe(ProbeId),
}
