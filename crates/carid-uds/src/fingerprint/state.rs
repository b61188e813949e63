//! Candidate narrowing for one identification attempt

use std::collections::BTreeSet;

use carid_core::{PlatformRegistry, ProbeId, Signature, VariantKey};
use serde::Serialize;
use tracing::debug;

use super::probe::ProbeTemplate;
use crate::error::IdentifyError;

/// What happened when a probe was considered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "signature", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Valid response with this signature
    Response(Signature),
    /// Timed out, or answered with something other than a valid response
    NoResponse,
    /// Not sent because no remaining candidate is in the probe's addressing class
    Skipped,
}

/// Diagnostic log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub probe: ProbeId,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
    /// Candidates left after this probe
    pub remaining: usize,
}

/// Per-attempt matching state
///
/// Candidates only ever shrink. Once a single candidate remains it is
/// confirmed; an empty candidate set is final.
#[derive(Debug)]
pub struct MatchState<'r> {
    registry: &'r PlatformRegistry,
    candidates: BTreeSet<VariantKey>,
    confirmed: Option<VariantKey>,
    observations: Vec<Observation>,
}

impl<'r> MatchState<'r> {
    /// Start with every registered variant as a candidate
    pub fn new(registry: &'r PlatformRegistry) -> Self {
        let mut state = Self {
            registry,
            candidates: registry.keys().cloned().collect(),
            confirmed: None,
            observations: Vec::new(),
        };
        state.update_confirmed();
        state
    }

    pub fn candidates(&self) -> &BTreeSet<VariantKey> {
        &self.candidates
    }

    pub fn confirmed(&self) -> Option<&VariantKey> {
        self.confirmed.as_ref()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }

    /// No further probe can change the outcome
    pub fn is_settled(&self) -> bool {
        self.candidates.len() <= 1
    }

    /// Whether sending `probe` can still narrow the candidates
    pub fn wants(&self, probe: &ProbeTemplate) -> bool {
        !self.is_settled()
            && self.candidates.iter().any(|key| {
                self.registry
                    .get(key)
                    .is_ok_and(|spec| probe.addressing.admits(spec))
            })
    }

    pub fn record_skip(&mut self, probe: &ProbeTemplate) {
        self.observe(probe, ProbeOutcome::Skipped);
    }

    /// Silence eliminates nothing
    pub fn record_silence(&mut self, probe: &ProbeTemplate) {
        self.observe(probe, ProbeOutcome::NoResponse);
    }

    /// Keep only candidates in the probe's addressing class that list `signature`
    pub fn record_response(
        &mut self,
        probe: &ProbeTemplate,
        signature: Signature,
    ) -> Result<(), IdentifyError> {
        let before = self.candidates.clone();
        let registry = self.registry;

        let matching = registry.variants_matching(&probe.id, &signature);
        self.candidates.retain(|key| {
            matching.contains(key)
                && registry
                    .get(key)
                    .is_ok_and(|spec| probe.addressing.admits(spec))
        });

        debug!(
            probe = %probe.id,
            signature = %hex::encode(&signature),
            before = before.len(),
            after = self.candidates.len(),
            "Eliminated candidates"
        );

        self.observe(probe, ProbeOutcome::Response(signature.clone()));
        self.update_confirmed();

        if self.candidates.is_empty() {
            return Err(IdentifyError::NoMatch {
                probe: probe.id.clone(),
                signature,
                candidates: before,
            });
        }
        Ok(())
    }

    /// Terminal outcome once probing has stopped
    pub fn finish(&self) -> Result<VariantKey, IdentifyError> {
        if let Some(key) = &self.confirmed {
            return Ok(key.clone());
        }
        if self.candidates.is_empty() {
            return Err(IdentifyError::NoCandidates);
        }
        Err(IdentifyError::Ambiguous {
            candidates: self.candidates.clone(),
        })
    }

    fn observe(&mut self, probe: &ProbeTemplate, outcome: ProbeOutcome) {
        self.observations.push(Observation {
            probe: probe.id.clone(),
            outcome,
            remaining: self.candidates.len(),
        });
    }

    fn update_confirmed(&mut self) {
        self.confirmed = match self.candidates.len() {
            1 => self.candidates.iter().next().cloned(),
            _ => None,
        };
    }
}
