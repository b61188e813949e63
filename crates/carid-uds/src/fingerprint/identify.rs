//! Identification driver

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use carid_core::{PlatformRegistry, Signature, VariantKey};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::probe::{FingerprintProtocol, ProbeStep, ProbeTemplate};
use super::state::{MatchState, Observation};
use crate::error::IdentifyError;
use crate::transport::{ProbeTarget, ProbeTransport, TransportError};
use crate::uds::{parse_negative_response, NegativeResponseCode};

/// Default wait for each probe step
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Cooperative cancellation, honored between probes
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one attempt together with its probe log
#[derive(Debug, Clone)]
pub struct Identification {
    pub result: Result<VariantKey, IdentifyError>,
    pub observations: Vec<Observation>,
}

/// Runs the probe list against a transport
///
/// One `Identifier` can drive any number of attempts; each attempt owns its
/// own [`MatchState`], so attempts may run concurrently on separate
/// transports.
#[derive(Debug, Clone)]
pub struct Identifier {
    protocol: FingerprintProtocol,
    timeout: Duration,
    cancel: CancelToken,
}

impl Identifier {
    pub fn new(protocol: FingerprintProtocol) -> Self {
        Self {
            protocol,
            timeout: DEFAULT_PROBE_TIMEOUT,
            cancel: CancelToken::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn protocol(&self) -> &FingerprintProtocol {
        &self.protocol
    }

    /// Identify the attached variant
    pub async fn identify(
        &self,
        transport: &dyn ProbeTransport,
        registry: &PlatformRegistry,
    ) -> Result<VariantKey, IdentifyError> {
        self.run(transport, registry).await.result
    }

    /// Identify the attached variant, keeping the probe log
    pub async fn run(
        &self,
        transport: &dyn ProbeTransport,
        registry: &PlatformRegistry,
    ) -> Identification {
        let mut state = MatchState::new(registry);
        let result = match self.drive(transport, &mut state).await {
            Ok(()) => state.finish(),
            Err(e) => Err(e),
        };

        match &result {
            Ok(key) => info!(variant = %key, "Variant identified"),
            Err(e) => warn!(error = %e, "Identification failed"),
        }

        Identification {
            result,
            observations: state.into_observations(),
        }
    }

    async fn drive(
        &self,
        transport: &dyn ProbeTransport,
        state: &mut MatchState<'_>,
    ) -> Result<(), IdentifyError> {
        if state.candidates().is_empty() {
            return Err(IdentifyError::NoCandidates);
        }
        if !transport.is_connected().await {
            return Err(IdentifyError::Transport {
                message: TransportError::ConnectionClosed.to_string(),
                candidates: state.candidates().clone(),
            });
        }

        for probe in self.protocol.probes() {
            if state.is_settled() {
                break;
            }
            if self.cancel.is_cancelled() {
                return Err(IdentifyError::Cancelled {
                    candidates: state.candidates().clone(),
                });
            }
            if !state.wants(probe) {
                debug!(probe = %probe.id, "No candidates in addressing class, skipping");
                state.record_skip(probe);
                continue;
            }

            match self.execute(transport, probe).await {
                Ok(Some(signature)) => state.record_response(probe, signature)?,
                Ok(None) => {
                    debug!(probe = %probe.id, "No response");
                    state.record_silence(probe);
                }
                Err(e) => {
                    return Err(IdentifyError::Transport {
                        message: e.to_string(),
                        candidates: state.candidates().clone(),
                    })
                }
            }
        }

        Ok(())
    }

    /// Send every step of a probe; `None` if any step goes unanswered
    async fn execute(
        &self,
        transport: &dyn ProbeTransport,
        probe: &ProbeTemplate,
    ) -> Result<Option<Signature>, TransportError> {
        let target = probe.target();
        let mut last = None;

        debug!(probe = %probe.id, ecu = %probe.ecu, %target, "Sending probe");

        for step in &probe.steps {
            let stale = transport.discard_pending(&target).await?;
            if stale > 0 {
                debug!(probe = %probe.id, %target, stale, "Discarded stale frames");
            }
            transport.send(&target, &step.request).await?;
            match self.await_response(transport, &target, step).await? {
                Some(response) => last = Some(response),
                None => return Ok(None),
            }
        }

        Ok(last.and_then(|response| probe.signature(&response)))
    }

    /// Wait for a valid answer to one step, riding out response-pending frames
    ///
    /// Frames that do not belong to this request (another service's negative
    /// response, or a positive response with the wrong prefix) are dropped
    /// and the wait continues until the deadline.
    async fn await_response(
        &self,
        transport: &dyn ProbeTransport,
        target: &ProbeTarget,
        step: &ProbeStep,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let received =
                match tokio::time::timeout(remaining, transport.receive(target, remaining)).await {
                    Ok(received) => received?,
                    Err(_) => return Ok(None),
                };
            let Some(response) = received else {
                return Ok(None);
            };

            if let Some((sid, nrc)) = parse_negative_response(&response) {
                if step.request.first() != Some(&sid) {
                    debug!(%target, sid, %nrc, "Negative response to another request, ignoring");
                    continue;
                }
                if nrc == NegativeResponseCode::ResponsePending {
                    debug!(%target, sid, "Response pending");
                    continue;
                }
                debug!(%target, sid, %nrc, "Negative response, treating as silence");
                return Ok(None);
            }

            if step.payload(&response).is_none() {
                debug!(%target, response = %hex::encode(&response), "Frame does not answer this request, ignoring");
                continue;
            }

            return Ok(Some(response));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
