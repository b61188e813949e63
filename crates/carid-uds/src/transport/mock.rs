//! Mock transport for testing

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::{ProbeTarget, ProbeTransport, TransportError};
use crate::config::{parse_addr, parse_hex_bytes, MockConfig};
use crate::uds::{service_id, std_queries, DEFAULT_RX_OFFSET};

/// Scripted answer: a request on (bus, tx_addr) queues frames on (bus, rx_addr)
#[derive(Debug, Clone)]
struct Script {
    target: ProbeTarget,
    request: Vec<u8>,
    responses: Vec<Vec<u8>>,
}

/// A request recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub target: ProbeTarget,
    pub request: Vec<u8>,
}

/// Mock transport with a scripted request -> response table
///
/// Requests that match no script are recorded and otherwise ignored, so the
/// caller sees silence. A receive with nothing queued returns immediately.
pub struct MockTransport {
    latency: Duration,
    connected: AtomicBool,
    scripts: RwLock<Vec<Script>>,
    /// Frames waiting to be received, keyed by (bus, rx_addr)
    queued: Mutex<HashMap<(u8, u32), VecDeque<Vec<u8>>>>,
    sent: Mutex<Vec<SentFrame>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            connected: AtomicBool::new(true),
            scripts: RwLock::new(Vec::new()),
            queued: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Simulated delay before every receive
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Build a mock from its TOML configuration
    pub fn from_config(config: &MockConfig) -> Result<Self, TransportError> {
        let transport = Self::new().with_latency(Duration::from_millis(config.latency_ms));
        let invalid = |e: crate::error::ConfigError| TransportError::InvalidConfig(e.to_string());

        for entry in &config.responses {
            let tx_addr = parse_addr(&entry.tx_addr).map_err(invalid)?;
            let rx_addr = match &entry.rx_addr {
                Some(rx) => parse_addr(rx).map_err(invalid)?,
                None => tx_addr + DEFAULT_RX_OFFSET,
            };
            let target = ProbeTarget::new(entry.bus, tx_addr, rx_addr);
            let request = parse_hex_bytes("request", &entry.request).map_err(invalid)?;
            let response = parse_hex_bytes("response", &entry.response).map_err(invalid)?;

            let sid = request.first().copied().unwrap_or_default();
            let mut frames: Vec<Vec<u8>> = (0..entry.pending)
                .map(|_| vec![service_id::NEGATIVE_RESPONSE, sid, 0x78])
                .collect();
            frames.push(response);

            let tester_present = std_queries::tester_present_request();
            if config.answer_tester_present && !transport.is_scripted(&target, &tester_present) {
                transport.answer_tester_present(target);
            }
            transport.add_responses(target, request, frames);
        }

        Ok(transport)
    }

    /// Answer `request` sent to `target.tx_addr` with one frame on `target.rx_addr`
    pub fn add_response(&self, target: ProbeTarget, request: Vec<u8>, response: Vec<u8>) {
        self.add_responses(target, request, vec![response]);
    }

    /// Answer `request` with a sequence of frames (e.g. response pending, then final)
    pub fn add_responses(&self, target: ProbeTarget, request: Vec<u8>, responses: Vec<Vec<u8>>) {
        self.scripts.write().push(Script {
            target,
            request,
            responses,
        });
    }

    /// Make the ECU at `target` answer tester present
    pub fn answer_tester_present(&self, target: ProbeTarget) {
        self.add_response(
            target,
            std_queries::tester_present_request(),
            std_queries::tester_present_response(),
        );
    }

    /// Set connection state
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Every request sent so far, in order
    pub fn sent(&self) -> Vec<SentFrame> {
        self.sent.lock().clone()
    }

    /// Requests sent so far that match `request` exactly
    pub fn sent_count(&self, request: &[u8]) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|frame| frame.request == request)
            .count()
    }

    fn is_scripted(&self, target: &ProbeTarget, request: &[u8]) -> bool {
        self.scripts
            .read()
            .iter()
            .any(|s| s.target == *target && s.request == request)
    }

    fn find_script(&self, target: &ProbeTarget, request: &[u8]) -> Option<Script> {
        self.scripts
            .read()
            .iter()
            .find(|s| {
                s.target.bus == target.bus && s.target.tx_addr == target.tx_addr && s.request == request
            })
            .cloned()
    }
}

#[async_trait]
impl ProbeTransport for MockTransport {
    async fn send(&self, target: &ProbeTarget, request: &[u8]) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }
        if request.is_empty() {
            return Err(TransportError::SendFailed {
                target: *target,
                reason: "empty request".to_string(),
            });
        }

        self.sent.lock().push(SentFrame {
            target: *target,
            request: request.to_vec(),
        });

        match self.find_script(target, request) {
            Some(script) => {
                let key = (script.target.bus, script.target.rx_addr);
                self.queued
                    .lock()
                    .entry(key)
                    .or_default()
                    .extend(script.responses);
            }
            None => {
                tracing::debug!(%target, request = %hex::encode(request), "Mock transport: no script, staying silent");
            }
        }

        Ok(())
    }

    async fn receive(
        &self,
        target: &ProbeTarget,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency.min(timeout)).await;
            if self.latency >= timeout {
                return Ok(None);
            }
        }

        let frame = self
            .queued
            .lock()
            .get_mut(&(target.bus, target.rx_addr))
            .and_then(VecDeque::pop_front);
        Ok(frame)
    }

    async fn discard_pending(&self, target: &ProbeTarget) -> Result<usize, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        let dropped = self
            .queued
            .lock()
            .get_mut(&(target.bus, target.rx_addr))
            .map(|queue| queue.drain(..).count())
            .unwrap_or_default();
        Ok(dropped)
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
