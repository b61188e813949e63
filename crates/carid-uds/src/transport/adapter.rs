//! Probe transport trait and addressing

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::TransportError;

/// Where a probe request goes and where its answer is expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    /// Physical bus number
    pub bus: u8,
    /// Request address (tester -> ECU)
    pub tx_addr: u32,
    /// Response address (ECU -> tester)
    pub rx_addr: u32,
}

impl ProbeTarget {
    pub fn new(bus: u8, tx_addr: u32, rx_addr: u32) -> Self {
        Self {
            bus,
            tx_addr,
            rx_addr,
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bus {} 0x{:03X}->0x{:03X}",
            self.bus, self.tx_addr, self.rx_addr
        )
    }
}

/// Raw request/response access to the vehicle bus
///
/// Implementations only move bytes. Interpreting responses (negative
/// responses, response pending, prefixes) is left to the caller.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Send a request to `target.tx_addr` on `target.bus`
    async fn send(&self, target: &ProbeTarget, request: &[u8]) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next frame on `target.rx_addr`
    ///
    /// Returns `Ok(None)` when nothing arrives; silence is not an error.
    async fn receive(
        &self,
        target: &ProbeTarget,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, TransportError>;

    /// Drop frames already waiting on `target.rx_addr`
    ///
    /// Called before every request, so a late answer to an earlier request
    /// is never read as the answer to this one. Returns the number dropped.
    async fn discard_pending(&self, target: &ProbeTarget) -> Result<usize, TransportError>;

    /// Check if the transport is connected
    async fn is_connected(&self) -> bool;
}
