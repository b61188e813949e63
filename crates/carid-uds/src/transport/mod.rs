//! Transport layer for ECU probing
//!
//! The identification logic talks to the bus only through
//! [`ProbeTransport`]. A scripted [`MockTransport`] ships with the crate;
//! real bus adapters live with the application that owns the hardware.
//!
//! # Example
//!
//! ```ignore
//! use carid_uds::transport::{create_transport, ProbeTarget, ProbeTransport};
//! use carid_uds::config::TransportConfig;
//!
//! let transport = create_transport(&TransportConfig::default()).await?;
//! let target = ProbeTarget::new(0, 0x730, 0x738);
//! transport.send(&target, &[0x3E, 0x00]).await?;
//! let response = transport.receive(&target, Duration::from_millis(100)).await?;
//! ```

mod adapter;
pub mod error;
pub mod mock;

pub use adapter::{ProbeTarget, ProbeTransport};
pub use error::TransportError;
pub use mock::MockTransport;

use std::sync::Arc;

use crate::config::TransportConfig;

/// Create a probe transport based on configuration
pub async fn create_transport(
    config: &TransportConfig,
) -> Result<Arc<dyn ProbeTransport>, TransportError> {
    match config {
        TransportConfig::Mock(cfg) => {
            let transport = MockTransport::from_config(cfg)?;
            Ok(Arc::new(transport))
        }
    }
}
