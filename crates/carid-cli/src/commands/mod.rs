//! Command implementations for carid

pub mod gear;
pub mod identify;
pub mod platforms;
pub mod resolve;

pub use gear::gear;
pub use identify::identify;
pub use platforms::{dialect, docs, list, show, users};
pub use resolve::resolve;

use anyhow::{Context, Result};
use carid_core::{tesla, PlatformRegistry};
use carid_uds::{CaridConfig, FingerprintProtocol};

/// Build the registry from the built-in table and the configured firmware database
///
/// Fails if the firmware database references unknown variants or probes, or
/// if a configured bus role cannot be resolved for some variant.
pub fn build_registry(config: &CaridConfig) -> Result<(FingerprintProtocol, PlatformRegistry)> {
    let protocol = FingerprintProtocol::tesla();
    let mut variants = tesla::platforms();

    config
        .apply_firmware(&mut variants, &protocol)
        .context("Invalid firmware database")?;

    let registry = tesla::registry_from(variants).context("Invalid platform table")?;
    registry
        .require_roles(&config.identify.bus_roles)
        .context("Configured bus roles cannot be resolved")?;

    Ok((protocol, registry))
}
