//! Registry error types

use thiserror::Error;

use crate::models::{BusRole, VariantKey};

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while building or querying the platform registry
///
/// These indicate bad variant data or a caller bug. Startup code is
/// expected to abort on them rather than recover.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two variant specs share the same key
    #[error("Duplicate variant key: {0}")]
    DuplicateKey(VariantKey),

    /// Key is not registered
    #[error("Unknown variant: {0}")]
    UnknownVariant(VariantKey),

    /// Role has no explicit mapping and no platform default exists
    #[error("Variant {variant} has no dialect for bus role '{role}' and no platform default is set")]
    UnresolvedBusRole { variant: VariantKey, role: BusRole },
}
