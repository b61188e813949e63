//! carid-core - Platform registry and control parameter resolution
//!
//! This crate holds the static half of vehicle identification: the
//! per-variant data table, the registry built from it once at startup,
//! and the resolver that turns a confirmed variant into control limits.
//!
//! Probing ECUs to find out *which* variant is attached lives in
//! `carid-uds`; this crate performs no I/O.

pub mod error;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod tesla;

pub use error::{RegistryError, RegistryResult};
pub use models::*;
pub use registry::PlatformRegistry;
pub use resolver::{resolve, resolve_with, ResolveOptions};
