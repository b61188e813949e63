//! Platform registry
//!
//! The registry is built exactly once from the variant table by
//! [`PlatformRegistry::register`] and is never mutated afterwards. It holds
//! no interior mutability, so it can be shared between any number of
//! readers by reference or behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::models::{BusRole, DialectName, DocEntry, ProbeId, VariantKey, VariantSpec};

/// Immutable set of all registered variants
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    /// Variants in registration order
    variants: Vec<VariantSpec>,
    index: HashMap<VariantKey, usize>,
    default_dialect: Option<DialectName>,
    /// Dialect name -> variants mapping at least one role to it
    by_dialect: BTreeMap<DialectName, BTreeSet<VariantKey>>,
}

impl PlatformRegistry {
    /// Build a registry with no platform default dialect
    pub fn register(variants: Vec<VariantSpec>) -> RegistryResult<Self> {
        Self::register_with_default(variants, None)
    }

    /// Build a registry; roles a variant leaves unmapped resolve to `default_dialect`
    pub fn register_with_default(
        variants: Vec<VariantSpec>,
        default_dialect: Option<DialectName>,
    ) -> RegistryResult<Self> {
        let mut index = HashMap::with_capacity(variants.len());
        let mut by_dialect: BTreeMap<DialectName, BTreeSet<VariantKey>> = BTreeMap::new();

        for (position, spec) in variants.iter().enumerate() {
            if index.insert(spec.key.clone(), position).is_some() {
                return Err(RegistryError::DuplicateKey(spec.key.clone()));
            }
            for dialect in spec.dialects.values() {
                by_dialect
                    .entry(dialect.clone())
                    .or_default()
                    .insert(spec.key.clone());
            }
        }

        debug!(
            variants = variants.len(),
            dialects = by_dialect.len(),
            default_dialect = ?default_dialect,
            "Platform registry built"
        );

        Ok(Self {
            variants,
            index,
            default_dialect,
            by_dialect,
        })
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn contains(&self, key: &VariantKey) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a variant by key
    pub fn get(&self, key: &VariantKey) -> RegistryResult<&VariantSpec> {
        self.index
            .get(key)
            .map(|&i| &self.variants[i])
            .ok_or_else(|| RegistryError::UnknownVariant(key.clone()))
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &VariantKey> {
        self.variants.iter().map(|spec| &spec.key)
    }

    /// Variants in registration order
    pub fn variants(&self) -> impl Iterator<Item = &VariantSpec> {
        self.variants.iter()
    }

    pub fn default_dialect(&self) -> Option<&DialectName> {
        self.default_dialect.as_ref()
    }

    /// Dialect a variant uses on a bus role
    ///
    /// Falls back to the platform default when the role is unmapped.
    pub fn dialect_for(&self, key: &VariantKey, role: BusRole) -> RegistryResult<&DialectName> {
        let spec = self.get(key)?;
        spec.dialects
            .get(&role)
            .or(self.default_dialect.as_ref())
            .ok_or_else(|| RegistryError::UnresolvedBusRole {
                variant: key.clone(),
                role,
            })
    }

    /// Every role this variant can resolve, with its dialect
    pub fn dialect_map(&self, key: &VariantKey) -> RegistryResult<BTreeMap<BusRole, DialectName>> {
        let spec = self.get(key)?;
        let mut map = spec.dialects.clone();
        if let Some(default) = &self.default_dialect {
            for role in BusRole::ALL {
                map.entry(role).or_insert_with(|| default.clone());
            }
        }
        Ok(map)
    }

    /// Variants that explicitly map at least one role to `dialect`
    pub fn variants_using_dialect(&self, dialect: &DialectName) -> BTreeSet<VariantKey> {
        self.by_dialect.get(dialect).cloned().unwrap_or_default()
    }

    /// Fail fast unless every variant resolves every role in `roles`
    pub fn require_roles(&self, roles: &[BusRole]) -> RegistryResult<()> {
        for spec in &self.variants {
            for &role in roles {
                self.dialect_for(&spec.key, role)?;
            }
        }
        Ok(())
    }

    /// Variants whose firmware database lists `signature` for `probe`
    pub fn variants_matching(&self, probe: &ProbeId, signature: &[u8]) -> BTreeSet<VariantKey> {
        self.variants
            .iter()
            .filter(|spec| spec.accepts(probe, signature))
            .map(|spec| spec.key.clone())
            .collect()
    }

    /// Documentation entries in registration order, for the docs generator
    pub fn documentation(&self) -> Vec<(&VariantKey, &DocEntry)> {
        self.variants
            .iter()
            .flat_map(|spec| spec.docs.iter().map(move |doc| (&spec.key, doc)))
            .collect()
    }
}
