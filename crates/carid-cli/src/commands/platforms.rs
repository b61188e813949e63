//! Platform commands - inspect the variant table

use anyhow::{bail, Result};
use carid_core::{BusRole, DialectName, LegacyHardware, VariantKey, VariantSpec};
use carid_uds::CaridConfig;

use super::build_registry;
use crate::output::{DialectRow, DocRow, OutputContext, VariantRow};

/// List all registered variants
pub fn list(config: &CaridConfig, ctx: &OutputContext) -> Result<()> {
    let (_, registry) = build_registry(config)?;

    let rows: Vec<VariantRow> = registry
        .variants()
        .map(|spec| VariantRow {
            key: spec.key.to_string(),
            addressing: addressing(spec),
            mass: spec.physical.mass,
            wheelbase: spec.physical.wheelbase,
            steer_ratio: spec.physical.steer_ratio,
            firmware: spec.firmware.values().map(Vec::len).sum(),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// Show one variant in detail
pub fn show(config: &CaridConfig, variant: &str, ctx: &OutputContext) -> Result<()> {
    let (_, registry) = build_registry(config)?;
    let spec = registry.get(&VariantKey::from(variant))?;

    let dialects = spec
        .dialects
        .iter()
        .map(|(role, dialect)| format!("{}={}", role, dialect))
        .collect::<Vec<_>>();
    let default = registry
        .default_dialect()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let firmware = spec
        .firmware
        .iter()
        .map(|(probe, versions)| {
            let versions: Vec<String> = versions
                .iter()
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .collect();
            format!("{}: {}", probe, versions.join(" "))
        })
        .collect::<Vec<_>>();
    let docs = spec.docs.iter().map(|d| d.name.as_str()).collect::<Vec<_>>();

    let pairs = vec![
        ("Key", spec.key.to_string()),
        ("Addressing", addressing(spec)),
        ("Mass (kg)", spec.physical.mass.to_string()),
        ("Wheelbase (m)", spec.physical.wheelbase.to_string()),
        ("Steer ratio", spec.physical.steer_ratio.to_string()),
        ("Dialects", or_dash(dialects.join(", "))),
        ("Default dialect", default),
        ("Firmware", or_dash(firmware.join("; "))),
        ("Docs", or_dash(docs.join("; "))),
    ];

    ctx.print_kv(&pairs, spec);
    Ok(())
}

/// Show the dialect for one role, or the full map
pub fn dialect(
    config: &CaridConfig,
    variant: &str,
    role: Option<BusRole>,
    ctx: &OutputContext,
) -> Result<()> {
    let (_, registry) = build_registry(config)?;
    let key = VariantKey::from(variant);

    let rows: Vec<DialectRow> = match role {
        Some(role) => vec![DialectRow {
            role: role.to_string(),
            dialect: registry.dialect_for(&key, role)?.to_string(),
        }],
        None => registry
            .dialect_map(&key)?
            .into_iter()
            .map(|(role, dialect)| DialectRow {
                role: role.to_string(),
                dialect: dialect.to_string(),
            })
            .collect(),
    };

    ctx.print(&rows);
    Ok(())
}

/// List variants that map a dialect explicitly
pub fn users(config: &CaridConfig, dialect: &str, ctx: &OutputContext) -> Result<()> {
    let (_, registry) = build_registry(config)?;
    let users = registry.variants_using_dialect(&DialectName::from(dialect));

    if users.is_empty() {
        if registry.default_dialect().map(DialectName::as_str) == Some(dialect) {
            ctx.info(&format!("{} is only used as the platform default", dialect));
            return Ok(());
        }
        bail!("No variant uses dialect '{}'", dialect);
    }

    let keys: Vec<String> = users.iter().map(ToString::to_string).collect();
    if ctx.is_json() {
        ctx.print_json(&keys);
    } else {
        for key in keys {
            println!("{}", key);
        }
    }
    Ok(())
}

/// Print the documentation table
pub fn docs(config: &CaridConfig, ctx: &OutputContext) -> Result<()> {
    let (_, registry) = build_registry(config)?;

    let rows: Vec<DocRow> = registry
        .documentation()
        .into_iter()
        .map(|(key, doc)| DocRow {
            variant: key.to_string(),
            name: doc.name.clone(),
            package: doc.package.clone(),
            harness: doc
                .harness
                .map(|h| h.to_string())
                .unwrap_or_else(|| "-".to_string()),
            notes: or_dash(
                doc.footnotes
                    .iter()
                    .map(|f| f.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

fn addressing(spec: &VariantSpec) -> String {
    let generation = match spec.legacy {
        None => return "standard".to_string(),
        Some(LegacyHardware::PreAp) => "pre-AP",
        Some(LegacyHardware::Hw1) => "HW1",
        Some(LegacyHardware::Hw2) => "HW2",
        Some(LegacyHardware::Hw3) => "HW3",
    };
    format!("legacy ({})", generation)
}

fn or_dash(s: String) -> String {
    if s.is_empty() {
        "-".to_string()
    } else {
        s
    }
}
