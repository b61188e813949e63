//! Identify command - fingerprint the attached vehicle

use anyhow::{bail, Context, Result};
use carid_core::{resolve_with, ControlParameters, ResolveOptions, VariantKey};
use carid_uds::{
    create_transport, CancelToken, CaridConfig, IdentifyError, Identifier, Observation,
    ProbeOutcome,
};
use serde::Serialize;

use super::build_registry;
use super::resolve::print_parameters;
use crate::output::{ObservationRow, OutputContext};

#[derive(Debug, Serialize)]
struct IdentifyReport<'a> {
    variant: &'a VariantKey,
    fallback_used: bool,
    observations: &'a [Observation],
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a ControlParameters>,
}

/// Run identification over the configured transport
///
/// Ctrl-C stops probing at the next probe boundary.
pub async fn identify(
    config: &CaridConfig,
    fallback: Option<&str>,
    no_resolve: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let (protocol, registry) = build_registry(config)?;
    let transport = create_transport(&config.transport)
        .await
        .context("Failed to create transport")?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let identifier = Identifier::new(protocol)
        .with_timeout(config.identify.probe_timeout())
        .with_cancel(cancel);

    ctx.info(&format!(
        "Probing {} candidate(s) with {} probe(s)",
        registry.len(),
        identifier.protocol().probes().len()
    ));
    let identification = identifier.run(transport.as_ref(), &registry).await;

    if !ctx.is_json() {
        let rows: Vec<ObservationRow> = identification.observations.iter().map(row).collect();
        ctx.print(&rows);
    }

    let fallback = fallback.map(VariantKey::from);
    let (variant, fallback_used) = select_variant(identification.result, fallback.as_ref())?;

    if fallback_used {
        ctx.warn(&format!("Probes were inconclusive, using fallback {}", variant));
    } else {
        ctx.success(&format!("Identified {}", variant));
    }

    let parameters = if no_resolve {
        None
    } else {
        let options = ResolveOptions {
            experimental_longitudinal: config.identify.experimental_longitudinal,
            ..Default::default()
        };
        Some(resolve_with(&variant, &registry, &options)?)
    };

    if ctx.is_json() {
        ctx.print_json(&IdentifyReport {
            variant: &variant,
            fallback_used,
            observations: &identification.observations,
            parameters: parameters.as_ref(),
        });
    } else if let Some(params) = &parameters {
        print_parameters(params, ctx);
    }

    Ok(())
}

/// Apply the caller's tie-break to an identification result
///
/// A fallback only settles an ambiguous outcome, and only when it is one of
/// the remaining candidates. Returns the variant and whether the fallback
/// was used; failures are reported once, by the caller.
fn select_variant(
    result: Result<VariantKey, IdentifyError>,
    fallback: Option<&VariantKey>,
) -> Result<(VariantKey, bool)> {
    let selected: Result<(VariantKey, bool), anyhow::Error> = match (result, fallback) {
        (Ok(key), _) => Ok((key, false)),
        (Err(IdentifyError::Ambiguous { candidates }), Some(fallback)) => {
            if !candidates.contains(fallback) {
                let names: Vec<String> = candidates.iter().map(ToString::to_string).collect();
                bail!(
                    "Fallback {} is not among the remaining candidates: {}",
                    fallback,
                    names.join(", ")
                );
            }
            Ok((fallback.clone(), true))
        }
        (Err(e), _) => Err(e.into()),
    };
    selected.context("Identification failed")
}

fn row(observation: &Observation) -> ObservationRow {
    let (outcome, signature) = match &observation.outcome {
        ProbeOutcome::Response(signature) => ("response", render_signature(signature)),
        ProbeOutcome::NoResponse => ("no response", "-".to_string()),
        ProbeOutcome::Skipped => ("skipped", "-".to_string()),
    };

    ObservationRow {
        probe: observation.probe.to_string(),
        outcome: outcome.to_string(),
        signature,
        remaining: observation.remaining,
    }
}

/// Firmware strings are usually printable ASCII; fall back to hex otherwise
fn render_signature(signature: &[u8]) -> String {
    match std::str::from_utf8(signature) {
        Ok(text) if !text.is_empty() && text.chars().all(|c| c.is_ascii_graphic() || c == ' ') => {
            text.to_string()
        }
        _ => hex::encode(signature),
    }
}
