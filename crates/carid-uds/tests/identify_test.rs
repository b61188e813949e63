//! End-to-end identification tests against the mock transport

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use carid_core::tesla;
use carid_core::{PhysicalParams, PlatformRegistry, ProbeId, VariantKey, VariantSpec};
use carid_uds::transport::mock::SentFrame;
use carid_uds::{
    create_transport, CaridConfig, CancelToken, FingerprintProtocol, IdentifyError, Identifier,
    MockTransport, ProbeOutcome, ProbeTarget, ProbeTransport, TransportError,
};
use pretty_assertions::assert_eq;

const EPS: ProbeTarget = ProbeTarget {
    bus: 0,
    tx_addr: 0x730,
    rx_addr: 0x738,
};

const SUPPLIER_SW: &[u8] = &[0x22, 0xF1, 0x95];
const KWP_SW: &[u8] = &[0x1A, 0x87];

fn key(k: &str) -> VariantKey {
    VariantKey::from(k)
}

fn keys(ks: &[&str]) -> BTreeSet<VariantKey> {
    ks.iter().map(|k| key(k)).collect()
}

fn variant(k: &str) -> VariantSpec {
    VariantSpec::new(k, PhysicalParams::new(1900.0, 2.9, 12.0))
}

fn identifier() -> Identifier {
    Identifier::new(FingerprintProtocol::tesla()).with_timeout(Duration::from_millis(20))
}

/// Two variants that differ only in the EPS supplier software version
fn twin_registry() -> PlatformRegistry {
    PlatformRegistry::register(vec![
        variant("CAR_ONE").with_firmware("eps_supplier_sw", [b"E1".to_vec()]),
        variant("CAR_TWO").with_firmware("eps_supplier_sw", [b"E2".to_vec()]),
    ])
    .unwrap()
}

/// Mock EPS answering tester present and the supplier software version
fn eps_answering(version: &[u8]) -> MockTransport {
    let mock = MockTransport::new();
    mock.answer_tester_present(EPS);
    let mut response = vec![0x62, 0xF1, 0x95];
    response.extend_from_slice(version);
    mock.add_response(EPS, SUPPLIER_SW.to_vec(), response);
    mock
}

/// Tesla table with a small firmware database merged in
fn tesla_registry() -> PlatformRegistry {
    let mut variants = tesla::platforms();
    for spec in &mut variants {
        match spec.key.as_str() {
            tesla::MODEL_3 => spec.add_firmware(ProbeId::from("eps_supplier_sw"), b"M3EPS".to_vec()),
            tesla::MODEL_Y => spec.add_firmware(ProbeId::from("eps_supplier_sw"), b"MYEPS".to_vec()),
            tesla::MODEL_S_HW2 => spec.add_firmware(ProbeId::from("eps_kwp_sw"), b"HW2EPS".to_vec()),
            tesla::MODEL_S_HW3 => spec.add_firmware(ProbeId::from("eps_kwp_sw"), b"HW3EPS".to_vec()),
            _ => {}
        }
    }
    tesla::registry_from(variants).unwrap()
}

#[tokio::test]
async fn test_unique_signature_identifies_variant() {
    let registry = twin_registry();
    let mock = eps_answering(b"E1");

    let result = identifier().identify(&mock, &registry).await;

    assert_eq!(result, Ok(key("CAR_ONE")));
}

#[tokio::test]
async fn test_probing_stops_once_settled() {
    let registry = twin_registry();
    let mock = eps_answering(b"E2");

    let identification = identifier().run(&mock, &registry).await;

    assert_eq!(identification.result, Ok(key("CAR_TWO")));
    assert_eq!(identification.observations.len(), 1);
    assert_eq!(
        mock.sent(),
        vec![
            SentFrame {
                target: EPS,
                request: vec![0x3E, 0x00],
            },
            SentFrame {
                target: EPS,
                request: SUPPLIER_SW.to_vec(),
            },
        ]
    );
}

#[tokio::test]
async fn test_silence_everywhere_is_ambiguous() {
    let registry = twin_registry();
    let mock = MockTransport::new();

    let identification = identifier().run(&mock, &registry).await;

    assert_eq!(
        identification.result,
        Err(IdentifyError::Ambiguous {
            candidates: keys(&["CAR_ONE", "CAR_TWO"]),
        })
    );
    assert!(identification
        .observations
        .iter()
        .all(|o| !matches!(o.outcome, ProbeOutcome::Response(_)) && o.remaining == 2));
}

#[tokio::test]
async fn test_single_variant_needs_no_probing() {
    let registry = PlatformRegistry::register(vec![variant("ONLY")]).unwrap();
    let mock = MockTransport::new();

    let result = identifier().identify(&mock, &registry).await;

    assert_eq!(result, Ok(key("ONLY")));
    assert!(mock.sent().is_empty());
}

#[tokio::test]
async fn test_empty_registry() {
    let registry = PlatformRegistry::register(Vec::new()).unwrap();

    let result = identifier().identify(&MockTransport::new(), &registry).await;

    assert_eq!(result, Err(IdentifyError::NoCandidates));
}

#[tokio::test]
async fn test_unknown_signature_is_no_match() {
    let registry = twin_registry();
    let mock = eps_answering(b"E9");

    let result = identifier().identify(&mock, &registry).await;

    assert_eq!(
        result,
        Err(IdentifyError::NoMatch {
            probe: ProbeId::from("eps_supplier_sw"),
            signature: b"E9".to_vec(),
            candidates: keys(&["CAR_ONE", "CAR_TWO"]),
        })
    );
}

#[tokio::test]
async fn test_identification_is_deterministic_and_repeatable() {
    let registry = twin_registry();
    let identifier = identifier();

    let first = identifier.run(&eps_answering(b"E1"), &registry).await;
    let second = identifier.run(&eps_answering(b"E1"), &registry).await;
    assert_eq!(first.result, second.result);
    assert_eq!(first.observations, second.observations);

    // Same transport, second attempt: nothing carries over between attempts
    let mock = eps_answering(b"E1");
    let a = identifier.identify(&mock, &registry).await;
    let b = identifier.identify(&mock, &registry).await;
    assert_eq!(a, Ok(key("CAR_ONE")));
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_answer_on_wrong_offset_is_not_heard() {
    let registry = twin_registry();
    let mock = MockTransport::new();
    let wrong_rx = ProbeTarget {
        rx_addr: 0x731,
        ..EPS
    };
    mock.answer_tester_present(wrong_rx);
    mock.add_response(wrong_rx, SUPPLIER_SW.to_vec(), b"\x62\xF1\x95E1".to_vec());

    let result = identifier().identify(&mock, &registry).await;

    assert!(matches!(result, Err(IdentifyError::Ambiguous { .. })));
}

#[tokio::test]
async fn test_response_pending_is_waited_out() {
    let registry = twin_registry();
    let mock = MockTransport::new();
    mock.answer_tester_present(EPS);
    mock.add_responses(
        EPS,
        SUPPLIER_SW.to_vec(),
        vec![
            vec![0x7F, 0x22, 0x78],
            vec![0x7F, 0x22, 0x78],
            b"\x62\xF1\x95E2".to_vec(),
        ],
    );

    let result = identifier().identify(&mock, &registry).await;

    assert_eq!(result, Ok(key("CAR_TWO")));
}

#[tokio::test]
async fn test_late_answer_is_not_taken_for_next_request() {
    let registry = PlatformRegistry::register(vec![
        variant("ONE").with_firmware("eps_uds_version", [b"V1".to_vec()]),
        variant("TWO").with_firmware("eps_uds_version", [b"V2".to_vec()]),
    ])
    .unwrap();
    // Every frame takes 15 ms; the supplier version only arrives after the
    // 50 ms step deadline and is still queued when the UDS version is asked.
    let mock = MockTransport::new().with_latency(Duration::from_millis(15));
    mock.answer_tester_present(EPS);
    mock.add_responses(
        EPS,
        SUPPLIER_SW.to_vec(),
        vec![
            vec![0x7F, 0x22, 0x78],
            vec![0x7F, 0x22, 0x78],
            vec![0x7F, 0x22, 0x78],
            b"\x62\xF1\x95E1".to_vec(),
        ],
    );
    mock.add_response(EPS, vec![0x22, 0xFF, 0x00], b"\x62\xFF\x00V1".to_vec());

    let identification = Identifier::new(FingerprintProtocol::tesla())
        .with_timeout(Duration::from_millis(50))
        .run(&mock, &registry)
        .await;

    assert_eq!(identification.result, Ok(key("ONE")));
    let outcome = |id: &str| {
        identification
            .observations
            .iter()
            .find(|o| o.probe == ProbeId::from(id))
            .map(|o| o.outcome.clone())
    };
    assert_eq!(outcome("eps_supplier_sw"), Some(ProbeOutcome::NoResponse));
    assert_eq!(
        outcome("eps_uds_version"),
        Some(ProbeOutcome::Response(b"V1".to_vec()))
    );
}

#[tokio::test]
async fn test_frame_for_another_request_is_skipped() {
    let registry = twin_registry();
    let mock = MockTransport::new();
    mock.answer_tester_present(EPS);
    mock.add_responses(
        EPS,
        SUPPLIER_SW.to_vec(),
        vec![
            vec![0x7F, 0x3E, 0x12],
            b"\x62\xF1\x88XX".to_vec(),
            b"\x62\xF1\x95E1".to_vec(),
        ],
    );

    let result = identifier().identify(&mock, &registry).await;

    assert_eq!(result, Ok(key("CAR_ONE")));
}

#[tokio::test]
async fn test_negative_response_counts_as_silence() {
    let registry = twin_registry();
    let mock = MockTransport::new();
    mock.answer_tester_present(EPS);
    mock.add_response(EPS, SUPPLIER_SW.to_vec(), vec![0x7F, 0x22, 0x31]);

    let identification = identifier().run(&mock, &registry).await;

    assert!(matches!(
        identification.result,
        Err(IdentifyError::Ambiguous { .. })
    ));
    assert_eq!(identification.observations[0].outcome, ProbeOutcome::NoResponse);
}

#[tokio::test]
async fn test_legacy_variant_found_by_legacy_probe() {
    let registry = tesla_registry();
    let mock = MockTransport::new();
    mock.add_response(EPS, KWP_SW.to_vec(), b"\x5A\x87HW3EPS".to_vec());

    let identification = identifier().run(&mock, &registry).await;

    assert_eq!(identification.result, Ok(key(tesla::MODEL_S_HW3)));
    // Every standard probe went unanswered and eliminated nothing
    assert!(identification.observations[..6]
        .iter()
        .all(|o| o.outcome == ProbeOutcome::NoResponse && o.remaining == registry.len()));
}

#[tokio::test]
async fn test_standard_answer_rules_out_legacy() {
    let registry = tesla_registry();
    let mock = MockTransport::new();
    mock.answer_tester_present(EPS);
    mock.add_response(EPS, SUPPLIER_SW.to_vec(), b"\x62\xF1\x95M3EPS".to_vec());
    mock.add_response(EPS, KWP_SW.to_vec(), b"\x5A\x87HW3EPS".to_vec());

    let result = identifier().identify(&mock, &registry).await;

    assert_eq!(result, Ok(key(tesla::MODEL_3)));
    assert_eq!(mock.sent_count(KWP_SW), 0);
}

#[tokio::test]
async fn test_legacy_probe_skipped_without_legacy_candidates() {
    let registry = PlatformRegistry::register(vec![
        variant("A").with_firmware("eps_supplier_sw", [b"E1".to_vec()]),
        variant("B").with_firmware("eps_supplier_sw", [b"E1".to_vec()]),
        variant("L")
            .with_legacy(carid_core::LegacyHardware::Hw1)
            .with_firmware("eps_kwp_sw", [b"L".to_vec()]),
    ])
    .unwrap();
    let mock = eps_answering(b"E1");
    mock.add_response(EPS, KWP_SW.to_vec(), b"\x5A\x87L".to_vec());

    let identification = identifier().run(&mock, &registry).await;

    assert_eq!(
        identification.result,
        Err(IdentifyError::Ambiguous {
            candidates: keys(&["A", "B"]),
        })
    );
    assert_eq!(mock.sent_count(KWP_SW), 0);
    assert_eq!(
        identification.observations.last().map(|o| o.outcome.clone()),
        Some(ProbeOutcome::Skipped)
    );
}

#[tokio::test]
async fn test_cancelled_before_start_sends_nothing() {
    let registry = twin_registry();
    let mock = eps_answering(b"E1");
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = identifier()
        .with_cancel(cancel)
        .identify(&mock, &registry)
        .await;

    assert_eq!(
        result,
        Err(IdentifyError::Cancelled {
            candidates: keys(&["CAR_ONE", "CAR_TWO"]),
        })
    );
    assert!(mock.sent().is_empty());
}

/// Cancels the attempt as soon as the first request goes out
struct CancelOnSend {
    inner: MockTransport,
    cancel: CancelToken,
}

#[async_trait]
impl ProbeTransport for CancelOnSend {
    async fn send(&self, target: &ProbeTarget, request: &[u8]) -> Result<(), TransportError> {
        self.cancel.cancel();
        self.inner.send(target, request).await
    }

    async fn receive(
        &self,
        target: &ProbeTarget,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        self.inner.receive(target, timeout).await
    }

    async fn discard_pending(&self, target: &ProbeTarget) -> Result<usize, TransportError> {
        self.inner.discard_pending(target).await
    }

    async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }
}

#[tokio::test]
async fn test_cancellation_takes_effect_at_probe_boundary() {
    let registry = twin_registry();
    let cancel = CancelToken::new();
    let transport = CancelOnSend {
        inner: MockTransport::new(),
        cancel: cancel.clone(),
    };
    transport.inner.answer_tester_present(EPS);

    let result = identifier()
        .with_cancel(cancel)
        .identify(&transport, &registry)
        .await;

    assert!(matches!(result, Err(IdentifyError::Cancelled { .. })));
    // The first probe ran to completion, nothing after it was sent
    assert_eq!(transport.inner.sent().len(), 2);
}

#[tokio::test]
async fn test_transport_failure_keeps_candidates() {
    let registry = twin_registry();
    let mock = eps_answering(b"E1");
    mock.set_connected(false);

    let result = identifier().identify(&mock, &registry).await;

    assert_eq!(
        result,
        Err(IdentifyError::Transport {
            message: TransportError::ConnectionClosed.to_string(),
            candidates: keys(&["CAR_ONE", "CAR_TWO"]),
        })
    );
}

#[tokio::test]
async fn test_slow_transport_is_bounded_by_probe_timeout() {
    let registry = twin_registry();
    let mock = eps_answering(b"E1").with_latency(Duration::from_millis(500));

    let start = Instant::now();
    let result = identifier().identify(&mock, &registry).await;

    assert!(matches!(result, Err(IdentifyError::Ambiguous { .. })));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_independent_attempts_run_concurrently() {
    let registry = Arc::new(twin_registry());
    let identifier = identifier();

    let handles: Vec<_> = [b"E1", b"E2"]
        .into_iter()
        .map(|version| {
            let registry = Arc::clone(&registry);
            let identifier = identifier.clone();
            let mock = eps_answering(version);
            tokio::spawn(async move { identifier.identify(&mock, &registry).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results, vec![Ok(key("CAR_ONE")), Ok(key("CAR_TWO"))]);
}

#[tokio::test]
async fn test_identify_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[identify]
probe_timeout_ms = 20

[transport]
type = "mock"

[[transport.responses]]
tx_addr = "0x606"
request = "22F188"
response = "62F188 4D594456"
pending = 1

[[firmware]]
variant = "TESLA_MODEL_3"
probe = "engine_manufacturer_sw"
versions = ["M3DV"]

[[firmware]]
variant = "TESLA_MODEL_Y"
probe = "engine_manufacturer_sw"
versions = ["MYDV"]
"#
    )
    .unwrap();

    let config = CaridConfig::load(file.path()).unwrap();
    let protocol = FingerprintProtocol::tesla();
    let mut variants = tesla::platforms();
    config.apply_firmware(&mut variants, &protocol).unwrap();
    let registry = tesla::registry_from(variants).unwrap();
    let transport = create_transport(&config.transport).await.unwrap();

    let result = Identifier::new(protocol)
        .with_timeout(config.identify.probe_timeout())
        .identify(transport.as_ref(), &registry)
        .await;

    assert_eq!(result, Ok(key(tesla::MODEL_Y)));
}

#[tokio::test]
async fn test_sample_config_identifies_model_3() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/carid.toml");
    let config = CaridConfig::load(&path).unwrap();

    let protocol = FingerprintProtocol::tesla();
    let mut variants = tesla::platforms();
    config.apply_firmware(&mut variants, &protocol).unwrap();
    let registry = tesla::registry_from(variants).unwrap();
    registry.require_roles(&config.identify.bus_roles).unwrap();
    let transport = create_transport(&config.transport).await.unwrap();

    let result = Identifier::new(protocol)
        .with_timeout(config.identify.probe_timeout())
        .identify(transport.as_ref(), &registry)
        .await;

    assert_eq!(result, Ok(key(tesla::MODEL_3)));
}
