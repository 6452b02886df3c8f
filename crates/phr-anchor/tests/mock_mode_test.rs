//! Mock-mode anchoring end to end: configuration from a lookup table,
//! strategy selection, canonicalization and id generation.

use std::collections::{HashMap, HashSet};

use phr_anchor::mock::is_transaction_id;
use phr_anchor::{anchor_payload, payload_digest, AnchorConfig, Anchorer, ErrorKind, Mode};
use phr_core::Payload;

fn config_from(pairs: &[(&str, &str)]) -> AnchorConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AnchorConfig::from_lookup(|var| env.get(var).cloned()).unwrap()
}

#[tokio::test]
async fn mock_anchor_returns_distinct_well_formed_ids() {
    let payload: Payload = serde_json::from_str(r#"{"steps": 8200, "heart_rate": 72}"#).unwrap();
    let config = config_from(&[]);

    let first = anchor_payload(&config, "0xABC", &payload).await.unwrap();
    let second = anchor_payload(&config, "0xABC", &payload).await.unwrap();

    assert!(is_transaction_id(&first.transaction_id), "{}", first.transaction_id);
    assert!(is_transaction_id(&second.transaction_id), "{}", second.transaction_id);
    assert_ne!(first, second);
}

#[tokio::test]
async fn many_mock_anchors_never_collide() {
    let anchorer = Anchorer::from_config(&AnchorConfig::mock()).unwrap();
    let payload = Payload::new().with("steps", 8200);
    let mut seen = HashSet::new();
    for _ in 0..200 {
        let r = anchorer.anchor("0xABC", &payload).await.unwrap();
        assert!(seen.insert(r.transaction_id));
    }
}

#[test]
fn digest_is_independent_of_key_order() {
    let a: Payload = serde_json::from_str(r#"{"steps": 8200, "heart_rate": 72}"#).unwrap();
    let b: Payload = serde_json::from_str(r#"{"heart_rate": 72, "steps": 8200}"#).unwrap();
    let da = payload_digest(&a).unwrap();
    assert_eq!(da, payload_digest(&b).unwrap());
    assert_eq!(
        da.to_hex(),
        "e68b318d07b3dcc8e3e2b2c370b8628f4b9c61ac5b1f4b6dee28eb04f5f6ccc2"
    );
}

#[test]
fn unset_flag_selects_mock_even_with_live_credentials() {
    // Credentials alone never switch to live mode.
    let config = config_from(&[
        ("BASE_SEPOLIA_RPC_URL", "http://127.0.0.1:1"),
        ("BACKEND_PRIVATE_KEY", "not-a-key"),
    ]);
    assert_eq!(config.mode, Mode::Mock);
    let anchorer = Anchorer::from_config(&config).unwrap();
    assert_eq!(anchorer.mode(), Mode::Mock);
}

#[test]
fn unparseable_flag_selects_mock() {
    let config = config_from(&[("USE_MOCK_BLOCKCHAIN", "perhaps")]);
    assert_eq!(config.mode, Mode::Mock);
}

#[test]
fn explicit_false_selects_live_and_validates_eagerly() {
    let config = config_from(&[("USE_MOCK_BLOCKCHAIN", "false")]);
    assert_eq!(config.mode, Mode::Live);
    let err = Anchorer::from_config(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
