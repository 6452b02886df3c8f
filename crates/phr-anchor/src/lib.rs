//! # phr-anchor — Health Record Anchoring Core
//!
//! Takes a health record, derives its content digest, and records that
//! digest in an on-chain registry, returning a transaction id.
//!
//! ```text
//! Payload ─► CanonicalBytes ─► ContentDigest ─► Anchorer
//!                                                ├─ Mock: local id, no network
//!                                                └─ Live: LedgerClient ─► TransactionBuilder
//!                                                          ─► SignerKey ─► submit
//! ```
//!
//! ## Strategies
//!
//! [`Anchorer`] is chosen once, at construction, from an [`AnchorConfig`].
//! Both variants honour the same `anchor` contract. Constructing a live
//! anchorer validates every live setting up front, so a missing endpoint or
//! key fails with [`ErrorKind::Configuration`] before any RPC is issued.
//!
//! ## Errors
//!
//! All failures are [`AnchorError`]s of four kinds. The core performs no
//! retries; see [`retry`] for an opt-in helper that re-runs whole attempts.
//! A submission whose outcome is unknown is never retryable.
//!
//! ## Security
//!
//! The signer key is parsed once from configuration and is never logged,
//! returned, or formatted into an error. RPC endpoints appear only in
//! redacted form.

pub mod address;
pub mod config;
pub mod error;
pub mod explorer;
pub mod live;
pub mod mock;
pub mod mode;
pub mod nonce;
pub mod retry;
pub mod rpc;
pub mod signer;
pub mod tx;

use phr_core::{sha256_digest, CanonicalBytes, ContentDigest, Payload};
use serde::Serialize;

pub use address::Address;
pub use config::{AnchorConfig, LiveSettings};
pub use error::{AnchorError, ConfigError, ConnectivityError, ErrorKind};
pub use explorer::explorer_tx_url;
pub use live::LiveAnchorer;
pub use mock::MockAnchorer;
pub use mode::Mode;
pub use retry::{retry_connectivity, RetryPolicy};
pub use rpc::LedgerClient;
pub use signer::{SignedTransaction, SignerKey};
pub use tx::{TransactionBuilder, UnsignedTransaction};

/// The sole artifact of an anchor call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorResult {
    /// `0x` + 64 lowercase hex digits.
    pub transaction_id: String,
}

/// Canonicalize and hash a payload.
pub fn payload_digest(payload: &Payload) -> Result<ContentDigest, AnchorError> {
    let canonical = CanonicalBytes::new(payload)?;
    Ok(sha256_digest(&canonical))
}

/// Mock or live anchoring, fixed at construction.
///
/// Construct once per process: the live variant holds the parsed signer key
/// and a pooled HTTP client, and serves any number of `anchor` calls.
#[derive(Debug)]
pub enum Anchorer {
    Mock(MockAnchorer),
    Live(Box<LiveAnchorer>),
}

impl Anchorer {
    /// Select and build the strategy for `config.mode`.
    ///
    /// # Errors
    ///
    /// In live mode, any `ConfigError` from
    /// [`AnchorConfig::live_settings()`]. No network calls are made.
    pub fn from_config(config: &AnchorConfig) -> Result<Self, AnchorError> {
        match config.mode {
            Mode::Mock => Ok(Self::Mock(MockAnchorer::new())),
            Mode::Live => {
                let settings = config.live_settings()?;
                Ok(Self::Live(Box::new(LiveAnchorer::new(settings)?)))
            }
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Mock(_) => Mode::Mock,
            Self::Live(_) => Mode::Live,
        }
    }

    /// Anchor `payload` on behalf of `identity`.
    pub async fn anchor(&self, identity: &str, payload: &Payload) -> Result<AnchorResult, AnchorError> {
        let digest = payload_digest(payload)?;
        self.anchor_digest(identity, &digest).await
    }

    /// Anchor an already computed digest.
    pub async fn anchor_digest(
        &self,
        identity: &str,
        digest: &ContentDigest,
    ) -> Result<AnchorResult, AnchorError> {
        let transaction_id = match self {
            Self::Mock(mock) => mock.anchor(identity, digest)?,
            Self::Live(live) => live.anchor(identity, digest).await?,
        };
        Ok(AnchorResult { transaction_id })
    }
}

/// One-shot anchor: select the strategy from `config` and anchor.
///
/// The payload is canonicalized first, so a malformed record fails with
/// `Serialization` even when configuration is also incomplete.
///
/// Every call builds a fresh [`Anchorer`], which re-parses the signer key
/// and opens a new connection pool. Long-running hosts build one
/// `Anchorer` at startup with [`Anchorer::from_config`] and share it.
pub async fn anchor_payload(
    config: &AnchorConfig,
    identity: &str,
    payload: &Payload,
) -> Result<AnchorResult, AnchorError> {
    let digest = payload_digest(payload)?;
    let anchorer = Anchorer::from_config(config)?;
    anchorer.anchor_digest(identity, &digest).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals() -> Payload {
        Payload::new().with("steps", 8200).with("heart_rate", 72)
    }

    #[tokio::test]
    async fn default_config_anchors_in_mock_mode() {
        let anchorer = Anchorer::from_config(&AnchorConfig::default()).unwrap();
        assert_eq!(anchorer.mode(), Mode::Mock);
        let result = anchorer.anchor("0xABC", &vitals()).await.unwrap();
        assert!(mock::is_transaction_id(&result.transaction_id));
    }

    #[tokio::test]
    async fn live_mode_without_key_fails_before_network() {
        let mut config = AnchorConfig::live(
            "http://127.0.0.1:1",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "unused",
        );
        config.signer_key = None;
        let err = anchor_payload(&config, "0xABC", &vitals()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.kind().http_status(), 400);
    }

    #[test]
    fn live_anchorer_holds_parsed_key_after_config_is_gone() {
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let config = AnchorConfig::live(
            "http://127.0.0.1:8545",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            key,
        );
        let anchorer = Anchorer::from_config(&config).unwrap();
        drop(config);
        assert_eq!(anchorer.mode(), Mode::Live);
        assert!(!format!("{anchorer:?}").contains(&key[2..]));
    }

    #[tokio::test]
    async fn non_finite_payload_is_serialization_error() {
        let payload = vitals().with("temp", f64::NAN);
        let err = anchor_payload(&AnchorConfig::mock(), "0xABC", &payload)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn payload_digest_ignores_key_order() {
        let reordered = Payload::new().with("heart_rate", 72).with("steps", 8200);
        assert_eq!(payload_digest(&vitals()).unwrap(), payload_digest(&reordered).unwrap());
    }

    #[test]
    fn anchor_result_serializes() {
        let r = AnchorResult {
            transaction_id: "0xabc".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"transaction_id":"0xabc"}"#
        );
    }
}
