//! # Live Anchoring
//!
//! Connect → lock signer → nonce → gas price → build → sign → submit.
//!
//! Nonce acquisition happens before signing, which happens before
//! submission, all under the signer's lock. The call returns as soon as the
//! node accepts the transaction; receipts are not polled.
//!
//! Once the envelope has been sent, any failure other than an explicit
//! rejection is reported as [`ConnectivityError::Unconfirmed`], which
//! callers must not retry.

use std::time::Duration;

use phr_core::ContentDigest;
use url::Url;

use crate::config::LiveSettings;
use crate::error::{redact_endpoint, AnchorError, ConnectivityError};
use crate::nonce::lock_signer;
use crate::rpc::{build_http_client, LedgerClient};
use crate::signer::SignerKey;
use crate::tx::TransactionBuilder;

/// Live strategy: signs and submits anchor transactions.
///
/// Holds one pooled HTTP client for its lifetime. Chain state (nonce, gas
/// price) is queried fresh for every anchor.
#[derive(Debug)]
pub struct LiveAnchorer {
    http: reqwest::Client,
    rpc_url: Url,
    endpoint: String,
    builder: TransactionBuilder,
    signer: SignerKey,
    chain_id: u64,
}

impl LiveAnchorer {
    /// Build from validated settings. Makes no network calls.
    pub fn new(settings: LiveSettings) -> Result<Self, AnchorError> {
        let http = build_http_client(settings.rpc_timeout)?;
        Ok(Self {
            http,
            endpoint: redact_endpoint(&settings.rpc_url),
            rpc_url: settings.rpc_url,
            builder: settings.builder,
            signer: settings.signer,
            chain_id: settings.chain_id,
        })
    }

    /// Shorthand for tests and tools that already hold parsed parts.
    pub fn with_parts(
        rpc_url: Url,
        builder: TransactionBuilder,
        signer: SignerKey,
        chain_id: u64,
        rpc_timeout: Duration,
    ) -> Result<Self, AnchorError> {
        Self::new(LiveSettings {
            rpc_url,
            builder,
            signer,
            chain_id,
            rpc_timeout,
        })
    }

    /// Redacted endpoint, safe to log.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Anchor `digest` on chain and return the transaction id.
    ///
    /// `identity` is recorded in logs only; the on-chain caller is always
    /// the backend wallet.
    pub async fn anchor(&self, identity: &str, digest: &ContentDigest) -> Result<String, AnchorError> {
        let ledger =
            LedgerClient::connect_with(self.http.clone(), self.rpc_url.clone(), self.chain_id)
                .await?;

        let signer_address = self.signer.address();
        let _slot = lock_signer(signer_address).await;

        let nonce = ledger.current_nonce(&signer_address).await?;
        let gas_price = ledger.current_gas_price().await?;
        tracing::debug!(
            nonce,
            gas_price = %gas_price,
            chain_id = ledger.chain_id(),
            "queried chain parameters"
        );

        let unsigned = self.builder.build(digest, nonce, gas_price);
        let signed = self.signer.sign(&unsigned)?;
        let expected_id = signed.transaction_id();

        let tx_id = ledger
            .submit(&signed)
            .await
            .map_err(|e| unconfirmed_unless_rejected(e, &expected_id))?;
        if tx_id != expected_id {
            tracing::warn!(
                endpoint = %self.endpoint,
                nonce,
                expected = %expected_id,
                returned = %tx_id,
                "node accepted transaction under an unexpected hash"
            );
            return Err(ConnectivityError::Unconfirmed {
                tx_id: expected_id,
                reason: format!("node returned hash {tx_id}"),
            }
            .into());
        }

        tracing::info!(
            mode = "live",
            identity,
            digest = %digest,
            endpoint = %self.endpoint,
            nonce,
            tx_id = %tx_id,
            "anchored payload digest"
        );
        Ok(tx_id)
    }
}

/// Classify a failed `eth_sendRawTransaction`.
///
/// A JSON-RPC rejection, an HTTP error status or a refused connection means
/// the node did not take the envelope. Anything else (timeout, dropped
/// reply, garbled body) leaves that open.
fn unconfirmed_unless_rejected(err: ConnectivityError, expected_id: &str) -> ConnectivityError {
    let rejected = match &err {
        ConnectivityError::Rpc { .. } | ConnectivityError::HttpStatus { .. } => true,
        ConnectivityError::Transport { source, .. } => source.is_connect(),
        _ => false,
    };
    if rejected {
        return err;
    }
    ConnectivityError::Unconfirmed {
        tx_id: expected_id.to_string(),
        reason: err.to_string(),
    }
}
