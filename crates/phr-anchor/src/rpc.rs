//! # Ledger JSON-RPC Client
//!
//! `LedgerClient` owns the HTTP connection to an EVM JSON-RPC endpoint and
//! exposes the handful of calls an anchor needs:
//!
//! | Call | RPC method |
//! |------|-----------|
//! | handshake | `eth_chainId` |
//! | [`LedgerClient::current_nonce()`] | `eth_getTransactionCount(addr, "pending")` |
//! | [`LedgerClient::current_gas_price()`] | `eth_gasPrice` |
//! | [`LedgerClient::submit()`] | `eth_sendRawTransaction` |
//!
//! Each call is a point-in-time read or a single send. Nothing is retried
//! here; every failure is returned as a typed [`ConnectivityError`] and the
//! caller decides. Every request is bounded by the configured timeout.
//!
//! The endpoint is only ever logged or reported in redacted form.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::address::Address;
use crate::config::{parse_rpc_url, RPC_URL_VAR};
use crate::error::{redact_endpoint, AnchorError, ConfigError, ConnectivityError};
use crate::signer::SignedTransaction;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Build the pooled HTTP client shared by every call of one anchorer.
///
/// # Errors
///
/// `AnchorError::Fatal` if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, AnchorError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AnchorError::Fatal(format!("failed to build HTTP client: {}", e.without_url())))
}

/// A connection to the ledger, verified by a chain-id handshake.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    url: Url,
    endpoint: String,
    chain_id: u64,
}

impl LedgerClient {
    /// Connect to `rpc_url` and confirm it serves `expected_chain_id`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingSetting` if the endpoint is empty.
    /// - `ConfigError::InvalidUrl` if it does not parse.
    /// - `ConnectivityError` if the endpoint is unreachable or the
    ///   handshake fails.
    /// - `ConfigError::ChainMismatch` if it serves a different chain.
    pub async fn connect(
        rpc_url: &str,
        expected_chain_id: u64,
        timeout: Duration,
    ) -> Result<Self, AnchorError> {
        if rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingSetting { var: RPC_URL_VAR }.into());
        }
        let url = parse_rpc_url(rpc_url)?;
        let http = build_http_client(timeout)?;
        Self::connect_with(http, url, expected_chain_id).await
    }

    /// Handshake over an existing pooled client.
    pub async fn connect_with(
        http: reqwest::Client,
        url: Url,
        expected_chain_id: u64,
    ) -> Result<Self, AnchorError> {
        let endpoint = redact_endpoint(&url);
        let mut client = Self {
            http,
            url,
            endpoint,
            chain_id: expected_chain_id,
        };

        let result = client.call("eth_chainId", serde_json::json!([])).await?;
        let actual = parse_quantity("eth_chainId", &result)?;
        let actual = u64::try_from(actual).map_err(|_| ConnectivityError::InvalidResponse {
            method: "eth_chainId".to_string(),
            reason: "chain id does not fit in 64 bits".to_string(),
        })?;
        if actual != expected_chain_id {
            return Err(ConfigError::ChainMismatch {
                endpoint: client.endpoint.clone(),
                expected: expected_chain_id,
                actual,
            }
            .into());
        }
        client.chain_id = actual;

        tracing::debug!(endpoint = %client.endpoint, chain_id = actual, "connected to ledger");
        Ok(client)
    }

    /// Chain id confirmed by the handshake.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Redacted endpoint, safe to log.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Next nonce for `address`, counting transactions still in the pool.
    pub async fn current_nonce(&self, address: &Address) -> Result<u64, ConnectivityError> {
        let method = "eth_getTransactionCount";
        let result = self
            .call(method, serde_json::json!([address.to_string(), "pending"]))
            .await?;
        let nonce = parse_quantity(method, &result)?;
        u64::try_from(nonce).map_err(|_| ConnectivityError::InvalidResponse {
            method: method.to_string(),
            reason: "nonce does not fit in 64 bits".to_string(),
        })
    }

    /// Current gas price in wei.
    pub async fn current_gas_price(&self) -> Result<u128, ConnectivityError> {
        let result = self.call("eth_gasPrice", serde_json::json!([])).await?;
        parse_quantity("eth_gasPrice", &result)
    }

    /// Send a signed envelope and return the id the node assigned to it.
    ///
    /// Returns as soon as the node accepts the transaction into its pool;
    /// inclusion and finality are not awaited.
    pub async fn submit(&self, tx: &SignedTransaction) -> Result<String, ConnectivityError> {
        let method = "eth_sendRawTransaction";
        let result = self.call(method, serde_json::json!([tx.raw_hex()])).await?;
        let tx_id = result
            .as_str()
            .ok_or_else(|| ConnectivityError::InvalidResponse {
                method: method.to_string(),
                reason: "transaction hash is not a string".to_string(),
            })?
            .to_ascii_lowercase();
        if !crate::mock::is_transaction_id(&tx_id) {
            return Err(ConnectivityError::InvalidResponse {
                method: method.to_string(),
                reason: "transaction hash is not 32 bytes of hex".to_string(),
            });
        }
        Ok(tx_id)
    }

    /// Send a JSON-RPC request and return its `result` field.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ConnectivityError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ConnectivityError::from_reqwest(&self.endpoint, method, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ConnectivityError::HttpStatus {
                endpoint: self.endpoint.clone(),
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let rpc: RpcResponse = resp.json().await.map_err(|e| {
            if e.is_decode() {
                ConnectivityError::InvalidResponse {
                    method: method.to_string(),
                    reason: format!("malformed JSON-RPC body: {}", e.without_url()),
                }
            } else {
                ConnectivityError::from_reqwest(&self.endpoint, method, e)
            }
        })?;

        if let Some(error) = rpc.error {
            tracing::warn!(
                endpoint = %self.endpoint,
                method,
                code = error.code,
                "ledger rejected request: {}",
                error.message
            );
            return Err(ConnectivityError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        rpc.result.ok_or_else(|| ConnectivityError::InvalidResponse {
            method: method.to_string(),
            reason: "response has neither result nor error".to_string(),
        })
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x3b9aca00"`.
fn parse_quantity(method: &str, value: &serde_json::Value) -> Result<u128, ConnectivityError> {
    let invalid = |reason: String| ConnectivityError::InvalidResponse {
        method: method.to_string(),
        reason,
    };
    let text = value
        .as_str()
        .ok_or_else(|| invalid(format!("expected hex quantity, got {value}")))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| invalid(format!("quantity {text:?} lacks 0x prefix")))?;
    if digits.is_empty() {
        return Err(invalid("empty quantity".to_string()));
    }
    u128::from_str_radix(digits, 16).map_err(|e| invalid(format!("quantity {text:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_quantity_values() {
        assert_eq!(parse_quantity("m", &json!("0x0")).unwrap(), 0);
        assert_eq!(parse_quantity("m", &json!("0x5")).unwrap(), 5);
        assert_eq!(parse_quantity("m", &json!("0x3b9aca00")).unwrap(), 1_000_000_000);
        assert_eq!(parse_quantity("m", &json!("0x14a34")).unwrap(), 84532);
    }

    #[test]
    fn parse_quantity_rejects_malformed() {
        for bad in [json!("5"), json!("0x"), json!("0xzz"), json!(5), json!(null)] {
            assert!(
                matches!(
                    parse_quantity("eth_gasPrice", &bad),
                    Err(ConnectivityError::InvalidResponse { .. })
                ),
                "{bad}"
            );
        }
    }

    #[tokio::test]
    async fn empty_endpoint_is_configuration_error() {
        let err = LedgerClient::connect("  ", 84532, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnchorError::Configuration(ConfigError::MissingSetting { var: RPC_URL_VAR })
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_connectivity_error() {
        // Port 1 is never listening.
        let err = LedgerClient::connect("http://127.0.0.1:1", 84532, Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, AnchorError::Connectivity(_)), "{err}");
    }
}
