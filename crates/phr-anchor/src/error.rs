//! # Anchoring Error Taxonomy
//!
//! Every failure leaving this crate is an [`AnchorError`] of one of four
//! kinds. Callers branch on [`AnchorError::kind()`], never on message text.
//!
//! | Kind | Meaning | Retry |
//! |------|---------|-------|
//! | `Serialization` | payload has no canonical form | never |
//! | `Configuration` | missing or malformed setting | never |
//! | `Connectivity` | RPC unreachable, rejected, timed out | caller's choice, except `Unconfirmed` |
//! | `Fatal` | randomness or key-material failure | never |
//!
//! ## Redaction
//!
//! No variant carries key material. RPC endpoints are stored in their
//! redacted form (see [`redact_endpoint()`]) and transport errors are
//! stripped of their URL before being wrapped.

use phr_core::CanonicalizationError;
use thiserror::Error;

use crate::address::{Address, AddressError};

/// Top-level error for an anchor call.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// The payload cannot be canonicalized.
    #[error("serialization error: {0}")]
    Serialization(#[from] CanonicalizationError),

    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The ledger could not be reached or refused the request.
    #[error("connectivity error: {0}")]
    Connectivity(#[from] ConnectivityError),

    /// Randomness source or signing failure.
    #[error("fatal error: {0}")]
    Fatal(String),
}

/// Classification of an [`AnchorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Serialization,
    Configuration,
    Connectivity,
    Fatal,
}

impl ErrorKind {
    /// Status code a request-handling layer should answer with.
    ///
    /// Request errors are 400, an unavailable ledger is 503, everything
    /// else is an internal error.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Serialization | Self::Configuration => 400,
            Self::Connectivity => 503,
            Self::Fatal => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Serialization => "serialization",
            Self::Configuration => "configuration",
            Self::Connectivity => "connectivity",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AnchorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Connectivity(_) => ErrorKind::Connectivity,
            Self::Fatal(_) => ErrorKind::Fatal,
        }
    }

    /// Only connectivity failures may be retried, and only with a fresh
    /// nonce and gas price. A submission the node may already hold is never
    /// retryable: a second attempt would anchor the digest twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connectivity(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Missing or malformed configuration. Detected before any network call,
/// except for [`ConfigError::ChainMismatch`], which needs the handshake.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting required in live mode is absent or empty.
    #[error("{var} is required in live mode")]
    MissingSetting { var: &'static str },

    #[error("invalid address in {var}: {source}")]
    InvalidAddress {
        var: &'static str,
        source: AddressError,
    },

    /// The key failed to parse. Deliberately carries no detail.
    #[error("signer key in {var} is malformed")]
    InvalidKey { var: &'static str },

    /// The configured signer address does not belong to the signer key.
    #[error("signer address {configured} does not match the address derived from the signer key ({derived})")]
    SignerMismatch { configured: Address, derived: Address },

    #[error("invalid URL in {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("invalid value for {var}: {value:?} is not a valid {expected}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    /// The endpoint serves a different network than the one configured.
    #[error("RPC endpoint {endpoint} serves chain {actual}, expected chain {expected}")]
    ChainMismatch {
        endpoint: String,
        expected: u64,
        actual: u64,
    },
}

/// Failure talking to the ledger RPC.
#[derive(Error, Debug)]
pub enum ConnectivityError {
    /// Connection refused, DNS failure, TLS failure, broken body.
    #[error("transport error calling {method} on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        method: String,
        source: reqwest::Error,
    },

    #[error("{method} on {endpoint} timed out")]
    Timeout { endpoint: String, method: String },

    #[error("{method} on {endpoint} returned HTTP {status}")]
    HttpStatus {
        endpoint: String,
        method: String,
        status: u16,
    },

    /// The node answered with a JSON-RPC error object, e.g. a nonce that is
    /// too low or insufficient funds for gas.
    #[error("{method} rejected by node (code {code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// The node answered, but not with what the protocol requires.
    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    /// The signed envelope was sent but its fate is unknown: the node
    /// returned an unexpected hash, the reply was lost, or the call timed
    /// out after the request went out. `tx_id` is the locally computed id
    /// to look up before anchoring again.
    #[error("transaction {tx_id} may already be in the pool: {reason}")]
    Unconfirmed { tx_id: String, reason: String },
}

impl ConnectivityError {
    /// False once a signed envelope may have reached the pool.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unconfirmed { .. })
    }

    /// Wrap a reqwest failure, dropping the request URL from it.
    pub(crate) fn from_reqwest(endpoint: &str, method: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_string(),
                method: method.to_string(),
            }
        } else {
            Self::Transport {
                endpoint: endpoint.to_string(),
                method: method.to_string(),
                source: err.without_url(),
            }
        }
    }
}

/// Reduce an RPC URL to `scheme://host[:port]`.
///
/// Hosted providers put API keys in the path or query string, and some
/// deployments use basic-auth userinfo. None of that may reach a log line.
pub fn redact_endpoint(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or("unknown-host");
    match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    }
}
