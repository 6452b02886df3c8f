//! # Anchoring Configuration
//!
//! `AnchorConfig` is built once at process start and passed by reference
//! into the anchoring component. Business logic never reads the process
//! environment; only [`AnchorConfig::from_env()`] does.
//!
//! Live-mode settings are optional at this level so that a mock deployment
//! needs no credentials. They are validated as a group by
//! [`AnchorConfig::live_settings()`], which runs before any network call.
//!
//! Custom `Debug` redacts the signer key and reduces the RPC URL to its
//! scheme, host and port.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::error::{redact_endpoint, ConfigError};
use crate::mode::{select_mode, Mode};
use crate::signer::{SignerKey, KEY_VAR};
use crate::tx::TransactionBuilder;

pub const MODE_VAR: &str = "USE_MOCK_BLOCKCHAIN";
pub const RPC_URL_VAR: &str = "BASE_SEPOLIA_RPC_URL";
pub const REGISTRY_VAR: &str = "PHR_REGISTRY_ADDRESS";
pub const SIGNER_ADDRESS_VAR: &str = "BACKEND_WALLET_ADDRESS";
pub const SIGNER_KEY_VAR: &str = KEY_VAR;
pub const CHAIN_ID_VAR: &str = "PHR_CHAIN_ID";
pub const GAS_LIMIT_VAR: &str = "PHR_GAS_LIMIT";
pub const RPC_TIMEOUT_VAR: &str = "PHR_RPC_TIMEOUT_SECS";
pub const EXPLORER_URL_VAR: &str = "PHR_EXPLORER_URL";

/// Base Sepolia.
pub const DEFAULT_CHAIN_ID: u64 = 84532;
pub const DEFAULT_GAS_LIMIT: u64 = 100_000;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.basescan.org";

/// Process-wide anchoring configuration.
#[derive(Clone)]
pub struct AnchorConfig {
    pub mode: Mode,
    /// Ledger JSON-RPC endpoint. Required in live mode.
    pub rpc_url: Option<String>,
    /// Registry contract address. Required in live mode.
    pub registry_address: Option<String>,
    /// Backend wallet address. Required in live mode.
    pub signer_address: Option<String>,
    /// Backend wallet key, hex. Required in live mode.
    pub signer_key: Option<Zeroizing<String>>,
    pub chain_id: u64,
    pub gas_limit: u64,
    /// Bound on every RPC call.
    pub rpc_timeout: Duration,
    /// Block explorer base URL, for links shown to users.
    pub explorer_url: String,
}

impl std::fmt::Debug for AnchorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rpc_url = self.rpc_url.as_deref().map(|raw| match Url::parse(raw) {
            Ok(url) => redact_endpoint(&url),
            Err(_) => "[unparseable]".to_string(),
        });
        f.debug_struct("AnchorConfig")
            .field("mode", &self.mode)
            .field("rpc_url", &rpc_url)
            .field("registry_address", &self.registry_address)
            .field("signer_address", &self.signer_address)
            .field("signer_key", &self.signer_key.as_ref().map(|_| "[REDACTED]"))
            .field("chain_id", &self.chain_id)
            .field("gas_limit", &self.gas_limit)
            .field("rpc_timeout", &self.rpc_timeout)
            .field("explorer_url", &self.explorer_url)
            .finish()
    }
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self::mock()
    }
}

impl AnchorConfig {
    /// Mock mode with default chain parameters and no credentials.
    pub fn mock() -> Self {
        Self {
            mode: Mode::Mock,
            rpc_url: None,
            registry_address: None,
            signer_address: None,
            signer_key: None,
            chain_id: DEFAULT_CHAIN_ID,
            gas_limit: DEFAULT_GAS_LIMIT,
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
        }
    }

    /// Live mode with all four required settings and default chain
    /// parameters. Nothing is validated until [`Self::live_settings()`].
    pub fn live(
        rpc_url: impl Into<String>,
        registry_address: impl Into<String>,
        signer_address: impl Into<String>,
        signer_key: impl Into<String>,
    ) -> Self {
        Self {
            mode: Mode::Live,
            rpc_url: Some(rpc_url.into()),
            registry_address: Some(registry_address.into()),
            signer_address: Some(signer_address.into()),
            signer_key: Some(Zeroizing::new(signer_key.into())),
            ..Self::mock()
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// Variables:
    /// - `USE_MOCK_BLOCKCHAIN` (default: mock; unparseable values also mock)
    /// - `BASE_SEPOLIA_RPC_URL`, `PHR_REGISTRY_ADDRESS`,
    ///   `BACKEND_WALLET_ADDRESS`, `BACKEND_PRIVATE_KEY` (required in live mode)
    /// - `PHR_CHAIN_ID` (default: 84532)
    /// - `PHR_GAS_LIMIT` (default: 100000)
    /// - `PHR_RPC_TIMEOUT_SECS` (default: 30)
    /// - `PHR_EXPLORER_URL` (default: `https://sepolia.basescan.org`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same parsing as [`Self::from_env()`] against an arbitrary source.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidNumber` if a numeric override is set but is not
    /// a positive integer. Missing live-mode settings are not an error
    /// here; they surface from [`Self::live_settings()`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let mode = select_mode(lookup(MODE_VAR).as_deref());
        let chain_id = parse_positive(CHAIN_ID_VAR, get(CHAIN_ID_VAR), DEFAULT_CHAIN_ID)?;
        let gas_limit = parse_positive(GAS_LIMIT_VAR, get(GAS_LIMIT_VAR), DEFAULT_GAS_LIMIT)?;
        let timeout_secs = parse_positive(
            RPC_TIMEOUT_VAR,
            get(RPC_TIMEOUT_VAR),
            DEFAULT_RPC_TIMEOUT_SECS,
        )?;

        Ok(Self {
            mode,
            rpc_url: get(RPC_URL_VAR),
            registry_address: get(REGISTRY_VAR),
            signer_address: get(SIGNER_ADDRESS_VAR),
            signer_key: get(SIGNER_KEY_VAR).map(Zeroizing::new),
            chain_id,
            gas_limit,
            rpc_timeout: Duration::from_secs(timeout_secs),
            explorer_url: get(EXPLORER_URL_VAR)
                .unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
        })
    }

    /// Validate everything live mode needs. Makes no network calls.
    ///
    /// # Errors
    ///
    /// - `MissingSetting` for the first absent required setting, checked in
    ///   the order endpoint, registry, signer address, signer key.
    /// - `InvalidUrl`, `InvalidAddress`, `InvalidKey` for malformed values.
    /// - `SignerMismatch` if the key does not control the signer address.
    pub fn live_settings(&self) -> Result<LiveSettings, ConfigError> {
        let rpc_url = required(RPC_URL_VAR, self.rpc_url.as_deref())?;
        let registry = required(REGISTRY_VAR, self.registry_address.as_deref())?;
        let signer_address = required(SIGNER_ADDRESS_VAR, self.signer_address.as_deref())?;
        let signer_key = required(SIGNER_KEY_VAR, self.signer_key.as_deref().map(String::as_str))?;

        let rpc_url = parse_rpc_url(rpc_url)?;
        let builder =
            TransactionBuilder::new(registry, signer_address, self.gas_limit, self.chain_id)?;
        let signer = SignerKey::from_hex(signer_key)?;
        if signer.address() != builder.from_address() {
            return Err(ConfigError::SignerMismatch {
                configured: builder.from_address(),
                derived: signer.address(),
            });
        }

        Ok(LiveSettings {
            rpc_url,
            builder,
            signer,
            chain_id: self.chain_id,
            rpc_timeout: self.rpc_timeout,
        })
    }
}

/// Validated live-mode settings.
#[derive(Debug)]
pub struct LiveSettings {
    pub rpc_url: Url,
    pub builder: TransactionBuilder,
    pub signer: SignerKey,
    pub chain_id: u64,
    pub rpc_timeout: Duration,
}

fn required<'a>(var: &'static str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingSetting { var }),
    }
}

/// Parse and check an RPC endpoint. Only `http` and `https` are accepted.
pub(crate) fn parse_rpc_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        var: RPC_URL_VAR,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            var: RPC_URL_VAR,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

fn parse_positive(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw,
            expected: "positive integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const REGISTRY: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const SIGNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    fn live_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (MODE_VAR, "false"),
            (RPC_URL_VAR, "https://base-sepolia.example.com/v2/secret-api-key"),
            (REGISTRY_VAR, REGISTRY),
            (SIGNER_ADDRESS_VAR, SIGNER),
            (SIGNER_KEY_VAR, KEY),
        ]
    }

    #[test]
    fn empty_environment_is_mock_with_defaults() {
        let cfg = AnchorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.mode, Mode::Mock);
        assert_eq!(cfg.chain_id, 84532);
        assert_eq!(cfg.gas_limit, 100_000);
        assert_eq!(cfg.rpc_timeout, Duration::from_secs(30));
        assert_eq!(cfg.explorer_url, "https://sepolia.basescan.org");
        assert!(cfg.signer_key.is_none());
    }

    #[test]
    fn full_live_environment_validates() {
        let cfg = AnchorConfig::from_lookup(lookup(&live_env())).unwrap();
        assert_eq!(cfg.mode, Mode::Live);
        let settings = cfg.live_settings().unwrap();
        assert_eq!(settings.signer.address().to_string(), SIGNER);
        assert_eq!(settings.builder.contract().to_string(), REGISTRY);
        assert_eq!(settings.chain_id, 84532);
    }

    #[test]
    fn numeric_overrides() {
        let mut env = live_env();
        env.push((CHAIN_ID_VAR, "8453"));
        env.push((GAS_LIMIT_VAR, "150000"));
        env.push((RPC_TIMEOUT_VAR, "5"));
        let cfg = AnchorConfig::from_lookup(lookup(&env)).unwrap();
        assert_eq!(cfg.chain_id, 8453);
        assert_eq!(cfg.gas_limit, 150_000);
        assert_eq!(cfg.rpc_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numeric_override_is_error() {
        for value in ["abc", "0", "-1", "1.5"] {
            let err = AnchorConfig::from_lookup(lookup(&[(GAS_LIMIT_VAR, value)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidNumber { var: GAS_LIMIT_VAR, .. }),
                "{value}"
            );
        }
    }

    #[test]
    fn each_missing_live_setting_is_reported() {
        for missing in [RPC_URL_VAR, REGISTRY_VAR, SIGNER_ADDRESS_VAR, SIGNER_KEY_VAR] {
            let env: Vec<_> = live_env().into_iter().filter(|(k, _)| *k != missing).collect();
            let cfg = AnchorConfig::from_lookup(lookup(&env)).unwrap();
            match cfg.live_settings().unwrap_err() {
                ConfigError::MissingSetting { var } => assert_eq!(var, missing),
                other => panic!("expected MissingSetting for {missing}, got {other}"),
            }
        }
    }

    #[test]
    fn blank_setting_counts_as_missing() {
        let mut env = live_env();
        env.retain(|(k, _)| *k != SIGNER_KEY_VAR);
        env.push((SIGNER_KEY_VAR, "   "));
        let cfg = AnchorConfig::from_lookup(lookup(&env)).unwrap();
        assert!(matches!(
            cfg.live_settings(),
            Err(ConfigError::MissingSetting { var: SIGNER_KEY_VAR })
        ));
    }

    #[test]
    fn signer_mismatch_detected() {
        let cfg = AnchorConfig::live(
            "http://127.0.0.1:8545",
            REGISTRY,
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            KEY,
        );
        assert!(matches!(
            cfg.live_settings(),
            Err(ConfigError::SignerMismatch { .. })
        ));
    }

    #[test]
    fn non_http_endpoint_rejected() {
        let cfg = AnchorConfig::live("ws://127.0.0.1:8546", REGISTRY, SIGNER, KEY);
        assert!(matches!(
            cfg.live_settings(),
            Err(ConfigError::InvalidUrl { var: RPC_URL_VAR, .. })
        ));
        let cfg = AnchorConfig::live("not a url", REGISTRY, SIGNER, KEY);
        assert!(matches!(cfg.live_settings(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn malformed_key_error_does_not_echo_key() {
        let bad_key = "0xdeadbeefnothex";
        let cfg = AnchorConfig::live("http://127.0.0.1:8545", REGISTRY, SIGNER, bad_key);
        let err = cfg.live_settings().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey { .. }));
        assert!(!err.to_string().contains("deadbeef"));
    }

    #[test]
    fn debug_redacts_key_and_endpoint_path() {
        let cfg = AnchorConfig::from_lookup(lookup(&live_env())).unwrap();
        let debug = format!("{cfg:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("ac0974bec39a17e3"));
        assert!(!debug.contains("secret-api-key"));
        assert!(debug.contains("https://base-sepolia.example.com"));
    }
}
